use super::{app_helper, command::Command, writable_string::WritableString};
use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg};
use log::info;
use std::{ffi::OsString, str::FromStr};
use sysinfo::System;

/// Handles the set of commands and processes the CLI arguments against them.
pub(crate) struct CliManager<'a> {
    app_name: &'a str,
    version: &'a str,
    author: &'a str,
    about: &'a str,
    commands: Vec<Box<dyn Command<'a>>>,
}

pub(crate) const APP_HELPER_LOGGING_LEVEL_ARG: &str = "APP_HELPER_LOGGING_LEVEL_ARG";

const LOGGING_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

pub(crate) fn logging_level_cli_arg<'a>() -> Arg<'a, 'a> {
    logging_level_cli_arg_with_default_value("info")
}

pub(crate) fn logging_level_cli_arg_with_default_value<'a>(default_value: &'a str) -> Arg<'a, 'a> {
    Arg::with_name(APP_HELPER_LOGGING_LEVEL_ARG)
        .long("logging-level")
        .multiple(false)
        .default_value(default_value)
        .possible_values(&LOGGING_LEVELS)
        .help("set the minimal logging level")
}

impl<'a> CliManager<'a> {
    pub(crate) fn new(app_name: &'a str, version: &'a str, author: &'a str, about: &'a str) -> Self {
        CliManager {
            app_name,
            version,
            author,
            about,
            commands: vec![],
        }
    }

    pub(crate) fn add_command(&mut self, command: Box<dyn Command<'a>>) {
        self.commands.push(command);
    }

    pub(crate) fn parse_cli<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<T> = args.into_iter().collect();
        let mut app = App::new(self.app_name)
            .global_setting(AppSettings::DisableVersion)
            .global_setting(AppSettings::VersionlessSubcommands)
            .setting(AppSettings::NeedsSubcommandHelp)
            .setting(AppSettings::SubcommandRequired)
            .version(self.version)
            .author(self.author)
            .about(self.about);
        for c in self.commands.iter() {
            app = app.subcommand(c.clap_subcommand());
        }
        match app.clone().get_matches_from_safe(args.clone()) {
            Ok(matches) => {
                let (command, matches) = self
                    .commands
                    .iter()
                    .find_map(|c| matches.subcommand_matches(c.name()).map(|m| (c, m)))
                    .ok_or_else(|| anyhow!("no subcommand was provided"))?;
                let log_level = matches
                    .value_of(APP_HELPER_LOGGING_LEVEL_ARG)
                    .map(|l| {
                        log::LevelFilter::from_str(l)
                            .map_err(|e| anyhow!(r#"invalid logging level "{}": {}"#, l, e))
                    })
                    .transpose()?
                    .unwrap_or(log::LevelFilter::Info);
                app_helper::init_logger_with_level(log_level);
                info!("{} {}", self.app_name, self.version);
                sys_info();
                command.execute(matches)
            }
            Err(clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            }) => {
                app_helper::init_logger();
                self.print_help(&mut app, args.as_slice())
            }
            Err(e) => {
                app_helper::init_logger();
                info!("{} {}", self.app_name, self.version);
                Err(anyhow!("{}", e))
            }
        }
    }

    fn print_help<T>(&self, app: &mut App, args: &[T]) -> Result<()>
    where
        T: Into<OsString> + Clone,
    {
        const HELP_STRINGS: [&str; 3] = ["help", "-h", "--help"];
        let arg_string = |i: usize| -> Option<String> {
            args.get(i)
                .and_then(|a| a.clone().into().into_string().ok())
        };
        let subcommand_name = match (arg_string(1), arg_string(2)) {
            (Some(a1), _) if !HELP_STRINGS.contains(&a1.as_str()) => Some(a1),
            (Some(_), Some(a2)) => Some(a2),
            _ => None,
        };
        let mut message = WritableString::default();
        let written =
            match subcommand_name.and_then(|n| self.commands.iter().find(|c| c.name() == n)) {
                Some(c) => c.clap_subcommand().write_long_help(&mut message),
                None => app.write_long_help(&mut message),
            };
        written.context("while writing the help message")?;
        message.to_string().split('\n').for_each(|s| info!("{}", s));
        info!("");
        Ok(())
    }
}

fn sys_info() {
    info!("----------------------------------------");
    let unknown = || "[unknown]".to_string();
    info!("running on {}", System::host_name().unwrap_or_else(unknown));
    info!(
        "OS is {} {} with kernel {}",
        System::name().unwrap_or_else(unknown),
        System::os_version().unwrap_or_else(unknown),
        System::kernel_version().unwrap_or_else(unknown)
    );
    let sys = System::new_all();
    let mut cpu_kinds: Vec<&str> = sys.cpus().iter().map(|p| p.brand()).collect();
    cpu_kinds.sort_unstable();
    cpu_kinds.dedup();
    info!(
        "physical core count: {} {:?}",
        sys.physical_core_count()
            .map(|n| n.to_string())
            .unwrap_or_else(unknown),
        cpu_kinds
    );
    info!("total memory: {} KB", sys.total_memory() / 1024);
    info!("----------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{ArgMatches, SubCommand};
    use std::{cell::RefCell, rc::Rc};

    struct LocalCommand {
        command_involved: Rc<RefCell<bool>>,
        argument_set: Rc<RefCell<bool>>,
    }

    impl<'a> Command<'a> for LocalCommand {
        fn name(&self) -> &str {
            "local_command_name"
        }

        fn clap_subcommand(&self) -> App<'a, 'a> {
            SubCommand::with_name("local_command_name")
                .about("local_command_about")
                .arg(Arg::with_name("arg_name").short("a"))
                .arg(logging_level_cli_arg())
                .setting(AppSettings::DisableVersion)
        }

        fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
            (*self.command_involved.borrow_mut()) = true;
            if arg_matches.is_present("arg_name") {
                (*self.argument_set.borrow_mut()) = true;
            }
            Ok(())
        }
    }

    fn test_local_command_result(args: Vec<&'static str>) -> Result<(bool, bool)> {
        let mut manager = CliManager::new("app_name", "app_version", "author", "about");
        let command_involved = Rc::new(RefCell::new(false));
        let argument_set = Rc::new(RefCell::new(false));
        manager.add_command(Box::new(LocalCommand {
            command_involved: Rc::clone(&command_involved),
            argument_set: Rc::clone(&argument_set),
        }));
        manager.parse_cli(args)?;
        let result = (*command_involved.borrow(), *argument_set.borrow());
        Ok(result)
    }

    #[test]
    fn test_command_involved() {
        let result = test_local_command_result(vec!["app_name", "local_command_name"]).unwrap();
        assert_eq!((true, false), result);
    }

    #[test]
    fn test_command_and_arg_involved() {
        let result =
            test_local_command_result(vec!["app_name", "local_command_name", "-a"]).unwrap();
        assert_eq!((true, true), result);
    }

    #[test]
    fn test_logging_level() {
        let result = test_local_command_result(vec![
            "app_name",
            "local_command_name",
            "--logging-level",
            "off",
        ])
        .unwrap();
        assert_eq!((true, false), result);
    }

    #[test]
    fn test_no_subcommand() {
        assert!(test_local_command_result(vec!["app_name"]).is_err());
    }

    #[test]
    fn test_wrong_subcommand() {
        assert!(test_local_command_result(vec!["app_name", "foo"]).is_err());
    }

    #[test]
    fn test_wrong_arg() {
        assert!(test_local_command_result(vec!["app_name", "local_command_name", "-b"]).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(
            (false, false),
            test_local_command_result(vec!["app_name", "-h"]).unwrap()
        );
    }

    #[test]
    fn test_help_for_subcommand() {
        test_local_command_result(vec!["app_name", "help", "local_command_name"]).unwrap();
        test_local_command_result(vec!["app_name", "local_command_name", "-h"]).unwrap();
    }
}
