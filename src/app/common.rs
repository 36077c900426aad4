use super::{app_helper::AppHelper, command::Command, AuthorsCommand, CheckCommand, SolveCommand};
use anyhow::{Context, Result};
use chrust::{
    chr::RuleStore,
    io::{ChrProgram, ChrReader, ProgramReader},
};
use clap::Arg;
use log::{info, warn};
use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::PathBuf,
};

pub(crate) fn create_app_helper() -> AppHelper<'static> {
    let app_name = option_env!("CARGO_PKG_NAME").unwrap_or("unknown app name");
    let app_version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version");
    let authors = option_env!("CARGO_PKG_AUTHORS").unwrap_or("unknown authors");
    let mut app = AppHelper::new(
        app_name,
        app_version,
        authors,
        "Chrust, a Constraint Handling Rules engine for argument construction.",
    );
    let commands: Vec<Box<dyn Command>> = vec![
        Box::new(AuthorsCommand::new(app_name, app_version, authors)),
        Box::new(CheckCommand::new()),
        Box::new(SolveCommand::new()),
    ];
    for c in commands {
        app.add_command(c);
    }
    app
}

pub(crate) const ARG_INPUT: &str = "INPUT";

pub(crate) fn input_args() -> Arg<'static, 'static> {
    Arg::with_name(ARG_INPUT)
        .short("f")
        .empty_values(false)
        .multiple(false)
        .help("the input file that contains the CHR program")
        .required(true)
}

/// Reads a CHR program and registers its rules, logging warnings and registration errors.
pub(crate) fn read_program(file_path: &str) -> Result<(ChrProgram, RuleStore)> {
    let mut reader = ChrReader::default();
    reader.add_warning_handler(Box::new(|line, msg| warn!("at line {}: {}", line, msg)));
    let program = read_file_path_with(file_path, &|r| reader.read(r))?;
    let (rules, errors) = program.build_rule_store();
    errors
        .iter()
        .for_each(|e| warn!("ignoring a rule: {}", e));
    info!(
        "the program has {} rule(s) ({} registered) and {} goal(s)",
        program.rules().len(),
        rules.len(),
        program.n_goals(),
    );
    Ok((program, rules))
}

pub(crate) fn read_file_path_with<F, R>(file_path: &str, reader: &F) -> Result<R>
where
    F: Fn(&mut dyn Read) -> Result<R>,
{
    let canonicalized = canonicalize_file_path(file_path)?;
    info!("reading input file {:?}", canonicalized);
    let mut file_reader = BufReader::new(
        File::open(&canonicalized)
            .with_context(|| format!("while opening file {:?}", canonicalized))?,
    );
    (reader)(&mut file_reader)
        .with_context(|| format!(r#"while reading file "{}""#, file_path))
}

/// Canonicalize a path given by the user.
pub(crate) fn canonicalize_file_path(file_path: &str) -> Result<PathBuf> {
    fs::canonicalize(PathBuf::from(file_path))
        .with_context(|| format!(r#"while opening file "{}""#, file_path))
}
