use super::{cli_manager, command::Command, common};
use anyhow::{anyhow, Context, Result};
use chrust::{
    chr::{ChrSolver, LoggingListener, SolvingResult, TraceLevel, DEFAULT_MAX_ITERATIONS},
    io::{ClauseWriter, ListWriter, ResultWriter},
};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use std::str::FromStr;
use strum::VariantNames;
use strum_macros::{EnumString, EnumVariantNames};

const CMD_NAME: &str = "solve";

const ARG_MAX_ITERATIONS: &str = "MAX_ITERATIONS";
const ARG_TRACE: &str = "TRACE";
const ARG_WRITER: &str = "WRITER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumVariantNames)]
#[strum(serialize_all = "snake_case")]
enum WriterKind {
    List,
    Clauses,
}

impl WriterKind {
    fn writer(&self) -> Box<dyn ResultWriter> {
        match self {
            WriterKind::List => Box::new(ListWriter::default()),
            WriterKind::Clauses => Box::new(ClauseWriter::default()),
        }
    }
}

pub(crate) struct SolveCommand;

impl SolveCommand {
    pub(crate) fn new() -> Self {
        SolveCommand
    }
}

impl<'a> Command<'a> for SolveCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Solves the goals of a CHR program")
            .setting(AppSettings::DisableVersion)
            .arg(common::input_args())
            .arg(
                Arg::with_name(ARG_MAX_ITERATIONS)
                    .long("max-iterations")
                    .empty_values(false)
                    .multiple(false)
                    .help("the maximal number of passes over the rules")
                    .required(false),
            )
            .arg(
                Arg::with_name(ARG_TRACE)
                    .long("trace")
                    .empty_values(false)
                    .multiple(false)
                    .possible_values(TraceLevel::VARIANTS)
                    .default_value("off")
                    .help("the solver events to log")
                    .required(false),
            )
            .arg(
                Arg::with_name(ARG_WRITER)
                    .long("writer")
                    .empty_values(false)
                    .multiple(false)
                    .possible_values(WriterKind::VARIANTS)
                    .default_value("list")
                    .help("the output format of the solution")
                    .required(false),
            )
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let file = arg_matches
            .value_of(common::ARG_INPUT)
            .ok_or_else(|| anyhow!("missing input file"))?;
        let max_iterations = arg_matches
            .value_of(ARG_MAX_ITERATIONS)
            .map(|n| {
                n.parse::<usize>()
                    .with_context(|| format!(r#"invalid number of iterations "{}""#, n))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_ITERATIONS);
        let trace_level = parse_enum_arg::<TraceLevel>(arg_matches, ARG_TRACE)?;
        let writer_kind = parse_enum_arg::<WriterKind>(arg_matches, ARG_WRITER)?;
        let (program, rules) = common::read_program(file)?;
        let mut solver = ChrSolver::new(rules);
        solver.set_max_iterations(max_iterations);
        solver.add_listener(Box::new(LoggingListener::new(trace_level)));
        for goals in program.goals() {
            solver.add_goals(goals)?;
        }
        info!("solving with at most {} pass(es)", max_iterations);
        let result = solver.solve();
        if result == SolvingResult::NonTermination {
            warn!("the maximal number of passes was reached before a fixpoint");
        }
        let solution = solver.solution(result);
        let mut out = std::io::stdout();
        writer_kind.writer().write_solution(&mut out, &solution)
    }
}

fn parse_enum_arg<T>(arg_matches: &ArgMatches<'_>, arg_name: &str) -> Result<T>
where
    T: FromStr,
{
    let value = arg_matches
        .value_of(arg_name)
        .ok_or_else(|| anyhow!("missing value for argument {}", arg_name))?;
    T::from_str(value).map_err(|_| anyhow!(r#"invalid value "{}" for argument {}"#, value, arg_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_kinds() {
        assert_eq!(&["list", "clauses"], WriterKind::VARIANTS);
        assert_eq!(WriterKind::Clauses, WriterKind::from_str("clauses").unwrap());
    }

    fn matches_for(args: &[&str]) -> Result<()> {
        let cmd = SolveCommand::new();
        let app = App::new("chrust").subcommand(cmd.clap_subcommand());
        let matches = app
            .get_matches_from_safe(args)
            .map_err(|e| anyhow!("{}", e))?;
        let solve_matches = matches
            .subcommand_matches(CMD_NAME)
            .ok_or_else(|| anyhow!("no solve subcommand"))?;
        parse_enum_arg::<TraceLevel>(solve_matches, ARG_TRACE)?;
        parse_enum_arg::<WriterKind>(solve_matches, ARG_WRITER)?;
        Ok(())
    }

    #[test]
    fn test_default_args() {
        matches_for(&["chrust", "solve", "-f", "foo.chr"]).unwrap();
    }

    #[test]
    fn test_explicit_args() {
        matches_for(&[
            "chrust",
            "solve",
            "-f",
            "foo.chr",
            "--trace",
            "environments",
            "--writer",
            "clauses",
        ])
        .unwrap();
    }

    #[test]
    fn test_unknown_writer() {
        assert!(matches_for(&["chrust", "solve", "-f", "foo.chr", "--writer", "json"]).is_err());
    }
}
