use crate::chr::{Rule, RuleStore, Solution, SolvingResult};
use crate::terms::Term;
use anyhow::{Context, Result};
use std::io::{Read, Write};

/// The type of callback functions to call when warnings are raised while parsing a CHR program.
///
/// The callback receives the line at which the warning was raised and the warning message.
pub type WarningHandler = Box<dyn Fn(usize, String)>;

/// A CHR program: a list of rules and a list of goals.
///
/// Goals are grouped by clause; the goals of the same clause form a conjunction and share their variables.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChrProgram {
    rules: Vec<Rule>,
    goals: Vec<Vec<Term>>,
}

impl ChrProgram {
    pub(crate) fn new(rules: Vec<Rule>, goals: Vec<Vec<Term>>) -> Self {
        ChrProgram { rules, goals }
    }

    /// Returns the rules, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the conjunctions of goals, in declaration order.
    pub fn goals(&self) -> &[Vec<Term>] {
        &self.goals
    }

    /// Returns the total number of goals.
    pub fn n_goals(&self) -> usize {
        self.goals.iter().map(|g| g.len()).sum()
    }

    /// Registers the rules of the program in a new rule store.
    ///
    /// Rules that cannot be registered are skipped; the corresponding errors are returned along with the store.
    pub fn build_rule_store(&self) -> (RuleStore, Vec<anyhow::Error>) {
        let mut store = RuleStore::default();
        let errors = self
            .rules
            .iter()
            .filter_map(|r| store.add_rule(r.clone()).err())
            .collect();
        (store, errors)
    }
}

/// A trait implemented by objects able to read CHR programs.
pub trait ProgramReader {
    /// Reads a [`ChrProgram`].
    ///
    /// In case warnings are raised, the callback functions registered by [add_warning_handler](Self::add_warning_handler) are triggered.
    ///
    /// # Example
    ///
    /// ```
    /// # use chrust::io::{ChrProgram, ChrReader, ProgramReader};
    /// fn read_program_from_str(s: &str) -> ChrProgram {
    ///     let reader = ChrReader::default();
    ///     reader.read(&mut s.as_bytes()).expect("invalid CHR program")
    /// }
    /// # read_program_from_str("gcd(0) <=> true.");
    /// ```
    fn read(&self, reader: &mut dyn Read) -> Result<ChrProgram>;

    /// Adds a callback function to call when warnings are raised while parsing a program.
    fn add_warning_handler(&mut self, h: WarningHandler);
}

/// A trait implemented by objects that write the solutions computed by a CHR solver.
pub trait ResultWriter {
    /// Writes a solution.
    fn write_solution(&self, writer: &mut dyn Write, solution: &Solution) -> Result<()>;
}

pub(crate) fn write_non_termination(writer: &mut dyn Write, solution: &Solution) -> Result<()> {
    if solution.result() == SolvingResult::NonTermination {
        writeln!(writer, "NON-TERMINATION").context("while writing the solving result")?;
    }
    Ok(())
}
