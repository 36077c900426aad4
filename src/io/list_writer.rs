use super::ResultWriter;
use crate::chr::Solution;
use crate::terms::Term;
use anyhow::{Context, Result};
use std::io::Write;

/// A writer displaying the final store as two lists.
///
/// The first line contains the ordinary constraints and the second one the built-in constraints, both in assertion order.
/// If the solver stopped before reaching a fixpoint, a `NON-TERMINATION` line is written first.
///
/// # Example
///
/// ```
/// # use chrust::chr::{solve, RuleStore};
/// # use chrust::io::{ListWriter, ResultWriter};
/// # use chrust::terms::Term;
/// let solution = solve(RuleStore::default(), &[Term::atom("a"), Term::atom("b")]).unwrap();
/// let mut buffer = Vec::new();
/// ListWriter::default().write_solution(&mut buffer, &solution).unwrap();
/// assert_eq!("[a, b]\n[]\n", String::from_utf8(buffer).unwrap());
/// ```
#[derive(Default)]
pub struct ListWriter;

fn write_list(writer: &mut dyn Write, terms: &[Term]) -> Result<()> {
    let items = terms
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<String>>()
        .join(", ");
    writeln!(writer, "[{}]", items).context("while writing a list of constraints")
}

impl ResultWriter for ListWriter {
    fn write_solution(&self, writer: &mut dyn Write, solution: &Solution) -> Result<()> {
        super::specs::write_non_termination(writer, solution)?;
        write_list(writer, solution.chr_constraints())?;
        write_list(writer, solution.builtin_constraints())?;
        writer.flush().context("while flushing the solution")
    }
}
