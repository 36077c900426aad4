use super::ResultWriter;
use crate::chr::Solution;
use anyhow::{Context, Result};
use std::io::Write;

/// A writer displaying the final store as a sequence of clauses, one constraint per line.
///
/// The output can be read back as the goals of a CHR program.
/// Built-in constraints follow the ordinary ones, after a `% built-in` comment line which is omitted when there are none.
#[derive(Default)]
pub struct ClauseWriter;

impl ResultWriter for ClauseWriter {
    fn write_solution(&self, writer: &mut dyn Write, solution: &Solution) -> Result<()> {
        let context = "while writing the solution";
        super::specs::write_non_termination(writer, solution)?;
        for t in solution.chr_constraints() {
            writeln!(writer, "{}.", t).context(context)?;
        }
        if !solution.builtin_constraints().is_empty() {
            writeln!(writer, "% built-in").context(context)?;
            for t in solution.builtin_constraints() {
                writeln!(writer, "{}.", t).context(context)?;
            }
        }
        writer.flush().context("while flushing the solution")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chr::{solve, RuleStore};
    use crate::io::{ChrReader, ProgramReader};
    use crate::terms::Term;
    use std::io::BufWriter;

    fn write(solution: &Solution) -> String {
        let writer = ClauseWriter::default();
        let mut buffer = BufWriter::new(Vec::new());
        writer.write_solution(&mut buffer, solution).unwrap();
        String::from_utf8(buffer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_write_ordinary_only() {
        let goals = [
            Term::compound("prime", vec![Term::Int(3)]),
            Term::compound("prime", vec![Term::Int(2)]),
        ];
        let solution = solve(RuleStore::default(), &goals).unwrap();
        assert_eq!("prime(3).\nprime(2).\n", write(&solution));
    }

    #[test]
    fn test_write_builtins() {
        let goals = [
            Term::atom("done"),
            Term::infix("<", Term::var("X"), Term::Int(3)),
        ];
        let solution = solve(RuleStore::default(), &goals).unwrap();
        assert_eq!("done.\n% built-in\nX_1<3.\n", write(&solution));
    }

    #[test]
    fn test_output_is_readable() {
        let goals = [
            Term::compound("arg", vec![Term::atom("Big A"), Term::List(vec![Term::Int(-1)])]),
            Term::infix("==", Term::var("Y"), Term::string("s")),
        ];
        let solution = solve(RuleStore::default(), &goals).unwrap();
        let output = write(&solution);
        let program = ChrReader::default().read(&mut output.as_bytes()).unwrap();
        let read_goals = program
            .goals()
            .iter()
            .flatten()
            .map(|t| t.to_string())
            .collect::<Vec<String>>();
        assert_eq!(vec!["arg('Big A',[-1])", "Y_1==\"s\""], read_goals);
    }
}
