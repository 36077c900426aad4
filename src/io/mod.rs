//! Objects used to read CHR programs and write the solutions computed by the solver.

mod chr_reader;
pub use chr_reader::ChrReader;

mod clause_writer;
pub use clause_writer::ClauseWriter;

mod list_writer;
pub use list_writer::ListWriter;

mod specs;
pub use specs::ChrProgram;
pub use specs::ProgramReader;
pub use specs::ResultWriter;
pub use specs::WarningHandler;
