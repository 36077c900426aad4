//! Chrust is a Constraint Handling Rules engine, used to build arguments from rule-based knowledge.
//!
//! Programs are made of rules (simplification, simpagation and propagation) and goals.
//! The [`io`] module reads them from text, the [`chr`] module fires the rules until a fixpoint is reached,
//! and the [`terms`] module provides the term language, unification and the evaluation of built-in expressions.
//!
//! # Example
//!
//! ```
//! # use chrust::chr::{ChrSolver, SolvingResult};
//! # use chrust::io::{ChrReader, ProgramReader};
//! let program = r#"
//!     gcd(0) <=> true.
//!     gcd(N) \ gcd(M) <=> N <= M | L is M mod N, gcd(L).
//!     gcd(9), gcd(6).
//! "#;
//! let program = ChrReader::default().read(&mut program.as_bytes()).unwrap();
//! let (rules, errors) = program.build_rule_store();
//! assert!(errors.is_empty());
//! let mut solver = ChrSolver::new(rules);
//! for goals in program.goals() {
//!     solver.add_goals(goals).unwrap();
//! }
//! assert_eq!(SolvingResult::Fixpoint, solver.solve());
//! assert_eq!("gcd(3)", solver.chr_constraints()[0].to_string());
//! ```

#![warn(missing_docs)]

pub mod chr;

pub mod io;

pub mod terms;
