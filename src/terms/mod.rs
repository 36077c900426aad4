//! Terms of the CHR language, together with environments, unification and expression evaluation.

mod bindings;
pub use bindings::Bindings;

mod evaluation;
pub use evaluation::as_assignment;
pub use evaluation::negate;
pub use evaluation::BuiltinOracle;
pub use evaluation::Evaluator;

mod operators;
pub use operators::infix_operator;
pub use operators::prefix_operator;
pub use operators::Operator;
pub use operators::OperatorKind;
pub use operators::ASSIGNMENT_OPERATORS;
pub use operators::EQUALITY_OPERATOR;

mod term;
pub use term::Compound;
pub use term::Term;
pub use term::TermType;
pub use term::Variable;

mod unification;
pub use unification::match_terms;
pub use unification::unify;
