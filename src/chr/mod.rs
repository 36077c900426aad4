//! The CHR engine: rules, constraint store, head matching and solver.

mod constraint_store;
pub use constraint_store::ConstraintId;
pub use constraint_store::ConstraintStore;
pub use constraint_store::Partition;

mod env_map;
pub use env_map::EnvId;
pub use env_map::EnvMap;
pub use env_map::Slot;
pub use env_map::EMPTY_ENV;

mod head_matcher;
pub use head_matcher::RuleMatch;

mod listener;
pub use listener::LoggingListener;
pub use listener::SolvingListener;
pub use listener::TraceLevel;

mod rule;
pub use rule::Rule;
pub use rule::RuleStore;

mod solver;
pub use solver::solve;
pub use solver::ChrSolver;
pub use solver::Solution;
pub use solver::SolvingResult;
pub use solver::DEFAULT_MAX_ITERATIONS;
