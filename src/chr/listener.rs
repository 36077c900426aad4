use super::{Rule, SolvingResult};
use crate::terms::{Bindings, Term};
use log::{debug, info, trace};
use strum_macros::{AsRefStr, EnumString, EnumVariantNames};

/// A trait for objects listening to the events of a CHR solver.
///
/// Every method has a default implementation doing nothing,
/// so that listeners only need to implement the events they are interested in.
pub trait SolvingListener {
    /// Called when the solver starts looking for a match of a rule.
    fn rule_attempted(&self, _rule: &Rule) {}

    /// Called when a rule fires, with the constraints matched by its heads (delete-heads first).
    fn rule_fired(&self, _rule: &Rule, _matched: &[&Term]) {}

    /// Called when no match satisfying the guards was found for a rule.
    fn rule_not_fired(&self, _rule: &Rule) {}

    /// Called when a rule fires, with the environment produced by head matching and guard evaluation.
    fn environment(&self, _rule: &Rule, _env: &Bindings) {}

    /// Called at the end of the search, with the number of passes over the rules.
    fn solving_end(&self, _result: SolvingResult, _n_passes: usize) {}
}

/// The verbosity of a [`LoggingListener`].
///
/// Each level includes the events of the previous ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsRefStr, EnumString, EnumVariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum TraceLevel {
    /// Only the end of the search is reported.
    Off,
    /// Rule firings are reported.
    Firings,
    /// Rule attempts, successful or not, are reported.
    Attempts,
    /// The environments of the firings are reported.
    Environments,
}

/// A listener forwarding the solver events to the logging facade.
///
/// # Example
///
/// ```
/// # use chrust::chr::{ChrSolver, LoggingListener, RuleStore, TraceLevel};
/// # use std::str::FromStr;
/// let mut solver = ChrSolver::new(RuleStore::default());
/// solver.add_listener(Box::new(LoggingListener::new(TraceLevel::from_str("firings").unwrap())));
/// ```
pub struct LoggingListener {
    level: TraceLevel,
}

impl LoggingListener {
    /// Builds a listener reporting the events up to the given level.
    pub fn new(level: TraceLevel) -> Self {
        LoggingListener { level }
    }
}

impl SolvingListener for LoggingListener {
    fn rule_attempted(&self, rule: &Rule) {
        if self.level >= TraceLevel::Attempts {
            trace!("trying rule {}", rule.name());
        }
    }

    fn rule_fired(&self, rule: &Rule, matched: &[&Term]) {
        if self.level >= TraceLevel::Firings {
            debug!(
                "rule {} fired on {}",
                rule.name(),
                matched
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            );
        }
    }

    fn rule_not_fired(&self, rule: &Rule) {
        if self.level >= TraceLevel::Attempts {
            trace!("rule {} did not fire", rule.name());
        }
    }

    fn environment(&self, rule: &Rule, env: &Bindings) {
        if self.level >= TraceLevel::Environments {
            trace!("environment of rule {}: {}", rule.name(), env);
        }
    }

    fn solving_end(&self, result: SolvingResult, n_passes: usize) {
        info!("CHR solver ended with result {} after {} pass(es)", result, n_passes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::VariantNames;

    #[test]
    fn test_trace_level_from_str() {
        assert_eq!(TraceLevel::Off, TraceLevel::from_str("off").unwrap());
        assert_eq!(TraceLevel::Environments, TraceLevel::from_str("environments").unwrap());
        assert!(TraceLevel::from_str("everything").is_err());
    }

    #[test]
    fn test_trace_level_order() {
        assert!(TraceLevel::Off < TraceLevel::Firings);
        assert!(TraceLevel::Attempts < TraceLevel::Environments);
        assert_eq!(&["off", "firings", "attempts", "environments"], TraceLevel::VARIANTS);
    }
}
