use super::{ConstraintId, ConstraintStore, EnvId, EnvMap, Rule, Slot, EMPTY_ENV};
use crate::terms::{as_assignment, unify, Bindings, Evaluator, Term};

/// A successful match of the heads of a rule.
#[derive(Debug)]
pub struct RuleMatch {
    /// The matched constraints, in head matching order (delete-heads first).
    pub constraints: Vec<ConstraintId>,
    /// The environment produced by head matching and guard evaluation.
    pub env: Bindings,
}

/// Searches for a combination of live constraints matching the heads of a rule.
///
/// The search is a depth-first traversal of the heads (delete-heads first, then keep-heads)
/// in which the outcome of each candidate is memorized in an [`EnvMap`] shared by all the attempts of a session.
/// For a head that is not the last one, the constraints that matched in a previous attempt are explored again
/// since new candidates may have appeared for the following heads;
/// the remaining candidates are scanned from the first unmemorized position.
/// The candidates of the last head are never revisited: a combination is tried once, whether the rule fires or not.
pub(crate) struct HeadMatcher<'a> {
    rule: &'a Rule,
    heads: Vec<&'a Term>,
    store: &'a ConstraintStore,
    env_map: &'a mut EnvMap,
    claimed: Vec<ConstraintId>,
}

impl<'a> HeadMatcher<'a> {
    pub(crate) fn new(rule: &'a Rule, store: &'a ConstraintStore, env_map: &'a mut EnvMap) -> Self {
        HeadMatcher {
            rule,
            heads: rule.heads().collect(),
            store,
            env_map,
            claimed: Vec::with_capacity(rule.n_heads()),
        }
    }

    /// Looks for the next match of the rule.
    pub(crate) fn find_match(mut self) -> Option<RuleMatch> {
        if self.heads.is_empty() {
            return None;
        }
        self.match_head(0, EMPTY_ENV).map(|env| RuleMatch {
            constraints: self.claimed,
            env,
        })
    }

    fn match_head(&mut self, head_index: usize, parent: EnvId) -> Option<Bindings> {
        let rule_id = self.rule.id();
        let head = self.heads[head_index];
        let is_last = head_index + 1 == self.heads.len();
        let parent_env = self.env_map.env(parent).clone();
        let candidates = self.store.candidates(head, &parent_env);
        if !is_last {
            let n_memorized = self.env_map.slots(rule_id, head_index, parent).len();
            for (i, candidate) in candidates.iter().enumerate().take(n_memorized) {
                let slot = self.env_map.slots(rule_id, head_index, parent)[i];
                if let Slot::Matched(env_id) = slot {
                    if !self.is_available(*candidate) {
                        continue;
                    }
                    self.claimed.push(*candidate);
                    if let Some(env) = self.match_head(head_index + 1, env_id) {
                        return Some(env);
                    }
                    self.claimed.pop();
                }
            }
        }
        let first_unscanned = self.env_map.slots(rule_id, head_index, parent).len();
        for candidate in candidates.iter().skip(first_unscanned) {
            let unified = if self.is_available(*candidate) {
                unify(head, self.store.get(*candidate), &parent_env)
            } else {
                None
            };
            let env = match unified {
                Some(env) => env,
                None => {
                    self.env_map
                        .push_slot(rule_id, head_index, parent, Slot::NoMatch);
                    continue;
                }
            };
            let env_id = self.env_map.add_env(env.clone());
            self.env_map
                .push_slot(rule_id, head_index, parent, Slot::Matched(env_id));
            self.claimed.push(*candidate);
            let result = if is_last {
                self.check_guards(env)
            } else {
                self.match_head(head_index + 1, env_id)
            };
            if result.is_some() {
                return result;
            }
            self.claimed.pop();
        }
        None
    }

    fn is_available(&self, candidate: ConstraintId) -> bool {
        self.store.is_live(candidate) && !self.claimed.contains(&candidate)
    }

    fn check_guards(&self, env: Bindings) -> Option<Bindings> {
        let evaluator = Evaluator::new_with_oracle(self.store);
        self.rule
            .guards()
            .iter()
            .try_fold(env, |current, guard| check_guard(&evaluator, guard, current))
    }
}

/// Evaluates a guard under an environment.
///
/// Assignment guards bind their left side, which must be an unbound variable, to the value of their right side.
/// Other guards must evaluate to `true`.
pub(crate) fn check_guard(evaluator: &Evaluator, guard: &Term, env: Bindings) -> Option<Bindings> {
    if let Some((left, right)) = as_assignment(guard) {
        let variable = env.chase(left).as_variable()?.clone();
        let value = evaluator.evaluate(right, &env);
        return Some(env.bind(variable, value));
    }
    if evaluator.is_true(guard, &env) {
        Some(env)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chr::RuleStore;

    fn gcd(t: Term) -> Term {
        Term::compound("gcd", vec![t])
    }

    fn gcd_rule() -> RuleStore {
        let mut rules = RuleStore::default();
        rules
            .add_rule(Rule::new(
                "gcd",
                vec![gcd(Term::var("N"))],
                vec![gcd(Term::var("M"))],
                vec![
                    Term::infix("<=", Term::var("N"), Term::var("M")),
                    Term::infix(
                        "is",
                        Term::var("L"),
                        Term::infix("mod", Term::var("M"), Term::var("N")),
                    ),
                ],
                vec![gcd(Term::var("L"))],
            ))
            .unwrap();
        rules
    }

    #[test]
    fn test_match_with_guards() {
        let rules = gcd_rule();
        let mut store = ConstraintStore::default();
        let id_6 = store.add(gcd(Term::Int(6))).unwrap();
        let id_4 = store.add(gcd(Term::Int(4))).unwrap();
        let mut env_map = EnvMap::default();
        let m = HeadMatcher::new(rules.get(0), &store, &mut env_map)
            .find_match()
            .unwrap();
        assert_eq!(vec![id_6, id_4], m.constraints);
        assert_eq!(
            gcd(Term::Int(2)),
            m.env.substitute(&gcd(Term::var("L")))
        );
    }

    #[test]
    fn test_same_constraint_is_not_matched_twice() {
        let rules = gcd_rule();
        let mut store = ConstraintStore::default();
        store.add(gcd(Term::Int(6))).unwrap();
        let mut env_map = EnvMap::default();
        assert!(HeadMatcher::new(rules.get(0), &store, &mut env_map)
            .find_match()
            .is_none());
    }

    #[test]
    fn test_failed_combinations_are_not_retried() {
        let rules = gcd_rule();
        let mut store = ConstraintStore::default();
        let id_4 = store.add(gcd(Term::Int(4))).unwrap();
        let id_6 = store.add(gcd(Term::Int(6))).unwrap();
        let mut env_map = EnvMap::default();
        let m = HeadMatcher::new(rules.get(0), &store, &mut env_map).find_match();
        assert_eq!(vec![id_6, id_4], m.unwrap().constraints);
        let m = HeadMatcher::new(rules.get(0), &store, &mut env_map).find_match();
        assert!(m.is_none());
    }

    #[test]
    fn test_new_constraints_are_found_after_memorized_ones() {
        let rules = gcd_rule();
        let mut store = ConstraintStore::default();
        let id_6 = store.add(gcd(Term::Int(6))).unwrap();
        let mut env_map = EnvMap::default();
        assert!(HeadMatcher::new(rules.get(0), &store, &mut env_map)
            .find_match()
            .is_none());
        let id_4 = store.add(gcd(Term::Int(4))).unwrap();
        let m = HeadMatcher::new(rules.get(0), &store, &mut env_map)
            .find_match()
            .unwrap();
        assert_eq!(vec![id_6, id_4], m.constraints);
    }

    #[test]
    fn test_consumed_constraints_are_skipped() {
        let rules = gcd_rule();
        let mut store = ConstraintStore::default();
        let id_6 = store.add(gcd(Term::Int(6))).unwrap();
        let id_4 = store.add(gcd(Term::Int(4))).unwrap();
        store.consume(id_6);
        let mut env_map = EnvMap::default();
        assert!(HeadMatcher::new(rules.get(0), &store, &mut env_map)
            .find_match()
            .is_none());
        let id_8 = store.add(gcd(Term::Int(8))).unwrap();
        let m = HeadMatcher::new(rules.get(0), &store, &mut env_map)
            .find_match()
            .unwrap();
        assert_eq!(vec![id_8, id_4], m.constraints);
    }

    #[test]
    fn test_assignment_guard_needs_unbound_variable() {
        let evaluator = Evaluator::default();
        let guard = Term::infix("is", Term::var("L"), Term::Int(1));
        let env = check_guard(&evaluator, &guard, Bindings::default()).unwrap();
        assert_eq!(Some(&Term::Int(1)), env.lookup(&crate::terms::Variable::new("L")));
        assert!(check_guard(&evaluator, &guard, env).is_none());
    }
}
