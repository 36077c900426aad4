use super::head_matcher::{HeadMatcher, RuleMatch};
use super::{ConstraintStore, EnvMap, Partition, Rule, RuleStore, SolvingListener};
use crate::terms::{as_assignment, Bindings, Evaluator, Term, EQUALITY_OPERATOR};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::cmp::Ordering;
use strum_macros::{AsRefStr, Display as StrumDisplay};

/// The default maximal number of passes over the rules.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// The outcome of a CHR solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum SolvingResult {
    /// No rule can fire anymore.
    Fixpoint,
    /// A rule still fired once the maximal number of passes was used up.
    NonTermination,
}

/// A CHR solver.
///
/// A solver is a session owning a set of rules, a constraint store and the memo of the head matching algorithm.
/// Goals are added to the store before calling [`solve`](Self::solve),
/// which fires rules until a fixpoint is reached or the maximal number of passes is exceeded.
///
/// Rules are tried in declaration order; each time a rule fires, the next pass starts again from the first rule.
/// When a rule fires, the constraints matched by its delete-heads are consumed and its body is executed in a fresh variable scope:
///
/// * assignments (`:=`, `=`, `is`) to unbound variables bind them for the next body literals;
/// * equalities (`==`) between terms that are not both values are accumulated as rewritings
///   which are applied to the whole store at the end of the body, and then asserted as built-in constraints;
/// * other literals are evaluated: `true` is ignored, `false` cancels the effects of the body,
///   and constraints are asserted in the store.
///
/// # Example
///
/// ```
/// # use chrust::chr::{ChrSolver, Rule, RuleStore, SolvingResult};
/// # use chrust::terms::Term;
/// let mut rules = RuleStore::default();
/// let gcd = |t| Term::compound("gcd", vec![t]);
/// rules.add_rule(Rule::new_simplification("zero", vec![gcd(Term::Int(0))], vec![], vec![])).unwrap();
/// rules.add_rule(Rule::new(
///     "step",
///     vec![gcd(Term::var("N"))],
///     vec![gcd(Term::var("M"))],
///     vec![
///         Term::infix("<=", Term::var("N"), Term::var("M")),
///         Term::infix("is", Term::var("L"), Term::infix("mod", Term::var("M"), Term::var("N"))),
///     ],
///     vec![gcd(Term::var("L"))],
/// )).unwrap();
/// let mut solver = ChrSolver::new(rules);
/// solver.add_goals(&[gcd(Term::Int(9)), gcd(Term::Int(6))]).unwrap();
/// assert_eq!(SolvingResult::Fixpoint, solver.solve());
/// assert_eq!(vec![&gcd(Term::Int(3))], solver.chr_constraints());
/// ```
pub struct ChrSolver {
    rules: RuleStore,
    store: ConstraintStore,
    env_map: EnvMap,
    last_scope: usize,
    max_iterations: usize,
    listeners: Vec<Box<dyn SolvingListener>>,
}

impl ChrSolver {
    /// Builds a new solver for a set of rules.
    pub fn new(rules: RuleStore) -> Self {
        ChrSolver {
            rules,
            store: ConstraintStore::default(),
            env_map: EnvMap::default(),
            last_scope: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            listeners: vec![],
        }
    }

    /// Sets the maximal number of passes over the rules.
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    /// Adds a listener to this solver.
    pub fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.listeners.push(listener);
    }

    /// Adds a single goal.
    pub fn add_goal(&mut self, goal: &Term) -> Result<()> {
        self.add_goals(std::slice::from_ref(goal))
    }

    /// Adds a conjunction of goals.
    ///
    /// The goals share their variables, which are moved into a fresh scope.
    /// Each goal is evaluated before being asserted; goals evaluating to `true` are ignored.
    pub fn add_goals(&mut self, goals: &[Term]) -> Result<()> {
        let scope = self.fresh_scope();
        let evaluator = Evaluator::default();
        let empty = Bindings::default();
        let evaluated = goals
            .iter()
            .map(|g| evaluator.evaluate(&g.rename(scope), &empty))
            .filter(|g| g != &Term::Bool(true))
            .collect::<Vec<Term>>();
        for goal in evaluated {
            let goal_str = goal.to_string();
            self.store
                .add(goal)
                .with_context(|| format!("while adding goal {}", goal_str))?;
        }
        Ok(())
    }

    fn fresh_scope(&mut self) -> usize {
        self.last_scope += 1;
        self.last_scope
    }

    /// Fires rules until a fixpoint is reached or the maximal number of passes is exceeded.
    ///
    /// A program needing exactly the maximal number of firing passes still reaches its fixpoint.
    /// [`NonTermination`](SolvingResult::NonTermination) is returned when a rule fires during the pass following them;
    /// the store is then left as it was at the end of that pass.
    pub fn solve(&mut self) -> SolvingResult {
        let n_rules = self.rules.len();
        let mut n_passes = 0;
        let result = loop {
            n_passes += 1;
            if !(0..n_rules).any(|id| self.try_rule(id)) {
                break SolvingResult::Fixpoint;
            }
            if n_passes > self.max_iterations {
                break SolvingResult::NonTermination;
            }
        };
        self.listeners
            .iter()
            .for_each(|l| l.solving_end(result, n_passes));
        result
    }

    fn try_rule(&mut self, rule_id: usize) -> bool {
        let rule = self.rules.get(rule_id);
        self.listeners.iter().for_each(|l| l.rule_attempted(rule));
        let rule_match = HeadMatcher::new(rule, &self.store, &mut self.env_map).find_match();
        let RuleMatch { constraints, env } = match rule_match {
            Some(m) => m,
            None => {
                self.listeners.iter().for_each(|l| l.rule_not_fired(rule));
                return false;
            }
        };
        let matched = constraints
            .iter()
            .map(|c| self.store.get(*c))
            .collect::<Vec<&Term>>();
        self.listeners.iter().for_each(|l| {
            l.rule_fired(rule, &matched);
            l.environment(rule, &env);
        });
        self.last_scope += 1;
        let scope = self.last_scope;
        for c in &constraints[..rule.delete_heads().len()] {
            self.store.consume(*c);
        }
        match FiringEffects::compute(rule, env, scope, &self.store) {
            Some(effects) => effects.commit(&mut self.store),
            None => debug!("the body of rule {} failed", rule.name()),
        }
        true
    }

    /// Returns the rules of this solver.
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Returns the constraint store of this solver.
    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    /// Returns the live ordinary constraints, in assertion order.
    pub fn chr_constraints(&self) -> Vec<&Term> {
        self.store.live_terms(Partition::Ordinary)
    }

    /// Returns the live built-in constraints, in assertion order.
    pub fn builtin_constraints(&self) -> Vec<&Term> {
        self.store.live_terms(Partition::Builtin)
    }

    /// Builds a [`Solution`] from a solving result and the current content of the store.
    pub fn solution(&self, result: SolvingResult) -> Solution {
        Solution {
            result,
            chr_constraints: self.chr_constraints().into_iter().cloned().collect(),
            builtin_constraints: self.builtin_constraints().into_iter().cloned().collect(),
        }
    }
}

#[derive(Default)]
struct FiringEffects {
    asserted: Vec<Term>,
    rewritings: Vec<(Term, Term)>,
}

impl FiringEffects {
    // Returns None if a body literal evaluates to false.
    fn compute(rule: &Rule, mut env: Bindings, scope: usize, store: &ConstraintStore) -> Option<Self> {
        let evaluator = Evaluator::new_with_oracle(store);
        let empty = Bindings::default();
        let mut effects = FiringEffects::default();
        for literal in rule.body() {
            let substituted = env.substitute(literal);
            if let Some((left, right)) = as_assignment(&substituted) {
                if let Some(variable) = left.as_variable().filter(|v| v.scope() == 0) {
                    let value = evaluator.evaluate(right, &empty);
                    env = env.bind(variable.clone(), value);
                    continue;
                }
                // an assignment to a bound term is a test
                let test = Term::infix(EQUALITY_OPERATOR, left.rename(scope), right.rename(scope));
                match evaluator.evaluate(&test, &empty) {
                    Term::Bool(true) => {}
                    Term::Bool(false) => return None,
                    t => debug!("ignoring body assignment {} of rule {}", t, rule.name()),
                }
                continue;
            }
            let renamed = substituted.rename(scope);
            if renamed.is_binary_operator(EQUALITY_OPERATOR) {
                let args = renamed.args();
                if !effects.add_equality(&evaluator, &args[0], &args[1]) {
                    return None;
                }
                continue;
            }
            match evaluator.evaluate(&renamed, &empty) {
                Term::Bool(true) => {}
                Term::Bool(false) => return None,
                t @ (Term::Atom(_) | Term::Compound(_)) => effects.asserted.push(t),
                t => debug!("ignoring body literal {} of rule {}", t, rule.name()),
            }
        }
        Some(effects)
    }

    // Returns false if the equality is known not to hold.
    fn add_equality(&mut self, evaluator: &Evaluator, left: &Term, right: &Term) -> bool {
        let empty = Bindings::default();
        let left = self.rewrite(&evaluator.evaluate(left, &empty));
        let right = self.rewrite(&evaluator.evaluate(right, &empty));
        if is_value(&left) && is_value(&right) {
            return evaluator.is_true(&Term::infix(EQUALITY_OPERATOR, left, right), &empty);
        }
        if left == right {
            return true;
        }
        let rewriting = match left.compare_standard(&right) {
            Ordering::Greater => (right, left),
            _ => (left, right),
        };
        self.rewritings.push(rewriting);
        true
    }

    fn rewrite(&self, term: &Term) -> Term {
        self.rewritings
            .iter()
            .fold(term.clone(), |t, (from, to)| t.replace(from, to))
    }

    fn commit(mut self, store: &mut ConstraintStore) {
        for t in std::mem::take(&mut self.asserted) {
            add_or_warn(store, t);
        }
        if self.rewritings.is_empty() {
            return;
        }
        let view: &ConstraintStore = store;
        let changed = [Partition::Ordinary, Partition::Builtin]
            .iter()
            .flat_map(|p| view.iter_live(*p))
            .filter_map(|(id, t)| {
                let rewritten = self.rewrite(t);
                if &rewritten == t {
                    None
                } else {
                    Some((id, rewritten))
                }
            })
            .collect::<Vec<_>>();
        for (id, t) in changed {
            store.consume(id);
            add_or_warn(store, t);
        }
        for (from, to) in self.rewritings {
            add_or_warn(store, Term::infix(EQUALITY_OPERATOR, from, to));
        }
    }
}

fn is_value(term: &Term) -> bool {
    matches!(
        term,
        Term::Bool(_) | Term::Int(_) | Term::Float(_) | Term::Str(_)
    )
}

fn add_or_warn(store: &mut ConstraintStore, term: Term) {
    if let Err(e) = store.add(term) {
        warn!("{}", e);
    }
}

/// The outcome of [`solve`]: the solving result and the final content of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    result: SolvingResult,
    chr_constraints: Vec<Term>,
    builtin_constraints: Vec<Term>,
}

impl Solution {
    /// Returns the result of the solver.
    pub fn result(&self) -> SolvingResult {
        self.result
    }

    /// Returns the final ordinary constraints, in assertion order.
    pub fn chr_constraints(&self) -> &[Term] {
        &self.chr_constraints
    }

    /// Returns the final built-in constraints, in assertion order.
    pub fn builtin_constraints(&self) -> &[Term] {
        &self.builtin_constraints
    }

    /// Returns the arguments of the final ordinary constraints with the given functor and two arguments.
    ///
    /// # Example
    ///
    /// ```
    /// # use chrust::chr::{solve, RuleStore};
    /// # use chrust::terms::Term;
    /// let goals = vec![
    ///     Term::compound("arg", vec![Term::atom("a1"), Term::atom("conclusion")]),
    ///     Term::compound("arg", vec![Term::atom("a2")]),
    /// ];
    /// let solution = solve(RuleStore::default(), &goals).unwrap();
    /// assert_eq!(vec![(&Term::atom("a1"), &Term::atom("conclusion"))], solution.find_results("arg"));
    /// ```
    pub fn find_results(&self, functor: &str) -> Vec<(&Term, &Term)> {
        self.chr_constraints
            .iter()
            .filter(|t| t.functor() == Some(functor))
            .filter_map(|t| match t.args() {
                [first, second] => Some((first, second)),
                _ => None,
            })
            .collect()
    }
}

/// Solves a set of goals under a set of rules with the default parameters.
///
/// The goals are added as a single conjunction, sharing their variables.
pub fn solve(rules: RuleStore, goals: &[Term]) -> Result<Solution> {
    let mut solver = ChrSolver::new(rules);
    solver.add_goals(goals)?;
    let result = solver.solve();
    Ok(solver.solution(result))
}
