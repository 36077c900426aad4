use crate::terms::{Bindings, BuiltinOracle, Term};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::fmt::Display;
use strum_macros::{AsRefStr, Display as StrumDisplay};

/// The identifier of a constraint in a [`ConstraintStore`].
///
/// Identifiers are given in increasing order of assertion and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(usize);

impl ConstraintId {
    /// Returns the position of the constraint in the store.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for ConstraintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The partitions of a constraint store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum Partition {
    /// User-defined constraints (atoms and compounds with priority `0`)
    Ordinary,
    /// Built-in constraints (operator terms)
    Builtin,
}

impl Partition {
    fn of(term: &Term) -> Partition {
        if term.is_operator() {
            Partition::Builtin
        } else {
            Partition::Ordinary
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FirstArgKey {
    NoArg,
    Atom(String),
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
    Compound(String),
    List,
    Variable,
}

impl FirstArgKey {
    fn of(term: &Term) -> FirstArgKey {
        match term.args().first() {
            None => FirstArgKey::NoArg,
            Some(first) => Self::of_arg(first),
        }
    }

    fn of_arg(arg: &Term) -> FirstArgKey {
        match arg {
            Term::Atom(a) => FirstArgKey::Atom(a.clone()),
            Term::Bool(b) => FirstArgKey::Bool(*b),
            Term::Int(i) => FirstArgKey::Int(*i),
            // -0.0 == 0.0
            Term::Float(x) if *x == 0. => FirstArgKey::Float(0f64.to_bits()),
            Term::Float(x) => FirstArgKey::Float(x.to_bits()),
            Term::Str(s) => FirstArgKey::Str(s.clone()),
            Term::Compound(c) => FirstArgKey::Compound(c.functor().to_string()),
            Term::List(_) => FirstArgKey::List,
            Term::Variable(_) => FirstArgKey::Variable,
        }
    }
}

// Buckets only grow, so a position in a bucket designates the same constraint forever.
#[derive(Default)]
struct FunctorIndex {
    all: Vec<ConstraintId>,
    by_first_arg: HashMap<FirstArgKey, Vec<ConstraintId>>,
}

impl FunctorIndex {
    fn add(&mut self, id: ConstraintId, key: FirstArgKey) {
        self.all.push(id);
        self.by_first_arg.entry(key).or_default().push(id);
    }

    fn bucket(&self, key: &FirstArgKey) -> &[ConstraintId] {
        self.by_first_arg.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn candidates(&self, key: FirstArgKey) -> Vec<ConstraintId> {
        match key {
            FirstArgKey::Variable => self.all.clone(),
            FirstArgKey::NoArg => self.bucket(&key).to_vec(),
            _ => merge_sorted(self.bucket(&key), self.bucket(&FirstArgKey::Variable)),
        }
    }
}

fn merge_sorted(v1: &[ConstraintId], v2: &[ConstraintId]) -> Vec<ConstraintId> {
    let mut merged = Vec::with_capacity(v1.len() + v2.len());
    let (mut i, mut j) = (0, 0);
    while i < v1.len() && j < v2.len() {
        if v1[i] < v2[j] {
            merged.push(v1[i]);
            i += 1;
        } else {
            merged.push(v2[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&v1[i..]);
    merged.extend_from_slice(&v2[j..]);
    merged
}

/// An append-only store of constraints, indexed for head matching.
///
/// The store has two partitions: one for ordinary constraints and one for built-in constraints (operator terms).
/// In each partition, constraints are indexed by their functor and by the shape of their first argument.
///
/// Constraints are never removed: consuming a constraint only marks it as dead.
/// Dead constraints are still reachable by their identifier but never appear in the live views of the store.
/// Since the candidate lists returned by [`candidates`](Self::candidates) only grow at their end,
/// a position in such a list can be memorized by the matching algorithm.
///
/// # Example
///
/// ```
/// # use chrust::chr::{ConstraintStore, Partition};
/// # use chrust::terms::{Bindings, Term};
/// let mut store = ConstraintStore::default();
/// let id = store.add(Term::compound("gcd", vec![Term::Int(4)])).unwrap();
/// store.add(Term::infix("==", Term::var("X"), Term::atom("a"))).unwrap();
/// let head = Term::compound("gcd", vec![Term::var("N")]);
/// assert_eq!(vec![id], store.live_candidates(&head, &Bindings::default()));
/// store.consume(id);
/// assert!(store.live_candidates(&head, &Bindings::default()).is_empty());
/// assert_eq!(0, store.live_terms(Partition::Ordinary).len());
/// assert_eq!(1, store.live_terms(Partition::Builtin).len());
/// ```
#[derive(Default)]
pub struct ConstraintStore {
    constraints: Vec<Term>,
    consumed: Vec<bool>,
    ordinary_index: HashMap<String, FunctorIndex>,
    builtin_index: HashMap<String, FunctorIndex>,
    ordinary_ids: Vec<ConstraintId>,
    builtin_ids: Vec<ConstraintId>,
}

impl ConstraintStore {
    /// Asserts a new constraint and returns its identifier.
    ///
    /// Only atoms and compound terms can be asserted; other terms lead to an error.
    pub fn add(&mut self, term: Term) -> Result<ConstraintId> {
        let functor = match &term {
            Term::Atom(_) | Term::Compound(_) => term.functor().map(|f| f.to_string()),
            _ => None,
        }
        .ok_or_else(|| anyhow!("cannot assert {} ({}) as a constraint", term, term.type_of()))?;
        let id = ConstraintId(self.constraints.len());
        let partition = Partition::of(&term);
        let key = FirstArgKey::of(&term);
        let (index, ids) = match partition {
            Partition::Ordinary => (&mut self.ordinary_index, &mut self.ordinary_ids),
            Partition::Builtin => (&mut self.builtin_index, &mut self.builtin_ids),
        };
        index.entry(functor).or_default().add(id, key);
        ids.push(id);
        self.constraints.push(term);
        self.consumed.push(false);
        Ok(id)
    }

    /// Returns the constraint with the given identifier, be it live or consumed.
    ///
    /// # Panics
    ///
    /// Panics if the identifier was not given by this store.
    pub fn get(&self, id: ConstraintId) -> &Term {
        &self.constraints[id.0]
    }

    /// Returns `true` iff the constraint has not been consumed.
    pub fn is_live(&self, id: ConstraintId) -> bool {
        !self.consumed[id.0]
    }

    /// Marks a constraint as consumed.
    ///
    /// Returns `false` if it was already consumed.
    pub fn consume(&mut self, id: ConstraintId) -> bool {
        let was_live = !self.consumed[id.0];
        self.consumed[id.0] = true;
        was_live
    }

    /// Returns the constraints that may match a head literal, in increasing order of identifiers.
    ///
    /// The first argument of the head is chased through the environment.
    /// If it is a variable, every constraint sharing the functor of the head is returned;
    /// otherwise, only the ones with a compatible first argument (including the ones whose first argument is a variable).
    /// Consumed constraints are part of the result.
    pub fn candidates(&self, head: &Term, env: &Bindings) -> Vec<ConstraintId> {
        let functor = match head.functor() {
            Some(f) => f,
            None => return vec![],
        };
        let index = match Partition::of(head) {
            Partition::Ordinary => &self.ordinary_index,
            Partition::Builtin => &self.builtin_index,
        };
        match index.get(functor) {
            Some(functor_index) => {
                let key = match head.args().first() {
                    None => FirstArgKey::NoArg,
                    Some(first) => FirstArgKey::of_arg(env.chase(first)),
                };
                functor_index.candidates(key)
            }
            None => vec![],
        }
    }

    /// Same as [`candidates`](Self::candidates), but filters out the consumed constraints.
    pub fn live_candidates(&self, head: &Term, env: &Bindings) -> Vec<ConstraintId> {
        self.candidates(head, env)
            .into_iter()
            .filter(|id| self.is_live(*id))
            .collect()
    }

    /// Iterates over the live constraints of a partition, in increasing order of identifiers.
    pub fn iter_live(
        &self,
        partition: Partition,
    ) -> impl Iterator<Item = (ConstraintId, &Term)> + '_ {
        let ids = match partition {
            Partition::Ordinary => &self.ordinary_ids,
            Partition::Builtin => &self.builtin_ids,
        };
        ids.iter()
            .filter(|id| self.is_live(**id))
            .map(|id| (*id, &self.constraints[id.0]))
    }

    /// Returns the live constraints of a partition, in increasing order of identifiers.
    pub fn live_terms(&self, partition: Partition) -> Vec<&Term> {
        self.iter_live(partition).map(|(_, t)| t).collect()
    }

    /// Returns the identifier of a live constraint structurally equal to the provided term, if any.
    pub fn find(&self, term: &Term) -> Option<ConstraintId> {
        let index = match Partition::of(term) {
            Partition::Ordinary => &self.ordinary_index,
            Partition::Builtin => &self.builtin_index,
        };
        index
            .get(term.functor()?)?
            .bucket(&FirstArgKey::of(term))
            .iter()
            .find(|id| self.is_live(**id) && &self.constraints[id.0] == term)
            .copied()
    }

    /// Returns the number of constraints ever asserted, consumed ones included.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Returns `true` iff no constraint was ever asserted.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Returns the number of live constraints.
    pub fn n_live(&self) -> usize {
        self.consumed.iter().filter(|c| !**c).count()
    }
}

impl BuiltinOracle for ConstraintStore {
    fn holds(&self, constraint: &Term) -> bool {
        constraint.is_operator() && self.find(constraint).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::Variable;

    fn p(arg: Term) -> Term {
        Term::compound("p", vec![arg])
    }

    #[test]
    fn test_add_rejects_non_constraints() {
        let mut store = ConstraintStore::default();
        assert!(store.add(Term::Int(1)).is_err());
        assert!(store.add(Term::var("X")).is_err());
        assert!(store.add(Term::atom("a")).is_ok());
        assert_eq!(1, store.len());
    }

    #[test]
    fn test_partitions() {
        let mut store = ConstraintStore::default();
        store.add(p(Term::Int(1))).unwrap();
        store.add(Term::infix("<", Term::var("X"), Term::Int(1))).unwrap();
        store.add(Term::atom("done")).unwrap();
        assert_eq!(
            vec![&p(Term::Int(1)), &Term::atom("done")],
            store.live_terms(Partition::Ordinary)
        );
        assert_eq!(1, store.live_terms(Partition::Builtin).len());
    }

    #[test]
    fn test_signed_zeros_share_their_bucket() {
        let mut store = ConstraintStore::default();
        let id = store.add(p(Term::Float(-0.))).unwrap();
        let empty = Bindings::default();
        assert_eq!(vec![id], store.candidates(&p(Term::Float(0.)), &empty));
        assert_eq!(Some(id), store.find(&p(Term::Float(0.))));
    }

    #[test]
    fn test_candidates_by_first_argument() {
        let mut store = ConstraintStore::default();
        let id_a = store.add(p(Term::atom("a"))).unwrap();
        let id_b = store.add(p(Term::atom("b"))).unwrap();
        let id_var = store.add(p(Term::var("Y").rename(1))).unwrap();
        let id_int = store.add(p(Term::Int(1))).unwrap();
        let id_float = store.add(p(Term::Float(1.))).unwrap();
        store.add(Term::compound("q", vec![Term::atom("a")])).unwrap();
        let empty = Bindings::default();
        assert_eq!(vec![id_a, id_var], store.candidates(&p(Term::atom("a")), &empty));
        assert_eq!(vec![id_b, id_var], store.candidates(&p(Term::atom("b")), &empty));
        assert_eq!(vec![id_var, id_int], store.candidates(&p(Term::Int(1)), &empty));
        assert_eq!(vec![id_var, id_float], store.candidates(&p(Term::Float(1.)), &empty));
        assert_eq!(
            vec![id_a, id_b, id_var, id_int, id_float],
            store.candidates(&p(Term::var("X")), &empty)
        );
        let env = empty.bind(Variable::new("X"), Term::atom("b"));
        assert_eq!(vec![id_b, id_var], store.candidates(&p(Term::var("X")), &env));
        assert!(store.candidates(&Term::compound("r", vec![Term::var("X")]), &empty).is_empty());
    }

    #[test]
    fn test_candidates_are_stable() {
        let mut store = ConstraintStore::default();
        let head = p(Term::atom("a"));
        let first = store.add(p(Term::atom("a"))).unwrap();
        let before = store.candidates(&head, &Bindings::default());
        store.consume(first);
        store.add(p(Term::var("Z").rename(1))).unwrap();
        store.add(p(Term::atom("a"))).unwrap();
        let after = store.candidates(&head, &Bindings::default());
        assert_eq!(before[..], after[..before.len()]);
        assert_eq!(3, after.len());
        assert_eq!(2, store.live_candidates(&head, &Bindings::default()).len());
    }

    #[test]
    fn test_no_arg_bucket() {
        let mut store = ConstraintStore::default();
        let id = store.add(Term::atom("start")).unwrap();
        store.add(Term::compound("start", vec![Term::Int(1)])).unwrap();
        assert_eq!(vec![id], store.candidates(&Term::atom("start"), &Bindings::default()));
    }

    #[test]
    fn test_monotonicity() {
        let mut store = ConstraintStore::default();
        let id = store.add(p(Term::Int(1))).unwrap();
        assert!(store.consume(id));
        assert!(!store.consume(id));
        assert_eq!(1, store.len());
        assert_eq!(0, store.n_live());
        assert_eq!(&p(Term::Int(1)), store.get(id));
        let next = store.add(p(Term::Int(1))).unwrap();
        assert!(next > id);
    }

    #[test]
    fn test_oracle() {
        let mut store = ConstraintStore::default();
        let lt = Term::infix("<", Term::var("X"), Term::var("Y"));
        let id = store.add(lt.clone()).unwrap();
        assert!(store.holds(&lt));
        assert!(!store.holds(&Term::infix("<", Term::var("Y"), Term::var("X"))));
        store.consume(id);
        assert!(!store.holds(&lt));
    }
}
