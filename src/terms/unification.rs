use super::{Bindings, Term, Variable};

/// Unifies two terms under an environment.
///
/// Unification is two-directional: variables on both sides may be bound.
/// Both terms are first chased through the environment; compound terms must share their functor and arity,
/// lists their length, and their elements are unified from left to right, threading the environment.
/// Binding a variable to a non-variable term is subject to an occurs-check rejecting cyclic bindings.
///
/// On success, the extended environment is returned.
/// On failure, `None` is returned and the provided environment is left as it was.
///
/// # Example
///
/// ```
/// # use chrust::terms::{unify, Bindings, Term};
/// let t1 = Term::compound("leq", vec![Term::var("X"), Term::atom("b")]);
/// let t2 = Term::compound("leq", vec![Term::atom("a"), Term::var("Y")]);
/// let env = unify(&t1, &t2, &Bindings::default()).unwrap();
/// assert_eq!(env.substitute(&t1), env.substitute(&t2));
///
/// let cyclic = Term::compound("f", vec![Term::var("X")]);
/// assert!(unify(&Term::var("X"), &cyclic, &Bindings::default()).is_none());
/// ```
pub fn unify(t1: &Term, t2: &Term, env: &Bindings) -> Option<Bindings> {
    let mut visited_1 = vec![];
    let chased_1 = env.chase_collecting(t1, &mut visited_1);
    let mut visited_2 = vec![];
    let chased_2 = env.chase_collecting(t2, &mut visited_2);
    match (chased_1, chased_2) {
        (Term::Variable(v1), Term::Variable(v2)) => {
            if v1 == v2 {
                Some(env.clone())
            } else {
                Some(env.bind(v1.clone(), chased_2.clone()))
            }
        }
        (Term::Variable(v), other) => bind_with_occurs_check(v, other, &visited_1, env),
        (other, Term::Variable(v)) => bind_with_occurs_check(v, other, &visited_2, env),
        (Term::Compound(c1), Term::Compound(c2)) => {
            if c1.functor() != c2.functor() || c1.args().len() != c2.args().len() {
                return None;
            }
            unify_all(c1.args(), c2.args(), env)
        }
        (Term::List(l1), Term::List(l2)) => {
            if l1.len() != l2.len() {
                return None;
            }
            unify_all(l1, l2, env)
        }
        (scalar_1, scalar_2) => {
            if scalar_1 == scalar_2 {
                Some(env.clone())
            } else {
                None
            }
        }
    }
}

fn unify_all(args_1: &[Term], args_2: &[Term], env: &Bindings) -> Option<Bindings> {
    args_1
        .iter()
        .zip(args_2.iter())
        .try_fold(env.clone(), |current, (a1, a2)| unify(a1, a2, &current))
}

// The check looks at the free variables of the term and at the direct bindings of these variables;
// deeper binding chains are not explored.
fn occurs(term: &Term, visited: &[Variable], env: &Bindings) -> bool {
    term.free_variables().iter().any(|w| {
        visited.contains(w)
            || env
                .lookup(w)
                .map(|bound| bound.free_variables().iter().any(|u| visited.contains(u)))
                .unwrap_or(false)
    })
}

fn bind_with_occurs_check(
    variable: &Variable,
    term: &Term,
    visited: &[Variable],
    env: &Bindings,
) -> Option<Bindings> {
    if occurs(term, visited, env) {
        None
    } else {
        Some(env.bind(variable.clone(), term.clone()))
    }
}

/// Matches a pattern against a subject term.
///
/// Matching is one-directional: only the variables of the pattern are bound,
/// while the variables of the subject are treated as constants.
/// A pattern variable that is already bound must be bound to a term structurally equal to the matched subterm.
///
/// # Example
///
/// ```
/// # use chrust::terms::{match_terms, Bindings, Term};
/// let pattern = Term::compound("p", vec![Term::var("X"), Term::var("X")]);
/// assert!(match_terms(&pattern, &Term::compound("p", vec![Term::Int(1), Term::Int(1)]), &Bindings::default()).is_some());
/// assert!(match_terms(&pattern, &Term::compound("p", vec![Term::Int(1), Term::Int(2)]), &Bindings::default()).is_none());
/// // subject variables are never bound
/// assert!(match_terms(&Term::atom("a"), &Term::var("Y"), &Bindings::default()).is_none());
/// ```
pub fn match_terms(pattern: &Term, subject: &Term, env: &Bindings) -> Option<Bindings> {
    match (pattern, subject) {
        (Term::Variable(v), _) => match env.lookup(v) {
            Some(bound) => {
                if bound == subject {
                    Some(env.clone())
                } else {
                    None
                }
            }
            None => Some(env.bind(v.clone(), subject.clone())),
        },
        (Term::Compound(c1), Term::Compound(c2)) => {
            if c1.functor() != c2.functor() || c1.args().len() != c2.args().len() {
                return None;
            }
            match_all(c1.args(), c2.args(), env)
        }
        (Term::List(l1), Term::List(l2)) => {
            if l1.len() != l2.len() {
                return None;
            }
            match_all(l1, l2, env)
        }
        (p, s) => {
            if p == s {
                Some(env.clone())
            } else {
                None
            }
        }
    }
}

fn match_all(patterns: &[Term], subjects: &[Term], env: &Bindings) -> Option<Bindings> {
    patterns
        .iter()
        .zip(subjects.iter())
        .try_fold(env.clone(), |current, (p, s)| match_terms(p, s, &current))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(args: Vec<Term>) -> Term {
        Term::compound("f", args)
    }

    fn ground_terms() -> Vec<Term> {
        vec![
            Term::atom("a"),
            Term::atom("b"),
            Term::Bool(true),
            Term::Int(1),
            Term::Int(2),
            Term::Float(1.),
            Term::string("a"),
            f(vec![Term::atom("a")]),
            f(vec![Term::atom("b")]),
            f(vec![Term::atom("a"), Term::atom("a")]),
            Term::compound("g", vec![Term::atom("a")]),
            Term::List(vec![Term::Int(1)]),
            Term::List(vec![Term::Int(1), Term::Int(2)]),
            Term::List(vec![]),
        ]
    }

    #[test]
    fn test_ground_soundness() {
        for t1 in ground_terms() {
            for t2 in ground_terms() {
                assert_eq!(
                    t1 == t2,
                    unify(&t1, &t2, &Bindings::default()).is_some(),
                    "{} vs {}",
                    t1,
                    t2
                );
            }
        }
    }

    #[test]
    fn test_occurs_check() {
        let x = Term::var("X");
        assert!(unify(&x, &f(vec![x.clone()]), &Bindings::default()).is_none());
        assert!(unify(&f(vec![x.clone()]), &x, &Bindings::default()).is_none());
    }

    #[test]
    fn test_occurs_check_through_binding() {
        let t1 = f(vec![Term::var("X"), Term::var("Y")]);
        let t2 = f(vec![Term::var("Y"), Term::compound("g", vec![Term::var("X")])]);
        assert!(unify(&t1, &t2, &Bindings::default()).is_none());
    }

    #[test]
    fn test_same_variable() {
        let env = unify(&Term::var("X"), &Term::var("X"), &Bindings::default()).unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn test_variable_to_variable() {
        let env = unify(&Term::var("X"), &Term::var("Y"), &Bindings::default()).unwrap();
        assert_eq!(Some(&Term::var("Y")), env.lookup(&Variable::new("X")));
    }

    #[test]
    fn test_bound_variable_chain() {
        let env = Bindings::default()
            .bind(Variable::new("X"), Term::var("Y"))
            .bind(Variable::new("Y"), Term::Int(3));
        assert!(unify(&Term::var("X"), &Term::Int(3), &env).is_some());
        assert!(unify(&Term::var("X"), &Term::Int(4), &env).is_none());
    }

    #[test]
    fn test_threads_environment() {
        let t1 = f(vec![Term::var("X"), Term::var("X")]);
        assert!(unify(&t1, &f(vec![Term::Int(1), Term::Int(1)]), &Bindings::default()).is_some());
        assert!(unify(&t1, &f(vec![Term::Int(1), Term::Int(2)]), &Bindings::default()).is_none());
    }

    #[test]
    fn test_two_directional() {
        let t1 = f(vec![Term::var("X"), Term::Int(2)]);
        let t2 = f(vec![Term::Int(1), Term::var("Y")]);
        let env = unify(&t1, &t2, &Bindings::default()).unwrap();
        assert_eq!(Some(&Term::Int(1)), env.lookup(&Variable::new("X")));
        assert_eq!(Some(&Term::Int(2)), env.lookup(&Variable::new("Y")));
    }

    #[test]
    fn test_failure_leaves_environment() {
        let env = Bindings::default().bind(Variable::new("Z"), Term::Int(0));
        let t1 = f(vec![Term::var("X"), Term::Int(2)]);
        let t2 = f(vec![Term::Int(1), Term::Int(3)]);
        assert!(unify(&t1, &t2, &env).is_none());
        assert_eq!(1, env.len());
        assert!(!env.is_bound(&Variable::new("X")));
    }

    #[test]
    fn test_list_length_mismatch() {
        let l1 = Term::List(vec![Term::var("X")]);
        let l2 = Term::List(vec![Term::Int(1), Term::Int(2)]);
        assert!(unify(&l1, &l2, &Bindings::default()).is_none());
    }

    #[test]
    fn test_match_is_one_directional() {
        let pattern = f(vec![Term::var("X"), Term::Int(2)]);
        let subject = f(vec![Term::Int(1), Term::var("Y")]);
        assert!(match_terms(&pattern, &subject, &Bindings::default()).is_none());
        let subject = f(vec![Term::var("Y"), Term::Int(2)]);
        let env = match_terms(&pattern, &subject, &Bindings::default()).unwrap();
        assert_eq!(Some(&Term::var("Y")), env.lookup(&Variable::new("X")));
        assert!(!env.is_bound(&Variable::new("Y")));
    }
}
