use super::{Term, Variable};
use std::fmt::Display;
use std::rc::Rc;

struct Binding {
    variable: Variable,
    value: Term,
    next: Bindings,
    len: usize,
}

/// An immutable environment binding variables to terms.
///
/// Bindings are stored as a persistent linked list: extending an environment returns a new one sharing its tail with the original.
/// Two search branches extending the same parent never observe each other's bindings, so backtracking requires no undo.
///
/// # Example
///
/// ```
/// # use chrust::terms::{Bindings, Term, Variable};
/// let empty = Bindings::default();
/// let x = Variable::new("X");
/// let env = empty.bind(x.clone(), Term::Int(1));
/// assert_eq!(Some(&Term::Int(1)), env.lookup(&x));
/// assert_eq!(None, empty.lookup(&x));
/// ```
#[derive(Clone, Default)]
pub struct Bindings(Option<Rc<Binding>>);

impl Bindings {
    /// Returns an environment extending this one with a new binding.
    pub fn bind(&self, variable: Variable, value: Term) -> Bindings {
        Bindings(Some(Rc::new(Binding {
            variable,
            value,
            next: self.clone(),
            len: self.len() + 1,
        })))
    }

    /// Returns the term directly bound to a variable, if any.
    pub fn lookup(&self, variable: &Variable) -> Option<&Term> {
        self.iter().find(|(v, _)| *v == variable).map(|(_, t)| t)
    }

    /// Returns `true` iff the variable is bound in this environment.
    pub fn is_bound(&self, variable: &Variable) -> bool {
        self.lookup(variable).is_some()
    }

    /// Follows the binding chain of a term until a non-variable term or an unbound variable is reached.
    ///
    /// Since a variable may be bound to another variable, the chase is exhaustive.
    /// A cycle of variable-to-variable bindings stops the chase at the first repeated variable.
    pub fn chase<'a>(&'a self, term: &'a Term) -> &'a Term {
        let max_steps = self.len();
        let mut current = term;
        let mut steps = 0;
        while let Term::Variable(v) = current {
            match self.lookup(v) {
                Some(t) if steps <= max_steps => {
                    current = t;
                    steps += 1;
                }
                _ => break,
            }
        }
        current
    }

    /// Like [`chase`](Self::chase), but also returns the variables walked through on the way.
    pub(crate) fn chase_collecting<'a>(
        &'a self,
        term: &'a Term,
        visited: &mut Vec<Variable>,
    ) -> &'a Term {
        let mut current = term;
        while let Term::Variable(v) = current {
            if visited.contains(v) {
                break;
            }
            visited.push(v.clone());
            match self.lookup(v) {
                Some(t) => current = t,
                None => break,
            }
        }
        current
    }

    /// Applies this environment to a term, replacing every bound variable by its (recursively substituted) value.
    ///
    /// # Example
    ///
    /// ```
    /// # use chrust::terms::{Bindings, Term, Variable};
    /// let env = Bindings::default()
    ///     .bind(Variable::new("X"), Term::var("Y"))
    ///     .bind(Variable::new("Y"), Term::atom("a"));
    /// let t = Term::compound("f", vec![Term::var("X"), Term::var("Z")]);
    /// assert_eq!("f(a,Z)", env.substitute(&t).to_string());
    /// ```
    pub fn substitute(&self, term: &Term) -> Term {
        if self.is_empty() {
            return term.clone();
        }
        self.substitute_with_depth(term, 0, self.len())
    }

    fn substitute_with_depth(&self, term: &Term, depth: usize, max_depth: usize) -> Term {
        if depth > max_depth {
            return term.clone();
        }
        term.map_variables(&|v| match self.lookup(v) {
            Some(t) => self.substitute_with_depth(t, depth + 1, max_depth),
            None => Term::Variable(v.clone()),
        })
    }

    /// Returns an iterator over the bindings, from the most recent to the oldest.
    ///
    /// A variable may appear several times; only its first (most recent) occurrence is effective.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> + '_ {
        let mut current = self.0.as_deref();
        std::iter::from_fn(move || {
            let b = current?;
            current = b.next.0.as_deref();
            Some((&b.variable, &b.value))
        })
    }

    /// Returns the number of bindings in this environment.
    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |b| b.len)
    }

    /// Returns `true` iff this environment has no binding.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl Display for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut all = self.iter().collect::<Vec<(&Variable, &Term)>>();
        all.reverse();
        write!(f, "{{")?;
        for (i, (v, t)) in all.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", v, t)?;
        }
        write!(f, "}}")
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharing_between_branches() {
        let x = Variable::new("X");
        let y = Variable::new("Y");
        let parent = Bindings::default().bind(x.clone(), Term::Int(1));
        let left = parent.bind(y.clone(), Term::atom("l"));
        let right = parent.bind(y.clone(), Term::atom("r"));
        assert_eq!(Some(&Term::atom("l")), left.lookup(&y));
        assert_eq!(Some(&Term::atom("r")), right.lookup(&y));
        assert_eq!(None, parent.lookup(&y));
        assert_eq!(Some(&Term::Int(1)), right.lookup(&x));
        assert_eq!(2, left.len());
        assert_eq!(1, parent.len());
    }

    #[test]
    fn test_chase_is_exhaustive() {
        let env = Bindings::default()
            .bind(Variable::new("X"), Term::var("Y"))
            .bind(Variable::new("Y"), Term::var("Z"))
            .bind(Variable::new("Z"), Term::Int(3));
        assert_eq!(&Term::Int(3), env.chase(&Term::var("X")));
        assert_eq!(&Term::var("W"), env.chase(&Term::var("W")));
    }

    #[test]
    fn test_chase_stops_on_unbound_variable() {
        let env = Bindings::default().bind(Variable::new("X"), Term::var("Y"));
        assert_eq!(&Term::var("Y"), env.chase(&Term::var("X")));
    }

    #[test]
    fn test_chase_cycle_terminates() {
        let env = Bindings::default()
            .bind(Variable::new("X"), Term::var("Y"))
            .bind(Variable::new("Y"), Term::var("X"));
        assert!(env.chase(&Term::var("X")).as_variable().is_some());
        let mut visited = vec![];
        env.chase_collecting(&Term::var("X"), &mut visited);
        assert_eq!(2, visited.len());
    }

    #[test]
    fn test_len_is_kept_along_branches() {
        let mut env = Bindings::default();
        for i in 0..200 {
            env = env.bind(
                Variable::new(&format!("X{}", i)),
                Term::var(&format!("X{}", i + 1)),
            );
        }
        let branch = env.bind(Variable::new("X200"), Term::Int(7));
        assert_eq!(200, env.len());
        assert_eq!(201, branch.len());
        assert_eq!(&Term::Int(7), branch.chase(&Term::var("X0")));
        assert_eq!(Term::Int(7), branch.substitute(&Term::var("X0")));
        assert_eq!(Term::var("X200"), env.substitute(&Term::var("X0")));
    }

    #[test]
    fn test_substitute_nested() {
        let env = Bindings::default().bind(
            Variable::new("L"),
            Term::List(vec![Term::var("X"), Term::Int(2)]),
        );
        let env = env.bind(Variable::new("X"), Term::Int(1));
        let t = Term::compound("p", vec![Term::var("L")]);
        assert_eq!("p([1,2])", env.substitute(&t).to_string());
    }

    #[test]
    fn test_display() {
        let env = Bindings::default()
            .bind(Variable::new("X"), Term::Int(1))
            .bind(Variable::new("Y"), Term::atom("a"));
        assert_eq!("{X=1, Y=a}", env.to_string());
        assert_eq!("{}", Bindings::default().to_string());
    }
}
