use super::operators::{self, ASSIGNMENT_OPERATORS};
use super::{Bindings, Term};
use std::cmp::Ordering;

/// A trait for objects able to tell whether a built-in constraint currently holds.
///
/// It is used by the evaluator to give a truth value to relational terms that cannot be reduced,
/// such as `X < Y` with unbound variables, by looking for them in the built-in partition of a constraint store.
pub trait BuiltinOracle {
    /// Returns `true` iff the provided constraint is known to hold.
    fn holds(&self, constraint: &Term) -> bool;
}

/// An evaluator for arithmetic, comparison and logical expressions.
///
/// Expressions are compound terms built with operators (see [`Operator`](crate::terms::Operator)).
/// Evaluation substitutes the bindings of an environment and then reduces the operators bottom-up.
/// Ordinary compound terms are kept, but their arguments are evaluated.
///
/// Evaluation is fail-soft: an expression that cannot be reduced (mismatched types, unbound variables, division by zero, overflow)
/// is returned unreduced instead of raising an error.
///
/// # Example
///
/// ```
/// # use chrust::terms::{Bindings, Evaluator, Term, Variable};
/// let env = Bindings::default().bind(Variable::new("N"), Term::Int(20));
/// let body = Term::compound("prime", vec![Term::infix("-", Term::var("N"), Term::Int(1))]);
/// assert_eq!("prime(19)", Evaluator::default().evaluate(&body, &env).to_string());
///
/// let ill_typed = Term::infix("+", Term::atom("a"), Term::Int(1));
/// assert_eq!(ill_typed, Evaluator::default().evaluate(&ill_typed, &env));
/// ```
#[derive(Default)]
pub struct Evaluator<'a> {
    oracle: Option<&'a dyn BuiltinOracle>,
}

impl<'a> Evaluator<'a> {
    /// Builds an evaluator consulting an oracle for relational terms that cannot be reduced.
    pub fn new_with_oracle(oracle: &'a dyn BuiltinOracle) -> Self {
        Evaluator {
            oracle: Some(oracle),
        }
    }

    /// Evaluates a term under an environment.
    pub fn evaluate(&self, term: &Term, env: &Bindings) -> Term {
        self.reduce(&env.substitute(term))
    }

    /// Evaluates a term and returns `true` iff it reduces to the boolean `true`.
    pub fn is_true(&self, term: &Term, env: &Bindings) -> bool {
        matches!(self.evaluate(term, env), Term::Bool(true))
    }

    fn reduce(&self, term: &Term) -> Term {
        match term {
            Term::Compound(c) => {
                let args = c.args().iter().map(|a| self.reduce(a)).collect::<Vec<Term>>();
                if !c.is_operator() {
                    return Term::compound(c.functor(), args);
                }
                let reduced = match args.as_slice() {
                    [arg] => self.reduce_unary(c.functor(), arg),
                    [left, right] => self.reduce_binary(c.functor(), left, right),
                    _ => None,
                };
                reduced.unwrap_or_else(|| Term::operator(c.functor(), args, c.priority()))
            }
            Term::List(items) => Term::List(items.iter().map(|i| self.reduce(i)).collect()),
            _ => term.clone(),
        }
    }

    fn reduce_unary(&self, op: &str, arg: &Term) -> Option<Term> {
        match (op, arg) {
            ("-", Term::Int(i)) => i.checked_neg().map(Term::Int),
            ("-", Term::Float(x)) => Some(Term::Float(-x)),
            ("!", t) => self.truth_value(t).map(|b| Term::Bool(!b)),
            _ => None,
        }
    }

    fn reduce_binary(&self, op: &str, left: &Term, right: &Term) -> Option<Term> {
        match op {
            "+" | "-" | "*" | "/" | "mod" | "**" | "^" => arithmetic(op, left, right),
            "<" | "<=" | ">" | ">=" => {
                compare(left, right).map(|o| Term::Bool(ordering_satisfies(op, o)))
            }
            "==" | "!=" => equality(left, right).map(|b| Term::Bool(if op == "==" { b } else { !b })),
            "&&" => self.conjunction(left, right),
            "||" => self.disjunction(left, right),
            _ => None,
        }
    }

    fn conjunction(&self, left: &Term, right: &Term) -> Option<Term> {
        match (self.truth_value(left), self.truth_value(right)) {
            (Some(false), _) | (_, Some(false)) => Some(Term::Bool(false)),
            (Some(true), Some(true)) => Some(Term::Bool(true)),
            (Some(true), None) => Some(right.clone()),
            (None, Some(true)) => Some(left.clone()),
            (None, None) => negate(left)
                .filter(|n| n == right)
                .map(|_| Term::Bool(false)),
        }
    }

    fn disjunction(&self, left: &Term, right: &Term) -> Option<Term> {
        match (self.truth_value(left), self.truth_value(right)) {
            (Some(true), _) | (_, Some(true)) => Some(Term::Bool(true)),
            (Some(false), Some(false)) => Some(Term::Bool(false)),
            (Some(false), None) => Some(right.clone()),
            (None, Some(false)) => Some(left.clone()),
            (None, None) => negate(left)
                .filter(|n| n == right)
                .map(|_| Term::Bool(true)),
        }
    }

    fn truth_value(&self, term: &Term) -> Option<bool> {
        if let Term::Bool(b) = term {
            return Some(*b);
        }
        let oracle = self.oracle?;
        if oracle.holds(term) {
            Some(true)
        } else if negate(term).map(|n| oracle.holds(&n)).unwrap_or(false) {
            Some(false)
        } else {
            None
        }
    }
}

/// Returns the logical negation of a term, when it has a syntactic one.
///
/// Relational operators are swapped with their complement (`X<Y` gives `X>=Y`),
/// `!T` gives `T`, and booleans are inverted.
///
/// # Example
///
/// ```
/// # use chrust::terms::{negate, Term};
/// let t = Term::infix("<", Term::var("X"), Term::var("Y"));
/// assert_eq!("X>=Y", negate(&t).unwrap().to_string());
/// assert!(negate(&Term::atom("a")).is_none());
/// ```
pub fn negate(term: &Term) -> Option<Term> {
    match term {
        Term::Bool(b) => Some(Term::Bool(!b)),
        Term::Compound(c) if c.is_operator() => match c.args() {
            [arg] if c.functor() == "!" => Some(arg.clone()),
            [left, right] => operators::negated_relation(c.functor())
                .map(|n| Term::infix(n, left.clone(), right.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// Returns the operands of an assignment (`:=`, `=` or `is`), if the term is one.
pub fn as_assignment(term: &Term) -> Option<(&Term, &Term)> {
    match term {
        Term::Compound(c)
            if c.is_operator()
                && c.args().len() == 2
                && ASSIGNMENT_OPERATORS.contains(&c.functor()) =>
        {
            Some((&c.args()[0], &c.args()[1]))
        }
        _ => None,
    }
}

fn arithmetic(op: &str, left: &Term, right: &Term) -> Option<Term> {
    match (left, right) {
        (Term::Int(a), Term::Int(b)) => integer_arithmetic(op, *a, *b).map(Term::Int),
        (Term::Str(a), Term::Str(b)) if op == "+" => Some(Term::Str(format!("{}{}", a, b))),
        _ => {
            let (a, b) = (left.as_f64()?, right.as_f64()?);
            float_arithmetic(op, a, b).map(Term::Float)
        }
    }
}

fn integer_arithmetic(op: &str, a: i64, b: i64) -> Option<i64> {
    match op {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" => a.checked_div(b),
        "mod" => a
            .checked_rem(b)
            .and_then(|r| if r != 0 && (r < 0) != (b < 0) { r.checked_add(b) } else { Some(r) }),
        "**" | "^" => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
        _ => None,
    }
}

fn float_arithmetic(op: &str, a: f64, b: f64) -> Option<f64> {
    match op {
        "+" => Some(a + b),
        "-" => Some(a - b),
        "*" => Some(a * b),
        "/" if b != 0. => Some(a / b),
        "**" | "^" => Some(a.powf(b)),
        _ => None,
    }
}

fn compare(left: &Term, right: &Term) -> Option<Ordering> {
    match (left, right) {
        (Term::Int(a), Term::Int(b)) => Some(a.cmp(b)),
        (Term::Str(a), Term::Str(b)) => Some(a.cmp(b)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn ordering_satisfies(op: &str, ordering: Ordering) -> bool {
    match op {
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        ">" => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }
}

fn equality(left: &Term, right: &Term) -> Option<bool> {
    if left.is_number() && right.is_number() {
        return compare(left, right).map(|o| o == Ordering::Equal);
    }
    if left == right {
        Some(true)
    } else if left.is_ground() && right.is_ground() {
        Some(false)
    } else {
        None
    }
}
