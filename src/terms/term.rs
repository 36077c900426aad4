use super::operators::{self, OperatorKind};
use std::cmp::Ordering;
use std::fmt::Display;
use strum_macros::{AsRefStr, Display as StrumDisplay};

/// A logical variable.
///
/// Variables are identified by their name and their scope.
/// The scope (or rename id) is `0` for variables as they are written in rules;
/// a fresh positive scope is given each time a goal is asserted or a rule fires,
/// so that two firings of the same rule never share variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    name: String,
    scope: usize,
}

impl Variable {
    /// Builds a variable in the declaration scope (`0`).
    pub fn new(name: &str) -> Self {
        Self::new_in_scope(name, 0)
    }

    /// Builds a variable in the given scope.
    pub fn new_in_scope(name: &str, scope: usize) -> Self {
        Variable {
            name: name.to_string(),
            scope,
        }
    }

    /// Returns the name of the variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the scope of the variable.
    pub fn scope(&self) -> usize {
        self.scope
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scope == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}_{}", self.name, self.scope)
        }
    }
}

/// A compound term, made of a functor and a list of arguments.
///
/// Compounds with a non-zero priority are built-in operators (see [`Operator`](crate::terms::Operator)).
#[derive(Clone, Debug, PartialEq)]
pub struct Compound {
    functor: String,
    args: Vec<Term>,
    priority: u32,
}

impl Compound {
    /// Returns the functor.
    pub fn functor(&self) -> &str {
        &self.functor
    }

    /// Returns the arguments.
    pub fn args(&self) -> &[Term] {
        &self.args
    }

    /// Returns the operator priority (`0` for ordinary constraints).
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Returns `true` iff this compound denotes a built-in operator.
    pub fn is_operator(&self) -> bool {
        self.priority != 0
    }
}

/// The variant of a term, as returned by [`Term::type_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum TermType {
    /// An atom
    Atom,
    /// A boolean
    Bool,
    /// An integer
    Int,
    /// A float
    Float,
    /// A string
    Str,
    /// A compound term
    Compound,
    /// A list
    List,
    /// A variable
    Variable,
}

/// A term of the CHR language.
///
/// Terms are immutable values; equality is structural and variant-sensitive
/// (`Int(1)` and `Float(1.0)` are different terms), and variables are equal iff they share their name and scope.
///
/// # Example
///
/// ```
/// # use chrust::terms::Term;
/// let t = Term::compound("leq", vec![Term::atom("a"), Term::var("X")]);
/// assert_eq!("leq(a,X)", t.to_string());
/// assert_eq!(1, t.free_variables().len());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// An atom, identified by its name
    Atom(String),
    /// A boolean
    Bool(bool),
    /// An integer
    Int(i64),
    /// A float
    Float(f64),
    /// A string
    Str(String),
    /// A compound term
    Compound(Compound),
    /// A list of terms
    List(Vec<Term>),
    /// A variable
    Variable(Variable),
}

impl Term {
    /// Builds an atom.
    pub fn atom(name: &str) -> Self {
        Term::Atom(name.to_string())
    }

    /// Builds a string term.
    pub fn string(s: &str) -> Self {
        Term::Str(s.to_string())
    }

    /// Builds a variable in the declaration scope.
    pub fn var(name: &str) -> Self {
        Term::Variable(Variable::new(name))
    }

    /// Builds an ordinary compound term (priority `0`).
    pub fn compound(functor: &str, args: Vec<Term>) -> Self {
        Term::Compound(Compound {
            functor: functor.to_string(),
            args,
            priority: 0,
        })
    }

    /// Builds an operator term with an explicit priority.
    pub fn operator(functor: &str, args: Vec<Term>, priority: u32) -> Self {
        Term::Compound(Compound {
            functor: functor.to_string(),
            args,
            priority,
        })
    }

    /// Builds a binary operator term, taking the priority from the operator table.
    ///
    /// # Panics
    ///
    /// Panics if the operator is not a known infix operator.
    ///
    /// # Example
    ///
    /// ```
    /// # use chrust::terms::Term;
    /// let t = Term::infix("<=", Term::var("N"), Term::var("M"));
    /// assert_eq!("N<=M", t.to_string());
    /// ```
    pub fn infix(op: &str, left: Term, right: Term) -> Self {
        let operator = operators::infix_operator(op)
            .unwrap_or_else(|| panic!("no such infix operator: {}", op));
        Term::operator(op, vec![left, right], operator.priority())
    }

    /// Builds a unary operator term, taking the priority from the operator table.
    ///
    /// # Panics
    ///
    /// Panics if the operator is not a known prefix operator.
    pub fn prefix(op: &str, arg: Term) -> Self {
        let operator = operators::prefix_operator(op)
            .unwrap_or_else(|| panic!("no such prefix operator: {}", op));
        Term::operator(op, vec![arg], operator.priority())
    }

    /// Returns the variant of this term.
    pub fn type_of(&self) -> TermType {
        match self {
            Term::Atom(_) => TermType::Atom,
            Term::Bool(_) => TermType::Bool,
            Term::Int(_) => TermType::Int,
            Term::Float(_) => TermType::Float,
            Term::Str(_) => TermType::Str,
            Term::Compound(_) => TermType::Compound,
            Term::List(_) => TermType::List,
            Term::Variable(_) => TermType::Variable,
        }
    }

    /// Returns the functor of constraint-like terms (atoms and compounds), or `None`.
    pub fn functor(&self) -> Option<&str> {
        match self {
            Term::Atom(a) => Some(a),
            Term::Compound(c) => Some(c.functor()),
            _ => None,
        }
    }

    /// Returns the arguments of a compound term; atoms and other terms have none.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(c) => c.args(),
            _ => &[],
        }
    }

    /// Returns the number of arguments of this term.
    pub fn arity(&self) -> usize {
        self.args().len()
    }

    /// Returns the operator priority of compound terms, and `0` for any other term.
    pub fn priority(&self) -> u32 {
        match self {
            Term::Compound(c) => c.priority(),
            _ => 0,
        }
    }

    /// Returns `true` iff this term is a compound denoting a built-in operator.
    pub fn is_operator(&self) -> bool {
        self.priority() != 0
    }

    /// Returns `true` iff this term is a binary operator term with the given name.
    pub fn is_binary_operator(&self, name: &str) -> bool {
        matches!(self, Term::Compound(c) if c.is_operator() && c.args.len() == 2 && c.functor == name)
    }

    /// Returns the variable if this term is one.
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` iff this term is a number (integer or float).
    pub fn is_number(&self) -> bool {
        matches!(self, Term::Int(_) | Term::Float(_))
    }

    /// Returns the variables occurring in this term, in order of first occurrence and without duplicates.
    ///
    /// # Example
    ///
    /// ```
    /// # use chrust::terms::{Term, Variable};
    /// let t = Term::compound("f", vec![Term::var("X"), Term::var("Y"), Term::var("X")]);
    /// assert_eq!(vec![Variable::new("X"), Variable::new("Y")], t.free_variables());
    /// ```
    pub fn free_variables(&self) -> Vec<Variable> {
        let mut vars = vec![];
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<Variable>) {
        match self {
            Term::Variable(v) => {
                if !vars.contains(v) {
                    vars.push(v.clone())
                }
            }
            Term::Compound(c) => c.args.iter().for_each(|a| a.collect_variables(vars)),
            Term::List(items) => items.iter().for_each(|a| a.collect_variables(vars)),
            _ => {}
        }
    }

    /// Visits every variable occurrence of this term (including repeated ones).
    pub(crate) fn for_each_variable<F>(&self, f: &mut F)
    where
        F: FnMut(&Variable),
    {
        match self {
            Term::Variable(v) => f(v),
            Term::Compound(c) => c.args.iter().for_each(|a| a.for_each_variable(f)),
            Term::List(items) => items.iter().for_each(|a| a.for_each_variable(f)),
            _ => {}
        }
    }

    /// Returns `true` iff the term contains no variable.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Compound(c) => c.args.iter().all(|a| a.is_ground()),
            Term::List(items) => items.iter().all(|a| a.is_ground()),
            _ => true,
        }
    }

    /// Moves the variables of the declaration scope into the provided scope.
    ///
    /// Variables already living in another scope are left untouched.
    pub fn rename(&self, scope: usize) -> Term {
        self.map_variables(&|v| {
            if v.scope == 0 {
                Term::Variable(Variable::new_in_scope(&v.name, scope))
            } else {
                Term::Variable(v.clone())
            }
        })
    }

    /// Rebuilds this term, replacing each variable by the result of the provided function.
    pub(crate) fn map_variables<F>(&self, f: &F) -> Term
    where
        F: Fn(&Variable) -> Term,
    {
        match self {
            Term::Variable(v) => f(v),
            Term::Compound(c) => Term::Compound(Compound {
                functor: c.functor.clone(),
                args: c.args.iter().map(|a| a.map_variables(f)).collect(),
                priority: c.priority,
            }),
            Term::List(items) => Term::List(items.iter().map(|a| a.map_variables(f)).collect()),
            _ => self.clone(),
        }
    }

    /// Replaces every subterm structurally equal to `from` by `to`.
    pub fn replace(&self, from: &Term, to: &Term) -> Term {
        if self == from {
            return to.clone();
        }
        match self {
            Term::Compound(c) => Term::Compound(Compound {
                functor: c.functor.clone(),
                args: c.args.iter().map(|a| a.replace(from, to)).collect(),
                priority: c.priority,
            }),
            Term::List(items) => Term::List(items.iter().map(|a| a.replace(from, to)).collect()),
            _ => self.clone(),
        }
    }

    fn standard_rank(&self) -> u8 {
        match self {
            Term::Variable(_) => 0,
            Term::Bool(_) => 1,
            Term::Int(_) | Term::Float(_) => 2,
            Term::Atom(_) => 3,
            Term::Str(_) => 4,
            Term::List(_) => 5,
            Term::Compound(_) => 6,
        }
    }

    /// Compares two terms using the standard order of terms.
    ///
    /// Variables come first, then booleans, numbers (compared by value), atoms, strings, lists and compound terms.
    /// Atoms and strings are ordered lexicographically, lists by length and then by elements,
    /// and compound terms by arity, functor name and then arguments.
    ///
    /// # Example
    ///
    /// ```
    /// # use chrust::terms::Term;
    /// # use std::cmp::Ordering;
    /// assert_eq!(Ordering::Less, Term::var("X").compare_standard(&Term::Int(3)));
    /// assert_eq!(Ordering::Less, Term::atom("a").compare_standard(&Term::atom("c")));
    /// ```
    pub fn compare_standard(&self, other: &Term) -> Ordering {
        let rank_cmp = self.standard_rank().cmp(&other.standard_rank());
        if rank_cmp != Ordering::Equal {
            return rank_cmp;
        }
        match (self, other) {
            (Term::Variable(v1), Term::Variable(v2)) => v1
                .name
                .cmp(&v2.name)
                .then_with(|| v1.scope.cmp(&v2.scope)),
            (Term::Bool(b1), Term::Bool(b2)) => b1.cmp(b2),
            (Term::Int(i1), Term::Int(i2)) => i1.cmp(i2),
            (Term::Atom(a1), Term::Atom(a2)) | (Term::Str(a1), Term::Str(a2)) => a1.cmp(a2),
            (Term::List(l1), Term::List(l2)) => l1
                .len()
                .cmp(&l2.len())
                .then_with(|| compare_all(l1, l2)),
            (Term::Compound(c1), Term::Compound(c2)) => c1
                .args
                .len()
                .cmp(&c2.args.len())
                .then_with(|| c1.functor.cmp(&c2.functor))
                .then_with(|| compare_all(&c1.args, &c2.args)),
            _ => {
                let (n1, n2) = (self.as_f64().unwrap_or(0.), other.as_f64().unwrap_or(0.));
                n1.partial_cmp(&n2)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| matches!(self, Term::Float(_)).cmp(&matches!(other, Term::Float(_))))
            }
        }
    }

    /// Returns the numeric value of numbers as a float.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Term::Int(i) => Some(*i as f64),
            Term::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn fmt_with_max_priority(&self, f: &mut std::fmt::Formatter<'_>, max: u32) -> std::fmt::Result {
        match self {
            Term::Atom(a) => write_atom(f, a),
            Term::Bool(b) => write!(f, "{}", b),
            Term::Int(i) => write!(f, "{}", i),
            Term::Float(x) => {
                if x.fract() == 0. && x.is_finite() {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Term::Str(s) => write!(f, "{:?}", s),
            Term::Variable(v) => write!(f, "{}", v),
            Term::List(items) => {
                write!(f, "[")?;
                write_args(f, items)?;
                write!(f, "]")
            }
            Term::Compound(c) => {
                match operators::operator_for(&c.functor, c.args.len(), c.priority) {
                    Some(op) => {
                        let parenthesized = op.priority() > max;
                        if parenthesized {
                            write!(f, "(")?;
                        }
                        let (left_max, right_max) = op.argument_max_priorities();
                        if op.kind() == OperatorKind::Fy {
                            write!(f, "{}", op.name())?;
                            c.args[0].fmt_with_max_priority(f, right_max)?;
                        } else {
                            c.args[0].fmt_with_max_priority(f, left_max)?;
                            if op.is_alphabetic() {
                                write!(f, " {} ", op.name())?;
                            } else {
                                write!(f, "{}", op.name())?;
                            }
                            c.args[1].fmt_with_max_priority(f, right_max)?;
                        }
                        if parenthesized {
                            write!(f, ")")?;
                        }
                        Ok(())
                    }
                    None => {
                        write_atom(f, &c.functor)?;
                        write!(f, "(")?;
                        write_args(f, &c.args)?;
                        write!(f, ")")
                    }
                }
            }
        }
    }
}

fn compare_all(l1: &[Term], l2: &[Term]) -> Ordering {
    l1.iter()
        .zip(l2.iter())
        .map(|(t1, t2)| t1.compare_standard(t2))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn write_atom(f: &mut std::fmt::Formatter<'_>, name: &str) -> std::fmt::Result {
    let mut chars = name.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        write!(f, "{}", name)
    } else {
        write!(f, "'{}'", name.replace('\'', "\\'"))
    }
}

fn write_args(f: &mut std::fmt::Formatter<'_>, args: &[Term]) -> std::fmt::Result {
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        a.fmt_with_max_priority(f, 999)?;
    }
    Ok(())
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_with_max_priority(f, 1200)
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::Int(i)
    }
}

impl From<f64> for Term {
    fn from(x: f64) -> Self {
        Term::Float(x)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}
