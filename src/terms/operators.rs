/// The associativity of an operator, following the usual Prolog notation.
///
/// `f` stands for the operator, `x` for an argument whose priority must be strictly lower than the one of the operator,
/// and `y` for an argument whose priority may be equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Non-associative infix operator
    Xfx,
    /// Right-associative infix operator
    Xfy,
    /// Left-associative infix operator
    Yfx,
    /// Prefix operator
    Fy,
}

/// A built-in operator.
///
/// Operators are the functors of compound terms with a non-zero priority.
/// Such terms denote arithmetic, comparison, logical or assignment expressions
/// and are stored in the built-in partition of the constraint store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    name: &'static str,
    priority: u32,
    kind: OperatorKind,
}

impl Operator {
    /// Returns the name of the operator, which is the functor of the terms it builds.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the priority of the operator.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Returns the kind of the operator.
    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Returns the maximal priorities allowed for the left and right arguments.
    ///
    /// For prefix operators, the left priority is meaningless and set to zero.
    pub fn argument_max_priorities(&self) -> (u32, u32) {
        let p = self.priority;
        match self.kind {
            OperatorKind::Xfx => (p - 1, p - 1),
            OperatorKind::Xfy => (p - 1, p),
            OperatorKind::Yfx => (p, p - 1),
            OperatorKind::Fy => (0, p),
        }
    }

    /// Returns `true` iff the operator is written with letters (and thus must be surrounded by spaces).
    pub fn is_alphabetic(&self) -> bool {
        self.name.chars().all(|c| c.is_ascii_alphabetic())
    }
}

const fn op(name: &'static str, priority: u32, kind: OperatorKind) -> Operator {
    Operator {
        name,
        priority,
        kind,
    }
}

const INFIX_OPERATORS: [Operator; 18] = [
    op("||", 1100, OperatorKind::Xfy),
    op("&&", 1000, OperatorKind::Xfy),
    op(":=", 700, OperatorKind::Xfx),
    op("=", 700, OperatorKind::Xfx),
    op("is", 700, OperatorKind::Xfx),
    op("==", 700, OperatorKind::Xfx),
    op("!=", 700, OperatorKind::Xfx),
    op("<", 700, OperatorKind::Xfx),
    op("<=", 700, OperatorKind::Xfx),
    op(">", 700, OperatorKind::Xfx),
    op(">=", 700, OperatorKind::Xfx),
    op("+", 500, OperatorKind::Yfx),
    op("-", 500, OperatorKind::Yfx),
    op("*", 400, OperatorKind::Yfx),
    op("/", 400, OperatorKind::Yfx),
    op("mod", 400, OperatorKind::Yfx),
    op("**", 200, OperatorKind::Xfx),
    op("^", 200, OperatorKind::Xfy),
];

const PREFIX_OPERATORS: [Operator; 2] = [op("!", 900, OperatorKind::Fy), op("-", 200, OperatorKind::Fy)];

/// The names of the operators used as assignments in guards and bodies.
pub const ASSIGNMENT_OPERATORS: [&str; 3] = [":=", "=", "is"];

/// The name of the equality operator.
pub const EQUALITY_OPERATOR: &str = "==";

/// Returns the infix operator with the given name, if any.
///
/// # Example
///
/// ```
/// # use chrust::terms::infix_operator;
/// assert_eq!(700, infix_operator("==").unwrap().priority());
/// assert!(infix_operator("gcd").is_none());
/// ```
pub fn infix_operator(name: &str) -> Option<Operator> {
    INFIX_OPERATORS.iter().find(|o| o.name == name).copied()
}

/// Returns the prefix operator with the given name, if any.
pub fn prefix_operator(name: &str) -> Option<Operator> {
    PREFIX_OPERATORS.iter().find(|o| o.name == name).copied()
}

/// Returns the operator matching a functor, an arity and a priority, if any.
///
/// Binary terms are looked up among the infix operators and unary ones among the prefix operators.
pub(crate) fn operator_for(functor: &str, arity: usize, priority: u32) -> Option<Operator> {
    let candidate = match arity {
        1 => prefix_operator(functor),
        2 => infix_operator(functor),
        _ => None,
    };
    candidate.filter(|o| o.priority == priority)
}

/// Returns the name of the relational operator expressing the negation of the provided one.
pub(crate) fn negated_relation(name: &str) -> Option<&'static str> {
    match name {
        "<" => Some(">="),
        ">=" => Some("<"),
        ">" => Some("<="),
        "<=" => Some(">"),
        "==" => Some("!="),
        "!=" => Some("=="),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_priorities() {
        assert_eq!((699, 699), infix_operator("<").unwrap().argument_max_priorities());
        assert_eq!((999, 1000), infix_operator("&&").unwrap().argument_max_priorities());
        assert_eq!((500, 499), infix_operator("-").unwrap().argument_max_priorities());
        assert_eq!((0, 200), prefix_operator("-").unwrap().argument_max_priorities());
    }

    #[test]
    fn test_operator_for() {
        assert!(operator_for("-", 2, 500).is_some());
        assert!(operator_for("-", 1, 200).is_some());
        assert!(operator_for("-", 1, 500).is_none());
        assert!(operator_for("-", 3, 500).is_none());
    }

    #[test]
    fn test_alphabetic() {
        assert!(infix_operator("mod").unwrap().is_alphabetic());
        assert!(infix_operator("is").unwrap().is_alphabetic());
        assert!(!infix_operator("==").unwrap().is_alphabetic());
    }

    #[test]
    fn test_negated_relation_is_involutive() {
        for r in ["<", "<=", ">", ">=", "==", "!="] {
            assert_eq!(r, negated_relation(negated_relation(r).unwrap()).unwrap());
        }
        assert!(negated_relation("+").is_none());
    }
}
