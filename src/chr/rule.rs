use crate::terms::Term;
use anyhow::{anyhow, Result};
use std::fmt::Display;

/// A CHR rule.
///
/// A rule is made of keep-heads, delete-heads, guards and a body.
/// Simplification rules only have delete-heads, propagation rules only keep-heads,
/// and simpagation rules have both.
/// When all its heads match constraints of the store and its guards hold,
/// the rule fires: the constraints matched by the delete-heads are consumed and the body is executed.
///
/// Rules get their identifier when they are registered in a [`RuleStore`].
///
/// # Example
///
/// ```
/// # use chrust::chr::Rule;
/// # use chrust::terms::Term;
/// let rule = Rule::new_simplification("zero", vec![Term::compound("gcd", vec![Term::Int(0)])], vec![], vec![]);
/// assert_eq!("zero @ gcd(0) <=> true.", rule.to_string());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: String,
    id: usize,
    keep_heads: Vec<Term>,
    delete_heads: Vec<Term>,
    guards: Vec<Term>,
    body: Vec<Term>,
}

impl Rule {
    /// Builds a new rule from its parts.
    pub fn new(
        name: &str,
        keep_heads: Vec<Term>,
        delete_heads: Vec<Term>,
        guards: Vec<Term>,
        body: Vec<Term>,
    ) -> Self {
        Rule {
            name: name.to_string(),
            id: 0,
            keep_heads,
            delete_heads,
            guards,
            body,
        }
    }

    /// Builds a simplification rule (`heads <=> guards | body`).
    pub fn new_simplification(
        name: &str,
        heads: Vec<Term>,
        guards: Vec<Term>,
        body: Vec<Term>,
    ) -> Self {
        Self::new(name, vec![], heads, guards, body)
    }

    /// Builds a propagation rule (`heads ==> guards | body`).
    pub fn new_propagation(
        name: &str,
        heads: Vec<Term>,
        guards: Vec<Term>,
        body: Vec<Term>,
    ) -> Self {
        Self::new(name, heads, vec![], guards, body)
    }

    /// Returns the name of the rule.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the identifier of the rule, which is its position in the rule store.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the heads kept when the rule fires.
    pub fn keep_heads(&self) -> &[Term] {
        &self.keep_heads
    }

    /// Returns the heads consumed when the rule fires.
    pub fn delete_heads(&self) -> &[Term] {
        &self.delete_heads
    }

    /// Returns the guards.
    pub fn guards(&self) -> &[Term] {
        &self.guards
    }

    /// Returns the body.
    pub fn body(&self) -> &[Term] {
        &self.body
    }

    /// Returns the heads in matching order: the delete-heads first, then the keep-heads.
    pub fn heads(&self) -> impl Iterator<Item = &Term> + '_ {
        self.delete_heads.iter().chain(self.keep_heads.iter())
    }

    /// Returns the total number of heads.
    pub fn n_heads(&self) -> usize {
        self.delete_heads.len() + self.keep_heads.len()
    }

    /// Returns `true` iff the rule is a propagation rule.
    pub fn is_propagation(&self) -> bool {
        self.delete_heads.is_empty()
    }
}

fn write_terms(f: &mut std::fmt::Formatter<'_>, terms: &[Term]) -> std::fmt::Result {
    for (i, t) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ ", self.name)?;
        if self.is_propagation() {
            write_terms(f, &self.keep_heads)?;
            write!(f, " ==> ")?;
        } else {
            if !self.keep_heads.is_empty() {
                write_terms(f, &self.keep_heads)?;
                write!(f, " \\ ")?;
            }
            write_terms(f, &self.delete_heads)?;
            write!(f, " <=> ")?;
        }
        if !self.guards.is_empty() {
            write_terms(f, &self.guards)?;
            write!(f, " | ")?;
        }
        if self.body.is_empty() {
            write!(f, "true")?;
        } else {
            write_terms(f, &self.body)?;
        }
        write!(f, ".")
    }
}

/// The set of rules of a CHR program, in declaration order.
#[derive(Debug, Default, Clone)]
pub struct RuleStore {
    rules: Vec<Rule>,
}

impl RuleStore {
    /// Registers a rule and returns its identifier.
    ///
    /// A rule without any head is rejected; in this case, the rule store is left unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// # use chrust::chr::{Rule, RuleStore};
    /// # use chrust::terms::Term;
    /// let mut rules = RuleStore::default();
    /// assert!(rules.add_rule(Rule::new_simplification("empty", vec![], vec![], vec![])).is_err());
    /// assert!(rules.is_empty());
    /// ```
    pub fn add_rule(&mut self, mut rule: Rule) -> Result<usize> {
        if rule.n_heads() == 0 {
            return Err(anyhow!(r#"rule "{}" has no head"#, rule.name));
        }
        rule.id = self.rules.len();
        self.rules.push(rule);
        Ok(self.rules.len() - 1)
    }

    /// Returns the rule with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if no rule has this identifier.
    pub fn get(&self, id: usize) -> &Rule {
        &self.rules[id]
    }

    /// Returns the rule with the given name, if any.
    pub fn get_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Returns an iterator to the rules, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    /// Returns the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` iff no rule was registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leq(x: &str, y: &str) -> Term {
        Term::compound("leq", vec![Term::var(x), Term::var(y)])
    }

    #[test]
    fn test_heads_order() {
        let rule = Rule::new(
            "dup",
            vec![leq("X", "Y")],
            vec![leq("Y", "X")],
            vec![],
            vec![],
        );
        let heads = rule.heads().cloned().collect::<Vec<Term>>();
        assert_eq!(vec![leq("Y", "X"), leq("X", "Y")], heads);
        assert_eq!(2, rule.n_heads());
        assert!(!rule.is_propagation());
    }

    #[test]
    fn test_add_rule_sets_ids() {
        let mut rules = RuleStore::default();
        assert_eq!(
            0,
            rules
                .add_rule(Rule::new_simplification("r1", vec![leq("X", "X")], vec![], vec![]))
                .unwrap()
        );
        assert!(rules.add_rule(Rule::new_propagation("r2", vec![], vec![], vec![])).is_err());
        assert_eq!(
            1,
            rules
                .add_rule(Rule::new_propagation("r3", vec![leq("X", "Y")], vec![], vec![]))
                .unwrap()
        );
        assert_eq!(2, rules.len());
        assert_eq!(1, rules.get_by_name("r3").unwrap().id());
        assert!(rules.get_by_name("r2").is_none());
    }

    #[test]
    fn test_add_rule_error_names_rule() {
        let mut rules = RuleStore::default();
        let err = rules
            .add_rule(Rule::new_simplification("nameless_heads", vec![], vec![], vec![]))
            .unwrap_err();
        assert!(err.to_string().contains("nameless_heads"));
    }

    #[test]
    fn test_display() {
        let rule = Rule::new(
            "gcd",
            vec![Term::compound("gcd", vec![Term::var("N")])],
            vec![Term::compound("gcd", vec![Term::var("M")])],
            vec![
                Term::infix("<=", Term::var("N"), Term::var("M")),
                Term::infix("is", Term::var("L"), Term::infix("mod", Term::var("M"), Term::var("N"))),
            ],
            vec![Term::compound("gcd", vec![Term::var("L")])],
        );
        assert_eq!(
            "gcd @ gcd(N) \\ gcd(M) <=> N<=M, L is M mod N | gcd(L).",
            rule.to_string()
        );
        let rule = Rule::new_propagation("trans", vec![leq("X", "Y"), leq("Y", "Z")], vec![], vec![leq("X", "Z")]);
        assert_eq!("trans @ leq(X,Y), leq(Y,Z) ==> leq(X,Z).", rule.to_string());
    }
}
