use super::{ChrProgram, ProgramReader, WarningHandler};
use crate::chr::Rule;
use crate::terms::{infix_operator, prefix_operator, Term, Variable};
use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::io::Read;

lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(
        r#"\A(?:(?P<ws>\s+)|(?P<comment>%[^\n]*)|(?P<float>\d+\.\d+(?:[eE][+-]?\d+)?)|(?P<int>\d+)|(?P<var>[A-Z_][A-Za-z0-9_]*)|(?P<name>[a-z][A-Za-z0-9_]*)|(?P<quoted>'(?:[^'\\]|\\.)*')|(?P<string>"(?:[^"\\]|\\.)*")|(?P<symbol><=>|==>|:=|==|!=|<=|>=|&&|\|\||\*\*|[<>=+\-*/!|\\@.,()\[\]^]))"#
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Var(String),
    Name(String),
    Quoted(String),
    Symbol(String),
}

impl Token {
    fn is_symbol(&self, s: &str) -> bool {
        matches!(self, Token::Symbol(t) if t == s)
    }

    fn infix_name(&self) -> Option<&str> {
        match self {
            Token::Symbol(s) | Token::Name(s) => Some(s),
            _ => None,
        }
    }
}

fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = vec![];
    let mut pos = 0;
    let mut line = 1;
    while pos < text.len() {
        let captures = TOKEN_PATTERN
            .captures(&text[pos..])
            .ok_or_else(|| anyhow!("unexpected character at line {}", line))?;
        let whole = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
        let token = if captures.name("ws").is_some() || captures.name("comment").is_some() {
            None
        } else if let Some(m) = captures.name("float") {
            Some(Token::Float(m.as_str().parse().with_context(|| {
                format!("invalid float {} at line {}", m.as_str(), line)
            })?))
        } else if let Some(m) = captures.name("int") {
            Some(Token::Int(m.as_str().parse().with_context(|| {
                format!("invalid integer {} at line {}", m.as_str(), line)
            })?))
        } else if let Some(m) = captures.name("var") {
            Some(Token::Var(m.as_str().to_string()))
        } else if let Some(m) = captures.name("name") {
            Some(Token::Name(m.as_str().to_string()))
        } else if let Some(m) = captures.name("quoted") {
            Some(Token::Quoted(unescape(m.as_str())))
        } else if let Some(m) = captures.name("string") {
            Some(Token::Str(unescape(m.as_str())))
        } else {
            Some(Token::Symbol(whole.to_string()))
        };
        if let Some(t) = token {
            tokens.push((t, line));
        }
        line += whole.matches('\n').count();
        pos += whole.len();
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    n_anonymous: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Result<&'a Token> {
        let token = self
            .peek()
            .ok_or_else(|| anyhow!("unexpected end of input"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, symbol: &str) -> Result<()> {
        let line = self.line();
        match self.next()? {
            t if t.is_symbol(symbol) => Ok(()),
            t => Err(anyhow!(
                r#"expected "{}" at line {}, found {:?}"#,
                symbol,
                line,
                t
            )),
        }
    }

    fn parse_term(&mut self, max_priority: u32) -> Result<Term> {
        let (mut left, mut left_priority) = self.parse_primary(max_priority)?;
        loop {
            let op = match self.peek().and_then(|t| t.infix_name()).and_then(infix_operator) {
                Some(op) => op,
                None => break,
            };
            let (left_max, right_max) = op.argument_max_priorities();
            if op.priority() > max_priority || left_priority > left_max {
                break;
            }
            self.pos += 1;
            let right = self.parse_term(right_max)?;
            left = Term::operator(op.name(), vec![left, right], op.priority());
            left_priority = op.priority();
        }
        Ok(left)
    }

    fn parse_primary(&mut self, max_priority: u32) -> Result<(Term, u32)> {
        let line = self.line();
        let token = self.next()?;
        match token {
            Token::Int(i) => Ok((Term::Int(*i), 0)),
            Token::Float(x) => Ok((Term::Float(*x), 0)),
            Token::Str(s) => Ok((Term::string(s), 0)),
            Token::Var(v) if v == "_" => {
                self.n_anonymous += 1;
                Ok((Term::var(&format!("_{}", self.n_anonymous)), 0))
            }
            Token::Var(v) => Ok((Term::var(v), 0)),
            Token::Symbol(s) if s == "(" => {
                let t = self.parse_term(1200)?;
                self.expect(")")?;
                Ok((t, 0))
            }
            Token::Symbol(s) if s == "[" => {
                let items = self.parse_sequence("]")?;
                Ok((Term::List(items), 0))
            }
            Token::Symbol(s) if s == "-" => match self.peek() {
                Some(Token::Int(i)) => {
                    self.pos += 1;
                    Ok((Term::Int(-i), 0))
                }
                Some(Token::Float(x)) => {
                    self.pos += 1;
                    Ok((Term::Float(-x), 0))
                }
                _ => self.parse_prefix_operation(s, max_priority, line),
            },
            Token::Symbol(s) => self.parse_prefix_operation(s, max_priority, line),
            Token::Name(n) if n == "true" => Ok((Term::Bool(true), 0)),
            Token::Name(n) if n == "false" => Ok((Term::Bool(false), 0)),
            Token::Name(n) | Token::Quoted(n) => {
                if matches!(self.peek(), Some(t) if t.is_symbol("(")) {
                    self.pos += 1;
                    let args = self.parse_sequence(")")?;
                    Ok((Term::compound(n, args), 0))
                } else {
                    Ok((Term::atom(n), 0))
                }
            }
        }
    }

    fn parse_prefix_operation(&mut self, name: &str, max_priority: u32, line: usize) -> Result<(Term, u32)> {
        match prefix_operator(name) {
            Some(op) if op.priority() <= max_priority => {
                let (_, arg_max) = op.argument_max_priorities();
                let arg = self.parse_term(arg_max)?;
                Ok((
                    Term::operator(op.name(), vec![arg], op.priority()),
                    op.priority(),
                ))
            }
            _ => Err(anyhow!(r#"unexpected "{}" at line {}"#, name, line)),
        }
    }

    fn parse_sequence(&mut self, closing: &str) -> Result<Vec<Term>> {
        if matches!(self.peek(), Some(t) if t.is_symbol(closing)) {
            self.pos += 1;
            return Ok(vec![]);
        }
        let items = self.parse_term_list()?;
        self.expect(closing)?;
        Ok(items)
    }

    fn parse_term_list(&mut self) -> Result<Vec<Term>> {
        let mut items = vec![self.parse_term(1200)?];
        while matches!(self.peek(), Some(t) if t.is_symbol(",")) {
            self.pos += 1;
            items.push(self.parse_term(1200)?);
        }
        Ok(items)
    }

    fn parse_rule_name(&mut self) -> Option<String> {
        let name = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Name(n) | Token::Var(n) | Token::Quoted(n)), Some(t)) if t.is_symbol("@") => {
                n.clone()
            }
            _ => return None,
        };
        self.pos += 2;
        Some(name)
    }

    fn parse_clause(&mut self, n_rules: usize) -> Result<Clause> {
        let name = self.parse_rule_name();
        let first = self.parse_term_list()?;
        let line = self.line();
        let (keep_heads, delete_heads) = match self.next()? {
            t if t.is_symbol(".") => {
                return match name {
                    Some(n) => Err(anyhow!(r#"rule "{}" has no arrow"#, n)),
                    None => Ok(Clause::Goals(first)),
                };
            }
            t if t.is_symbol("\\") => {
                let delete = self.parse_term_list()?;
                self.expect("<=>")?;
                (first, delete)
            }
            t if t.is_symbol("<=>") => (vec![], first),
            t if t.is_symbol("==>") => (first, vec![]),
            t => return Err(anyhow!(r#"unexpected {:?} at line {}"#, t, line)),
        };
        let mut body = self.parse_term_list()?;
        let mut guards = vec![];
        if matches!(self.peek(), Some(t) if t.is_symbol("|")) {
            self.pos += 1;
            guards = body;
            body = self.parse_term_list()?;
        }
        self.expect(".")?;
        let body = body
            .into_iter()
            .filter(|t| t != &Term::Bool(true))
            .collect();
        let name = name.unwrap_or_else(|| format!("rule_{}", n_rules + 1));
        Ok(Clause::Rule(Rule::new(
            &name,
            keep_heads,
            delete_heads,
            guards,
            body,
        )))
    }
}

enum Clause {
    Rule(Rule),
    Goals(Vec<Term>),
}

fn singleton_variables(rule: &Rule) -> Vec<String> {
    let mut occurrences: Vec<(Variable, usize)> = vec![];
    let mut count = |v: &Variable| match occurrences.iter_mut().find(|(w, _)| w == v) {
        Some((_, n)) => *n += 1,
        None => occurrences.push((v.clone(), 1)),
    };
    rule.keep_heads()
        .iter()
        .chain(rule.delete_heads().iter())
        .chain(rule.guards().iter())
        .chain(rule.body().iter())
        .for_each(|t| t.for_each_variable(&mut count));
    occurrences
        .into_iter()
        .filter(|(v, n)| *n == 1 && !v.name().starts_with('_'))
        .map(|(v, _)| v.name().to_string())
        .collect()
}

/// A reader for CHR programs.
///
/// A program is a sequence of clauses ended by a dot; `%` starts a comment running until the end of the line.
/// A clause is either a rule or a comma-separated list of goals.
///
/// Rules follow the usual CHR syntax: `name @ heads <=> guards | body.` for simplification rules,
/// `name @ kept \ deleted <=> guards | body.` for simpagation rules
/// and `name @ heads ==> guards | body.` for propagation rules.
/// The name and the guards are optional; unnamed rules are named `rule_<n>`, where `n` is the position of the rule.
///
/// Terms may use the operators of the expression language (see [`Operator`](crate::terms::Operator)).
/// Warnings are raised for rule variables occurring once (unless their name begins with `_`) and for duplicated rule names.
///
/// # Example
///
/// ```
/// # use chrust::io::{ChrReader, ProgramReader};
/// let program = r#"
///     gcd(0) <=> true.
///     gcd(N) \ gcd(M) <=> N <= M, L is M mod N | gcd(L).
///     gcd(94017), gcd(1155), gcd(2035).
/// "#;
/// let program = ChrReader::default().read(&mut program.as_bytes()).unwrap();
/// assert_eq!(2, program.rules().len());
/// assert_eq!("rule_2 @ gcd(N) \\ gcd(M) <=> N<=M, L is M mod N | gcd(L).", program.rules()[1].to_string());
/// assert_eq!(3, program.n_goals());
/// ```
#[derive(Default)]
pub struct ChrReader {
    warning_handlers: Vec<WarningHandler>,
}

impl ChrReader {
    fn warn(&self, line: usize, message: String) {
        self.warning_handlers
            .iter()
            .for_each(|h| (h)(line, message.clone()));
    }
}

impl ProgramReader for ChrReader {
    fn read(&self, reader: &mut dyn Read) -> Result<ChrProgram> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("while reading the CHR program")?;
        let tokens = tokenize(&text)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            n_anonymous: 0,
        };
        let mut rules: Vec<Rule> = vec![];
        let mut goals = vec![];
        let mut rule_lines: HashMap<String, usize> = HashMap::new();
        while parser.peek().is_some() {
            let line = parser.line();
            let clause = parser
                .parse_clause(rules.len())
                .with_context(|| format!("while reading the clause beginning at line {}", line))?;
            match clause {
                Clause::Goals(g) => goals.push(g),
                Clause::Rule(r) => {
                    for v in singleton_variables(&r) {
                        self.warn(
                            line,
                            format!(r#"singleton variable {} in rule "{}""#, v, r.name()),
                        );
                    }
                    if let Some(first) = rule_lines.get(r.name()) {
                        self.warn(
                            line,
                            format!(
                                r#"rule name "{}" was already used at line {}"#,
                                r.name(),
                                first
                            ),
                        );
                    } else {
                        rule_lines.insert(r.name().to_string(), line);
                    }
                    rules.push(r);
                }
            }
        }
        Ok(ChrProgram::new(rules, goals))
    }

    fn add_warning_handler(&mut self, h: WarningHandler) {
        self.warning_handlers.push(h);
    }
}
