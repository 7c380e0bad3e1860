//! Propositional formulas over named boolean symbols.
//!
//! `logic_form` strings are parsed into [`Expr`] by a small recursive-descent
//! parser. The grammar is closed: anything outside it is a [`ParseError`],
//! never evaluated.
//!
//! ```text
//! formula    := comparison EOF
//! comparison := term (("==" | "!=") bool)?
//! term       := connective "(" comparison ("," comparison)* ")"
//!             | "(" comparison ")"
//!             | bool
//!             | symbol
//! connective := "Not" | "And" | "Or" | "Implies"
//! bool       := "True" | "False" | "true" | "false"
//! symbol     := [A-Za-z0-9_]+
//! ```
//!
//! Nesting is limited to [`MAX_DEPTH`] levels.
//!
//! [`ParseError`]: crate::error::ParseError

mod parser;

use std::collections::BTreeMap;
use std::fmt;

pub use parser::{parse, MAX_DEPTH};

/// A boolean formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Const(bool),
    Var(String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Implies(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Shorthand for a symbol.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Negates, folding double negation and constants.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Const(b) => Self::Const(!b),
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Symbols in first-occurrence order, without duplicates.
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Const(_) => {}
            Self::Var(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Not(inner) => inner.collect_symbols(out),
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
            Self::Implies(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    /// Evaluates under `assignment`. `None` if a symbol is unassigned.
    #[must_use]
    pub fn eval(&self, assignment: &BTreeMap<String, bool>) -> Option<bool> {
        match self {
            Self::Const(b) => Some(*b),
            Self::Var(name) => assignment.get(name).copied(),
            Self::Not(inner) => inner.eval(assignment).map(|v| !v),
            Self::And(items) => items.iter().try_fold(true, |acc, e| Some(acc & e.eval(assignment)?)),
            Self::Or(items) => items.iter().try_fold(false, |acc, e| Some(acc | e.eval(assignment)?)),
            Self::Implies(a, b) => Some(!a.eval(assignment)? || b.eval(assignment)?),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, items: &[Expr]) -> fmt::Result {
            write!(f, "{name}(")?;
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            write!(f, ")")
        }

        match self {
            Self::Const(true) => write!(f, "True"),
            Self::Const(false) => write!(f, "False"),
            Self::Var(name) => write!(f, "{name}"),
            Self::Not(inner) => write!(f, "Not({inner})"),
            Self::And(items) => list(f, "And", items),
            Self::Or(items) => list(f, "Or", items),
            Self::Implies(a, b) => write!(f, "Implies({a}, {b})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_negate_folds() {
        assert_eq!(Expr::var("x").negate().negate(), Expr::var("x"));
        assert_eq!(Expr::Const(true).negate(), Expr::Const(false));
    }

    #[test]
    fn test_symbols_dedup_in_order() {
        let e = Expr::And(vec![
            Expr::var("b"),
            Expr::Implies(Box::new(Expr::var("a")), Box::new(Expr::var("b"))),
        ]);
        assert_eq!(e.symbols(), vec!["b", "a"]);
    }

    #[test]
    fn test_eval() {
        let e = Expr::Implies(Box::new(Expr::var("a")), Box::new(Expr::var("b")));
        assert_eq!(e.eval(&assignment(&[("a", true), ("b", false)])), Some(false));
        assert_eq!(e.eval(&assignment(&[("a", false), ("b", false)])), Some(true));
        assert_eq!(e.eval(&assignment(&[("a", true)])), None);
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let e = parse("Or(a, Not(b), Implies(c, True))").unwrap();
        assert_eq!(e.to_string(), "Or(a, Not(b), Implies(c, True))");
        assert_eq!(parse(&e.to_string()).unwrap(), e);
    }
}
