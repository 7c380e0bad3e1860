//! Tseitin encoding of [`Expr`] into CNF.
//!
//! Every connective gets a fresh gate literal constrained to be equivalent
//! to its inputs, so a tracked formula becomes one selector clause
//! `!selector | root` plus gate definitions that are always satisfiable on
//! their own.

use std::collections::HashMap;

use varisat::{CnfFormula, ExtendFormula, Lit};

use crate::logic::Expr;

pub(super) struct Encoder {
    cnf: CnfFormula,
    symbols: HashMap<String, Lit>,
    order: Vec<String>,
    truth: Option<Lit>,
}

impl Encoder {
    pub(super) fn new() -> Self {
        Self {
            cnf: CnfFormula::new(),
            symbols: HashMap::new(),
            order: Vec::new(),
            truth: None,
        }
    }

    /// Literal for a symbol, declared on first use.
    pub(super) fn symbol(&mut self, name: &str) -> Lit {
        if let Some(lit) = self.symbols.get(name) {
            return *lit;
        }
        let lit = self.cnf.new_lit();
        self.symbols.insert(name.to_string(), lit);
        self.order.push(name.to_string());
        lit
    }

    pub(super) fn encode(&mut self, expr: &Expr) -> Lit {
        match expr {
            Expr::Const(b) => {
                let truth = self.truth();
                if *b {
                    truth
                } else {
                    !truth
                }
            }
            Expr::Var(name) => self.symbol(name),
            Expr::Not(inner) => !self.encode(inner),
            Expr::And(items) => {
                let inputs: Vec<Lit> = items.iter().map(|e| self.encode(e)).collect();
                let gate = self.cnf.new_lit();
                let mut back = vec![gate];
                for &input in &inputs {
                    self.cnf.add_clause(&[!gate, input]);
                    back.push(!input);
                }
                self.cnf.add_clause(&back);
                gate
            }
            Expr::Or(items) => {
                let inputs: Vec<Lit> = items.iter().map(|e| self.encode(e)).collect();
                let gate = self.cnf.new_lit();
                let mut forward = vec![!gate];
                for &input in &inputs {
                    self.cnf.add_clause(&[gate, !input]);
                    forward.push(input);
                }
                self.cnf.add_clause(&forward);
                gate
            }
            Expr::Implies(a, b) => {
                let a = self.encode(a);
                let b = self.encode(b);
                let gate = self.cnf.new_lit();
                self.cnf.add_clause(&[!gate, !a, b]);
                self.cnf.add_clause(&[gate, a]);
                self.cnf.add_clause(&[gate, !b]);
                gate
            }
        }
    }

    /// Fresh selector `s` with clause `!s | root`.
    pub(super) fn guard(&mut self, root: Lit) -> Lit {
        let selector = self.cnf.new_lit();
        self.cnf.add_clause(&[!selector, root]);
        selector
    }

    pub(super) fn clause_count(&self) -> usize {
        self.cnf.len()
    }

    /// The CNF and the symbols in declaration order.
    pub(super) fn finish(self) -> (CnfFormula, Vec<(String, Lit)>) {
        let Self {
            cnf, symbols, order, ..
        } = self;
        let symbols = order
            .into_iter()
            .map(|name| {
                let lit = symbols[&name];
                (name, lit)
            })
            .collect();
        (cnf, symbols)
    }

    fn truth(&mut self) -> Lit {
        if let Some(lit) = self.truth {
            return lit;
        }
        let lit = self.cnf.new_lit();
        self.cnf.add_clause(&[lit]);
        self.truth = Some(lit);
        lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::parse;

    #[test]
    fn test_symbols_are_shared() {
        let mut enc = Encoder::new();
        let a = enc.symbol("a");
        assert_eq!(enc.encode(&Expr::var("a")), a);
        assert_eq!(enc.encode(&parse("Not(a)").unwrap()), !a);
        assert_eq!(enc.clause_count(), 0);
    }

    #[test]
    fn test_gate_clause_counts() {
        let mut enc = Encoder::new();
        enc.encode(&parse("And(a, b, c)").unwrap());
        // three forward clauses plus one backward clause
        assert_eq!(enc.clause_count(), 4);

        let mut enc = Encoder::new();
        enc.encode(&parse("Implies(a, b)").unwrap());
        assert_eq!(enc.clause_count(), 3);
    }

    #[test]
    fn test_constants_share_truth_literal() {
        let mut enc = Encoder::new();
        let t = enc.encode(&Expr::Const(true));
        let f = enc.encode(&Expr::Const(false));
        assert_eq!(t, !f);
        assert_eq!(enc.clause_count(), 1);
    }

    #[test]
    fn test_finish_keeps_declaration_order() {
        let mut enc = Encoder::new();
        enc.symbol("z");
        enc.encode(&parse("Or(a, z)").unwrap());
        let (_, symbols) = enc.finish();
        let names: Vec<_> = symbols.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }
}
