#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Tseitin translation of NNF formulas into equisatisfiable CNF.
//!
//! Every `and`, `or` and `not` node gets a fresh unnamed variable `t` standing for the
//! subformula; a variable node stands for itself. With children `l` and `r`:
//!
//! | node      | `t => node`       | `node => t` (equivalence only) |
//! |-----------|-------------------|--------------------------------|
//! | `and l r` | `¬t ∨ l`, `¬t ∨ r` | `¬l ∨ ¬r ∨ t`                  |
//! | `or l r`  | `¬t ∨ l ∨ r`       | `¬l ∨ t`, `¬r ∨ t`             |
//! | `not x`   | `¬t ∨ ¬x`          | `t ∨ x`                        |
//!
//! followed by the unit clause asserting the root. Since NNF has no negation above
//! compound nodes, the implications alone already give an equisatisfiable formula.

use crate::encoding::nnf::{NnfError, NnfNode, NnfParser, NnfTree};
use crate::sat::clause::Clause;
use crate::sat::cnf::{CnfFormula, VariableTable};
use crate::sat::literal::Variable;
use log::debug;

/// Result of a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub cnf: CnfFormula,
    /// The variable whose truth is asserted by the final unit clause.
    pub root: Variable,
    /// The parsed formula; its variables are the first ones of `cnf`.
    pub tree: NnfNode,
    pub num_original: usize,
}

impl Translation {
    /// Variables of the input formula, numbered before every auxiliary variable.
    #[allow(clippy::cast_possible_truncation)]
    pub fn original_variables(&self) -> impl Iterator<Item = Variable> + '_ {
        (0..self.num_original).map(|i| Variable::new(i as u32))
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn auxiliary_variables(&self) -> impl Iterator<Item = Variable> + '_ {
        (self.num_original..self.cnf.num_vars()).map(|i| Variable::new(i as u32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TseitinTranslator {
    use_equivalence: bool,
}

struct Encoder<'a> {
    variables: &'a mut VariableTable,
    clauses: Vec<Clause>,
    use_equivalence: bool,
}

impl Encoder<'_> {
    fn variable_for(&mut self, node: &NnfNode) -> Variable {
        match node {
            NnfNode::Variable(var) => *var,
            _ => self.variables.new_variable(None),
        }
    }

    fn encode(&mut self, node: &NnfNode, t: Variable) {
        match node {
            NnfNode::Variable(_) => {}
            NnfNode::Negation(x) => {
                if self.use_equivalence {
                    self.clauses.push(Clause::new([t.positive(), x.positive()]));
                }
                self.clauses.push(Clause::new([t.negative(), x.negative()]));
            }
            NnfNode::And(left, right) => {
                let l = self.variable_for(left);
                let r = self.variable_for(right);
                if self.use_equivalence {
                    self.clauses
                        .push(Clause::new([l.negative(), r.negative(), t.positive()]));
                }
                self.clauses.push(Clause::new([t.negative(), l.positive()]));
                self.clauses.push(Clause::new([t.negative(), r.positive()]));
                self.encode(left, l);
                self.encode(right, r);
            }
            NnfNode::Or(left, right) => {
                let l = self.variable_for(left);
                let r = self.variable_for(right);
                if self.use_equivalence {
                    self.clauses.push(Clause::new([l.negative(), t.positive()]));
                    self.clauses.push(Clause::new([r.negative(), t.positive()]));
                }
                self.clauses
                    .push(Clause::new([t.negative(), l.positive(), r.positive()]));
                self.encode(left, l);
                self.encode(right, r);
            }
        }
    }
}

impl TseitinTranslator {
    #[must_use]
    pub const fn new(use_equivalence: bool) -> Self {
        Self { use_equivalence }
    }

    /// Parses `input` as NNF and translates it.
    ///
    /// # Errors
    ///
    /// Any `NnfError` from parsing.
    pub fn translate_str(&self, input: &str) -> Result<Translation, NnfError> {
        Ok(self.translate(NnfParser::parse(input)?))
    }

    #[must_use]
    pub fn translate(&self, tree: NnfTree) -> Translation {
        let (node, mut variables) = tree.into_parts();
        let num_original = variables.len();

        let mut encoder = Encoder {
            variables: &mut variables,
            clauses: Vec::new(),
            use_equivalence: self.use_equivalence,
        };
        let root = encoder.variable_for(&node);
        encoder.encode(&node, root);
        let mut clauses = encoder.clauses;
        clauses.push(Clause::new([root.positive()]));

        debug!(
            "translated {num_original} variables into {} clauses over {} variables",
            clauses.len(),
            variables.len()
        );
        Translation {
            cnf: CnfFormula::from_parts(variables, clauses),
            root,
            tree: node,
            num_original,
        }
    }
}
