#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Propositional formulas in negation normal form, written in prefix notation.
//!
//! ```text
//! F := VAR | ( and F F ) | ( or F F ) | ( not VAR )
//! ```
//!
//! Tokens are separated by whitespace or parentheses; any token that is not a
//! parenthesis is a variable name where a formula is expected. Every distinct name
//! becomes one variable of the tree's `VariableTable`, in order of first appearance.

use crate::sat::assignment::Assignment;
use crate::sat::cnf::VariableTable;
use crate::sat::literal::Variable;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NnfError {
    #[error("formula ended unexpectedly")]
    UnexpectedEnd,
    #[error("token {position}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("token {position}: unsupported operator `{operator}`")]
    UnsupportedOperator { position: usize, operator: String },
    #[error("formula parsed but {count} tokens remain")]
    TrailingTokens { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NnfNode {
    Variable(Variable),
    /// Negation is only allowed directly above a variable.
    Negation(Variable),
    And(Box<NnfNode>, Box<NnfNode>),
    Or(Box<NnfNode>, Box<NnfNode>),
}

impl NnfNode {
    /// Truth value under `assignment`, reading unassigned variables as false.
    #[must_use]
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        match self {
            Self::Variable(var) => assignment.var_value(*var).unwrap_or(false),
            Self::Negation(var) => !assignment.var_value(*var).unwrap_or(false),
            Self::And(left, right) => left.evaluate(assignment) && right.evaluate(assignment),
            Self::Or(left, right) => left.evaluate(assignment) || right.evaluate(assignment),
        }
    }
}

/// A parsed formula together with the variables it mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NnfTree {
    root: NnfNode,
    variables: VariableTable,
}

impl NnfTree {
    #[must_use]
    pub const fn root(&self) -> &NnfNode {
        &self.root
    }

    #[must_use]
    pub const fn variables(&self) -> &VariableTable {
        &self.variables
    }

    #[must_use]
    pub fn into_parts(self) -> (NnfNode, VariableTable) {
        (self.root, self.variables)
    }

    /// Nodes in pre-order. A negation's variable is part of the negation node.
    pub fn nodes(&self) -> impl Iterator<Item = &NnfNode> {
        let mut stack = vec![&self.root];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let NnfNode::And(left, right) | NnfNode::Or(left, right) = node {
                stack.push(right);
                stack.push(left);
            }
            Some(node)
        })
    }
}

#[derive(Debug, Default)]
pub struct NnfParser<'a> {
    tokens: Vec<&'a str>,
    position: usize,
    variables: VariableTable,
    names: FxHashMap<&'a str, Variable>,
}

impl<'a> NnfParser<'a> {
    /// Parses one formula spanning all of `input`.
    ///
    /// # Errors
    ///
    /// `NnfError` when `input` is not exactly one well-formed formula.
    pub fn parse(input: &'a str) -> Result<NnfTree, NnfError> {
        let mut parser = Self {
            tokens: tokenize(input),
            ..Self::default()
        };

        let root = parser.formula()?;
        let count = parser.tokens.len() - parser.position;
        if count > 0 {
            return Err(NnfError::TrailingTokens { count });
        }

        Ok(NnfTree {
            root,
            variables: parser.variables,
        })
    }

    fn next_token(&mut self) -> Result<&'a str, NnfError> {
        let token = *self.tokens.get(self.position).ok_or(NnfError::UnexpectedEnd)?;
        self.position += 1;
        Ok(token)
    }

    fn unexpected(&self, expected: &'static str, found: &str) -> NnfError {
        NnfError::UnexpectedToken {
            position: self.position - 1,
            expected,
            found: found.to_string(),
        }
    }

    fn variable(&mut self, name: &'a str) -> Variable {
        let variables = &mut self.variables;
        *self
            .names
            .entry(name)
            .or_insert_with(|| variables.new_variable(Some(name.to_string())))
    }

    fn variable_token(&mut self, expected: &'static str) -> Result<Variable, NnfError> {
        match self.next_token()? {
            token @ ("(" | ")") => Err(self.unexpected(expected, token)),
            name => Ok(self.variable(name)),
        }
    }

    fn formula(&mut self) -> Result<NnfNode, NnfError> {
        match self.next_token()? {
            "(" => {}
            ")" => return Err(self.unexpected("a formula", ")")),
            name => return Ok(NnfNode::Variable(self.variable(name))),
        }

        let node = match self.next_token()? {
            "and" => {
                let left = self.formula()?;
                let right = self.formula()?;
                NnfNode::And(Box::new(left), Box::new(right))
            }
            "or" => {
                let left = self.formula()?;
                let right = self.formula()?;
                NnfNode::Or(Box::new(left), Box::new(right))
            }
            "not" => NnfNode::Negation(self.variable_token("a variable")?),
            operator => {
                return Err(NnfError::UnsupportedOperator {
                    position: self.position - 1,
                    operator: operator.to_string(),
                });
            }
        };

        match self.next_token()? {
            ")" => Ok(node),
            token => Err(self.unexpected("`)`", token)),
        }
    }
}

fn tokenize(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for word in input.split_whitespace() {
        let mut rest = word;
        while let Some(at) = rest.find(['(', ')']) {
            if at > 0 {
                tokens.push(&rest[..at]);
            }
            tokens.push(&rest[at..=at]);
            rest = &rest[at + 1..];
        }
        if !rest.is_empty() {
            tokens.push(rest);
        }
    }
    tokens
}
