#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Variables and literals.
//!
//! A `Variable` is an index into a `VariableTable` (see `cnf.rs`); two variables are the
//! same exactly when their indices are equal. A `Literal` packs a variable and a polarity
//! into one `u32` as `2 * var + (negative as u32)`, so the two literals of a variable are
//! adjacent and negation is a single bit flip.

use core::ops::{Neg, Not};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Variable(u32);

impl Variable {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn positive(self) -> Literal {
        Literal::new(self, true)
    }

    #[must_use]
    pub const fn negative(self) -> Literal {
        Literal::new(self, false)
    }

    #[must_use]
    pub const fn literal(self, polarity: bool) -> Literal {
        Literal::new(self, polarity)
    }

    /// The 1-based number this variable has in DIMACS files.
    #[must_use]
    pub const fn to_dimacs(self) -> u32 {
        self.0 + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal(u32);

impl Literal {
    #[must_use]
    pub const fn new(var: Variable, polarity: bool) -> Self {
        Self((var.0 << 1) | (!polarity as u32))
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        Variable(self.0 >> 1)
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 & 1 == 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        !self.is_positive()
    }

    /// The other literal of the same variable.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Dense index over all literals, usable as a `Vec` slot.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Converts a signed DIMACS literal (`3`, `-3`) into a literal. `value` must be non-zero.
    #[must_use]
    pub const fn from_dimacs(value: i32) -> Self {
        debug_assert!(value != 0);
        Self::new(Variable(value.unsigned_abs() - 1), value > 0)
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_dimacs(self) -> i32 {
        let number = self.variable().to_dimacs() as i32;
        if self.is_positive() { number } else { -number }
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl Neg for &Literal {
    type Output = Literal;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Not for &Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_neg() {
        let x = Variable::new(4);
        assert_eq!(x.positive().negate(), x.negative());
        assert_eq!(x.negative().negate(), x.positive());
        assert_eq!(-x.positive(), x.negative());
        assert_eq!(!x.negative(), x.positive());
    }

    #[test]
    fn test_double_negation_is_identity() {
        for index in 0..16 {
            let var = Variable::new(index);
            for lit in [var.positive(), var.negative()] {
                assert_eq!(lit.negate().negate(), lit);
                assert_eq!(lit.variable(), var);
            }
        }
    }

    #[test]
    fn test_sibling_literals_share_variable() {
        let var = Variable::new(7);
        assert!(var.positive().is_positive());
        assert!(var.negative().is_negative());
        assert_ne!(var.positive(), var.negative());
        assert_eq!(var.positive().index() ^ 1, var.negative().index());
    }

    #[test]
    fn test_dimacs_conversion() {
        assert_eq!(Literal::from_dimacs(1), Variable::new(0).positive());
        assert_eq!(Literal::from_dimacs(-3), Variable::new(2).negative());
        assert_eq!(Literal::from_dimacs(-3).to_dimacs(), -3);
        assert_eq!(Literal::from_dimacs(12).to_string(), "12");
    }
}
