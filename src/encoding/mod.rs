//! Front end for propositional formulas that are not yet in CNF.

pub mod nnf;
pub mod tseitin;
