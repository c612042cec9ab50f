//! A DPLL SAT solver with interchangeable backtrackable formula representations.
//!
//! The search itself (`sat::solver`) is written against the `BacktrackableFormula`
//! contract, implemented twice: once with per-variable clause lists that shrink and grow
//! as literals are assigned and undone, and once with two watched literals per clause.
//! Formulas are read from DIMACS files or from propositional formulas in negation normal
//! form, which are brought into CNF by Tseitin translation.

/// The solver core: literals, clauses, the two formula representations, decision
/// heuristics, the search driver and DIMACS input/output.
pub mod sat;

/// NNF parsing and Tseitin translation into CNF.
pub mod encoding;
