#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Backtrackable formula built on per-variable clause lists.
//!
//! Every clause keeps the set of its literals that are not yet falsified. Assigning a
//! literal visits each clause mentioning its variable: clauses containing the literal
//! become satisfied, clauses containing its negation lose that literal. Every removal is
//! logged with its decision level so that backtracking can put it back.
//!
//! Unit propagation rescans all clauses for a unit clause after every forced assignment,
//! which costs O(clauses) per step. `WatchedLiteralsFormula` avoids that scan.

use crate::sat::clause::Clause;
use crate::sat::cnf::{CnfFormula, DecisionLevel};
use crate::sat::formula::BacktrackableFormula;
use crate::sat::literal::Literal;
use itertools::Itertools;
use log::trace;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct AdjacencyClause {
    /// Literals not falsified so far.
    live: SmallVec<[Literal; 8]>,
    /// `(level, position, literal)` for every literal removed from `live`, oldest first.
    removed: Vec<(DecisionLevel, usize, Literal)>,
    satisfied_at: Option<DecisionLevel>,
}

impl AdjacencyClause {
    fn new(clause: &Clause) -> Self {
        Self {
            live: clause.iter().copied().unique().collect(),
            removed: Vec::new(),
            satisfied_at: None,
        }
    }

    const fn is_satisfied(&self) -> bool {
        self.satisfied_at.is_some()
    }

    fn is_unsatisfiable(&self) -> bool {
        !self.is_satisfied() && self.live.is_empty()
    }

    fn is_unit(&self) -> bool {
        !self.is_satisfied() && self.live.len() == 1
    }

    fn assign(&mut self, literal: Literal, level: DecisionLevel) {
        if !self.is_satisfied() && self.live.contains(&literal) {
            self.satisfied_at = Some(level);
            return;
        }

        let opposite = literal.negate();
        if let Some(position) = self.live.iter().position(|&l| l == opposite) {
            self.live.remove(position);
            self.removed.push((level, position, opposite));
        }
    }

    fn backtrack(&mut self, level: DecisionLevel) {
        // Reinserting in reverse removal order restores the original literal order.
        while let Some(&(removed_at, position, literal)) = self.removed.last() {
            if removed_at <= level {
                break;
            }
            self.removed.pop();
            self.live.insert(position, literal);
        }

        if self.satisfied_at.is_some_and(|at| at > level) {
            self.satisfied_at = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdjacencyListFormula {
    clauses: Vec<AdjacencyClause>,
    /// Clause indices per variable index.
    occurrences: Vec<SmallVec<[usize; 6]>>,
    /// Literals fixed at each decision level, indexed by level.
    assigned: Vec<Vec<Literal>>,
    unsatisfiable_at: Option<DecisionLevel>,
    unit_propagation_steps: usize,
}

impl AdjacencyListFormula {
    fn find_unit_literal(&self) -> Option<Literal> {
        self.clauses
            .iter()
            .find(|clause| clause.is_unit())
            .map(|clause| clause.live[0])
    }
}

impl BacktrackableFormula for AdjacencyListFormula {
    fn new(cnf: &CnfFormula) -> Self {
        let mut occurrences = vec![SmallVec::new(); cnf.num_vars()];
        let mut clauses = Vec::with_capacity(cnf.len());
        let mut unsatisfiable_at = None;

        for (i, clause) in cnf.iter().enumerate() {
            let wrapped = AdjacencyClause::new(clause);
            for var in wrapped.live.iter().map(|l| l.variable()).unique() {
                occurrences[var.index()].push(i);
            }
            if wrapped.is_unsatisfiable() {
                unsatisfiable_at = Some(0);
            }
            clauses.push(wrapped);
        }

        Self {
            clauses,
            occurrences,
            assigned: Vec::new(),
            unsatisfiable_at,
            unit_propagation_steps: 0,
        }
    }

    fn assign(&mut self, literal: Literal, level: DecisionLevel) {
        let slot = level as usize;
        if self.assigned.len() <= slot {
            self.assigned.resize_with(slot + 1, Vec::new);
        }
        self.assigned[slot].push(literal);

        for &i in &self.occurrences[literal.variable().index()] {
            let clause = &mut self.clauses[i];
            clause.assign(literal, level);
            if clause.is_unsatisfiable() {
                trace!("clause {i} falsified by {literal} at level {level}");
                self.unsatisfiable_at.get_or_insert(level);
            }
        }
    }

    fn unit_propagate(&mut self, level: DecisionLevel) {
        while !self.is_unsatisfiable() {
            let Some(literal) = self.find_unit_literal() else {
                break;
            };
            self.assign(literal, level);
            self.unit_propagation_steps += 1;
        }
    }

    fn backtrack(&mut self, level: DecisionLevel) {
        let keep = level as usize + 1;
        if self.assigned.len() > keep {
            for literals in self.assigned.drain(keep..) {
                for literal in literals {
                    for &i in &self.occurrences[literal.variable().index()] {
                        self.clauses[i].backtrack(level);
                    }
                }
            }
        }

        if self.unsatisfiable_at.is_some_and(|at| at > level) {
            self.unsatisfiable_at = None;
        }
    }

    fn is_satisfied(&self) -> bool {
        self.clauses.iter().all(AdjacencyClause::is_satisfied)
    }

    fn is_unsatisfiable(&self) -> bool {
        self.unsatisfiable_at.is_some()
    }

    fn unit_propagation_steps(&self) -> usize {
        self.unit_propagation_steps
    }

    fn assignment(&self) -> impl Iterator<Item = Literal> + '_ {
        self.assigned.iter().flatten().copied()
    }

    fn live_clauses(&self) -> impl Iterator<Item = impl Iterator<Item = Literal> + '_> + '_ {
        self.clauses
            .iter()
            .filter(|clause| !clause.is_satisfied() && !clause.live.is_empty())
            .map(|clause| clause.live.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: i32) -> Literal {
        Literal::from_dimacs(value)
    }

    fn formula(clauses: Vec<Vec<i32>>) -> AdjacencyListFormula {
        AdjacencyListFormula::new(&CnfFormula::from(clauses))
    }

    fn live(formula: &AdjacencyListFormula) -> Vec<Vec<i32>> {
        formula
            .live_clauses()
            .map(|c| c.map(Literal::to_dimacs).collect())
            .collect()
    }

    #[test]
    fn test_assign_satisfies_and_shrinks() {
        let mut f = formula(vec![vec![1, 2], vec![-1, 3], vec![2, 3]]);
        f.assign(lit(1), 1);
        assert_eq!(live(&f), vec![vec![3], vec![2, 3]]);
        assert!(!f.is_satisfied());
        assert!(!f.is_unsatisfiable());
    }

    #[test]
    fn test_conflict_records_level() {
        let mut f = formula(vec![vec![1, 2], vec![-1]]);
        f.assign(lit(-2), 1);
        assert!(!f.is_unsatisfiable());
        f.assign(lit(1), 2);
        assert!(f.is_unsatisfiable());
        assert_eq!(f.unsatisfiable_at, Some(2));

        f.backtrack(1);
        assert!(!f.is_unsatisfiable());
        assert_eq!(live(&f), vec![vec![1], vec![-1]]);
    }

    #[test]
    fn test_backtrack_restores_literal_order() {
        let mut f = formula(vec![vec![1, 2, 3, 4]]);
        f.assign(lit(-3), 1);
        f.assign(lit(-1), 2);
        f.assign(lit(-4), 2);
        assert_eq!(live(&f), vec![vec![2]]);

        f.backtrack(1);
        assert_eq!(live(&f), vec![vec![1, 2, 4]]);
        f.backtrack(0);
        assert_eq!(live(&f), vec![vec![1, 2, 3, 4]]);
        assert_eq!(f.assignment().count(), 0);
    }

    #[test]
    fn test_backtrack_clears_satisfaction_above_level() {
        let mut f = formula(vec![vec![1, 2]]);
        f.assign(lit(-1), 1);
        f.assign(lit(2), 2);
        assert!(f.is_satisfied());
        f.backtrack(1);
        assert!(!f.is_satisfied());
        assert_eq!(live(&f), vec![vec![2]]);
    }

    #[test]
    fn test_unit_propagate_chains() {
        let mut f = formula(vec![vec![1], vec![-1, 2], vec![-2, 3]]);
        f.unit_propagate(0);
        assert!(f.is_satisfied());
        assert_eq!(f.unit_propagation_steps(), 3);
        assert_eq!(
            f.assignment().map(Literal::to_dimacs).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_unit_propagate_stops_at_conflict() {
        let mut f = formula(vec![vec![1], vec![-1], vec![2]]);
        f.unit_propagate(0);
        assert!(f.is_unsatisfiable());
        assert_eq!(f.unit_propagation_steps(), 1);
    }

    #[test]
    fn test_empty_clause_survives_backtrack() {
        let mut f = formula(vec![vec![1, 2], vec![]]);
        assert!(f.is_unsatisfiable());
        f.assign(lit(1), 1);
        f.backtrack(0);
        assert!(f.is_unsatisfiable());
    }

    #[test]
    fn test_duplicate_literals_collapse() {
        let mut f = formula(vec![vec![1, 1, 2]]);
        assert_eq!(live(&f), vec![vec![1, 2]]);
        f.assign(lit(-1), 1);
        assert_eq!(live(&f), vec![vec![2]]);
        f.unit_propagate(1);
        assert!(f.is_satisfied());
    }

    #[test]
    fn test_assignment_is_level_major() {
        let mut f = formula(vec![vec![1, 2, 3, 4]]);
        f.assign(lit(-2), 2);
        f.assign(lit(-1), 1);
        f.assign(lit(3), 2);
        assert_eq!(
            f.assignment().map(Literal::to_dimacs).collect::<Vec<_>>(),
            vec![-1, -2, 3]
        );
    }
}
