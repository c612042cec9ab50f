#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Backtrackable formula using two watched literals per clause.
//!
//! Clauses with two or more literals watch two of their positions, one per watch slot.
//! Assigning a literal only visits the clauses that watch it or its negation. A clause
//! whose watched literal is falsified looks for another open literal to watch; if there
//! is none the clause has become unit (or falsified) and is queued for
//! `unit_propagate`.
//!
//! Clause bodies never shrink. Falsified literals are filtered out lazily when the live
//! clauses are read, and only satisfaction and the assignment trail are undone on
//! backtrack.

use crate::sat::cnf::{CnfFormula, DecisionLevel};
use crate::sat::formula::BacktrackableFormula;
use crate::sat::literal::Literal;
use itertools::Itertools;
use log::trace;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::mem;

/// Outcome of looking for a new position to watch after the current one was falsified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replacement {
    Satisfied,
    Watch(usize),
    Unit,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct WatchedClause {
    literals: SmallVec<[Literal; 8]>,
    /// Watched positions in `literals`, one per slot.
    watched: [usize; 2],
    known_satisfied: bool,
    queued: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedLiteralsFormula {
    clauses: Vec<WatchedClause>,
    /// Per slot, the clauses watching each literal, indexed by `Literal::index`.
    watches: [Vec<Vec<usize>>; 2],
    /// Decision level of every true literal, indexed by `Literal::index`.
    levels: Vec<Option<DecisionLevel>>,
    trail: Vec<Literal>,
    /// Clauses proven satisfied, with the level they were proven at, oldest first.
    satisfied: Vec<(usize, DecisionLevel)>,
    unit_clauses: VecDeque<usize>,
    empty_clause: bool,
    conflict: bool,
    unit_propagation_steps: usize,
    checked_clauses: usize,
}

impl WatchedLiteralsFormula {
    /// Clause visits made while maintaining watches and undoing satisfaction.
    #[must_use]
    pub const fn checked_clauses(&self) -> usize {
        self.checked_clauses
    }

    fn is_true(&self, literal: Literal) -> bool {
        self.levels[literal.index()].is_some()
    }

    fn is_open(&self, literal: Literal) -> bool {
        !self.is_true(literal) && !self.is_true(literal.negate())
    }

    fn mark_satisfied(&mut self, clause: usize, level: DecisionLevel) {
        let wrapped = &mut self.clauses[clause];
        if !wrapped.known_satisfied {
            wrapped.known_satisfied = true;
            self.satisfied.push((clause, level));
        }
    }

    fn enqueue(&mut self, clause: usize) {
        let wrapped = &mut self.clauses[clause];
        if !wrapped.queued {
            wrapped.queued = true;
            self.unit_clauses.push_back(clause);
        }
    }

    fn clear_unit_clauses(&mut self) {
        for clause in self.unit_clauses.drain(..) {
            self.clauses[clause].queued = false;
        }
    }

    /// Scans the clause starting just after the position watched in `slot`, wrapping
    /// around, for a true literal or an open literal the other slot does not watch.
    fn find_replacement(&self, clause: usize, slot: usize) -> Replacement {
        let wrapped = &self.clauses[clause];
        let current = wrapped.watched[slot];
        let other = wrapped.watched[1 - slot];

        for position in (current + 1..wrapped.literals.len()).chain(0..=current) {
            let literal = wrapped.literals[position];
            if self.is_true(literal) {
                return Replacement::Satisfied;
            }
            if position != other && self.is_open(literal) {
                return Replacement::Watch(position);
            }
        }
        Replacement::Unit
    }

    fn update_watches(&mut self, slot: usize, literal: Literal, level: DecisionLevel) {
        let satisfied = mem::take(&mut self.watches[slot][literal.index()]);
        for &clause in &satisfied {
            self.checked_clauses += 1;
            self.mark_satisfied(clause, level);
        }
        self.watches[slot][literal.index()] = satisfied;

        // No replacement is ever the falsified literal, so its list is not touched while taken.
        let falsified = literal.negate();
        let mut watchers = mem::take(&mut self.watches[slot][falsified.index()]);
        watchers.retain(|&clause| {
            self.checked_clauses += 1;
            if self.clauses[clause].known_satisfied {
                return true;
            }

            match self.find_replacement(clause, slot) {
                Replacement::Satisfied => {
                    self.mark_satisfied(clause, level);
                    true
                }
                Replacement::Unit => {
                    trace!("clause {clause} became unit at level {level}");
                    self.enqueue(clause);
                    true
                }
                Replacement::Watch(position) => {
                    let wrapped = &mut self.clauses[clause];
                    wrapped.watched[slot] = position;
                    let watched = wrapped.literals[position];
                    self.watches[slot][watched.index()].push(clause);
                    false
                }
            }
        });
        self.watches[slot][falsified.index()] = watchers;
    }
}

impl BacktrackableFormula for WatchedLiteralsFormula {
    fn new(cnf: &CnfFormula) -> Self {
        let literal_slots = 2 * cnf.num_vars();
        let mut formula = Self {
            clauses: Vec::with_capacity(cnf.len()),
            watches: [vec![Vec::new(); literal_slots], vec![Vec::new(); literal_slots]],
            levels: vec![None; literal_slots],
            ..Self::default()
        };

        for clause in cnf.iter() {
            let index = formula.clauses.len();
            let mut wrapped = WatchedClause {
                literals: clause.iter().copied().unique().collect(),
                ..WatchedClause::default()
            };

            match wrapped.literals.len() {
                0 => formula.empty_clause = true,
                1 => {
                    wrapped.queued = true;
                    formula.unit_clauses.push_back(index);
                }
                _ => {
                    wrapped.watched = [0, 1];
                    formula.watches[0][wrapped.literals[0].index()].push(index);
                    formula.watches[1][wrapped.literals[1].index()].push(index);
                }
            }
            formula.clauses.push(wrapped);
        }

        formula
    }

    fn assign(&mut self, literal: Literal, level: DecisionLevel) {
        self.trail.push(literal);
        self.levels[literal.index()] = Some(level);

        self.update_watches(0, literal, level);
        if !self.is_unsatisfiable() {
            self.update_watches(1, literal, level);
        }
    }

    fn unit_propagate(&mut self, level: DecisionLevel) {
        loop {
            if self.is_unsatisfiable() {
                self.clear_unit_clauses();
                return;
            }
            let Some(clause) = self.unit_clauses.pop_front() else {
                return;
            };
            self.clauses[clause].queued = false;

            if self.clauses[clause].known_satisfied {
                continue;
            }
            if self.clauses[clause].literals.iter().any(|&l| self.is_true(l)) {
                self.mark_satisfied(clause, level);
                continue;
            }

            let open: SmallVec<[Literal; 2]> = self.clauses[clause]
                .literals
                .iter()
                .copied()
                .filter(|&l| self.is_open(l))
                .take(2)
                .collect();

            match open.as_slice() {
                [] => {
                    trace!("clause {clause} falsified at level {level}");
                    self.conflict = true;
                }
                &[literal] => {
                    self.unit_propagation_steps += 1;
                    self.assign(literal, level);
                    self.mark_satisfied(clause, level);
                }
                _ => trace!("clause {clause} is no longer unit"),
            }
        }
    }

    fn backtrack(&mut self, level: DecisionLevel) {
        while let Some(&literal) = self.trail.last() {
            if self.levels[literal.index()].is_some_and(|at| at <= level) {
                break;
            }
            self.trail.pop();
            self.levels[literal.index()] = None;
        }

        while let Some(&(clause, at)) = self.satisfied.last() {
            self.checked_clauses += 1;
            if at <= level {
                break;
            }
            self.satisfied.pop();
            self.clauses[clause].known_satisfied = false;
        }

        self.conflict = false;
    }

    fn is_satisfied(&self) -> bool {
        self.satisfied.len() == self.clauses.len()
    }

    fn is_unsatisfiable(&self) -> bool {
        self.empty_clause || self.conflict
    }

    fn unit_propagation_steps(&self) -> usize {
        self.unit_propagation_steps
    }

    fn assignment(&self) -> impl Iterator<Item = Literal> + '_ {
        self.trail.iter().copied()
    }

    fn live_clauses(&self) -> impl Iterator<Item = impl Iterator<Item = Literal> + '_> + '_ {
        self.clauses
            .iter()
            .filter(|clause| !clause.known_satisfied)
            .map(move |clause| {
                clause
                    .literals
                    .iter()
                    .copied()
                    .filter(move |&l| self.is_open(l))
            })
    }
}
