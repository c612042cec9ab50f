#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Decision heuristics: which open literal the solver branches on next.
//!
//! Every policy reads the formula's live-clause view only, so it never sees an assigned
//! variable. Each call to `suggest` counts as a decision, including calls that find
//! nothing to branch on.

use crate::sat::formula::BacktrackableFormula;
use crate::sat::literal::Literal;
use clap::ValueEnum;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::{Debug, Display, Formatter};

pub trait DecisionHeuristic: Debug {
    /// An open literal of some live clause, or `None` when no live clause has one.
    fn suggest<F: BacktrackableFormula>(&mut self, formula: &F) -> Option<Literal>;

    /// Number of `suggest` calls so far.
    fn decisions(&self) -> usize;
}

/// Branches on the first literal of the first live clause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TakeFirst {
    decisions: usize,
}

impl TakeFirst {
    #[must_use]
    pub const fn new() -> Self {
        Self { decisions: 0 }
    }
}

impl DecisionHeuristic for TakeFirst {
    fn suggest<F: BacktrackableFormula>(&mut self, formula: &F) -> Option<Literal> {
        self.decisions += 1;
        formula.live_clauses().find_map(|mut clause| clause.next())
    }

    fn decisions(&self) -> usize {
        self.decisions
    }
}

/// Picks uniformly among the literal occurrences of the live clauses.
#[derive(Debug, Clone)]
pub struct RandomLiteral {
    rng: fastrand::Rng,
    decisions: usize,
}

impl RandomLiteral {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            decisions: 0,
        }
    }
}

impl Default for RandomLiteral {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DecisionHeuristic for RandomLiteral {
    fn suggest<F: BacktrackableFormula>(&mut self, formula: &F) -> Option<Literal> {
        self.decisions += 1;
        let candidates: Vec<Literal> = formula.live_clauses().flatten().collect();
        self.rng.choice(candidates)
    }

    fn decisions(&self) -> usize {
        self.decisions
    }
}

/// Jeroslow-Wang: the literal maximising the sum of `2^-|c|` over the live clauses `c`
/// containing it, where `|c|` counts open literals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JeroslowWang {
    decisions: usize,
}

impl JeroslowWang {
    #[must_use]
    pub const fn new() -> Self {
        Self { decisions: 0 }
    }
}

impl DecisionHeuristic for JeroslowWang {
    fn suggest<F: BacktrackableFormula>(&mut self, formula: &F) -> Option<Literal> {
        self.decisions += 1;

        let mut scores: FxHashMap<Literal, OrderedFloat<f64>> = FxHashMap::default();
        let mut seen = Vec::new();
        for clause in formula.live_clauses() {
            let literals: SmallVec<[Literal; 8]> = clause.collect();
            let weight = 0.5_f64.powi(i32::try_from(literals.len()).unwrap_or(i32::MAX));
            for literal in literals {
                let score = scores.entry(literal).or_insert_with(|| {
                    seen.push(literal);
                    OrderedFloat(0.0)
                });
                score.0 += weight;
            }
        }

        // `max_by_key` keeps the last maximum, so walk backwards to prefer the first seen.
        seen.into_iter().rev().max_by_key(|literal| scores[literal])
    }

    fn decisions(&self) -> usize {
        self.decisions
    }
}

/// Closed set of heuristics, chosen at runtime.
#[derive(Debug, Clone)]
pub enum HeuristicImpls {
    TakeFirst(TakeFirst),
    Random(RandomLiteral),
    JeroslowWang(JeroslowWang),
}

impl Default for HeuristicImpls {
    fn default() -> Self {
        Self::TakeFirst(TakeFirst::new())
    }
}

impl DecisionHeuristic for HeuristicImpls {
    fn suggest<F: BacktrackableFormula>(&mut self, formula: &F) -> Option<Literal> {
        match self {
            Self::TakeFirst(h) => h.suggest(formula),
            Self::Random(h) => h.suggest(formula),
            Self::JeroslowWang(h) => h.suggest(formula),
        }
    }

    fn decisions(&self) -> usize {
        match self {
            Self::TakeFirst(h) => h.decisions(),
            Self::Random(h) => h.decisions(),
            Self::JeroslowWang(h) => h.decisions(),
        }
    }
}

/// Heuristic selectable from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum HeuristicType {
    /// First literal of the first live clause
    #[default]
    TakeFirst,
    /// Random literal of a live clause
    Random,
    /// Literal with the highest Jeroslow-Wang score
    JeroslowWang,
}

impl Display for HeuristicType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TakeFirst => write!(f, "take-first"),
            Self::Random => write!(f, "random"),
            Self::JeroslowWang => write!(f, "jeroslow-wang"),
        }
    }
}

impl HeuristicType {
    /// `seed` is only used by the random heuristic.
    #[must_use]
    pub fn to_impl(self, seed: u64) -> HeuristicImpls {
        match self {
            Self::TakeFirst => HeuristicImpls::TakeFirst(TakeFirst::new()),
            Self::Random => HeuristicImpls::Random(RandomLiteral::new(seed)),
            Self::JeroslowWang => HeuristicImpls::JeroslowWang(JeroslowWang::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::adjacency::AdjacencyListFormula;
    use crate::sat::cnf::CnfFormula;
    use crate::sat::watched::WatchedLiteralsFormula;

    fn lit(value: i32) -> Literal {
        Literal::from_dimacs(value)
    }

    fn adjacency(clauses: Vec<Vec<i32>>) -> AdjacencyListFormula {
        AdjacencyListFormula::new(&CnfFormula::from(clauses))
    }

    #[test]
    fn test_take_first_skips_satisfied_clauses() {
        let mut formula = adjacency(vec![vec![1, 2], vec![-3, 2]]);
        let mut heuristic = TakeFirst::new();
        assert_eq!(heuristic.suggest(&formula), Some(lit(1)));

        formula.assign(lit(1), 1);
        assert_eq!(heuristic.suggest(&formula), Some(lit(-3)));
        assert_eq!(heuristic.decisions(), 2);
    }

    #[test]
    fn test_take_first_skips_falsified_watched_literals() {
        let mut formula = WatchedLiteralsFormula::new(&CnfFormula::from(vec![vec![1, 2, 3]]));
        formula.assign(lit(-1), 1);
        assert_eq!(TakeFirst::new().suggest(&formula), Some(lit(2)));
    }

    #[test]
    fn test_none_still_counts_a_decision() {
        let mut formula = adjacency(vec![vec![1]]);
        formula.unit_propagate(0);
        let mut heuristic = TakeFirst::new();
        assert_eq!(heuristic.suggest(&formula), None);
        assert_eq!(heuristic.decisions(), 1);
    }

    #[test]
    fn test_random_picks_open_literal() {
        let mut formula = adjacency(vec![vec![1, 2, 3], vec![-1, 4], vec![5, -6]]);
        formula.assign(lit(1), 1);
        formula.assign(lit(-5), 1);
        let open = [lit(2), lit(3), lit(4), lit(-6)];

        let mut heuristic = RandomLiteral::new(7);
        for _ in 0..32 {
            let choice = heuristic.suggest(&formula);
            assert!(choice.is_some_and(|l| open.contains(&l)));
        }
        assert_eq!(heuristic.decisions(), 32);
    }

    #[test]
    fn test_random_is_reproducible() {
        let formula = adjacency(vec![vec![1, 2, 3, 4, 5, 6, 7, 8]]);
        let mut a = RandomLiteral::new(42);
        let mut b = RandomLiteral::new(42);
        for _ in 0..16 {
            assert_eq!(a.suggest(&formula), b.suggest(&formula));
        }
    }

    #[test]
    fn test_jeroslow_wang_prefers_short_clauses() {
        let formula = adjacency(vec![vec![1, 2, 3, 6], vec![2, 3, 4, 7], vec![-4, 5]]);
        assert_eq!(JeroslowWang::new().suggest(&formula), Some(lit(-4)));

        let formula = adjacency(vec![vec![2, 3, 4], vec![1, 5, 6], vec![1, 7, 8]]);
        assert_eq!(JeroslowWang::new().suggest(&formula), Some(lit(1)));
    }

    #[test]
    fn test_jeroslow_wang_ties_go_to_first_seen() {
        let formula = adjacency(vec![vec![3, 1], vec![2, 4]]);
        assert_eq!(JeroslowWang::new().suggest(&formula), Some(lit(3)));
    }

    #[test]
    fn test_heuristic_type_builds_matching_impl() {
        assert!(matches!(HeuristicType::TakeFirst.to_impl(0), HeuristicImpls::TakeFirst(_)));
        assert!(matches!(HeuristicType::Random.to_impl(0), HeuristicImpls::Random(_)));
        assert!(matches!(
            HeuristicType::JeroslowWang.to_impl(0),
            HeuristicImpls::JeroslowWang(_)
        ));
        assert_eq!(HeuristicType::JeroslowWang.to_string(), "jeroslow-wang");

        let formula = adjacency(vec![vec![-2, 1]]);
        let mut heuristic = HeuristicType::default().to_impl(0);
        assert_eq!(heuristic.suggest(&formula), Some(lit(-2)));
        assert_eq!(heuristic.decisions(), 1);
    }
}
