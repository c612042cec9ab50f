#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The DPLL search driver.
//!
//! `Solver` runs the classic Davis-Putnam-Logemann-Loveland search over any
//! `BacktrackableFormula`:
//!
//! 1.  **Unit propagation** at the current decision level `d`.
//! 2.  If the formula is satisfied the search ends with success; if it is
//!     unsatisfiable this branch fails and the caller backtracks.
//! 3.  **Decision:** the heuristic suggests a literal `l`, which is assigned at `d + 1`
//!     and searched.
//! 4.  If that branch fails, the formula is **backtracked** to `d`, `¬l` is assigned at
//!     `d + 1` and searched instead. If both branches fail, the failure is passed up.
//!
//! There is no clause learning and no non-chronological backtracking: every decision
//! tries its literal and then the negation, exactly once each.
//!
//! The search is written as a loop over an explicit stack of `(level, literal, phase)`
//! frames instead of recursion, so its depth is bounded by heap memory only.

use crate::sat::cnf::{CnfFormula, DecisionLevel};
use crate::sat::formula::{BacktrackableFormula, FormulaImpls, Representation};
use crate::sat::heuristic::{DecisionHeuristic, TakeFirst};
use crate::sat::literal::Literal;
use log::{debug, trace, warn};

/// Counters describing one finished search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SolutionStats {
    /// Branching decisions requested from the heuristic.
    pub decisions: usize,
    /// Assignments forced by unit propagation.
    pub unit_propagation_steps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// The decided literal itself is being searched.
    Positive,
    /// The negation is being searched; failure exhausts the frame.
    Negative,
}

/// One pending decision: `literal` was decided at `level + 1` from a node at `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    level: DecisionLevel,
    literal: Literal,
    phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Start a search node at this level.
    Enter(DecisionLevel),
    /// The node just finished; `true` unless it ended unsatisfiable.
    Return(bool),
}

/// A DPLL solver, generic over the decision heuristic.
///
/// A solver owns its heuristic and with it the decision counter, so reuse a solver
/// across formulas only when cumulative counts are wanted.
#[derive(Debug, Clone, Default)]
pub struct Solver<H: DecisionHeuristic = TakeFirst> {
    heuristic: H,
}

impl Solver<TakeFirst> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heuristic: TakeFirst::new(),
        }
    }
}

impl<H: DecisionHeuristic> Solver<H> {
    #[must_use]
    pub const fn with_heuristic(heuristic: H) -> Self {
        Self { heuristic }
    }

    #[must_use]
    pub const fn heuristic(&self) -> &H {
        &self.heuristic
    }

    #[must_use]
    pub fn decisions_count(&self) -> usize {
        self.heuristic.decisions()
    }

    /// Wraps `cnf` in a fresh `F` and searches it.
    ///
    /// The searched formula is returned as is: read `is_satisfied`,
    /// `is_unsatisfiable` and `assignment` from it.
    pub fn solve<F: BacktrackableFormula>(&mut self, cnf: &CnfFormula) -> F {
        let mut formula = F::new(cnf);
        self.search(&mut formula);
        formula
    }

    /// Like `solve`, with the representation picked at runtime.
    pub fn solve_with(&mut self, cnf: &CnfFormula, representation: Representation) -> FormulaImpls {
        debug!(
            "solving {} clauses over {} variables using {representation}",
            cnf.len(),
            cnf.num_vars()
        );
        let mut formula = FormulaImpls::with_representation(cnf, representation);
        let satisfiable = self.search(&mut formula);
        debug!(
            "search finished: {} after {} decisions and {} propagation steps",
            if satisfiable { "satisfiable" } else { "unsatisfiable" },
            self.decisions_count(),
            formula.unit_propagation_steps()
        );
        formula
    }

    /// Runs the search on `formula`, starting at decision level 0.
    ///
    /// Returns `false` when the search ended unsatisfiable. `formula` must not have been
    /// assigned above level 0.
    pub fn search<F: BacktrackableFormula>(&mut self, formula: &mut F) -> bool {
        let mut frames: Vec<Frame> = Vec::new();
        let mut step = Step::Enter(0);

        loop {
            step = match step {
                Step::Enter(level) => self.enter(formula, level, &mut frames),
                Step::Return(result) => {
                    let Some(frame) = frames.last_mut() else {
                        return result;
                    };

                    if result || frame.phase == Phase::Negative {
                        frames.pop();
                        Step::Return(result)
                    } else {
                        let negated = frame.literal.negate();
                        trace!("backtrack to {}, trying {negated}", frame.level);
                        formula.backtrack(frame.level);
                        formula.assign(negated, frame.level + 1);
                        frame.phase = Phase::Negative;
                        Step::Enter(frame.level + 1)
                    }
                }
            };
        }
    }

    fn enter<F: BacktrackableFormula>(
        &mut self,
        formula: &mut F,
        level: DecisionLevel,
        frames: &mut Vec<Frame>,
    ) -> Step {
        formula.unit_propagate(level);

        if formula.is_satisfied() {
            return Step::Return(true);
        }
        if formula.is_unsatisfiable() {
            return Step::Return(false);
        }

        let Some(literal) = self.heuristic.suggest(formula) else {
            warn!("no open literal at level {level} although the formula is undecided");
            return Step::Return(true);
        };

        trace!("decide {literal} at level {}", level + 1);
        formula.assign(literal, level + 1);
        frames.push(Frame {
            level,
            literal,
            phase: Phase::Positive,
        });
        Step::Enter(level + 1)
    }

    #[must_use]
    pub fn stats<F: BacktrackableFormula>(&self, formula: &F) -> SolutionStats {
        SolutionStats {
            decisions: self.decisions_count(),
            unit_propagation_steps: formula.unit_propagation_steps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::adjacency::AdjacencyListFormula;
    use crate::sat::assignment::Assignment;
    use crate::sat::heuristic::HeuristicType;
    use crate::sat::literal::Variable;
    use crate::sat::watched::WatchedLiteralsFormula;

    const REPRESENTATIONS: [Representation; 2] =
        [Representation::AdjacencyList, Representation::WatchedLiterals];

    fn lit(value: i32) -> Literal {
        Literal::from_dimacs(value)
    }

    fn model<F: BacktrackableFormula>(cnf: &CnfFormula, formula: &F) -> Assignment {
        Assignment::from_literals(cnf.num_vars(), formula.assignment())
    }

    fn random_cnf(rng: &mut fastrand::Rng, max_vars: i32, max_clauses: usize) -> CnfFormula {
        let num_vars = rng.i32(1..=max_vars);
        let clauses = (0..rng.usize(0..=max_clauses))
            .map(|_| {
                (0..rng.usize(1..=3))
                    .map(|_| {
                        let var = rng.i32(1..=num_vars);
                        if rng.bool() { var } else { -var }
                    })
                    .collect()
            })
            .collect::<Vec<Vec<i32>>>();
        CnfFormula::from(clauses)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn brute_force_satisfiable(cnf: &CnfFormula) -> bool {
        let n = cnf.num_vars();
        (0..1_u32 << n).any(|mask| {
            let literals = (0..n).map(|i| Variable::new(i as u32).literal((mask >> i) & 1 == 1));
            cnf.verify(&Assignment::from_literals(n, literals))
        })
    }

    #[test]
    fn test_contradicting_units_are_unsat() {
        let cnf = CnfFormula::from(vec![vec![1], vec![-1]]);
        for representation in REPRESENTATIONS {
            let mut solver = Solver::new();
            let formula = solver.solve_with(&cnf, representation);
            assert!(formula.is_unsatisfiable());
            assert!(!formula.is_satisfied());
            assert_eq!(solver.decisions_count(), 0);
        }
    }

    #[test]
    fn test_single_binary_clause_is_sat() {
        let cnf = CnfFormula::from(vec![vec![1, 2]]);
        for representation in REPRESENTATIONS {
            let mut solver = Solver::new();
            let formula = solver.solve_with(&cnf, representation);
            assert!(formula.is_satisfied());
            let model = model(&cnf, &formula);
            assert!(model.literal_value(lit(1)) == Some(true) || model.literal_value(lit(2)) == Some(true));
            assert_eq!(solver.decisions_count(), 1);
        }
    }

    #[test]
    fn test_propagation_alone_solves_chain() {
        let cnf = CnfFormula::from(vec![vec![1], vec![-1, 2]]);
        for representation in REPRESENTATIONS {
            let mut solver = Solver::new();
            let formula = solver.solve_with(&cnf, representation);
            assert!(formula.is_satisfied());
            assert_eq!(
                formula.assignment().collect::<Vec<_>>(),
                vec![lit(1), lit(2)]
            );
            assert_eq!(
                solver.stats(&formula),
                SolutionStats {
                    decisions: 0,
                    unit_propagation_steps: 2
                }
            );
        }
    }

    #[test]
    fn test_empty_clause_is_unsat_without_decisions() {
        let cnf = CnfFormula::from(vec![vec![]]);
        for representation in REPRESENTATIONS {
            let mut solver = Solver::new();
            let formula = solver.solve_with(&cnf, representation);
            assert!(formula.is_unsatisfiable());
            assert_eq!(solver.decisions_count(), 0);
        }
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let cnf = CnfFormula::default();
        for representation in REPRESENTATIONS {
            let mut solver = Solver::new();
            let formula = solver.solve_with(&cnf, representation);
            assert!(formula.is_satisfied());
            assert_eq!(formula.assignment().count(), 0);
        }
    }

    #[test]
    fn test_both_branches_explored() {
        // Deciding 1 first fails; only -1 leads to a model.
        let cnf = CnfFormula::from(vec![vec![1, 2], vec![-1, 3], vec![-1, -3], vec![-2, 4]]);
        let mut solver = Solver::new();
        let formula: AdjacencyListFormula = solver.solve(&cnf);
        assert!(formula.is_satisfied());
        let model = model(&cnf, &formula);
        assert!(cnf.verify(&model));
        assert_eq!(model.literal_value(lit(1)), Some(false));
    }

    #[test]
    fn test_generic_solve_matches_dispatch() {
        let cnf = CnfFormula::from(vec![vec![1, -2], vec![2, 3], vec![-1, -3], vec![-3, 2]]);
        let mut by_type = Solver::new();
        let watched: WatchedLiteralsFormula = by_type.solve(&cnf);
        let mut by_value = Solver::new();
        let dispatched = by_value.solve_with(&cnf, Representation::WatchedLiterals);

        assert_eq!(watched.is_satisfied(), dispatched.is_satisfied());
        assert_eq!(
            watched.assignment().collect::<Vec<_>>(),
            dispatched.assignment().collect::<Vec<_>>()
        );
        assert_eq!(by_type.decisions_count(), by_value.decisions_count());
    }

    #[test]
    fn test_verdicts_match_brute_force() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..300 {
            let cnf = random_cnf(&mut rng, 6, 14);
            let expected = brute_force_satisfiable(&cnf);

            for representation in REPRESENTATIONS {
                for heuristic in [HeuristicType::TakeFirst, HeuristicType::Random, HeuristicType::JeroslowWang] {
                    let mut solver = Solver::with_heuristic(heuristic.to_impl(rng.u64(..)));
                    let formula = solver.solve_with(&cnf, representation);

                    assert_eq!(formula.is_satisfied(), expected, "{representation} {heuristic}\n{cnf}");
                    assert_eq!(formula.is_unsatisfiable(), !expected, "{representation} {heuristic}\n{cnf}");
                    if expected {
                        assert!(cnf.verify(&model(&cnf, &formula)), "{representation} {heuristic}\n{cnf}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_representations_agree_on_larger_formulas() {
        let mut rng = fastrand::Rng::with_seed(17);
        for _ in 0..40 {
            let cnf = random_cnf(&mut rng, 30, 130);
            let mut adjacency_solver = Solver::new();
            let adjacency: AdjacencyListFormula = adjacency_solver.solve(&cnf);
            let mut watched_solver = Solver::new();
            let watched: WatchedLiteralsFormula = watched_solver.solve(&cnf);

            assert_eq!(adjacency.is_satisfied(), watched.is_satisfied(), "{cnf}");
            assert_eq!(adjacency.is_unsatisfiable(), watched.is_unsatisfiable(), "{cnf}");
            if adjacency.is_satisfied() {
                assert!(cnf.verify(&model(&cnf, &adjacency)));
                assert!(cnf.verify(&model(&cnf, &watched)));
            }
        }
    }

    fn live_view<F: BacktrackableFormula>(formula: &F) -> Vec<Vec<Literal>> {
        formula.live_clauses().map(Iterator::collect).collect()
    }

    /// Assigns a few random open variables at `level`, then propagates.
    fn assign_random<F: BacktrackableFormula>(
        rng: &mut fastrand::Rng,
        formula: &mut F,
        cnf: &CnfFormula,
        level: DecisionLevel,
    ) {
        for _ in 0..rng.usize(1..=2) {
            let assigned = model(cnf, formula);
            let open: Vec<Variable> = cnf.variables().iter().filter(|&v| assigned[v].is_unassigned()).collect();
            let Some(var) = rng.choice(open) else {
                return;
            };
            formula.assign(var.literal(rng.bool()), level);
        }
        formula.unit_propagate(level);
    }

    fn check_backtrack_restores<F: BacktrackableFormula>(seed: u64) {
        let mut rng = fastrand::Rng::with_seed(seed);
        for _ in 0..200 {
            let cnf = random_cnf(&mut rng, 10, 30);
            let mut formula = F::new(&cnf);
            formula.unit_propagate(0);

            let base = rng.u32(0..3);
            for level in 1..=base {
                if formula.is_unsatisfiable() {
                    break;
                }
                assign_random(&mut rng, &mut formula, &cnf, level);
            }
            if formula.is_unsatisfiable() {
                continue;
            }

            let live = live_view(&formula);
            let assignment: Vec<Literal> = formula.assignment().collect();
            let satisfied = formula.is_satisfied();

            for level in base + 1..=base + 3 {
                if formula.is_unsatisfiable() {
                    break;
                }
                assign_random(&mut rng, &mut formula, &cnf, level);
            }
            formula.backtrack(base);

            assert_eq!(live_view(&formula), live, "{cnf}");
            assert_eq!(formula.assignment().collect::<Vec<_>>(), assignment, "{cnf}");
            assert_eq!(formula.is_satisfied(), satisfied, "{cnf}");
            assert!(!formula.is_unsatisfiable(), "{cnf}");
        }
    }

    #[test]
    fn test_backtrack_undoes_adjacency_assignments() {
        check_backtrack_restores::<AdjacencyListFormula>(3);
    }

    #[test]
    fn test_backtrack_undoes_watched_assignments() {
        check_backtrack_restores::<WatchedLiteralsFormula>(3);
    }

    #[test]
    fn test_many_decisions() {
        let clauses = (1..=4000).map(|i| vec![2 * i - 1, 2 * i]).collect::<Vec<_>>();
        let cnf = CnfFormula::from(clauses);
        let mut solver = Solver::new();
        let formula: WatchedLiteralsFormula = solver.solve(&cnf);
        assert!(formula.is_satisfied());
        assert_eq!(solver.decisions_count(), 4000);
    }
}
