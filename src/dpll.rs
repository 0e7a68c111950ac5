use std::{collections::BTreeSet, convert::Infallible, fmt};

use rand::{rngs::StdRng, seq::IteratorRandom, SeedableRng};

use crate::{Cnf, Error, Lit, SolverConfig, Var};

/// The literals made true along one search path.
///
/// A literal is only accepted when its negation is absent, so a live
/// assignment never holds both polarities of a variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    lits: BTreeSet<Lit>,
}

impl Assignment {
    pub fn new() -> Assignment {
        Assignment::default()
    }

    /// Returns `false`, leaving `self` untouched, if `!lit` is already true.
    pub fn assign_lit(&mut self, lit: Lit) -> bool {
        if self.lits.contains(&!lit) {
            return false;
        }
        self.lits.insert(lit);
        true
    }

    pub fn contains(&self, lit: Lit) -> bool {
        self.lits.contains(&lit)
    }

    pub fn is_assigned(&self, var: Var) -> bool {
        self.value(var).is_some()
    }

    /// `None` for unassigned vars, including ones no literal can name.
    pub fn value(&self, var: Var) -> Option<bool> {
        let lit = Lit::from_var(var, true).ok()?;
        if self.lits.contains(&lit) {
            Some(true)
        } else if self.lits.contains(&!lit) {
            Some(false)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Lit> + '_ {
        self.lits.iter().copied()
    }

    pub fn true_vars(&self) -> Vec<Var> {
        self.vars(true)
    }

    pub fn false_vars(&self) -> Vec<Var> {
        self.vars(false)
    }

    fn vars(&self, val: bool) -> Vec<Var> {
        self.iter()
            .filter(|lit| lit.is_positive() == val)
            .map(Lit::var)
            .collect()
    }

    fn with(&self, lit: Lit) -> Option<Assignment> {
        let mut assignment = self.clone();
        assignment.assign_lit(lit).then_some(assignment)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lit in self.iter() {
            write!(f, "{} ", lit)?;
        }
        write!(f, "0")
    }
}

/// Counters collected during one search. They never steer the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// search states processed, one per recursive call
    pub recursions: u64,
    /// branches that ended in an empty clause
    pub conflicts: u64,
    pub decisions: u64,
    /// deepest decision level reached, at most the number of variables
    pub max_depth: usize,
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub satisfiable: bool,
    /// One literal per variable of the input when satisfiable, empty otherwise.
    pub assignment: Assignment,
    pub stats: SearchStats,
}

// one pending recursive call
struct State {
    cnf: Cnf,
    assignment: Assignment,
    depth: usize,
}

enum Frame {
    Ready(State),
    // the `x` half of a branch, only committed once `!x` has failed
    Retry { parent: State, lit: Lit },
}

impl Frame {
    fn into_state(self) -> Option<State> {
        match self {
            Frame::Ready(state) => Some(state),
            Frame::Retry { parent, lit } => Some(State {
                cnf: parent.cnf.remove_literal(lit),
                assignment: parent.assignment.with(lit)?,
                depth: parent.depth + 1,
            }),
        }
    }
}

enum Step {
    Satisfied(Assignment),
    Conflict,
    // (state for `!x`, the parent to retry with `x`)
    Branch(State, Frame),
}

type ProgressHook<'a> = Box<dyn FnMut(&SearchStats) + 'a>;
type AbortHook<'a> = Box<dyn FnMut(&SearchStats) -> bool + 'a>;

/// DPLL search over an explicit stack of states.
///
/// Each state is simplified once, then either accepted (no clause left),
/// rejected (an empty clause), or split on a random unassigned variable `x`
/// into `!x` and `x`, explored in that order.
pub struct Solver<'a> {
    config: SolverConfig,
    rng: StdRng,
    progress: Option<ProgressHook<'a>>,
    abort: Option<AbortHook<'a>>,
}

impl Default for Solver<'_> {
    fn default() -> Self {
        Solver::new(SolverConfig::default())
    }
}

impl<'a> Solver<'a> {
    pub fn new(config: SolverConfig) -> Solver<'a> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Solver {
            config,
            rng,
            progress: None,
            abort: None,
        }
    }

    /// Called with the current counters at every recursion.
    pub fn on_progress(mut self, hook: impl FnMut(&SearchStats) + 'a) -> Self {
        self.progress = Some(Box::new(hook));
        self
    }

    /// Checked at the top of every recursion, `true` stops the search.
    pub fn abort_when(mut self, hook: impl FnMut(&SearchStats) -> bool + 'a) -> Self {
        self.abort = Some(Box::new(hook));
        self
    }

    pub fn run(&mut self, cnf: &Cnf) -> Result<SolveResult, Error> {
        let max_recursions = self.config.max_recursions;
        let mut abort = self.abort.take();

        let res = self.search(cnf, |stats| {
            let over_limit = max_recursions.is_some_and(|max| stats.recursions >= max);
            let hooked = abort.as_mut().is_some_and(|hook| hook(stats));
            if over_limit || hooked {
                log::debug!("search aborted: {:?}", stats);
                return Err(Error::Aborted {
                    recursions: stats.recursions,
                });
            }
            Ok(())
        });

        self.abort = abort;
        res
    }

    fn search<E>(
        &mut self,
        cnf: &Cnf,
        mut check: impl FnMut(&SearchStats) -> Result<(), E>,
    ) -> Result<SolveResult, E> {
        let universe = cnf.variables();
        let mut stats = SearchStats::default();
        log::debug!(
            "solving {} clauses over {} variables",
            cnf.num_clause(),
            universe.len()
        );

        let mut stack = vec![Frame::Ready(State {
            cnf: cnf.clone(),
            assignment: Assignment::new(),
            depth: 0,
        })];

        while let Some(frame) = stack.pop() {
            check(&stats)?;
            // a retry whose polarity is already taken can't happen: `x` was unassigned
            let Some(state) = frame.into_state() else {
                stats.conflicts += 1;
                continue;
            };
            self.log_progress(&stats, &state);
            stats.recursions += 1;
            if let Some(hook) = self.progress.as_mut() {
                hook(&stats);
            }

            match self.step(state, &universe, &mut stats) {
                Step::Satisfied(mut assignment) => {
                    // vars dropped along with satisfied clauses take the
                    // same polarity a branch tries first
                    for &var in &universe {
                        if !assignment.is_assigned(var) {
                            assignment.assign_lit(Lit::negative(var));
                        }
                    }
                    debug_assert!(cnf.is_satisfied_by(&assignment));
                    log::debug!("satisfied: {:?}", stats);
                    return Ok(SolveResult {
                        satisfiable: true,
                        assignment,
                        stats,
                    });
                }
                Step::Conflict => stats.conflicts += 1,
                Step::Branch(neg, retry) => {
                    stack.push(retry);
                    stack.push(Frame::Ready(neg));
                }
            }
        }

        log::debug!("unsatisfiable: {:?}", stats);
        Ok(SolveResult {
            satisfiable: false,
            assignment: Assignment::new(),
            stats,
        })
    }

    fn step(
        &mut self,
        state: State,
        universe: &BTreeSet<Var>,
        stats: &mut SearchStats,
    ) -> Step {
        let State {
            cnf,
            mut assignment,
            depth,
        } = state;
        stats.max_depth = stats.max_depth.max(depth);

        // 1. unit propagation and pure literal elimination, one pass
        let (cnf, forced) = cnf.simplify();
        for &lit in &forced {
            if !assignment.assign_lit(lit) {
                log::trace!("forced {} contradicts the assignment", lit);
                return Step::Conflict;
            }
        }

        // 2. terminal states
        if cnf.is_empty() {
            return Step::Satisfied(assignment);
        }
        if cnf.has_empty_clause() {
            log::trace!("conflict at depth {}", depth);
            return Step::Conflict;
        }

        // 3. now that we must make a guess
        let guess = universe
            .iter()
            .copied()
            .filter(|&var| !assignment.is_assigned(var))
            .choose(&mut self.rng);
        // every lit left in cnf is unassigned, so this only fires on a broken invariant
        let Some(var) = guess else {
            log::warn!(
                "no unassigned variable left for {} open clauses",
                cnf.num_clause()
            );
            return Step::Conflict;
        };
        stats.decisions += 1;

        let x = Lit::positive(var);
        log::trace!("depth {}: branch on {}", depth, x);
        let Some(neg) = assignment.with(!x) else {
            return Step::Conflict;
        };
        Step::Branch(
            State {
                cnf: cnf.remove_literal(!x),
                assignment: neg,
                depth: depth + 1,
            },
            Frame::Retry {
                parent: State {
                    cnf,
                    assignment,
                    depth,
                },
                lit: x,
            },
        )
    }

    fn log_progress(&self, stats: &SearchStats, state: &State) {
        let interval = self.config.log_interval;
        if interval > 0 && stats.recursions % interval == 0 {
            log::debug!(
                "recursions: {}, conflicts: {}, assigned: {}, clauses: {}",
                stats.recursions,
                stats.conflicts,
                state.assignment.len(),
                state.cnf.num_clause()
            );
        }
    }
}

/// Decides `cnf` with a default, entropy-seeded [`Solver`].
pub fn solve(cnf: &Cnf) -> SolveResult {
    match Solver::default().search(cnf, |_| Ok::<(), Infallible>(())) {
        Ok(res) => res,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::BTreeSet};

    use proptest::prelude::*;

    use super::{Frame, State};
    use crate::cnf::tests::{assignment, cnf, lits};
    use crate::{
        solve, Assignment, Cnf, Error, Lit, SearchStats, SolveResult, Solver, SolverConfig, Var,
    };

    fn seeded<'a>(seed: u64) -> Solver<'a> {
        Solver::new(SolverConfig::default().seed(seed))
    }

    fn assert_total(f: &Cnf, res: &SolveResult) {
        let vars: BTreeSet<Var> = res.assignment.iter().map(Lit::var).collect();
        assert_eq!(vars, f.variables());
        assert_eq!(res.assignment.len(), vars.len());
    }

    // tries every assignment over the formula's variables
    fn brute_force(f: &Cnf) -> bool {
        let vars: Vec<Var> = f.variables().into_iter().collect();
        (0u64..1 << vars.len()).any(|bits| {
            let mut assignment = Assignment::new();
            for (i, &var) in vars.iter().enumerate() {
                assignment.assign_lit(Lit::from_var(var, bits >> i & 1 == 1).unwrap());
            }
            f.is_satisfied_by(&assignment)
        })
    }

    #[test]
    fn unit_then_pure() {
        let f = cnf(&[&[1, 2], &[-1]]);
        let res = solve(&f);
        assert!(res.satisfiable);
        assert_eq!(res.assignment.iter().collect::<BTreeSet<_>>(), lits(&[-1, 2]));
        assert_eq!(res.stats.recursions, 1);
        assert_eq!(res.stats.decisions, 0);
    }

    #[test]
    fn contradicting_units() {
        let res = solve(&cnf(&[&[1], &[-1]]));
        assert!(!res.satisfiable);
        assert!(res.assignment.is_empty());
        assert_eq!(res.stats.conflicts, 1);
    }

    #[test]
    fn empty_formula() {
        let res = solve(&Cnf::new());
        assert!(res.satisfiable);
        assert!(res.assignment.is_empty());
        assert_eq!(res.stats.max_depth, 0);
    }

    #[test]
    fn empty_clause() {
        let res = solve(&cnf(&[&[]]));
        assert!(!res.satisfiable);
        let res = solve(&cnf(&[&[1, 2], &[]]));
        assert!(!res.satisfiable);
    }

    #[test]
    fn tautology() {
        let f = cnf(&[&[1, -1]]);
        let res = solve(&f);
        assert!(res.satisfiable);
        // the first branch, `-1`, already satisfies the clause
        assert_eq!(res.assignment.iter().collect::<BTreeSet<_>>(), lits(&[-1]));
        assert_eq!(res.stats.decisions, 1);
        assert_eq!(res.stats.recursions, 2);
    }

    #[test]
    fn two_var_unsat() {
        let f = cnf(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
        for seed in 0..8 {
            let res = seeded(seed).run(&f).unwrap();
            assert!(!res.satisfiable);
            assert!(res.stats.conflicts >= 2);
            assert!(res.stats.max_depth <= 2);
        }
    }

    #[test]
    fn test_ok() {
        let f = cnf(&[&[1, -2, -3], &[-1, 2, -3], &[-1, -2, 3], &[1], &[2]]);
        let res = solve(&f);
        assert!(res.satisfiable);
        assert_eq!(res.assignment.true_vars(), vec![1, 2, 3]);
        assert!(res.assignment.false_vars().is_empty());
    }

    #[test]
    fn test_conflict() {
        let f = cnf(&[
            &[-2, -3, -4, 5],
            &[-1, -5, 6],
            &[-5, 7],
            &[-1, -6, -7],
            &[-1, -2, 5],
            &[-1, -3, 5],
            &[-1, -4, 5],
            &[1, 4],
            &[-1, 2, 3, 4, 5, -6],
        ]);
        for seed in 0..16 {
            let res = seeded(seed).run(&f).unwrap();
            assert!(res.satisfiable);
            assert!(f.is_satisfied_by(&res.assignment));
            assert_total(&f, &res);
        }
    }

    #[test]
    fn pigeonhole_unsat() {
        // 3 pigeons, 2 holes: p(i, h) = 2 * i + h + 1
        let p = |i: i32, h: i32| 2 * i + h + 1;
        let mut clauses: Vec<Vec<i32>> = (0..3).map(|i| vec![p(i, 0), p(i, 1)]).collect();
        for h in 0..2 {
            for i in 0..3 {
                for j in i + 1..3 {
                    clauses.push(vec![-p(i, h), -p(j, h)]);
                }
            }
        }
        let f = Cnf::from_dimacs_clauses(&clauses).unwrap();
        let res = seeded(7).run(&f).unwrap();
        assert!(!res.satisfiable);
        assert!(res.stats.max_depth <= f.variables().len());
    }

    #[test]
    fn same_seed_same_answer() {
        let f = cnf(&[
            &[1, 2, 3],
            &[-1, 2],
            &[-2, 3, 4],
            &[-3, -4],
            &[4, 5, -1],
            &[-5, 1],
        ]);
        let a = seeded(42).run(&f).unwrap();
        let b = seeded(42).run(&f).unwrap();
        assert_eq!(a.assignment, b.assignment);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn max_recursions_aborts() {
        let f = cnf(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
        let mut solver = Solver::new(SolverConfig::default().seed(1).max_recursions(2));
        assert_eq!(solver.run(&f).unwrap_err(), Error::Aborted { recursions: 2 });
    }

    #[test]
    fn abort_hook() {
        let f = cnf(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
        let seen = Cell::new(0);
        let mut solver = seeded(3)
            .on_progress(|_| seen.set(seen.get() + 1))
            .abort_when(|stats| stats.conflicts > 0);
        let err = solver.run(&f).unwrap_err();
        assert!(matches!(err, Error::Aborted { .. }));
        assert!(seen.get() >= 2);

        // a hook that never fires leaves the search alone
        let mut solver = seeded(3).abort_when(|_| false);
        assert!(!solver.run(&f).unwrap().satisfiable);
    }

    #[test]
    fn progress_sees_every_recursion() {
        let f = cnf(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
        let last = Cell::new(SearchStats::default());
        let res = seeded(5)
            .on_progress(|stats| last.set(*stats))
            .run(&f)
            .unwrap();
        assert_eq!(last.get().recursions, res.stats.recursions);
    }

    #[test]
    fn assignment_refuses_negation() {
        let mut assignment = Assignment::new();
        assert!(assignment.assign_lit(Lit::positive(1)));
        assert!(!assignment.assign_lit(Lit::negative(1)));
        assert_eq!(assignment.value(1), Some(true));
        assert_eq!(assignment.len(), 1);
        assert_eq!(assignment.value(2), None);
        assert_eq!(assignment.to_string(), "1 0");
    }

    #[test]
    fn retry_commits_positive_polarity() {
        let parent = State {
            cnf: cnf(&[&[1, 2], &[-1, 3], &[2, 3]]),
            assignment: assignment(&[-4]),
            depth: 1,
        };
        let x = Lit::positive(1);
        let state = Frame::Retry { parent, lit: x }.into_state().unwrap();
        assert_eq!(state.cnf, cnf(&[&[3], &[2, 3]]));
        assert_eq!(state.assignment, assignment(&[1, -4]));
        assert_eq!(state.depth, 2);

        // the negation is already true: nothing to retry
        let parent = State {
            cnf: cnf(&[&[1, 2]]),
            assignment: assignment(&[-1]),
            depth: 0,
        };
        assert!(Frame::Retry { parent, lit: x }.into_state().is_none());
    }

    #[test]
    fn first_branch_success_skips_retry() {
        // `-1` satisfies the clause, so the `1` half is never popped
        let res = seeded(0).run(&cnf(&[&[1, -1]])).unwrap();
        assert_eq!(res.stats.recursions, 2);
        assert_eq!(res.stats.conflicts, 0);
    }

    #[test]
    fn value_of_unnameable_var() {
        let a = assignment(&[-1, 2]);
        assert_eq!(a.value(1), Some(false));
        assert_eq!(a.value(0), None);
        assert_eq!(a.value(i32::MAX as Var + 1), None);
        assert_eq!(a.value(u32::MAX), None);
        assert!(!a.is_assigned(0));
        assert_eq!(a.true_vars(), vec![2]);
        assert_eq!(a.false_vars(), vec![1]);
    }

    fn small_cnf() -> impl Strategy<Value = Vec<Vec<i32>>> {
        let lit = (1i32..=5, any::<bool>()).prop_map(|(v, neg)| if neg { -v } else { v });
        prop::collection::vec(prop::collection::vec(lit, 1..=3), 0..=12)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Sat answers come with a total model, unsat answers have none.
        #[test]
        fn agrees_with_brute_force(clauses in small_cnf(), seed in any::<u64>()) {
            let f = Cnf::from_dimacs_clauses(&clauses).unwrap();
            let res = seeded(seed).run(&f).unwrap();
            prop_assert_eq!(res.satisfiable, brute_force(&f));
            prop_assert!(res.stats.max_depth <= f.variables().len());
            if res.satisfiable {
                prop_assert!(f.is_satisfied_by(&res.assignment));
                let vars: BTreeSet<Var> = res.assignment.iter().map(Lit::var).collect();
                prop_assert_eq!(&vars, &f.variables());
                prop_assert_eq!(res.assignment.len(), vars.len());
            }
        }

        #[test]
        fn answer_is_seed_independent(clauses in small_cnf(), a in any::<u64>(), b in any::<u64>()) {
            let f = Cnf::from_dimacs_clauses(&clauses).unwrap();
            prop_assert_eq!(
                seeded(a).run(&f).unwrap().satisfiable,
                seeded(b).run(&f).unwrap().satisfiable
            );
        }
    }
}
