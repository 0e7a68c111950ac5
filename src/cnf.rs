use std::{
    collections::{BTreeSet, HashSet},
    fmt,
};

use crate::{Assignment, Clause, Error, Lit, Var};

/// A conjunction of clauses.
///
/// Every analysis method takes `&self` and returns a fresh formula, so a
/// search state can keep its own copy while its siblings keep theirs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    pub clauses: Vec<Clause>,
}

impl FromIterator<Clause> for Cnf {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        Cnf {
            clauses: iter.into_iter().collect(),
        }
    }
}

impl Cnf {
    pub fn new() -> Cnf {
        Cnf::default()
    }

    /// Builds a formula from dimacs-style signed integers, rejecting 0.
    pub fn from_dimacs_clauses(value: &[Vec<i32>]) -> Result<Cnf, Error> {
        value
            .iter()
            .enumerate()
            .map(|(clause_id, clause)| {
                Clause::try_from(clause.as_slice()).map_err(|err| match err {
                    Error::InvalidLiteral { lit } => Error::InvalidClause {
                        clause: clause_id,
                        lit,
                    },
                    other => other,
                })
            })
            .collect()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn num_clause(&self) -> usize {
        self.clauses.len()
    }

    // no clause left: satisfied
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    // some clause lost all of its lits: conflict
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    pub fn literals(&self) -> BTreeSet<Lit> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.inner().iter().copied())
            .collect()
    }

    pub fn variables(&self) -> BTreeSet<Var> {
        self.literals().into_iter().map(Lit::var).collect()
    }

    /// Literals whose negation occurs nowhere in the formula.
    pub fn pure_literals(&self) -> BTreeSet<Lit> {
        let occurrences: HashSet<Lit> = self
            .clauses
            .iter()
            .flat_map(|clause| clause.inner().iter().copied())
            .collect();
        occurrences
            .iter()
            .copied()
            .filter(|lit| !occurrences.contains(&!*lit))
            .collect()
    }

    /// The lit of every clause of length 1. Contradicting units are both kept.
    pub fn unit_clauses(&self) -> BTreeSet<Lit> {
        self.clauses.iter().filter_map(Clause::unit).collect()
    }

    // the clauses that contain lit are satisfied once lit is true
    pub fn remove_clauses_with_literal(&self, lit: Lit) -> Cnf {
        self.clauses
            .iter()
            .filter(|clause| !clause.contains(lit))
            .cloned()
            .collect()
    }

    // lit can't satisfy any clause, drop it but keep the clauses
    pub fn shorten_clauses_with_literal(&self, lit: Lit) -> Cnf {
        self.clauses.iter().map(|clause| clause.without(lit)).collect()
    }

    /// Commits `lit = true`: clauses containing `lit` go away and `!lit` is
    /// pruned from the remaining ones.
    pub fn remove_literal(&self, lit: Lit) -> Cnf {
        self.remove_clauses_with_literal(lit)
            .shorten_clauses_with_literal(!lit)
    }

    /// One pass of unit propagation and pure literal elimination.
    ///
    /// Every unit and pure literal found in `self` is committed with
    /// [`Cnf::remove_literal`]. New units produced by this pass are left for
    /// the next call. Returns the reduced formula and the forced literals.
    pub fn simplify(&self) -> (Cnf, BTreeSet<Lit>) {
        let mut forced = self.unit_clauses();
        forced.extend(self.pure_literals());

        let mut cnf = self.clone();
        for &lit in &forced {
            cnf = cnf.remove_literal(lit);
        }
        log::trace!("simplify forced {:?}, {} clauses left", forced, cnf.num_clause());

        (cnf, forced)
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.inner().iter().any(|&lit| assignment.contains(lit)))
    }
}

impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            writeln!(f, "{}", clause)?;
        }
        Ok(())
    }
}
