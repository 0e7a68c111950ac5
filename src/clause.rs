use std::fmt;

use crate::{Error, Lit};

/// A disjunction of literals. Empty means conflict, one literal means unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clause(pub(crate) Vec<Lit>);

impl Clause {
    pub fn inner(&self) -> &[Lit] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn unit(&self) -> Option<Lit> {
        match self.0.as_slice() {
            [lit] => Some(*lit),
            _ => None,
        }
    }

    pub fn contains(&self, lit: Lit) -> bool {
        self.0.contains(&lit)
    }

    // copy of this clause with every occurrence of `lit` dropped
    pub(crate) fn without(&self, lit: Lit) -> Clause {
        Clause(self.0.iter().copied().filter(|&l| l != lit).collect())
    }
}

impl TryFrom<&[i32]> for Clause {
    type Error = Error;

    fn try_from(value: &[i32]) -> Result<Self, Self::Error> {
        let mut clause = Vec::with_capacity(value.len());
        for &lit in value {
            clause.push(Lit::try_from_dimacs(lit)?);
        }
        Ok(Clause(clause))
    }
}

impl FromIterator<Lit> for Clause {
    fn from_iter<T: IntoIterator<Item = Lit>>(iter: T) -> Self {
        Clause(iter.into_iter().collect())
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lit in &self.0 {
            write!(f, "{} ", lit)?;
        }
        write!(f, "0")
    }
}
