use std::{fmt, ops::Not};

use crate::Error;

/// A boolean variable, 1-based like dimacs.
pub type Var = u32;

/// A signed literal, `v` or `-v`.
///
/// The inner value is never 0 and never `i32::MIN`, so negation can't overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit(i32);

impl Lit {
    pub fn try_from_dimacs(lit: i32) -> Result<Lit, Error> {
        if lit == 0 || lit == i32::MIN {
            return Err(Error::InvalidLiteral { lit });
        }
        Ok(Lit(lit))
    }

    /// The literal of `var` with the given polarity.
    pub fn from_var(var: Var, positive: bool) -> Result<Lit, Error> {
        if var == 0 || var > i32::MAX as Var {
            return Err(Error::InvalidVariable { var });
        }
        let lit = Lit(var as i32);
        Ok(if positive { lit } else { !lit })
    }

    // `var` must come from an existing literal
    pub(crate) fn positive(var: Var) -> Lit {
        debug_assert!(var > 0 && var <= i32::MAX as Var);
        Lit(var as i32)
    }

    pub(crate) fn negative(var: Var) -> Lit {
        !Lit::positive(var)
    }

    pub fn to_dimacs(self) -> i32 {
        self.0
    }

    pub fn var(self) -> Var {
        self.0.unsigned_abs()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Self::Output {
        Lit(-self.0)
    }
}

// order by variable first so that `-1 < 1 < -2 < 2`
impl Ord for Lit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.var(), self.is_positive()).cmp(&(other.var(), other.is_positive()))
    }
}

impl PartialOrd for Lit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<i32> for Lit {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Lit::try_from_dimacs(value)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
