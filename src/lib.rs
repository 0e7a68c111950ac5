mod clause;
mod cnf;
mod config;
mod dpll;
mod error;
mod lit;

pub use clause::Clause;
pub use cnf::Cnf;
pub use config::SolverConfig;
pub use dpll::{solve, Assignment, SearchStats, SolveResult, Solver};
pub use error::{Error, Result};
pub use lit::{Lit, Var};
