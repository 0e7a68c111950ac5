/// Knobs for [`Solver`](crate::Solver).
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Seed for branch selection. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Give up with [`Error::Aborted`](crate::Error::Aborted) after this many
    /// recursions.
    pub max_recursions: Option<u64>,
    /// Emit a progress line every `log_interval` recursions, 0 disables it.
    pub log_interval: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            seed: None,
            max_recursions: None,
            log_interval: 10,
        }
    }
}

impl SolverConfig {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_recursions(mut self, max: u64) -> Self {
        self.max_recursions = Some(max);
        self
    }

    pub fn log_interval(mut self, interval: u64) -> Self {
        self.log_interval = interval;
        self
    }
}
