//! Engine configuration.

/// How many instances of a recurring series are requested per refresh.
pub const DEFAULT_OCCURRENCE_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Upper bound passed to the store when expanding a series.
    pub occurrence_limit: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            occurrence_limit: DEFAULT_OCCURRENCE_LIMIT,
        }
    }
}

impl ControllerConfig {
    /// Sets the expansion limit. Zero is raised to one.
    pub fn with_occurrence_limit(mut self, limit: usize) -> Self {
        self.occurrence_limit = limit.max(1);
        self
    }
}
