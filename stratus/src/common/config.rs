use crate::common::constants::{
    DEFAULT_CATALOG_RETRY_INITIAL_DELAY_MS, DEFAULT_CATALOG_RETRY_MAX_DELAY_MS,
    DEFAULT_MAX_CATALOG_RETRIES,
};
use std::time::Duration;

/// Configuration for a Stratus engine instance.
///
/// `StratusConfig` carries the tunables of the query/index engine, most
/// importantly the retry policy used when a conditional write of the index
/// catalog loses a compare-and-swap race against a concurrent writer.
///
/// # Examples
///
/// ```rust,ignore
/// use stratus::common::StratusConfig;
/// use std::time::Duration;
///
/// let config = StratusConfig::new()
///     .max_catalog_retries(3)
///     .catalog_retry_initial_delay(Duration::from_millis(50));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StratusConfig {
    pub(crate) max_catalog_retries: u32,
    pub(crate) catalog_retry_initial_delay: Duration,
    pub(crate) catalog_retry_max_delay: Duration,
}

impl StratusConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        StratusConfig {
            max_catalog_retries: DEFAULT_MAX_CATALOG_RETRIES,
            catalog_retry_initial_delay: Duration::from_millis(
                DEFAULT_CATALOG_RETRY_INITIAL_DELAY_MS,
            ),
            catalog_retry_max_delay: Duration::from_millis(DEFAULT_CATALOG_RETRY_MAX_DELAY_MS),
        }
    }

    /// Sets the maximum number of retries for catalog CAS conflicts.
    pub fn max_catalog_retries(mut self, retries: u32) -> Self {
        self.max_catalog_retries = retries;
        self
    }

    /// Sets the initial backoff delay for catalog CAS retries.
    ///
    /// The delay doubles on every attempt, capped by
    /// [`catalog_retry_max_delay`](Self::catalog_retry_max_delay).
    pub fn catalog_retry_initial_delay(mut self, delay: Duration) -> Self {
        self.catalog_retry_initial_delay = delay;
        self
    }

    /// Sets the maximum backoff delay for catalog CAS retries.
    pub fn catalog_retry_max_delay(mut self, delay: Duration) -> Self {
        self.catalog_retry_max_delay = delay;
        self
    }

    /// Computes the backoff delay for the given zero-based attempt.
    pub(crate) fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.catalog_retry_initial_delay
            .checked_mul(factor)
            .unwrap_or(self.catalog_retry_max_delay)
            .min(self.catalog_retry_max_delay)
    }
}

impl Default for StratusConfig {
    fn default() -> Self {
        Self::new()
    }
}
