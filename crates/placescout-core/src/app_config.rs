/// Application configuration for one scraping run.
///
/// Each run constructs its own `AppConfig`; there is no process-wide
/// configuration state. See [`crate::load_app_config`] for the env-var
/// surface and defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum number of admitted records before the run stops.
    pub max_results: usize,
    /// Whether proxy identity rotation is enabled. When false the run may
    /// proceed with an empty identity pool (direct connection).
    pub rotation_enabled: bool,
    /// Great-circle distance in meters under which two same-named records
    /// are considered the same place.
    pub dedup_tolerance_meters: f64,
    /// Ceiling on operation attempts inside the retry controller.
    pub max_attempts: u32,
    /// Consecutive error count at which an identity is marked dead.
    pub dead_error_threshold: u32,
    /// Proactive identity rotation period, in successful operations.
    pub rotation_interval: u32,
    /// Base delay in milliseconds for exponential backoff on target faults.
    pub backoff_base_ms: u64,
}
