use thiserror::Error;

/// Failure classification for one publication cycle, so the scheduler can
/// count and log the two failure kinds distinctly.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Forecast retrieval failed; the cycle was skipped entirely and the
    /// next scheduled tick proceeds normally.
    #[error("forecast fetch failed: {0}")]
    Fetch(#[source] anyhow::Error),

    /// The transport accepted none of the cycle's facts.
    #[error("publication failed: {0}")]
    Publish(#[source] anyhow::Error),
}
