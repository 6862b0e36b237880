//! The optional policy oracle: a learned-algorithm-selection hook the engine
//! consults when a job doesn't pin an algorithm explicitly. The core only
//! depends on the [`PolicyOracle`] interface; [`NoopOracle`] is a valid
//! production implementation for deployments with no model to consult.

use async_trait::async_trait;

/// The feature vector the engine derives from a job before asking the
/// oracle for a recommendation.
#[derive(Clone, Copy, Debug)]
pub struct Features {
    pub is_1d: bool,
    pub total_piece_count: u32,
    pub unique_piece_count: u32,
    pub piece_area_variance: f64,
    pub piece_aspect_ratio_mean: f64,
    pub stock_count: u32,
}

/// An algorithm recommendation along with the oracle's confidence in it.
#[derive(Clone, Debug)]
pub struct Recommendation {
    pub algorithm: String,
    pub confidence: f64,
    pub prediction_id: String,
}

#[async_trait]
pub trait PolicyOracle: Send + Sync {
    /// Returns `None` when the oracle has no recommendation -- a valid,
    /// expected outcome, not an error.
    async fn select_algorithm(&self, features: Features) -> Option<Recommendation>;

    /// Fire-and-forget outcome reporting; failures are the oracle
    /// implementation's concern, never the caller's.
    async fn record_outcome(&self, prediction_id: &str, waste_percentage: f64, runtime_ms: u64);
}

/// The default oracle: never recommends, accepts every outcome report
/// silently. Side-effect free on the request path, as the contract requires.
pub struct NoopOracle;

#[async_trait]
impl PolicyOracle for NoopOracle {
    async fn select_algorithm(&self, _features: Features) -> Option<Recommendation> {
        None
    }

    async fn record_outcome(&self, _prediction_id: &str, _waste_percentage: f64, _runtime_ms: u64) {}
}
