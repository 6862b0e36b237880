//! The optimization engine: loads a job and its candidate stock, classifies
//! geometry, dispatches to the worker pool (falling back to inline execution
//! on pool trouble), converts the result to a plan, and emits lifecycle
//! events. This is the one component that ties every other module together.

use crate::contracts::{
    CandidateStock, GeometryType, JobStore, OptimizationError, OptimizationRequest, OptimizationResponse, StockStore,
};
use crate::events::{Envelope, Event, EventBus};
use crate::executor::ExecutionParams;
use crate::model::PackingResult;
use crate::oracle::{Features, PolicyOracle};
use crate::plan::{to_plan_data, PlanData};
use crate::pool::WorkerPool;
use crate::registry::AlgorithmRegistry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

pub struct OptimizationEngine {
    job_store: Arc<dyn JobStore>,
    stock_store: Arc<dyn StockStore>,
    registry: Arc<AlgorithmRegistry>,
    pool: Arc<WorkerPool>,
    oracle: Arc<dyn PolicyOracle>,
    events: Arc<dyn EventBus>,
}

impl OptimizationEngine {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        stock_store: Arc<dyn StockStore>,
        registry: Arc<AlgorithmRegistry>,
        pool: Arc<WorkerPool>,
        oracle: Arc<dyn PolicyOracle>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        OptimizationEngine {
            job_store,
            stock_store,
            registry,
            pool,
            oracle,
            events,
        }
    }

    pub async fn run_optimization(&self, request: OptimizationRequest) -> OptimizationResponse {
        let scenario_id = request.scenario_id.clone();
        log::debug!(target: "cutstock_core::engine", "[{scenario_id}] loading job {}", request.job_id);

        self.events
            .publish(Envelope::wrap(Event::Started {
                scenario_id: scenario_id.clone(),
                job_id: request.job_id.clone(),
                started_at: Utc::now(),
            }))
            .await;

        let job = match self.job_store.find_job(&request.job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                return self.fail(&scenario_id, "JOB_NOT_FOUND", format!("job {} not found", request.job_id)).await;
            }
            Err(err) => {
                return self.fail(&scenario_id, err.code().as_str(), err.to_string()).await;
            }
        };

        if job.items.is_empty() {
            log::info!(target: "cutstock_core::engine", "[{scenario_id}] empty job, returning empty plan");
            let empty = match job.geometry_type() {
                GeometryType::OneD => PackingResult::empty_1d(),
                GeometryType::TwoD => PackingResult::empty_2d(),
            };
            let plan_data = to_plan_data(&empty);
            self.complete(&scenario_id, plan_data.clone(), 1).await;
            return OptimizationResponse {
                success: true,
                plan_data: Some(plan_data),
                error: None,
            };
        }

        let geometry = job.geometry_type();
        let candidate_stock = match self
            .stock_store
            .find_candidate_stock(&job, request.params.selected_stock_ids.as_deref())
            .await
        {
            Ok(stock) => stock,
            Err(err) => return self.fail(&scenario_id, err.code().as_str(), err.to_string()).await,
        };
        if candidate_stock.is_empty() {
            return self.fail(&scenario_id, "NO_STOCK", format!("no candidate stock for job {}", request.job_id)).await;
        }

        let algorithm = self.resolve_algorithm(&request, &job, &candidate_stock, geometry).await;

        let execution_params = ExecutionParams {
            algorithm: Some(algorithm.algorithm.clone()),
            kerf: request.params.kerf,
            min_usable_waste: request.params.min_usable_waste,
            allow_rotation: request.params.allow_rotation,
            guillotine_only: request.params.guillotine_only,
        };

        let started_at = Instant::now();
        let outcome = self
            .execute(&job, &candidate_stock, &execution_params, request.params.workers_only)
            .await;
        let runtime_ms = started_at.elapsed().as_millis() as u64;

        self.oracle
            .record_outcome(
                &algorithm.prediction_id,
                outcome.as_ref().map(|r| r.total_waste_percentage).unwrap_or(0.0),
                runtime_ms,
            )
            .await;

        match outcome {
            Ok(result) => {
                let plan_data = to_plan_data(&result);
                self.complete(&scenario_id, plan_data.clone(), 1).await;
                OptimizationResponse {
                    success: true,
                    plan_data: Some(plan_data),
                    error: None,
                }
            }
            Err(err) => self.fail(&scenario_id, err.code().as_str(), err.to_string()).await,
        }
    }

    async fn resolve_algorithm(
        &self,
        request: &OptimizationRequest,
        job: &crate::contracts::Job,
        candidate_stock: &CandidateStock,
        geometry: GeometryType,
    ) -> ResolvedAlgorithm {
        if let Some(algorithm) = &request.params.algorithm {
            return ResolvedAlgorithm {
                algorithm: algorithm.clone(),
                prediction_id: String::new(),
            };
        }

        let dimensionality = match geometry {
            GeometryType::OneD => crate::algorithms::Dimensionality::OneD,
            GeometryType::TwoD => crate::algorithms::Dimensionality::TwoD,
        };

        // guillotineOnly constrains the algorithm itself, so when the caller
        // hasn't named one explicitly it overrides whatever the oracle would
        // otherwise recommend rather than risk a later validation error.
        if dimensionality == crate::algorithms::Dimensionality::TwoD && request.params.guillotine_only == Some(true) {
            return ResolvedAlgorithm {
                algorithm: "2D_GUILLOTINE".to_string(),
                prediction_id: String::new(),
            };
        }

        let features = derive_features(job, geometry, candidate_stock);

        match self.oracle.select_algorithm(features).await {
            Some(recommendation) => ResolvedAlgorithm {
                algorithm: recommendation.algorithm,
                prediction_id: recommendation.prediction_id,
            },
            None => ResolvedAlgorithm {
                algorithm: oracle_fallback_algorithm(dimensionality).to_string(),
                prediction_id: String::new(),
            },
        }
    }

    async fn execute(
        &self,
        job: &crate::contracts::Job,
        candidate_stock: &CandidateStock,
        params: &ExecutionParams,
        workers_only: bool,
    ) -> Result<PackingResult, crate::error::CoreError> {
        match (job.geometry_type(), candidate_stock) {
            (GeometryType::OneD, CandidateStock::OneD(stock)) => {
                let registry = self.registry.clone();
                let pieces = job.pieces_1d();
                let stock = stock.clone();
                let params = params.clone();

                let pool_result = self
                    .pool
                    .submit({
                        let registry = registry.clone();
                        let pieces = pieces.clone();
                        let stock = stock.clone();
                        let params = params.clone();
                        move || crate::executor::execute_1d(&registry, &pieces, &stock, &params)
                    })
                    .await;

                let outcome = match pool_result {
                    Ok(outcome) => outcome,
                    Err(err) if workers_only => return Err(err),
                    Err(_) => crate::executor::execute_1d(&registry, &pieces, &stock, &params),
                };

                outcome
                    .result
                    .ok_or_else(|| outcome.error.unwrap_or(crate::error::CoreError::Internal("algorithm produced no result".to_string())))
            }
            (GeometryType::TwoD, CandidateStock::TwoD(stock)) => {
                let registry = self.registry.clone();
                let pieces = job.pieces_2d();
                let stock = stock.clone();
                let params = params.clone();

                let pool_result = self
                    .pool
                    .submit({
                        let registry = registry.clone();
                        let pieces = pieces.clone();
                        let stock = stock.clone();
                        let params = params.clone();
                        move || crate::executor::execute_2d(&registry, &pieces, &stock, &params)
                    })
                    .await;

                let outcome = match pool_result {
                    Ok(outcome) => outcome,
                    Err(err) if workers_only => return Err(err),
                    Err(_) => crate::executor::execute_2d(&registry, &pieces, &stock, &params),
                };

                outcome
                    .result
                    .ok_or_else(|| outcome.error.unwrap_or(crate::error::CoreError::Internal("algorithm produced no result".to_string())))
            }
            _ => Err(crate::error::CoreError::Internal("job geometry and candidate stock dimensionality disagree".to_string())),
        }
    }

    async fn fail(&self, scenario_id: &str, code: &'static str, message: String) -> OptimizationResponse {
        log::error!(target: "cutstock_core::engine", "[{scenario_id}] {message}");
        self.events
            .publish(Envelope::wrap(Event::Failed {
                scenario_id: scenario_id.to_string(),
                error: message.clone(),
                failed_at: Utc::now(),
            }))
            .await;
        OptimizationResponse {
            success: false,
            plan_data: None,
            error: Some(OptimizationError { code, message }),
        }
    }

    async fn complete(&self, scenario_id: &str, plan_data: PlanData, plan_number: u32) {
        self.events
            .publish(Envelope::wrap(Event::Completed {
                scenario_id: scenario_id.to_string(),
                plan_id: plan_data.plan_id.clone(),
                plan_number,
                total_waste: plan_data.total_waste,
                waste_percentage: plan_data.waste_percentage,
                stock_used_count: plan_data.stock_used_count,
                completed_at: Utc::now(),
            }))
            .await;
    }
}

struct ResolvedAlgorithm {
    algorithm: String,
    prediction_id: String,
}

/// The historical safe default consulted only when the policy oracle
/// declines to recommend an algorithm -- distinct from
/// [`AlgorithmRegistry::default_algorithm`], the executor's own bare
/// default used when no oracle is in play at all.
pub fn oracle_fallback_algorithm(dimensionality: crate::algorithms::Dimensionality) -> &'static str {
    match dimensionality {
        crate::algorithms::Dimensionality::OneD => "1D_FFD",
        crate::algorithms::Dimensionality::TwoD => "2D_GUILLOTINE",
    }
}

/// Derives the oracle's feature vector from the job and its candidate stock:
/// total and unique piece counts, the variance of piece area (piece length
/// for 1D jobs), the mean piece aspect ratio (1.0 for 1D, where pieces have
/// no second dimension), and the candidate stock count.
fn derive_features(job: &crate::contracts::Job, geometry: GeometryType, candidate_stock: &CandidateStock) -> Features {
    let stock_count = match candidate_stock {
        CandidateStock::OneD(stock) => stock.len() as u32,
        CandidateStock::TwoD(stock) => stock.len() as u32,
    };

    match geometry {
        GeometryType::OneD => {
            let pieces = job.pieces_1d();
            let areas: Vec<f64> = pieces
                .iter()
                .flat_map(|p| std::iter::repeat_n(p.length as f64, p.quantity.max(1) as usize))
                .collect();
            Features {
                is_1d: true,
                total_piece_count: pieces.iter().map(|p| p.quantity).sum(),
                unique_piece_count: pieces.len() as u32,
                piece_area_variance: variance(&areas),
                piece_aspect_ratio_mean: 1.0,
                stock_count,
            }
        }
        GeometryType::TwoD => {
            let pieces = job.pieces_2d();
            let areas: Vec<f64> = pieces
                .iter()
                .flat_map(|p| std::iter::repeat_n(p.width as f64 * p.height as f64, p.quantity.max(1) as usize))
                .collect();
            let aspect_ratios: Vec<f64> = pieces
                .iter()
                .flat_map(|p| {
                    let ratio = if p.height == 0 { 0.0 } else { p.width as f64 / p.height as f64 };
                    std::iter::repeat_n(ratio, p.quantity.max(1) as usize)
                })
                .collect();
            Features {
                is_1d: false,
                total_piece_count: pieces.iter().map(|p| p.quantity).sum(),
                unique_piece_count: pieces.len() as u32,
                piece_area_variance: variance(&areas),
                piece_aspect_ratio_mean: mean(&aspect_ratios),
                stock_count,
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{Job, JobItem, OptimizationParams};
    use crate::model::{Piece1D, Stock1D};
    use crate::oracle::NoopOracle;
    use async_trait::async_trait;

    struct FixedJobStore(Option<Job>);

    #[async_trait]
    impl JobStore for FixedJobStore {
        async fn find_job(&self, _job_id: &str) -> Result<Option<Job>, crate::error::CoreError> {
            Ok(self.0.clone())
        }
    }

    struct FixedStockStore(CandidateStock);

    #[async_trait]
    impl StockStore for FixedStockStore {
        async fn find_candidate_stock(&self, _job: &Job, _selected: Option<&[String]>) -> Result<CandidateStock, crate::error::CoreError> {
            Ok(self.0.clone())
        }
    }

    fn job_1d() -> Job {
        Job {
            id: "j1".into(),
            material_type_id: "mat".into(),
            thickness: None,
            items: vec![JobItem::OneD(Piece1D {
                id: "p1".into(),
                order_item_id: "o1".into(),
                length: 900,
                quantity: 2,
            })],
        }
    }

    fn engine(job: Option<Job>, stock: CandidateStock) -> OptimizationEngine {
        OptimizationEngine::new(
            Arc::new(FixedJobStore(job)),
            Arc::new(FixedStockStore(stock)),
            Arc::new(AlgorithmRegistry::with_defaults()),
            Arc::new(WorkerPool::new(crate::pool::PoolConfig::default())),
            Arc::new(NoopOracle),
            Arc::new(crate::events::LoggingEventBus),
        )
    }

    fn request(job_id: &str) -> OptimizationRequest {
        OptimizationRequest {
            job_id: job_id.to_string(),
            scenario_id: "scenario-1".to_string(),
            params: OptimizationParams::default(),
        }
    }

    #[tokio::test]
    async fn missing_job_yields_job_not_found() {
        let engine = engine(None, CandidateStock::OneD(Vec::new()));
        let response = engine.run_optimization(request("missing")).await;
        assert!(!response.success);
        assert_eq!(response.error.unwrap().code, "JOB_NOT_FOUND");
    }

    #[tokio::test]
    async fn empty_stock_yields_no_stock() {
        let engine = engine(Some(job_1d()), CandidateStock::OneD(Vec::new()));
        let response = engine.run_optimization(request("j1")).await;
        assert!(!response.success);
        assert_eq!(response.error.unwrap().code, "NO_STOCK");
    }

    struct SpyOracle {
        seen: std::sync::Mutex<Option<Features>>,
    }

    #[async_trait]
    impl PolicyOracle for SpyOracle {
        async fn select_algorithm(&self, features: Features) -> Option<crate::oracle::Recommendation> {
            *self.seen.lock().unwrap() = Some(features);
            None
        }

        async fn record_outcome(&self, _prediction_id: &str, _waste_percentage: f64, _runtime_ms: u64) {}
    }

    #[tokio::test]
    async fn oracle_receives_features_derived_from_the_job_and_stock() {
        let stock = CandidateStock::OneD(vec![Stock1D {
            id: "s1".into(),
            length: 1000,
            available: 2,
            unit_price: None,
        }]);
        let oracle = Arc::new(SpyOracle {
            seen: std::sync::Mutex::new(None),
        });
        let engine = OptimizationEngine::new(
            Arc::new(FixedJobStore(Some(job_1d()))),
            Arc::new(FixedStockStore(stock)),
            Arc::new(AlgorithmRegistry::with_defaults()),
            Arc::new(WorkerPool::new(crate::pool::PoolConfig::default())),
            oracle.clone(),
            Arc::new(crate::events::LoggingEventBus),
        );
        let _ = engine.run_optimization(request("j1")).await;

        let features = oracle.seen.lock().unwrap().expect("oracle was consulted");
        assert!(features.is_1d);
        assert_eq!(features.total_piece_count, 2);
        assert_eq!(features.unique_piece_count, 1);
        assert_eq!(features.piece_area_variance, 0.0);
        assert_eq!(features.stock_count, 1);
    }

    #[tokio::test]
    async fn successful_run_yields_a_plan_with_no_unplaced_pieces() {
        let stock = CandidateStock::OneD(vec![Stock1D {
            id: "s1".into(),
            length: 1000,
            available: 2,
            unit_price: None,
        }]);
        let engine = engine(Some(job_1d()), stock);
        let response = engine.run_optimization(request("j1")).await;
        assert!(response.success);
        let plan = response.plan_data.unwrap();
        assert_eq!(plan.unplaced_count, 0);
        assert_eq!(plan.stock_used_count, 2);
    }

    #[tokio::test]
    async fn empty_job_yields_a_trivial_successful_plan() {
        let job = Job {
            id: "j1".into(),
            material_type_id: "mat".into(),
            thickness: None,
            items: Vec::new(),
        };
        let engine = engine(Some(job), CandidateStock::OneD(Vec::new()));
        let response = engine.run_optimization(request("j1")).await;
        assert!(response.success);
        assert_eq!(response.plan_data.unwrap().stock_used_count, 0);
    }
}
