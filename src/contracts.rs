//! In-process data contracts crossing the core boundary: the abstract
//! job/stock query interfaces the engine depends on, and the request/response
//! shapes its callers use. The job store, stock store, and their persistence
//! are out of scope -- only these read-only interfaces matter here.

use crate::error::CoreError;
use crate::model::{Piece1D, Piece2D, Stock1D, Stock2D};
use crate::plan::PlanData;
use async_trait::async_trait;

/// Which geometry family a job's pieces are tagged with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryType {
    OneD,
    TwoD,
}

/// A single line item on a job, before the engine knows whether it holds
/// 1D or 2D geometry.
#[derive(Clone, Debug)]
pub enum JobItem {
    OneD(Piece1D),
    TwoD(Piece2D),
}

/// A cutting job: an ordered list of items plus the material/thickness
/// criteria used to select candidate stock.
#[derive(Clone, Debug)]
pub struct Job {
    pub id: String,
    pub material_type_id: String,
    pub thickness: Option<u32>,
    pub items: Vec<JobItem>,
}

impl Job {
    /// The job's geometry family, taken from its first item. An empty item
    /// list defaults to 1D per the engine's classification rule.
    pub fn geometry_type(&self) -> GeometryType {
        match self.items.first() {
            Some(JobItem::TwoD(_)) => GeometryType::TwoD,
            _ => GeometryType::OneD,
        }
    }

    pub fn pieces_1d(&self) -> Vec<Piece1D> {
        self.items
            .iter()
            .filter_map(|item| match item {
                JobItem::OneD(piece) => Some(piece.clone()),
                JobItem::TwoD(_) => None,
            })
            .collect()
    }

    pub fn pieces_2d(&self) -> Vec<Piece2D> {
        self.items
            .iter()
            .filter_map(|item| match item {
                JobItem::TwoD(piece) => Some(piece.clone()),
                JobItem::OneD(_) => None,
            })
            .collect()
    }
}

/// Either family of candidate stock, scoped to a job's material/thickness.
#[derive(Clone, Debug)]
pub enum CandidateStock {
    OneD(Vec<Stock1D>),
    TwoD(Vec<Stock2D>),
}

impl CandidateStock {
    pub fn is_empty(&self) -> bool {
        match self {
            CandidateStock::OneD(stock) => stock.is_empty(),
            CandidateStock::TwoD(stock) => stock.is_empty(),
        }
    }
}

/// Read-only query interface over the job catalog.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_job(&self, job_id: &str) -> Result<Option<Job>, CoreError>;
}

/// Read-only query interface over the stock catalog, filtered by a job's
/// material criteria and an optional explicit allowlist.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn find_candidate_stock(
        &self,
        job: &Job,
        selected_stock_ids: Option<&[String]>,
    ) -> Result<CandidateStock, CoreError>;
}

/// Caller-supplied parameter overrides for one optimization run.
#[derive(Clone, Debug, Default)]
pub struct OptimizationParams {
    pub algorithm: Option<String>,
    pub kerf: Option<u32>,
    pub min_usable_waste: Option<u32>,
    pub allow_rotation: Option<bool>,
    pub guillotine_only: Option<bool>,
    pub selected_stock_ids: Option<Vec<String>>,
    pub workers_only: bool,
}

/// A request to run one optimization scenario.
#[derive(Clone, Debug)]
pub struct OptimizationRequest {
    pub job_id: String,
    pub scenario_id: String,
    pub params: OptimizationParams,
}

/// The structured error surfaced to a caller on an infrastructural failure.
#[derive(Clone, Debug)]
pub struct OptimizationError {
    pub code: &'static str,
    pub message: String,
}

/// The result of one optimization run: either a plan (possibly with
/// unplaced pieces) or an infrastructural error.
#[derive(Clone, Debug)]
pub struct OptimizationResponse {
    pub success: bool,
    pub plan_data: Option<PlanData>,
    pub error: Option<OptimizationError>,
}
