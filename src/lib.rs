//! cutstock-core is the deterministic cutting-stock optimization core of a
//! manufacturing planning backend. It packs 1D bar-cutting and 2D
//! sheet-cutting jobs with First-Fit/Best-Fit Decreasing and Bottom-Left
//! Fill/Guillotine heuristics, runs them on a bounded worker pool isolated
//! from the calling task, and converts the result into a persistence-agnostic
//! plan.
//!
//! HTTP routing, auth, tenancy, persistence, and export formats are outside
//! this crate; [`contracts::JobStore`] and [`contracts::StockStore`] are the
//! abstract interfaces an embedding application implements to supply them.

#![allow(clippy::too_many_arguments)]

/// Geometry primitives: rectangles, overlap tests, orientation enumeration.
pub mod geometry;

/// Error taxonomy crossing the core boundary.
pub mod error;

/// In-process data contracts: pieces, stock, cuts, placements, results.
pub mod model;

/// Explodes quantity-bearing pieces into unit instances.
pub mod expander;

/// Deterministic bin-packing algorithms (FFD, BFD, Bottom-Left Fill, Guillotine).
pub mod algorithms;

/// Process-wide algorithm name -> implementation registry.
pub mod registry;

/// Algorithm dispatch, parameter defaulting, and validation.
pub mod executor;

/// A bounded worker pool for CPU-bound algorithm execution.
pub mod pool;

/// Converts a packing result into persistence-agnostic plan data.
pub mod plan;

/// Optimization lifecycle events and the abstract bus they publish to.
pub mod events;

/// The optional learned-policy oracle for algorithm selection.
pub mod oracle;

/// Job/stock query interfaces and the optimization request/response shapes.
pub mod contracts;

/// The optimization engine tying every component together.
pub mod engine;

/// Typed, environment-overridable tunables for this crate's own defaults.
pub mod settings;

pub use algorithms::{Algorithm1D, Algorithm2D, Bfd, BottomLeftFill, Dimensionality, Ffd, Guillotine};
pub use engine::OptimizationEngine;
pub use error::{CoreError, ErrorCode, Result};
pub use plan::{Layout, PlanData};
pub use registry::AlgorithmRegistry;
pub use settings::Settings;
