//! Deterministic bin-packing algorithms.
//!
//! Every algorithm is a pure function over `(pieces, stock, options)`: no
//! I/O, no shared mutable state, deterministic for identical inputs modulo
//! the sort ordering rules in each module's doc comment. Behavior is
//! composed from the shared helpers in [`crate::geometry`] and
//! [`crate::expander`] rather than through an inheritance hierarchy.

pub mod bfd;
pub mod blf;
mod common;
pub mod ffd;
pub mod guillotine;

use crate::model::{AlgorithmOptions, PackingResult, Piece1D, Piece2D, Stock1D, Stock2D};

/// Which family of geometry an algorithm operates on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dimensionality {
    OneD,
    TwoD,
}

impl Dimensionality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimensionality::OneD => "1D",
            Dimensionality::TwoD => "2D",
        }
    }
}

/// A deterministic 1D bar-packing algorithm.
pub trait Algorithm1D: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, pieces: &[Piece1D], stock: &[Stock1D], options: AlgorithmOptions) -> PackingResult;
}

/// A deterministic 2D sheet-packing algorithm.
pub trait Algorithm2D: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, pieces: &[Piece2D], stock: &[Stock2D], options: AlgorithmOptions) -> PackingResult;
}

pub use bfd::Bfd;
pub use blf::BottomLeftFill;
pub use ffd::Ffd;
pub use guillotine::Guillotine;
