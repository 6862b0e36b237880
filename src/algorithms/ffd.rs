//! First-Fit Decreasing: a greedy 1D bar-packing heuristic.
//!
//! Pieces are placed into the first already-open bar that has room; only
//! when no open bar fits is a new bar opened. This tends to use fewer bars
//! than a naive online algorithm at the cost of being slightly more
//! expensive than [`super::bfd::Bfd`] to reason about when bars are
//! reordered.

use super::common::OpenBar;
use crate::model::{AlgorithmOptions, BarResult, PackedStock, PackingResult, Piece1D, Statistics, Stock1D, UnplacedPiece};
use std::collections::HashMap;

use super::Algorithm1D;

/// First-fit decreasing 1D bar packer.
pub struct Ffd;

impl Algorithm1D for Ffd {
    fn name(&self) -> &'static str {
        "1D_FFD"
    }

    fn execute(&self, pieces: &[Piece1D], stock: &[Stock1D], options: AlgorithmOptions) -> PackingResult {
        run(pieces, stock, options)
    }
}

/// Stock family availability, tracked by the open order used to pick a new
/// bar's source family.
struct StockFamily {
    id: String,
    length: u32,
    remaining: u32,
}

pub(super) fn run(pieces: &[Piece1D], stock: &[Stock1D], options: AlgorithmOptions) -> PackingResult {
    if pieces.is_empty() || stock.is_empty() {
        return PackingResult::empty_1d();
    }

    let mut expanded = crate::expander::expand_1d(pieces);
    expanded.sort_by(|a, b| {
        b.length
            .cmp(&a.length)
            .then_with(|| a.original_id.cmp(&b.original_id))
            .then_with(|| a.unit_id.cmp(&b.unit_id))
    });

    let mut families: Vec<StockFamily> = stock
        .iter()
        .map(|s| StockFamily {
            id: s.id.clone(),
            length: s.length,
            remaining: s.available,
        })
        .collect();
    families.sort_by(|a, b| b.length.cmp(&a.length).then_with(|| a.id.cmp(&b.id)));

    let mut bars: Vec<OpenBar> = Vec::new();
    let mut unplaced: HashMap<String, u32> = HashMap::new();
    let total_pieces = expanded.len() as u32;

    for piece in &expanded {
        if let Some(bar) = bars.iter_mut().find(|bar| bar.fits(piece.length, options.kerf)) {
            bar.place(piece.unit_id.clone(), piece.order_item_id.clone(), piece.length, options.kerf);
            continue;
        }

        let opened = families
            .iter_mut()
            .find(|f| f.remaining > 0 && f.length >= piece.length);

        match opened {
            Some(family) => {
                family.remaining -= 1;
                let mut bar = OpenBar::new(family.id.clone(), family.length);
                bar.place(piece.unit_id.clone(), piece.order_item_id.clone(), piece.length, options.kerf);
                bars.push(bar);
            }
            None => {
                *unplaced.entry(piece.original_id.clone()).or_insert(0) += 1;
            }
        }
    }

    let bar_results: Vec<BarResult> = bars.into_iter().map(|bar| bar.finish(&options)).collect();
    finalize(bar_results, unplaced, total_pieces)
}

pub(super) fn finalize(
    bar_results: Vec<BarResult>,
    unplaced: HashMap<String, u32>,
    total_pieces: u32,
) -> PackingResult {
    let total_stock_extent: u64 = bar_results.iter().map(|b| b.stock_length as u64).sum();
    let total_waste: u64 = bar_results.iter().map(|b| b.waste as u64).sum();
    let total_used_extent = total_stock_extent - total_waste;
    let total_waste_percentage = if total_stock_extent == 0 {
        0.0
    } else {
        total_waste as f64 / total_stock_extent as f64 * 100.0
    };
    let efficiency = if total_stock_extent == 0 {
        0.0
    } else {
        total_used_extent as f64 / total_stock_extent as f64 * 100.0
    };

    let unplaced_pieces: Vec<UnplacedPiece> = {
        let mut v: Vec<UnplacedPiece> = unplaced
            .into_iter()
            .map(|(piece_id, quantity)| UnplacedPiece { piece_id, quantity })
            .collect();
        v.sort_by(|a, b| a.piece_id.cmp(&b.piece_id));
        v
    };

    let stock_used_count = bar_results.len();
    PackingResult {
        success: true,
        packed: PackedStock::Bars(bar_results),
        total_waste,
        total_waste_percentage,
        stock_used_count,
        unplaced_pieces,
        statistics: Statistics {
            total_pieces,
            total_stock_extent,
            total_used_extent,
            efficiency,
        },
    }
}
