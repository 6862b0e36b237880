//! Best-Fit Decreasing: a greedy 1D bar-packing heuristic.
//!
//! Differs from [`super::ffd::Ffd`] only in two choices: among open bars
//! that fit a piece, it picks the one that leaves the least leftover length
//! (ties broken by open order); and when no open bar fits, it opens a new
//! bar from the *smallest* qualifying stock length rather than iterating
//! stock in the FFD preamble's descending order, to avoid burning a large
//! bar on a small piece when a smaller one would do.

use super::common::OpenBar;
use crate::model::{AlgorithmOptions, BarResult, PackingResult, Piece1D, Stock1D};
use std::collections::HashMap;

use super::Algorithm1D;

/// Best-fit decreasing 1D bar packer.
pub struct Bfd;

impl Algorithm1D for Bfd {
    fn name(&self) -> &'static str {
        "1D_BFD"
    }

    fn execute(&self, pieces: &[Piece1D], stock: &[Stock1D], options: AlgorithmOptions) -> PackingResult {
        run(pieces, stock, options)
    }
}

struct StockFamily {
    id: String,
    length: u32,
    remaining: u32,
}

fn run(pieces: &[Piece1D], stock: &[Stock1D], options: AlgorithmOptions) -> PackingResult {
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

    // Ascending order, used exclusively for new-bar stock selection.
    let mut families: Vec<StockFamily> = stock
        .iter()
        .map(|s| StockFamily {
            id: s.id.clone(),
            length: s.length,
            remaining: s.available,
        })
        .collect();
    families.sort_by(|a, b| a.length.cmp(&b.length).then_with(|| a.id.cmp(&b.id)));

    let mut bars: Vec<OpenBar> = Vec::new();
    let mut unplaced: HashMap<String, u32> = HashMap::new();
    let total_pieces = expanded.len() as u32;

    for piece in &expanded {
        let best = bars
            .iter_mut()
            .enumerate()
            .filter(|(_, bar)| bar.fits(piece.length, options.kerf))
            .min_by_key(|(index, bar)| {
                let leftover = bar.remaining_length - bar.required_length(piece.length, options.kerf);
                (leftover, *index)
            })
            .map(|(index, _)| index);

        if let Some(index) = best {
            bars[index].place(piece.unit_id.clone(), piece.order_item_id.clone(), piece.length, options.kerf);
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
    super::ffd::finalize(bar_results, unplaced, total_pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlgorithmOptions, PackedStock};

    fn piece(id: &str, length: u32, quantity: u32) -> Piece1D {
        Piece1D {
            id: id.into(),
            order_item_id: format!("order-{id}"),
            length,
            quantity,
        }
    }

    fn stock(id: &str, length: u32, available: u32) -> Stock1D {
        Stock1D {
            id: id.into(),
            length,
            available,
            unit_price: None,
        }
    }

    // S4: BFD must never do worse than FFD on a mixed piece set.
    #[test]
    fn s4_bfd_is_at_least_as_good_as_ffd() {
        let pieces = vec![
            piece("p1", 400, 2),
            piece("p2", 300, 3),
            piece("p3", 250, 2),
            piece("p4", 200, 4),
        ];
        let stock = vec![stock("s1", 1000, 10), stock("s2", 800, 5)];
        let options = AlgorithmOptions {
            kerf: 0,
            ..Default::default()
        };

        let ffd_result = super::super::Ffd.execute(&pieces, &stock, options);
        let bfd_result = Bfd.execute(&pieces, &stock, options);

        assert!(bfd_result.total_waste_percentage <= ffd_result.total_waste_percentage + 1e-3);
    }

    #[test]
    fn picks_tightest_leftover_among_open_bars() {
        let pieces = vec![piece("p1", 100, 1), piece("p2", 100, 1), piece("p3", 80, 1)];
        let stock = vec![stock("s1", 200, 1), stock("s2", 90, 1)];
        let options = AlgorithmOptions {
            kerf: 0,
            ..Default::default()
        };
        let result = Bfd.execute(&pieces, &stock, options);
        assert_eq!(result.stock_used_count, 2);
        let PackedStock::Bars(bars) = result.packed else {
            panic!("expected bars")
        };
        assert!(bars.iter().any(|b| b.cuts.len() == 2));
    }
}
