//! Guillotine: a free-rectangle 2D sheet-packing heuristic.
//!
//! Every sheet keeps a list of free (unused) rectangles. A piece is placed
//! into the free rectangle selected by best-short-side-fit -- the one whose
//! shorter leftover dimension, after placing, is smallest -- among rectangles
//! that admit the piece plus kerf on both axes. The chosen rectangle is then
//! split width-first into at most two new free rectangles; free rectangles
//! are never merged back together, trading some long-run packing density for
//! a simpler, fully deterministic split step.

use crate::geometry::{apply_orientation, orientations, Orientation, Rect};
use crate::model::{AlgorithmOptions, Placement, Piece2D, Stock2D};
use std::collections::HashMap;

use super::blf::finalize;
use super::Algorithm2D;

/// Guillotine-cut 2D sheet packer.
pub struct Guillotine;

impl Algorithm2D for Guillotine {
    fn name(&self) -> &'static str {
        "2D_GUILLOTINE"
    }

    fn execute(&self, pieces: &[Piece2D], stock: &[Stock2D], options: AlgorithmOptions) -> crate::model::PackingResult {
        run(pieces, stock, options)
    }
}

struct OpenSheet {
    stock_id: String,
    width: u32,
    height: u32,
    free_rects: Vec<Rect>,
    placements: Vec<Placement>,
}

impl OpenSheet {
    fn new(stock_id: String, width: u32, height: u32) -> Self {
        OpenSheet {
            stock_id,
            width,
            height,
            free_rects: vec![Rect::new(0, 0, width, height)],
            placements: Vec::new(),
        }
    }

    /// Finds the best-short-side-fit free rectangle for a `w x h` piece
    /// (inflated by `kerf` on the trailing edges), returning its index and
    /// the score to minimize (short-side leftover, then long-side leftover).
    fn best_fit(&self, w: u32, h: u32, kerf: u32) -> Option<(usize, u32, u32)> {
        let needed_w = w + kerf;
        let needed_h = h + kerf;
        self.free_rects
            .iter()
            .enumerate()
            .filter(|(_, r)| r.width >= needed_w && r.height >= needed_h)
            .map(|(index, r)| {
                let leftover_w = r.width - needed_w;
                let leftover_h = r.height - needed_h;
                let (short, long) = if leftover_w < leftover_h {
                    (leftover_w, leftover_h)
                } else {
                    (leftover_h, leftover_w)
                };
                (index, short, long)
            })
            .min_by_key(|&(index, short, long)| (short, long, index))
    }

    fn place(&mut self, rect_index: usize, w: u32, h: u32, kerf: u32) -> (u32, u32) {
        let free_rect = self.free_rects.swap_remove(rect_index);
        let (x, y) = (free_rect.x, free_rect.y);

        // Width-first split: a right-hand strip spanning the free rect's
        // full height, and a strip above the placed piece spanning its own
        // width. Strips thinner than the kerf can never host another piece
        // and are dropped instead of kept as dead weight.
        let right_width = free_rect.width.saturating_sub(w + kerf);
        if right_width >= kerf || (right_width > 0 && kerf == 0) {
            self.free_rects.push(Rect::new(x + w + kerf, y, right_width, free_rect.height));
        }
        let top_height = free_rect.height.saturating_sub(h + kerf);
        if top_height >= kerf || (top_height > 0 && kerf == 0) {
            self.free_rects.push(Rect::new(x, y + h + kerf, w + kerf, top_height));
        }

        (x, y)
    }
}

struct StockFamily {
    id: String,
    width: u32,
    height: u32,
    remaining: u32,
}

fn run(pieces: &[Piece2D], stock: &[Stock2D], options: AlgorithmOptions) -> crate::model::PackingResult {
    if pieces.is_empty() || stock.is_empty() {
        return crate::model::PackingResult::empty_2d();
    }

    let mut expanded = crate::expander::expand_2d(pieces);
    expanded.sort_by(|a, b| {
        let area_a = a.width as u64 * a.height as u64;
        let area_b = b.width as u64 * b.height as u64;
        area_b
            .cmp(&area_a)
            .then_with(|| a.original_id.cmp(&b.original_id))
            .then_with(|| a.unit_id.cmp(&b.unit_id))
    });

    let mut families: Vec<StockFamily> = stock
        .iter()
        .map(|s| StockFamily {
            id: s.id.clone(),
            width: s.width,
            height: s.height,
            remaining: s.available,
        })
        .collect();
    families.sort_by(|a, b| {
        let area_a = a.width as u64 * a.height as u64;
        let area_b = b.width as u64 * b.height as u64;
        area_b.cmp(&area_a).then_with(|| a.id.cmp(&b.id))
    });

    let mut sheets: Vec<OpenSheet> = Vec::new();
    let mut unplaced: HashMap<String, u32> = HashMap::new();
    let total_pieces = expanded.len() as u32;

    for piece in &expanded {
        let orients = orientations(piece.width, piece.height, piece.can_rotate, options.allow_rotation);

        let placed_in_open = sheets.iter_mut().enumerate().find_map(|(sheet_index, sheet)| {
            orients
                .iter()
                .filter_map(|&o| {
                    let (w, h) = apply_orientation(piece.width, piece.height, o);
                    sheet.best_fit(w, h, options.kerf).map(|(idx, short, long)| (o, w, h, idx, short, long))
                })
                .min_by_key(|&(_, _, _, _, short, long)| (short, long))
                .map(|(o, w, h, idx, _, _)| (sheet_index, o, w, h, idx))
        });

        if let Some((sheet_index, orientation, w, h, rect_index)) = placed_in_open {
            let sheet = &mut sheets[sheet_index];
            let (x, y) = sheet.place(rect_index, w, h, options.kerf);
            sheet.placements.push(Placement {
                piece_id: piece.unit_id.clone(),
                order_item_id: piece.order_item_id.clone(),
                x,
                y,
                width: w,
                height: h,
                rotated: orientation == Orientation::Rotated,
            });
            continue;
        }

        let opened = families.iter_mut().find(|f| {
            f.remaining > 0
                && orients.iter().any(|&o| {
                    let (w, h) = apply_orientation(piece.width, piece.height, o);
                    w <= f.width && h <= f.height
                })
        });

        match opened {
            Some(family) => {
                let orientation = orients
                    .iter()
                    .copied()
                    .find(|&o| {
                        let (w, h) = apply_orientation(piece.width, piece.height, o);
                        w <= family.width && h <= family.height
                    })
                    .expect("already checked an orientation fits");
                let (w, h) = apply_orientation(piece.width, piece.height, orientation);
                family.remaining -= 1;
                let mut sheet = OpenSheet::new(family.id.clone(), family.width, family.height);
                let rect_index = sheet.best_fit(w, h, options.kerf).expect("fresh sheet has one full free rect").0;
                let (x, y) = sheet.place(rect_index, w, h, options.kerf);
                sheet.placements.push(Placement {
                    piece_id: piece.unit_id.clone(),
                    order_item_id: piece.order_item_id.clone(),
                    x,
                    y,
                    width: w,
                    height: h,
                    rotated: orientation == Orientation::Rotated,
                });
                sheets.push(sheet);
            }
            None => {
                *unplaced.entry(piece.original_id.clone()).or_insert(0) += 1;
            }
        }
    }

    let open_sheets: Vec<super::blf::OpenSheet> = sheets
        .into_iter()
        .map(|s| super::blf::OpenSheet {
            stock_id: s.stock_id,
            width: s.width,
            height: s.height,
            placements: s.placements,
        })
        .collect();

    finalize(open_sheets, unplaced, total_pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlgorithmOptions, PackedStock};

    fn piece(id: &str, width: u32, height: u32, quantity: u32, can_rotate: bool) -> Piece2D {
        Piece2D {
            id: id.into(),
            order_item_id: format!("order-{id}"),
            width,
            height,
            quantity,
            can_rotate,
        }
    }

    fn stock(id: &str, width: u32, height: u32, available: u32) -> Stock2D {
        Stock2D {
            id: id.into(),
            width,
            height,
            available,
            unit_price: None,
        }
    }

    // S6: two pieces that exactly tile a sheet leave zero waste.
    #[test]
    fn s6_exact_tiling_leaves_no_waste() {
        let pieces = vec![piece("p1", 400, 600, 1, false), piece("p2", 200, 600, 1, false)];
        let stock = vec![stock("s1", 600, 600, 1)];
        let options = AlgorithmOptions {
            kerf: 0,
            ..Default::default()
        };
        let result = Guillotine.execute(&pieces, &stock, options);
        assert!(result.success);
        assert_eq!(result.total_waste, 0);
    }

    #[test]
    fn non_overlap_holds_for_guillotine_splits() {
        let pieces = vec![piece("p1", 150, 150, 5, false)];
        let stock = vec![stock("s1", 400, 400, 1)];
        let options = AlgorithmOptions {
            kerf: 3,
            ..Default::default()
        };
        let result = Guillotine.execute(&pieces, &stock, options);
        let PackedStock::Sheets(sheets) = result.packed else {
            panic!("expected sheets")
        };
        let placements = &sheets[0].placements;
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                assert!(!placements[i].rect().inflate(options.kerf).overlaps(&placements[j].rect()));
            }
        }
    }

    // S6 (spec worked example): piece 400x300 on a 1000x800 sheet, kerf 5,
    // placed at (0,0) leaves free rects {405,0,595,800} and {0,305,405,495}.
    #[test]
    fn s6_split_matches_the_documented_free_rectangles() {
        let mut sheet = OpenSheet::new("s1".into(), 1000, 800);
        let rect_index = sheet.best_fit(400, 300, 5).unwrap().0;
        let (x, y) = sheet.place(rect_index, 400, 300, 5);
        assert_eq!((x, y), (0, 0));
        assert_eq!(sheet.free_rects.len(), 2);
        assert!(sheet.free_rects.contains(&Rect::new(405, 0, 595, 800)));
        assert!(sheet.free_rects.contains(&Rect::new(0, 305, 405, 495)));
    }

    #[test]
    fn unplaced_when_no_sheet_admits_piece() {
        let pieces = vec![piece("p1", 900, 900, 1, false)];
        let stock = vec![stock("s1", 400, 400, 3)];
        let result = Guillotine.execute(&pieces, &stock, AlgorithmOptions::default());
        assert_eq!(result.stock_used_count, 0);
        assert_eq!(result.unplaced_pieces[0].quantity, 1);
    }
}
