//! Bottom-Left Fill: a greedy 2D sheet-packing heuristic.
//!
//! For each piece, in descending-area order, every open sheet is searched
//! for the lowest, then leftmost integer position that the piece (in either
//! orientation) fits into without its kerf-inflated bounding box overlapping
//! an existing placement. See the module-level open question in `DESIGN.md`
//! about the scan's complexity on sheet-scale inputs.

use crate::geometry::{apply_orientation, orientations, Orientation, Rect};
use crate::model::{AlgorithmOptions, PackedStock, Placement, PackingResult, Piece2D, SheetResult, Statistics, Stock2D, UnplacedPiece};
use std::collections::HashMap;

use super::Algorithm2D;

/// Bottom-left-fill 2D sheet packer.
pub struct BottomLeftFill;

impl Algorithm2D for BottomLeftFill {
    fn name(&self) -> &'static str {
        "2D_BOTTOM_LEFT"
    }

    fn execute(&self, pieces: &[Piece2D], stock: &[Stock2D], options: AlgorithmOptions) -> PackingResult {
        run(pieces, stock, options)
    }
}

pub(super) struct OpenSheet {
    pub stock_id: String,
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

impl OpenSheet {
    fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.rect().area()).sum()
    }

    /// Finds the lowest, then leftmost position for a `w x h` piece that
    /// doesn't collide (at `kerf`) with any existing placement.
    fn find_position(&self, w: u32, h: u32, kerf: u32) -> Option<(u32, u32)> {
        if w > self.width || h > self.height {
            return None;
        }
        for y in 0..=(self.height - h) {
            for x in 0..=(self.width - w) {
                let candidate = Rect::new(x, y, w, h);
                let collides = self
                    .placements
                    .iter()
                    .any(|placed| placed.rect().inflate(kerf).overlaps(&candidate));
                if !collides {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

struct StockFamily {
    id: String,
    width: u32,
    height: u32,
    remaining: u32,
}

fn run(pieces: &[Piece2D], stock: &[Stock2D], options: AlgorithmOptions) -> PackingResult {
    if pieces.is_empty() || stock.is_empty() {
        return PackingResult::empty_2d();
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

        if let Some((sheet_index, x, y, w, h, rotated)) =
            find_in_open_sheets(&sheets, piece.width, piece.height, &orients, options.kerf)
        {
            sheets[sheet_index].placements.push(Placement {
                piece_id: piece.unit_id.clone(),
                order_item_id: piece.order_item_id.clone(),
                x,
                y,
                width: w,
                height: h,
                rotated,
            });
            continue;
        }

        let opened = families.iter_mut().find(|f| {
            f.remaining > 0
                && orients
                    .iter()
                    .any(|&o| fits_family(f, piece.width, piece.height, o))
        });

        match opened {
            Some(family) => {
                let orientation = orients
                    .iter()
                    .copied()
                    .find(|&o| fits_family(family, piece.width, piece.height, o))
                    .expect("already checked an orientation fits");
                let (w, h) = apply_orientation(piece.width, piece.height, orientation);
                family.remaining -= 1;
                let mut sheet = OpenSheet {
                    stock_id: family.id.clone(),
                    width: family.width,
                    height: family.height,
                    placements: Vec::new(),
                };
                sheet.placements.push(Placement {
                    piece_id: piece.unit_id.clone(),
                    order_item_id: piece.order_item_id.clone(),
                    x: 0,
                    y: 0,
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

    finalize(sheets, unplaced, total_pieces)
}

fn fits_family(family: &StockFamily, width: u32, height: u32, orientation: Orientation) -> bool {
    let (w, h) = apply_orientation(width, height, orientation);
    w <= family.width && h <= family.height
}

#[allow(clippy::type_complexity)]
fn find_in_open_sheets(
    sheets: &[OpenSheet],
    width: u32,
    height: u32,
    orients: &[Orientation],
    kerf: u32,
) -> Option<(usize, u32, u32, u32, u32, bool)> {
    for (index, sheet) in sheets.iter().enumerate() {
        for &orientation in orients {
            let (w, h) = apply_orientation(width, height, orientation);
            if let Some((x, y)) = sheet.find_position(w, h, kerf) {
                return Some((index, x, y, w, h, orientation == Orientation::Rotated));
            }
        }
    }
    None
}

pub(super) fn finalize(
    sheets: Vec<OpenSheet>,
    unplaced: HashMap<String, u32>,
    total_pieces: u32,
) -> PackingResult {
    let mut total_stock_extent: u64 = 0;
    let mut total_used_extent: u64 = 0;
    let mut sheet_results = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        let stock_area = sheet.width as u64 * sheet.height as u64;
        let used_area = sheet.used_area();
        let waste_area = stock_area - used_area;
        let waste_percentage = if stock_area == 0 {
            0.0
        } else {
            waste_area as f64 / stock_area as f64 * 100.0
        };

        total_stock_extent += stock_area;
        total_used_extent += used_area;

        let mut placements = sheet.placements;
        placements.sort_by(|a, b| a.y.cmp(&b.y).then_with(|| a.x.cmp(&b.x)));

        sheet_results.push(SheetResult {
            stock_id: sheet.stock_id,
            stock_width: sheet.width,
            stock_height: sheet.height,
            placements,
            used_area,
            waste_area,
            waste_percentage,
        });
    }

    let total_waste = total_stock_extent - total_used_extent;
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

    let mut unplaced_pieces: Vec<UnplacedPiece> = unplaced
        .into_iter()
        .map(|(piece_id, quantity)| UnplacedPiece { piece_id, quantity })
        .collect();
    unplaced_pieces.sort_by(|a, b| a.piece_id.cmp(&b.piece_id));

    let stock_used_count = sheet_results.len();
    PackingResult {
        success: true,
        packed: PackedStock::Sheets(sheet_results),
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
