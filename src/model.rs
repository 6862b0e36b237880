//! In-process data contracts crossing the core boundary: pieces, stock,
//! placements, and the packing result produced by an algorithm run.

use crate::geometry::Rect;
use serde::Serialize;

#[cfg(feature = "serialize")]
use serde::Deserialize;

/// A 1D piece to be cut from a bar, before quantity expansion.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct Piece1D {
    pub id: String,
    pub order_item_id: String,
    pub length: u32,
    pub quantity: u32,
}

/// A 2D piece to be cut from a sheet, before quantity expansion.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct Piece2D {
    pub id: String,
    pub order_item_id: String,
    pub width: u32,
    pub height: u32,
    pub quantity: u32,
    pub can_rotate: bool,
}

/// A family of bars available to cut 1D pieces from.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct Stock1D {
    pub id: String,
    pub length: u32,
    pub available: u32,
    pub unit_price: Option<f64>,
}

/// A family of sheets available to cut 2D pieces from.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct Stock2D {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub available: u32,
    pub unit_price: Option<f64>,
}

/// A single cut made in a placed bar.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cut {
    pub piece_id: String,
    pub order_item_id: String,
    pub position: u32,
    pub length: u32,
}

/// A single piece placed on a sheet.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub piece_id: String,
    pub order_item_id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A reusable remnant left at the tail end of a bar.
///
/// Always serializable: it appears in a bar's `serializedLayout` regardless
/// of whether the `serialize` feature enables (de)serialization on the rest
/// of the algorithm-layer DTOs.
#[cfg_attr(feature = "serialize", derive(Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UsableWaste {
    pub position: u32,
    pub length: u32,
}

/// The result of packing one used bar.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct BarResult {
    pub stock_id: String,
    pub stock_length: u32,
    pub cuts: Vec<Cut>,
    pub waste: u32,
    pub waste_percentage: f64,
    pub usable_waste: Option<UsableWaste>,
}

/// The result of packing one used sheet.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct SheetResult {
    pub stock_id: String,
    pub stock_width: u32,
    pub stock_height: u32,
    pub placements: Vec<Placement>,
    pub used_area: u64,
    pub waste_area: u64,
    pub waste_percentage: f64,
}

/// A piece (aggregated back to its original id) that no candidate stock
/// could admit.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnplacedPiece {
    pub piece_id: String,
    pub quantity: u32,
}

/// Aggregate statistics for a single algorithm run.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct Statistics {
    pub total_pieces: u32,
    pub total_stock_extent: u64,
    pub total_used_extent: u64,
    pub efficiency: f64,
}

/// Either the bar results of a 1D run or the sheet results of a 2D run.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub enum PackedStock {
    Bars(Vec<BarResult>),
    Sheets(Vec<SheetResult>),
}

impl PackedStock {
    pub fn stock_used_count(&self) -> usize {
        match self {
            PackedStock::Bars(bars) => bars.len(),
            PackedStock::Sheets(sheets) => sheets.len(),
        }
    }
}

/// The full output of a single algorithm run.
#[cfg_attr(feature = "serialize", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug)]
pub struct PackingResult {
    pub success: bool,
    pub packed: PackedStock,
    pub total_waste: u64,
    pub total_waste_percentage: f64,
    pub stock_used_count: usize,
    pub unplaced_pieces: Vec<UnplacedPiece>,
    pub statistics: Statistics,
}

impl PackingResult {
    pub fn empty_1d() -> Self {
        PackingResult {
            success: false,
            packed: PackedStock::Bars(Vec::new()),
            total_waste: 0,
            total_waste_percentage: 0.0,
            stock_used_count: 0,
            unplaced_pieces: Vec::new(),
            statistics: Statistics::default(),
        }
    }

    pub fn empty_2d() -> Self {
        PackingResult {
            success: false,
            packed: PackedStock::Sheets(Vec::new()),
            total_waste: 0,
            total_waste_percentage: 0.0,
            stock_used_count: 0,
            unplaced_pieces: Vec::new(),
            statistics: Statistics::default(),
        }
    }
}

/// Parameters shared by every algorithm, after defaulting and validation.
#[derive(Clone, Copy, Debug)]
pub struct AlgorithmOptions {
    pub kerf: u32,
    pub min_usable_waste: u32,
    pub allow_rotation: bool,
    /// 2D only: require a guillotine-cuttable layout. Consumed by the
    /// executor's defaulting/validation, not by an algorithm's own
    /// `execute` -- `2D_GUILLOTINE` always satisfies it by construction,
    /// `2D_BOTTOM_LEFT` never does.
    pub guillotine_only: bool,
}

impl Default for AlgorithmOptions {
    fn default() -> Self {
        AlgorithmOptions {
            kerf: 3,
            min_usable_waste: 50,
            allow_rotation: true,
            guillotine_only: false,
        }
    }
}
