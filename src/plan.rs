//! Converts a [`PackingResult`] into the persistence-agnostic plan shape the
//! engine hands back to its caller: one [`Layout`] per used stock unit, each
//! carrying a canonical JSON encoding of its cuts or placements.

use crate::model::{BarResult, PackedStock, PackingResult, SheetResult};
use serde::Serialize;
use uuid::Uuid;

/// One used stock unit's contribution to a plan, in emission order.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub stock_item_id: String,
    pub sequence: u32,
    pub waste: u64,
    pub waste_percentage: f64,
    pub serialized_layout: String,
}

/// The plan produced by converting one successful algorithm run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanData {
    pub plan_id: String,
    pub total_waste: u64,
    pub waste_percentage: f64,
    pub stock_used_count: usize,
    pub efficiency: f64,
    pub layouts: Vec<Layout>,
    pub unplaced_count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CutLayout<'a> {
    piece_id: &'a str,
    order_item_id: &'a str,
    position: u32,
    length: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BarLayout<'a> {
    bar_id: &'a str,
    bar_length: u32,
    cuts: Vec<CutLayout<'a>>,
    waste: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    usable_waste: Option<crate::model::UsableWaste>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacementLayout<'a> {
    piece_id: &'a str,
    order_item_id: &'a str,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    rotated: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SheetLayout<'a> {
    sheet_id: &'a str,
    sheet_width: u32,
    sheet_height: u32,
    placements: Vec<PlacementLayout<'a>>,
}

fn serialize_bar(bar: &BarResult) -> String {
    let mut cuts: Vec<&crate::model::Cut> = bar.cuts.iter().collect();
    cuts.sort_by_key(|c| c.position);
    let layout = BarLayout {
        bar_id: &bar.stock_id,
        bar_length: bar.stock_length,
        cuts: cuts
            .into_iter()
            .map(|c| CutLayout {
                piece_id: &c.piece_id,
                order_item_id: &c.order_item_id,
                position: c.position,
                length: c.length,
            })
            .collect(),
        waste: bar.waste,
        usable_waste: bar.usable_waste,
    };
    serde_json::to_string(&layout).expect("bar layout always serializes")
}

fn serialize_sheet(sheet: &SheetResult) -> String {
    let mut placements: Vec<&crate::model::Placement> = sheet.placements.iter().collect();
    placements.sort_by(|a, b| a.y.cmp(&b.y).then_with(|| a.x.cmp(&b.x)));
    let layout = SheetLayout {
        sheet_id: &sheet.stock_id,
        sheet_width: sheet.stock_width,
        sheet_height: sheet.stock_height,
        placements: placements
            .into_iter()
            .map(|p| PlacementLayout {
                piece_id: &p.piece_id,
                order_item_id: &p.order_item_id,
                x: p.x,
                y: p.y,
                width: p.width,
                height: p.height,
                rotated: p.rotated,
            })
            .collect(),
    };
    serde_json::to_string(&layout).expect("sheet layout always serializes")
}

/// Converts a completed packing result into plan data, assigning a dense,
/// 1-indexed `sequence` to each used stock unit in emission order.
pub fn to_plan_data(result: &PackingResult) -> PlanData {
    let unplaced_count = result.unplaced_pieces.iter().map(|p| p.quantity).sum();

    let layouts = match &result.packed {
        PackedStock::Bars(bars) => bars
            .iter()
            .enumerate()
            .map(|(index, bar)| Layout {
                stock_item_id: bar.stock_id.clone(),
                sequence: index as u32 + 1,
                waste: bar.waste as u64,
                waste_percentage: bar.waste_percentage,
                serialized_layout: serialize_bar(bar),
            })
            .collect(),
        PackedStock::Sheets(sheets) => sheets
            .iter()
            .enumerate()
            .map(|(index, sheet)| Layout {
                stock_item_id: sheet.stock_id.clone(),
                sequence: index as u32 + 1,
                waste: sheet.waste_area,
                waste_percentage: sheet.waste_percentage,
                serialized_layout: serialize_sheet(sheet),
            })
            .collect(),
    };

    PlanData {
        plan_id: Uuid::new_v4().to_string(),
        total_waste: result.total_waste,
        waste_percentage: result.total_waste_percentage,
        stock_used_count: result.stock_used_count,
        efficiency: result.statistics.efficiency,
        layouts,
        unplaced_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::Algorithm1D;
    use crate::model::{AlgorithmOptions, Piece1D, Stock1D};

    #[test]
    fn sequence_is_dense_and_one_indexed() {
        let pieces = vec![Piece1D {
            id: "p1".into(),
            order_item_id: "o1".into(),
            length: 900,
            quantity: 3,
        }];
        let stock = vec![Stock1D {
            id: "s1".into(),
            length: 1000,
            available: 3,
            unit_price: None,
        }];
        let result = crate::algorithms::Ffd.execute(&pieces, &stock, AlgorithmOptions::default());
        let plan = to_plan_data(&result);
        let sequences: Vec<u32> = plan.layouts.iter().map(|l| l.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn cuts_are_sorted_ascending_by_position_in_serialized_layout() {
        let pieces = vec![Piece1D {
            id: "p1".into(),
            order_item_id: "o1".into(),
            length: 300,
            quantity: 3,
        }];
        let stock = vec![Stock1D {
            id: "s1".into(),
            length: 1000,
            available: 1,
            unit_price: None,
        }];
        let options = AlgorithmOptions {
            kerf: 0,
            ..Default::default()
        };
        let result = crate::algorithms::Ffd.execute(&pieces, &stock, options);
        let plan = to_plan_data(&result);
        let parsed: serde_json::Value = serde_json::from_str(&plan.layouts[0].serialized_layout).unwrap();
        let positions: Vec<u64> = parsed["cuts"].as_array().unwrap().iter().map(|c| c["position"].as_u64().unwrap()).collect();
        assert_eq!(positions, vec![0, 300, 600]);
    }

    #[test]
    fn unplaced_count_sums_residual_quantities() {
        let result = PackingResult {
            unplaced_pieces: vec![
                crate::model::UnplacedPiece { piece_id: "a".into(), quantity: 2 },
                crate::model::UnplacedPiece { piece_id: "b".into(), quantity: 5 },
            ],
            ..PackingResult::empty_1d()
        };
        assert_eq!(to_plan_data(&result).unplaced_count, 7);
    }
}
