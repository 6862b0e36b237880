//! Explodes quantity-bearing pieces into unit instances with stable derived
//! ids, so every downstream algorithm only ever deals with single-quantity
//! pieces.

use crate::model::{Piece1D, Piece2D};

/// A single unit-quantity 1D piece, expanded from a [`Piece1D`].
#[derive(Clone, Debug)]
pub struct ExpandedPiece1D {
    pub unit_id: String,
    pub original_id: String,
    pub order_item_id: String,
    pub length: u32,
}

/// A single unit-quantity 2D piece, expanded from a [`Piece2D`].
#[derive(Clone, Debug)]
pub struct ExpandedPiece2D {
    pub unit_id: String,
    pub original_id: String,
    pub order_item_id: String,
    pub width: u32,
    pub height: u32,
    pub can_rotate: bool,
}

/// Expands a list of 1D pieces by quantity, preserving input order.
///
/// Each unit gets an id of the form `"<id>_<index>"`, where `index` is
/// zero-based and restarts for every original piece. The `original_id` field
/// lets callers aggregate unplaced remainders back onto the piece the caller
/// actually asked for.
pub fn expand_1d(pieces: &[Piece1D]) -> Vec<ExpandedPiece1D> {
    let mut out = Vec::new();
    for piece in pieces {
        for index in 0..piece.quantity {
            out.push(ExpandedPiece1D {
                unit_id: format!("{}_{}", piece.id, index),
                original_id: piece.id.clone(),
                order_item_id: piece.order_item_id.clone(),
                length: piece.length,
            });
        }
    }
    out
}

/// Expands a list of 2D pieces by quantity, preserving input order.
pub fn expand_2d(pieces: &[Piece2D]) -> Vec<ExpandedPiece2D> {
    let mut out = Vec::new();
    for piece in pieces {
        for index in 0..piece.quantity {
            out.push(ExpandedPiece2D {
                unit_id: format!("{}_{}", piece.id, index),
                original_id: piece.id.clone(),
                order_item_id: piece.order_item_id.clone(),
                width: piece.width,
                height: piece.height,
                can_rotate: piece.can_rotate,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece_1d(id: &str, length: u32, quantity: u32) -> Piece1D {
        Piece1D {
            id: id.into(),
            order_item_id: format!("order-{id}"),
            length,
            quantity,
        }
    }

    #[test]
    fn expands_by_quantity_with_derived_ids() {
        let pieces = vec![piece_1d("p1", 300, 3)];
        let expanded = expand_1d(&pieces);
        let ids: Vec<_> = expanded.iter().map(|p| p.unit_id.clone()).collect();
        assert_eq!(ids, vec!["p1_0", "p1_1", "p1_2"]);
        assert!(expanded.iter().all(|p| p.original_id == "p1"));
    }

    #[test]
    fn order_is_stable_and_input_preserving() {
        let pieces = vec![piece_1d("a", 100, 2), piece_1d("b", 50, 1)];
        let expanded = expand_1d(&pieces);
        let ids: Vec<_> = expanded.iter().map(|p| p.unit_id.clone()).collect();
        assert_eq!(ids, vec!["a_0", "a_1", "b_0"]);
    }

    #[test]
    fn zero_quantity_yields_no_units() {
        let pieces = vec![piece_1d("p1", 300, 0)];
        assert!(expand_1d(&pieces).is_empty());
    }

    #[test]
    fn expands_2d_pieces_preserving_rotation_flag() {
        let pieces = vec![Piece2D {
            id: "p1".into(),
            order_item_id: "o1".into(),
            width: 100,
            height: 200,
            quantity: 2,
            can_rotate: true,
        }];
        let expanded = expand_2d(&pieces);
        assert_eq!(expanded.len(), 2);
        assert!(expanded.iter().all(|p| p.can_rotate));
    }
}
