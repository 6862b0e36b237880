//! Strategy executor: resolves which algorithm to run, defaults and
//! validates its parameters, and times the run. This is the layer between
//! the registry (which only knows how to look algorithms up by name) and the
//! engine (which doesn't want to know about defaulting or validation).

use crate::algorithms::Dimensionality;
use crate::error::CoreError;
use crate::model::{AlgorithmOptions, PackingResult, Piece1D, Piece2D, Stock1D, Stock2D};
use crate::registry::AlgorithmRegistry;
use std::time::Instant;

/// Caller-supplied overrides; any field left `None` falls back to the
/// executor's defaults.
#[derive(Clone, Debug, Default)]
pub struct ExecutionParams {
    pub algorithm: Option<String>,
    pub kerf: Option<u32>,
    pub min_usable_waste: Option<u32>,
    pub allow_rotation: Option<bool>,
    pub guillotine_only: Option<bool>,
}

/// Maximum kerf accepted by validation, in millimeters.
const MAX_KERF_MM: u32 = 20;

/// The outcome of one algorithm run, with the bookkeeping the engine needs
/// beyond the raw packing result.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub result: Option<PackingResult>,
    pub algorithm_name: String,
    pub elapsed_ms: u64,
    pub error: Option<CoreError>,
}

/// Validates and defaults `params`, returning the resolved options plus the
/// algorithm name to run. Performed up front so a validation failure never
/// invokes an algorithm.
pub(crate) fn resolve(
    dimensionality: Dimensionality,
    params: &ExecutionParams,
) -> Result<(String, AlgorithmOptions), CoreError> {
    let guillotine_only = params.guillotine_only.unwrap_or(false) && dimensionality == Dimensionality::TwoD;

    let algorithm_name = match (&params.algorithm, guillotine_only) {
        (Some(requested), true) if requested != "2D_GUILLOTINE" => {
            return Err(CoreError::ValidationError {
                field: "algorithm".to_string(),
                message: format!("guillotineOnly requires 2D_GUILLOTINE, but {requested} was requested"),
            });
        }
        (Some(requested), _) => requested.clone(),
        (None, true) => "2D_GUILLOTINE".to_string(),
        (None, false) => AlgorithmRegistry::default_algorithm(dimensionality).to_string(),
    };

    let kerf = params.kerf.unwrap_or(3);
    if kerf > MAX_KERF_MM {
        return Err(CoreError::ValidationError {
            field: "kerf".to_string(),
            message: format!("kerf {kerf} exceeds the maximum of {MAX_KERF_MM}mm"),
        });
    }

    let min_usable_waste = params.min_usable_waste.unwrap_or(50);
    let allow_rotation = params.allow_rotation.unwrap_or(true);

    Ok((
        algorithm_name,
        AlgorithmOptions {
            kerf,
            min_usable_waste,
            allow_rotation,
            guillotine_only,
        },
    ))
}

pub fn execute_1d(
    registry: &AlgorithmRegistry,
    pieces: &[Piece1D],
    stock: &[Stock1D],
    params: &ExecutionParams,
) -> ExecutionOutcome {
    let (algorithm_name, options) = match resolve(Dimensionality::OneD, params) {
        Ok(resolved) => resolved,
        Err(err) => {
            return ExecutionOutcome {
                success: false,
                result: None,
                algorithm_name: params.algorithm.clone().unwrap_or_default(),
                elapsed_ms: 0,
                error: Some(err),
            }
        }
    };

    let algorithm = match registry.get_1d(&algorithm_name) {
        Ok(algorithm) => algorithm,
        Err(err) => {
            return ExecutionOutcome {
                success: false,
                result: None,
                algorithm_name,
                elapsed_ms: 0,
                error: Some(err),
            }
        }
    };

    let started = Instant::now();
    let result = algorithm.execute(pieces, stock, options);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    ExecutionOutcome {
        success: true,
        result: Some(result),
        algorithm_name,
        elapsed_ms,
        error: None,
    }
}

pub fn execute_2d(
    registry: &AlgorithmRegistry,
    pieces: &[Piece2D],
    stock: &[Stock2D],
    params: &ExecutionParams,
) -> ExecutionOutcome {
    let (algorithm_name, options) = match resolve(Dimensionality::TwoD, params) {
        Ok(resolved) => resolved,
        Err(err) => {
            return ExecutionOutcome {
                success: false,
                result: None,
                algorithm_name: params.algorithm.clone().unwrap_or_default(),
                elapsed_ms: 0,
                error: Some(err),
            }
        }
    };

    let algorithm = match registry.get_2d(&algorithm_name) {
        Ok(algorithm) => algorithm,
        Err(err) => {
            return ExecutionOutcome {
                success: false,
                result: None,
                algorithm_name,
                elapsed_ms: 0,
                error: Some(err),
            }
        }
    };

    let started = Instant::now();
    let result = algorithm.execute(pieces, stock, options);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    ExecutionOutcome {
        success: true,
        result: Some(result),
        algorithm_name,
        elapsed_ms,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn defaults_to_ffd_when_unspecified() {
        let registry = AlgorithmRegistry::with_defaults();
        let outcome = execute_1d(&registry, &[piece("p1", 100, 1)], &[stock("s1", 1000, 1)], &ExecutionParams::default());
        assert!(outcome.success);
        assert_eq!(outcome.algorithm_name, "1D_FFD");
    }

    fn piece_2d(id: &str, width: u32, height: u32, quantity: u32) -> crate::model::Piece2D {
        crate::model::Piece2D {
            id: id.into(),
            order_item_id: format!("order-{id}"),
            width,
            height,
            quantity,
            can_rotate: true,
        }
    }

    fn stock_2d(id: &str, width: u32, height: u32, available: u32) -> crate::model::Stock2D {
        crate::model::Stock2D {
            id: id.into(),
            width,
            height,
            available,
            unit_price: None,
        }
    }

    #[test]
    fn defaults_to_bottom_left_fill_when_unspecified_2d() {
        let registry = AlgorithmRegistry::with_defaults();
        let outcome = execute_2d(
            &registry,
            &[piece_2d("p1", 100, 100, 1)],
            &[stock_2d("s1", 1000, 1000, 1)],
            &ExecutionParams::default(),
        );
        assert!(outcome.success);
        assert_eq!(outcome.algorithm_name, "2D_BOTTOM_LEFT");
    }

    #[test]
    fn rejects_kerf_above_maximum() {
        let registry = AlgorithmRegistry::with_defaults();
        let params = ExecutionParams {
            kerf: Some(21),
            ..Default::default()
        };
        let outcome = execute_1d(&registry, &[piece("p1", 100, 1)], &[stock("s1", 1000, 1)], &params);
        assert!(!outcome.success);
        assert_eq!(outcome.error.unwrap().code().as_str(), "VALIDATION_ERROR");
    }

    #[test]
    fn unknown_algorithm_name_is_reported() {
        let registry = AlgorithmRegistry::with_defaults();
        let params = ExecutionParams {
            algorithm: Some("NOPE".to_string()),
            ..Default::default()
        };
        let outcome = execute_1d(&registry, &[piece("p1", 100, 1)], &[stock("s1", 1000, 1)], &params);
        assert!(!outcome.success);
        assert_eq!(outcome.error.unwrap().code().as_str(), "UNKNOWN_ALGORITHM");
    }

    #[test]
    fn guillotine_only_overrides_the_unspecified_2d_default() {
        let registry = AlgorithmRegistry::with_defaults();
        let params = ExecutionParams {
            guillotine_only: Some(true),
            ..Default::default()
        };
        let outcome = execute_2d(&registry, &[piece_2d("p1", 100, 100, 1)], &[stock_2d("s1", 1000, 1000, 1)], &params);
        assert!(outcome.success);
        assert_eq!(outcome.algorithm_name, "2D_GUILLOTINE");
    }

    #[test]
    fn guillotine_only_rejects_a_conflicting_explicit_algorithm() {
        let registry = AlgorithmRegistry::with_defaults();
        let params = ExecutionParams {
            algorithm: Some("2D_BOTTOM_LEFT".to_string()),
            guillotine_only: Some(true),
            ..Default::default()
        };
        let outcome = execute_2d(&registry, &[piece_2d("p1", 100, 100, 1)], &[stock_2d("s1", 1000, 1000, 1)], &params);
        assert!(!outcome.success);
        assert_eq!(outcome.error.unwrap().code().as_str(), "VALIDATION_ERROR");
    }

    #[test]
    fn explicit_algorithm_choice_is_honored() {
        let registry = AlgorithmRegistry::with_defaults();
        let params = ExecutionParams {
            algorithm: Some("1D_BFD".to_string()),
            ..Default::default()
        };
        let outcome = execute_1d(&registry, &[piece("p1", 100, 1)], &[stock("s1", 1000, 1)], &params);
        assert!(outcome.success);
        assert_eq!(outcome.algorithm_name, "1D_BFD");
    }
}
