//! Process-wide registry of available algorithms.
//!
//! Algorithms are registered once at startup (the built-in four via
//! [`AlgorithmRegistry::with_defaults`]) and looked up by name on every
//! optimization run. Registration is idempotent: registering the same name
//! twice replaces the prior entry rather than erroring, so tests and
//! embedding applications can override a built-in without ceremony.

use crate::algorithms::{Algorithm1D, Algorithm2D, Bfd, BottomLeftFill, Dimensionality, Ffd, Guillotine};
use crate::error::CoreError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

enum Entry {
    OneD(Arc<dyn Algorithm1D>),
    TwoD(Arc<dyn Algorithm2D>),
}

/// A thread-safe name -> algorithm lookup table.
pub struct AlgorithmRegistry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        AlgorithmRegistry {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A registry pre-populated with the four built-in deterministic
    /// algorithms: `1D_FFD`, `1D_BFD`, `2D_BOTTOM_LEFT`, `2D_GUILLOTINE`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_1d(Arc::new(Ffd));
        registry.register_1d(Arc::new(Bfd));
        registry.register_2d(Arc::new(BottomLeftFill));
        registry.register_2d(Arc::new(Guillotine));
        registry
    }

    pub fn register_1d(&self, algorithm: Arc<dyn Algorithm1D>) {
        let name = algorithm.name().to_string();
        self.entries.write().unwrap().insert(name, Entry::OneD(algorithm));
    }

    pub fn register_2d(&self, algorithm: Arc<dyn Algorithm2D>) {
        let name = algorithm.name().to_string();
        self.entries.write().unwrap().insert(name, Entry::TwoD(algorithm));
    }

    pub fn get_1d(&self, name: &str) -> Result<Arc<dyn Algorithm1D>, CoreError> {
        match self.entries.read().unwrap().get(name) {
            Some(Entry::OneD(algorithm)) => Ok(algorithm.clone()),
            Some(Entry::TwoD(_)) => Err(CoreError::AlgorithmMismatch {
                algorithm: name.to_string(),
                job_dimensionality: Dimensionality::OneD.as_str().to_string(),
            }),
            None => Err(CoreError::UnknownAlgorithm(name.to_string())),
        }
    }

    pub fn get_2d(&self, name: &str) -> Result<Arc<dyn Algorithm2D>, CoreError> {
        match self.entries.read().unwrap().get(name) {
            Some(Entry::TwoD(algorithm)) => Ok(algorithm.clone()),
            Some(Entry::OneD(_)) => Err(CoreError::AlgorithmMismatch {
                algorithm: name.to_string(),
                job_dimensionality: Dimensionality::TwoD.as_str().to_string(),
            }),
            None => Err(CoreError::UnknownAlgorithm(name.to_string())),
        }
    }

    /// The strategy executor's bare default algorithm name, used by
    /// [`crate::executor::resolve`] when a job specifies neither an explicit
    /// algorithm nor an oracle recommendation exists to consult. This is
    /// distinct from [`crate::engine::oracle_fallback_algorithm`], the
    /// historical safe default consulted only when the policy oracle itself
    /// declines to recommend.
    pub fn default_algorithm(dimensionality: Dimensionality) -> &'static str {
        match dimensionality {
            Dimensionality::OneD => "1D_FFD",
            Dimensionality::TwoD => "2D_BOTTOM_LEFT",
        }
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves_all_built_ins() {
        let registry = AlgorithmRegistry::with_defaults();
        assert!(registry.get_1d("1D_FFD").is_ok());
        assert!(registry.get_1d("1D_BFD").is_ok());
        assert!(registry.get_2d("2D_BOTTOM_LEFT").is_ok());
        assert!(registry.get_2d("2D_GUILLOTINE").is_ok());
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = AlgorithmRegistry::with_defaults();
        let Err(err) = registry.get_1d("NOPE") else {
            panic!("expected an error")
        };
        assert_eq!(err.code().as_str(), "UNKNOWN_ALGORITHM");
    }

    #[test]
    fn dimensionality_mismatch_is_reported() {
        let registry = AlgorithmRegistry::with_defaults();
        let Err(err) = registry.get_2d("1D_FFD") else {
            panic!("expected an error")
        };
        assert_eq!(err.code().as_str(), "ALGORITHM_MISMATCH");
    }

    #[test]
    fn re_registering_a_name_replaces_it() {
        let registry = AlgorithmRegistry::new();
        registry.register_1d(Arc::new(Ffd));
        registry.register_1d(Arc::new(Bfd));
        // Re-registering under Ffd's name with Bfd's impl should resolve to Bfd.
        registry.entries.write().unwrap().insert("1D_FFD".to_string(), Entry::OneD(Arc::new(Bfd)));
        assert_eq!(registry.get_1d("1D_FFD").unwrap().name(), "1D_BFD");
    }
}
