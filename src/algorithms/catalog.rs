use super::builtin::register_builtins;
use super::registry::{AlgorithmSpec, Extractor};
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name → extractor lookup used to turn configured algorithm tables into
/// [`AlgorithmSpec`]s.
#[derive(Clone)]
pub struct ExtractorCatalog {
    entries: BTreeMap<String, Arc<dyn Extractor>>,
}

impl Default for ExtractorCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ExtractorCatalog {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Catalog pre-populated with the reference extractors.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();
        register_builtins(&mut catalog);
        catalog
    }

    /// Register (or replace) an extractor, returning the previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> Option<Arc<dyn Extractor>> {
        self.entries.insert(name.into(), extractor)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Extractor>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Build a spec for `name` with the given weight.
    pub fn resolve(&self, name: &str, weight: f32) -> Result<AlgorithmSpec, ConfigError> {
        let extractor = self.get(name).ok_or_else(|| ConfigError::UnknownAlgorithm {
            name: name.to_string(),
        })?;
        Ok(AlgorithmSpec::new(name, weight, extractor))
    }
}

impl fmt::Debug for ExtractorCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
