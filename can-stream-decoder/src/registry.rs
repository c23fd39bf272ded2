//! Bus registry
//!
//! Binds logical bus names to the catalog loaded for each bus. The registry is
//! built once before streaming starts and is read-only afterwards.

use crate::signals::dbc::parse_dbc_file;
use crate::signals::Catalog;
use crate::types::{DecoderError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// A `<bus name>:<catalog path>` pair from the command line or config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusSpec {
    pub name: String,
    pub catalog: PathBuf,
}

impl BusSpec {
    pub fn new(name: impl Into<String>, catalog: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            catalog: catalog.into(),
        }
    }
}

impl FromStr for BusSpec {
    type Err = DecoderError;

    /// Splits at the first `:`; the path keeps any later colons.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => {
                Ok(BusSpec::new(name, path))
            }
            _ => Err(DecoderError::InvalidBusSpec(s.to_string())),
        }
    }
}

/// Registry of buses and their catalogs
#[derive(Debug, Default)]
pub struct BusRegistry {
    buses: HashMap<String, Catalog>,
}

impl BusRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            buses: HashMap::new(),
        }
    }

    /// Load every bus catalog in order
    ///
    /// The first failure aborts loading, so a partially populated registry
    /// is never returned.
    pub fn load(specs: &[BusSpec]) -> Result<Self> {
        let mut registry = Self::new();

        for spec in specs {
            if registry.contains(&spec.name) {
                return Err(DecoderError::DuplicateBus(spec.name.clone()));
            }

            log::info!("Loading catalog for bus '{}': {:?}", spec.name, spec.catalog);
            let catalog = parse_dbc_file(&spec.catalog).map_err(|e| {
                DecoderError::CatalogLoadError {
                    bus: spec.name.clone(),
                    path: spec.catalog.display().to_string(),
                    reason: e.to_string(),
                }
            })?;

            registry.register(spec.name.clone(), catalog)?;
        }

        Ok(registry)
    }

    /// Bind a catalog to a bus name
    ///
    /// A second registration under an existing name is rejected and the
    /// existing binding is left untouched.
    pub fn register(&mut self, bus: impl Into<String>, catalog: Catalog) -> Result<()> {
        let bus = bus.into();
        if self.buses.contains_key(&bus) {
            return Err(DecoderError::DuplicateBus(bus));
        }

        let stats = catalog.stats();
        log::info!(
            "Registered bus '{}' ({}): {} messages, {} signals",
            bus,
            catalog.source(),
            stats.num_messages,
            stats.num_signals
        );
        self.buses.insert(bus, catalog);
        Ok(())
    }

    /// Catalog bound to a bus name
    pub fn resolve(&self, bus: &str) -> Option<&Catalog> {
        self.buses.get(bus)
    }

    pub fn contains(&self, bus: &str) -> bool {
        self.buses.contains_key(bus)
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }
}
