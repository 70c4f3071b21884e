//! Hand-off of ready sources to the tile server.

use std::collections::BTreeMap;
use std::fmt::Debug;

use tracing::{info, warn};

use crate::ReadySource;

/// Receives sources once their descriptor is ready.
pub trait TileRegistrar: Debug {
    fn register(&mut self, source: ReadySource);
}

/// In-memory registry of ready sources, keyed by source id.
#[derive(Debug, Default)]
pub struct RegisteredSources(BTreeMap<String, ReadySource>);

impl RegisteredSources {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ReadySource> {
        self.0.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TileRegistrar for RegisteredSources {
    fn register(&mut self, source: ReadySource) {
        let id = source.id.clone();
        if self.0.insert(id.clone(), source).is_some() {
            warn!("Source {id} was already registered and has been replaced");
        } else {
            info!("Registered source {id}");
        }
    }
}
