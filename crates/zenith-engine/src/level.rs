//! Level population from named spawn layers.
//!
//! A map-loading collaborator hands the engine groups of named rectangles;
//! this module turns them into entities through a registry of per-kind
//! factories. The engine does not care about the map file format, only
//! about `(kind, bounds)` pairs, so layers deserialize from plain JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zenith_ecs::prelude::*;

use crate::body::{Body, BodyType, Fixture, FixtureKind};
use crate::math::Aabb;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while populating a level.
#[derive(Debug, Error)]
pub enum LevelError {
    /// A spawn entry named a kind no factory is registered for.
    #[error("no factory registered for spawn kind {kind:?} in layer {layer:?}")]
    UnknownSpawnKind {
        /// The unmatched entry kind.
        kind: String,
        /// The layer the entry came from.
        layer: String,
    },

    /// The layer input was not valid JSON of the expected shape.
    #[error("spawn layer input failed to parse")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Spawn input
// ---------------------------------------------------------------------------

/// One rectangle to instantiate: a kind tag plus its placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub kind: String,
    pub bounds: Aabb,
}

/// A named group of spawn entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnLayer {
    pub name: String,
    pub entries: Vec<SpawnEntry>,
}

/// Parse spawn layers from a JSON document.
pub fn layers_from_json(input: &str) -> Result<Vec<SpawnLayer>, LevelError> {
    Ok(serde_json::from_str(input)?)
}

// ---------------------------------------------------------------------------
// SpawnRegistry
// ---------------------------------------------------------------------------

type SpawnFactory = Box<dyn Fn(&SpawnEntry) -> ComponentStore>;

/// Registry mapping spawn kinds to entity factories.
#[derive(Default)]
pub struct SpawnRegistry {
    factories: HashMap<String, SpawnFactory>,
}

impl SpawnRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the stock `"block"` and `"death_zone"` factories.
    pub fn with_stock_factories() -> Self {
        let mut registry = Self::new();
        registry.register("block", |entry| {
            let mut store = ComponentStore::new();
            store.put(
                Body::new(entry.bounds, BodyType::Static).with_fixture(Fixture::new(
                    FixtureKind::Block,
                    entry.bounds.width,
                    entry.bounds.height,
                )),
            );
            store
        });
        registry.register("death_zone", |entry| {
            let mut store = ComponentStore::new();
            store.put(
                Body::new(entry.bounds, BodyType::Static).with_fixture(Fixture::new(
                    FixtureKind::DeathZone,
                    entry.bounds.width,
                    entry.bounds.height,
                )),
            );
            store
        });
        registry
    }

    /// Register a factory for `kind`, replacing any previous one.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        factory: impl Fn(&SpawnEntry) -> ComponentStore + 'static,
    ) {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    /// Whether a factory exists for `kind`.
    pub fn supports(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    fn build(&self, layer: &SpawnLayer, entry: &SpawnEntry) -> Result<ComponentStore, LevelError> {
        let factory = self
            .factories
            .get(&entry.kind)
            .ok_or_else(|| LevelError::UnknownSpawnKind {
                kind: entry.kind.clone(),
                layer: layer.name.clone(),
            })?;
        Ok(factory(entry))
    }
}

/// Instantiate every entry of every layer, in order.
///
/// The spawned ids become live at the next frame start, like any other
/// spawn. Fails on the first entry whose kind has no factory; entities
/// queued before the failure stay queued.
pub fn populate(
    orchestrator: &mut Orchestrator,
    layers: &[SpawnLayer],
    registry: &SpawnRegistry,
) -> Result<Vec<EntityId>, LevelError> {
    let mut spawned = Vec::new();
    for layer in layers {
        for entry in &layer.entries {
            let store = registry.build(layer, entry)?;
            let id = orchestrator.spawn(store);
            spawned.push(id);
        }
        tracing::debug!(layer = %layer.name, entries = layer.entries.len(), "layer populated");
    }
    Ok(spawned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
