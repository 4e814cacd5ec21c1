//! Id-keyed diffing of entity collections
//!
//! A diff partitions two collections by id into entities that only exist in
//! the target (`new`), entities that only exist in the source (`deleted`) and
//! entities present in both whose fields differ (`changed`, target version).

use crate::types::{Category, CategoryId, Sound, SoundId};
use std::collections::BTreeMap;

/// An entity with a stable identity
pub trait Identified: Clone + PartialEq {
    /// Identifier type
    type Id: Ord + Clone;

    /// The entity's identifier
    fn id(&self) -> &Self::Id;
}

impl Identified for Category {
    type Id = CategoryId;

    fn id(&self) -> &CategoryId {
        &self.id
    }
}

impl Identified for Sound {
    type Id = SoundId;

    fn id(&self) -> &SoundId {
        &self.id
    }
}

/// Collect entities into a map keyed by id
pub fn index_by_id<T, I>(entities: I) -> BTreeMap<T::Id, T>
where
    T: Identified,
    I: IntoIterator<Item = T>,
{
    entities
        .into_iter()
        .map(|entity| (entity.id().clone(), entity))
        .collect()
}

/// New / deleted / changed partition between two collections
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDiff<T> {
    /// Present in target, absent from source
    pub new: Vec<T>,
    /// Present in source, absent from target
    pub deleted: Vec<T>,
    /// Present in both with differing fields (target version)
    pub changed: Vec<T>,
}

impl<T: Identified> EntityDiff<T> {
    /// Compute the changes that turn `source` into `target`
    pub fn between(source: &BTreeMap<T::Id, T>, target: &BTreeMap<T::Id, T>) -> Self {
        let mut new = Vec::new();
        let mut changed = Vec::new();

        for (id, entity) in target {
            match source.get(id) {
                None => new.push(entity.clone()),
                Some(existing) if existing != entity => changed.push(entity.clone()),
                Some(_) => {}
            }
        }

        let deleted = source
            .iter()
            .filter(|(id, _)| !target.contains_key(*id))
            .map(|(_, entity)| entity.clone())
            .collect();

        Self {
            new,
            deleted,
            changed,
        }
    }

    /// True when source and target hold identical entities
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.deleted.is_empty() && self.changed.is_empty()
    }

    /// Ids of the deleted entities
    pub fn deleted_ids(&self) -> Vec<T::Id> {
        self.deleted.iter().map(|entity| entity.id().clone()).collect()
    }
}
