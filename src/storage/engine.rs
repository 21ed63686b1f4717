//! The storage contract shared by every backend.
//!
//! Consumers are generic over [`Storage`]; the concrete backend is picked once
//! at startup and never inspected again.

use std::collections::BTreeMap;

use crate::models::{Amenity, City, ClassName, Entity, Model, Place, Review};
use crate::storage::{StorageError, StorageResult};

/// Live objects keyed by `"<Class>.<id>"`.
pub type Objects = BTreeMap<String, Entity>;

/// Object storage.
///
/// Lifecycle: construct the backend, call [`Storage::reload`] once, use it,
/// then [`Storage::close`] it. Mutating operations take `&mut self`; a store
/// has a single owner.
#[allow(async_fn_in_trait)]
pub trait Storage {
    /// All live objects, or only those of `class`.
    async fn all(&self, class: Option<ClassName>) -> StorageResult<Objects>;

    /// The object of `class` with `id`, if any. A missing id is not an error.
    async fn get(&self, class: ClassName, id: &str) -> StorageResult<Option<Entity>>;

    /// Register (or replace) an object. Durable only after [`Storage::save`].
    async fn new(&mut self, entity: Entity) -> StorageResult<()>;

    /// Make every registered change durable.
    async fn save(&mut self) -> StorageResult<()>;

    /// Remove an object. Removing an unknown object is a no-op.
    async fn delete(&mut self, entity: &Entity) -> StorageResult<()>;

    /// Load durable state (file backend) or establish the schema (database
    /// backend).
    async fn reload(&mut self) -> StorageResult<()>;

    /// Release the backend's resources.
    async fn close(self) -> StorageResult<()>
    where
        Self: Sized;

    /// Typed lookup.
    async fn get_as<M: Model>(&self, id: &str) -> StorageResult<Option<M>> {
        Ok(self.get(M::CLASS, id).await?.and_then(M::from_entity))
    }

    /// Typed lookup that treats a missing object as an error.
    async fn require<M: Model>(&self, id: &str) -> StorageResult<M> {
        self.get_as::<M>(id)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                class: M::CLASS.to_string(),
                id: id.to_string(),
            })
    }

    /// Save a single object: bump its `updated_at`, register it, flush.
    async fn save_entity(&mut self, entity: &mut Entity) -> StorageResult<()> {
        entity.touch()?;
        self.new(entity.clone()).await?;
        self.save().await
    }

    /// Delete a single object and flush.
    async fn destroy(&mut self, entity: &Entity) -> StorageResult<()> {
        self.delete(entity).await?;
        self.save().await
    }

    async fn count(&self, class: Option<ClassName>) -> StorageResult<usize> {
        Ok(self.all(class).await?.len())
    }

    /// Link an amenity to a place. Returns false if they were already linked.
    /// The change is durable after the next [`Storage::save`].
    async fn link_amenity(&mut self, place_id: &str, amenity_id: &str) -> StorageResult<bool> {
        let mut place = self.require::<Place>(place_id).await?;
        self.require::<Amenity>(amenity_id).await?;
        let linked = place.add_amenity(amenity_id);
        if linked {
            self.new(place.into_entity()).await?;
        }
        Ok(linked)
    }

    /// Unlink an amenity from a place. Returns false if they weren't linked.
    async fn unlink_amenity(&mut self, place_id: &str, amenity_id: &str) -> StorageResult<bool> {
        let mut place = self.require::<Place>(place_id).await?;
        let unlinked = place.remove_amenity(amenity_id);
        if unlinked {
            self.new(place.into_entity()).await?;
        }
        Ok(unlinked)
    }

    /// Amenities linked to a place. Dangling links are skipped.
    async fn place_amenities(&self, place_id: &str) -> StorageResult<Vec<Amenity>> {
        let place = self.require::<Place>(place_id).await?;
        let mut amenities = Vec::with_capacity(place.amenity_ids.len());
        for amenity_id in &place.amenity_ids {
            if let Some(amenity) = self.get_as::<Amenity>(amenity_id).await? {
                amenities.push(amenity);
            }
        }
        Ok(amenities)
    }

    /// Cities of a state.
    async fn cities_of(&self, state_id: &str) -> StorageResult<Vec<City>> {
        Ok(collect_where(self.all(Some(ClassName::City)).await?, |city: &City| {
            city.state_id == state_id
        }))
    }

    /// Places in a city.
    async fn places_of(&self, city_id: &str) -> StorageResult<Vec<Place>> {
        Ok(collect_where(self.all(Some(ClassName::Place)).await?, |place: &Place| {
            place.city_id == city_id
        }))
    }

    /// Reviews of a place.
    async fn reviews_of(&self, place_id: &str) -> StorageResult<Vec<Review>> {
        Ok(collect_where(self.all(Some(ClassName::Review)).await?, |review: &Review| {
            review.place_id == place_id
        }))
    }
}

fn collect_where<M: Model>(objects: Objects, keep: impl Fn(&M) -> bool) -> Vec<M> {
    objects
        .into_values()
        .filter_map(M::from_entity)
        .filter(|model| keep(model))
        .collect()
}

/// Keep only the objects of `class`, or everything when `class` is `None`.
pub(crate) fn filter_class(objects: &Objects, class: Option<ClassName>) -> Objects {
    objects
        .iter()
        .filter(|(_, entity)| class.is_none_or(|c| entity.class() == c))
        .map(|(key, entity)| (key.clone(), entity.clone()))
        .collect()
}
