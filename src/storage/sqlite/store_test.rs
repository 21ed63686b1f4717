//! Tests for the SQLite object store.

use tempfile::TempDir;

use crate::models::{
    Amenity, AttrValue, City, ClassName, Entity, Model, Place, Review, State, User,
};
use crate::storage::{SqliteStorage, Storage, StorageError};

async fn setup() -> SqliteStorage {
    let mut storage = SqliteStorage::in_memory()
        .await
        .expect("Failed to create in-memory database");
    storage.reload().await.expect("Schema setup should succeed");
    storage
}

fn state(name: &str) -> State {
    State {
        name: name.to_string(),
        ..Default::default()
    }
}

fn city(name: &str, state: &State) -> City {
    City {
        name: name.to_string(),
        state_id: state.id().to_string(),
        ..Default::default()
    }
}

fn user(email: &str) -> User {
    User {
        email: email.to_string(),
        password: "pwd".to_string(),
        ..Default::default()
    }
}

fn place(name: &str, city: &City, owner: &User) -> Place {
    Place {
        name: name.to_string(),
        city_id: city.id().to_string(),
        user_id: owner.id().to_string(),
        ..Default::default()
    }
}

fn review(text: &str, place: &Place, author: &User) -> Review {
    Review {
        text: text.to_string(),
        place_id: place.id().to_string(),
        user_id: author.id().to_string(),
        ..Default::default()
    }
}

fn amenity(name: &str) -> Amenity {
    Amenity {
        name: name.to_string(),
        ..Default::default()
    }
}

/// Registers and saves a state, a city, a user and a place in that city.
async fn seed(storage: &mut SqliteStorage) -> (State, City, User, Place) {
    let s = state("California");
    let c = city("San Francisco", &s);
    let u = user("owner@example.com");
    let p = place("Loft", &c, &u);
    for entity in [
        p.clone().into_entity(),
        c.clone().into_entity(),
        u.clone().into_entity(),
        s.clone().into_entity(),
    ] {
        storage.new(entity).await.unwrap();
    }
    storage.save().await.expect("Batch should be ordered parents first");
    (s, c, u, p)
}

async fn rows(storage: &SqliteStorage, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(storage.pool())
        .await
        .expect("Query should succeed")
}

#[tokio::test(flavor = "multi_thread")]
async fn new_is_visible_before_save() {
    let mut storage = setup().await;
    let s = state("Nevada");
    storage.new(s.clone().into_entity()).await.unwrap();

    assert_eq!(rows(&storage, "states").await, 0);
    let found = storage.get(ClassName::State, s.id()).await.unwrap();
    assert_eq!(found, Some(s.clone().into_entity()));
    assert!(
        storage
            .all(Some(ClassName::State))
            .await
            .unwrap()
            .contains_key(&s.into_entity().key())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn save_round_trips_every_column() {
    let mut storage = setup().await;
    let (_, _, mut u, mut p) = seed(&mut storage).await;

    u.first_name = Some("Betty".to_string());
    p.number_rooms = 4;
    p.latitude = 37.77;
    p.longitude = -122.41;
    storage.new(u.clone().into_entity()).await.unwrap();
    storage.new(p.clone().into_entity()).await.unwrap();
    storage.save().await.unwrap();

    let loaded_user = storage.require::<User>(u.id()).await.unwrap();
    assert_eq!(loaded_user, u);
    assert_eq!(loaded_user.last_name, None);

    let loaded_place = storage.require::<Place>(p.id()).await.unwrap();
    assert_eq!(loaded_place, p);
    assert_eq!(
        loaded_place.meta.created_at(),
        p.meta.created_at(),
        "Timestamps keep their microseconds"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn save_entity_advances_updated_at_in_the_table() {
    let mut storage = setup().await;
    let (s, ..) = seed(&mut storage).await;

    let mut entity = s.clone().into_entity();
    entity
        .set_attribute("name", AttrValue::Str("Nevada".to_string()))
        .unwrap();
    storage.save_entity(&mut entity).await.unwrap();

    let stored = storage.require::<State>(s.id()).await.unwrap();
    assert_eq!(stored.name, "Nevada");
    assert!(stored.meta.updated_at() > s.meta.updated_at());
    assert_eq!(stored.meta.created_at(), s.meta.created_at());
}

#[tokio::test(flavor = "multi_thread")]
async fn updating_a_parent_keeps_its_children() {
    let mut storage = setup().await;
    let (mut s, c, ..) = seed(&mut storage).await;

    s.name = "CA".to_string();
    storage.new(s.into_entity()).await.unwrap();
    storage.save().await.unwrap();

    assert!(storage.get(ClassName::City, c.id()).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_parent_is_an_integrity_error_and_rolls_back() {
    let mut storage = setup().await;
    let orphan = city("Nowhere", &state("Never saved"));
    let fine = state("Oregon");
    storage.new(fine.clone().into_entity()).await.unwrap();
    storage.new(orphan.clone().into_entity()).await.unwrap();

    let err = storage.save().await.unwrap_err();
    assert!(matches!(err, StorageError::Integrity { .. }), "got {err:?}");

    assert_eq!(rows(&storage, "states").await, 0);
    assert!(storage.get(ClassName::City, orphan.id()).await.unwrap().is_none());
    assert!(storage.get(ClassName::State, fine.id()).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_the_row_after_save() {
    let mut storage = setup().await;
    let a = amenity("Wifi");
    storage.new(a.clone().into_entity()).await.unwrap();
    storage.save().await.unwrap();

    storage.delete(&a.clone().into_entity()).await.unwrap();
    assert!(storage.get(ClassName::Amenity, a.id()).await.unwrap().is_none());
    assert_eq!(rows(&storage, "amenities").await, 1);

    storage.save().await.unwrap();
    assert_eq!(rows(&storage, "amenities").await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_user_cascades_to_places_and_reviews() {
    let mut storage = setup().await;
    let (_, _, u, p) = seed(&mut storage).await;
    let r = review("Great stay", &p, &u);
    storage.new(r.clone().into_entity()).await.unwrap();
    storage.save().await.unwrap();

    storage.destroy(&u.into_entity()).await.unwrap();

    assert!(storage.get(ClassName::Review, r.id()).await.unwrap().is_none());
    assert!(storage.get(ClassName::Place, p.id()).await.unwrap().is_none());
    assert_eq!(storage.count(Some(ClassName::City)).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_state_cascades_to_cities() {
    let mut storage = setup().await;
    let (s, c, ..) = seed(&mut storage).await;

    storage.destroy(&s.into_entity()).await.unwrap();

    assert!(storage.get(ClassName::City, c.id()).await.unwrap().is_none());
    assert_eq!(storage.count(Some(ClassName::Place)).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn amenity_links_are_stored_once() {
    let mut storage = setup().await;
    let (_, _, _, p) = seed(&mut storage).await;
    let wifi = amenity("Wifi");
    storage.new(wifi.clone().into_entity()).await.unwrap();
    storage.save().await.unwrap();

    assert!(storage.link_amenity(p.id(), wifi.id()).await.unwrap());
    assert!(!storage.link_amenity(p.id(), wifi.id()).await.unwrap());
    storage.save().await.unwrap();
    assert!(!storage.link_amenity(p.id(), wifi.id()).await.unwrap());
    storage.save().await.unwrap();

    assert_eq!(rows(&storage, "place_amenity").await, 1);
    let linked = storage.place_amenities(p.id()).await.unwrap();
    assert_eq!(linked, vec![wifi]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unlinking_removes_the_association_row() {
    let mut storage = setup().await;
    let (_, _, _, p) = seed(&mut storage).await;
    let wifi = amenity("Wifi");
    storage.new(wifi.clone().into_entity()).await.unwrap();
    storage.save().await.unwrap();
    storage.link_amenity(p.id(), wifi.id()).await.unwrap();
    storage.save().await.unwrap();

    assert!(storage.unlink_amenity(p.id(), wifi.id()).await.unwrap());
    storage.save().await.unwrap();

    assert_eq!(rows(&storage, "place_amenity").await, 0);
    assert_eq!(rows(&storage, "amenities").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_place_removes_its_links_but_not_amenities() {
    let mut storage = setup().await;
    let (_, _, _, p) = seed(&mut storage).await;
    let wifi = amenity("Wifi");
    storage.new(wifi.clone().into_entity()).await.unwrap();
    storage.save().await.unwrap();
    storage.link_amenity(p.id(), wifi.id()).await.unwrap();
    storage.save().await.unwrap();

    storage.destroy(&p.into_entity()).await.unwrap();

    assert_eq!(rows(&storage, "place_amenity").await, 0);
    assert!(storage.get(ClassName::Amenity, wifi.id()).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn reload_is_idempotent_and_drops_unsaved_changes() {
    let mut storage = setup().await;
    let (s, ..) = seed(&mut storage).await;
    storage.new(state("Unsaved").into_entity()).await.unwrap();

    storage.reload().await.unwrap();
    storage.reload().await.unwrap();

    let states = storage.all(Some(ClassName::State)).await.unwrap();
    assert_eq!(states.len(), 1);
    assert!(states.contains_key(&s.into_entity().key()));
}

#[tokio::test(flavor = "multi_thread")]
async fn all_lists_every_class_when_unfiltered() {
    let mut storage = setup().await;
    seed(&mut storage).await;

    let all = storage.all(None).await.unwrap();
    assert_eq!(all.len(), 4);
    for (key, entity) in &all {
        assert_eq!(key, &entity.key());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn extra_attributes_are_not_stored() {
    let mut storage = setup().await;
    let mut dict = serde_json::Map::new();
    dict.insert("name".to_string(), "Utah".into());
    dict.insert("motto".to_string(), "Industry".into());
    let entity = Entity::from_dict(ClassName::State, dict).unwrap();
    storage.new(entity.clone()).await.unwrap();
    storage.save().await.unwrap();

    let stored = storage
        .get(ClassName::State, entity.id())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.extra().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn rows_survive_a_new_connection() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hbnb.db");

    let mut storage = SqliteStorage::open(&path).await.unwrap();
    storage.reload().await.unwrap();
    let (s, c, ..) = seed(&mut storage).await;
    storage.close().await.unwrap();

    let mut reopened = SqliteStorage::open(&path).await.unwrap();
    reopened.reload().await.unwrap();
    assert_eq!(reopened.require::<State>(s.id()).await.unwrap(), s);
    let cities = reopened.cities_of(s.id()).await.unwrap();
    assert_eq!(cities, vec![c]);
}
