//! Tests for entity construction, serialization and reconstruction.

use serde_json::{Value, json};

use crate::models::{
    AttrValue, CLASS_KEY, ClassName, Entity, Model, ModelError, Place, State, User,
};

fn state_named(name: &str) -> Entity {
    let mut state = State::default();
    state.name = name.to_string();
    state.into_entity()
}

#[test]
fn fresh_entities_get_distinct_ids() {
    let a = ClassName::State.instantiate();
    let b = ClassName::State.instantiate();
    assert_ne!(a.id(), b.id());
    assert!(!a.same_identity(&b));
}

#[test]
fn fresh_entity_timestamps_start_equal() {
    let entity = ClassName::City.instantiate();
    assert_eq!(entity.meta().created_at(), entity.meta().updated_at());
}

#[test]
fn key_combines_class_and_id() {
    let entity = state_named("Texas");
    assert_eq!(entity.key(), format!("State.{}", entity.id()));
}

#[test]
fn every_class_serializes_to_an_object_and_back() {
    for class in ClassName::ALL {
        let entity = class.instantiate();
        let dict = entity.to_dict().unwrap();
        assert_eq!(dict[CLASS_KEY], json!(class.to_string()));
        assert!(entity.attributes().unwrap().get(CLASS_KEY).is_none());
        assert_eq!(Entity::from_value(Value::Object(dict)).unwrap(), entity);
    }
}

#[test]
fn to_dict_includes_discriminator_and_iso_timestamps() {
    let entity = state_named("Nevada");
    let dict = entity.to_dict().unwrap();

    assert_eq!(dict[CLASS_KEY], json!("State"));
    assert_eq!(dict["name"], json!("Nevada"));
    assert_eq!(dict["id"], json!(entity.id()));

    let created = dict["created_at"].as_str().expect("created_at is a string");
    assert_eq!(created.len(), "2017-09-28T21:03:54.052298".len());
    assert!(created.contains('T'));
}

#[test]
fn round_trip_preserves_identity_timestamps_and_attributes() {
    let mut place = Place::default();
    place.name = "My little house".to_string();
    place.number_rooms = 4;
    place.latitude = 37.773972;
    place.add_amenity("a-1");
    let original = place.into_entity();

    let rebuilt = Entity::from_value(Value::Object(original.to_dict().unwrap())).unwrap();

    assert_eq!(rebuilt, original);
    assert_eq!(rebuilt.meta().created_at(), original.meta().created_at());
    assert_eq!(rebuilt.meta().updated_at(), original.meta().updated_at());
}

#[test]
fn from_dict_ignores_discriminator_and_fills_defaults() {
    let dict = json!({
        "__class__": "User",
        "id": "u-1",
        "created_at": "2017-09-28T21:03:54.052298",
        "updated_at": "2017-09-28T21:05:54.119572",
        "email": "a@b.c"
    });
    let Value::Object(dict) = dict else { unreachable!() };

    let entity = Entity::from_dict(ClassName::User, dict).unwrap();
    let user = User::from_entity(entity).unwrap();

    assert_eq!(user.id(), "u-1");
    assert_eq!(user.email, "a@b.c");
    assert_eq!(user.password, "");
    assert_eq!(user.first_name, None);
    assert!(user.extra.is_empty());
}

#[test]
fn from_dict_generates_missing_identity() {
    let Value::Object(dict) = json!({"name": "Ohio"}) else {
        unreachable!()
    };
    let entity = Entity::from_dict(ClassName::State, dict).unwrap();
    assert!(!entity.id().is_empty());
}

#[test]
fn unknown_keys_are_kept_as_extra_attributes() {
    let value = json!({
        "__class__": "State",
        "id": "s-1",
        "created_at": "2017-09-28T21:03:54.052298",
        "updated_at": "2017-09-28T21:03:54.052298",
        "name": "Utah",
        "nickname": "Beehive"
    });

    let entity = Entity::from_value(value).unwrap();
    assert_eq!(entity.extra()["nickname"], json!("Beehive"));
    assert_eq!(entity.to_dict().unwrap()["nickname"], json!("Beehive"));
}

#[test]
fn from_value_rejects_unknown_class() {
    let err = Entity::from_value(json!({"__class__": "Spaceship", "id": "x"})).unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownClass {
            name: "Spaceship".to_string()
        }
    );
}

#[test]
fn from_value_requires_discriminator() {
    let err = Entity::from_value(json!({"id": "x"})).unwrap_err();
    assert!(matches!(err, ModelError::Reconstruct { .. }));
}

#[test]
fn from_value_rejects_bad_timestamp() {
    let err = Entity::from_value(json!({
        "__class__": "State",
        "created_at": "not a date"
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::Reconstruct { .. }));
}

#[test]
fn touch_strictly_advances_updated_at() {
    let mut entity = state_named("Iowa");
    let before = entity.meta().updated_at();
    entity.touch().unwrap();
    let middle = entity.meta().updated_at();
    entity.touch().unwrap();
    assert!(middle > before);
    assert!(entity.meta().updated_at() > middle);
    assert_eq!(entity.meta().created_at(), before);
}

#[test]
fn set_attribute_assigns_declared_fields() {
    let mut entity = ClassName::Place.instantiate();
    entity
        .set_attribute("name", AttrValue::Str("Loft".to_string()))
        .unwrap();
    entity.set_attribute("max_guest", AttrValue::Int(6)).unwrap();
    entity.set_attribute("longitude", AttrValue::Int(-3)).unwrap();

    let place = Place::from_entity(entity).unwrap();
    assert_eq!(place.name, "Loft");
    assert_eq!(place.max_guest, 6);
    assert_eq!(place.longitude, -3.0);
}

#[test]
fn set_attribute_rejects_wrong_type() {
    let mut entity = ClassName::Place.instantiate();
    let err = entity
        .set_attribute("number_rooms", AttrValue::Float(2.5))
        .unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch { .. }));
}

#[test]
fn set_attribute_rejects_unknown_and_read_only_names() {
    let mut entity = ClassName::State.instantiate();
    assert!(matches!(
        entity.set_attribute("population", AttrValue::Int(3)),
        Err(ModelError::UnknownAttribute { .. })
    ));
    assert!(matches!(
        entity.set_attribute("id", AttrValue::Str("new".to_string())),
        Err(ModelError::ReadOnlyAttribute { .. })
    ));
}

#[test]
fn set_attribute_raw_converts_to_declared_type() {
    let mut entity = ClassName::Place.instantiate();
    entity.set_attribute_raw("price_by_night", "300").unwrap();
    entity.set_attribute_raw("latitude", "37.77").unwrap();
    assert!(entity.set_attribute_raw("max_guest", "many").is_err());

    let place = Place::from_entity(entity).unwrap();
    assert_eq!(place.price_by_night, 300);
    assert_eq!(place.latitude, 37.77);
}

#[test]
fn optional_user_names_are_set_and_serialized() {
    let mut entity = ClassName::User.instantiate();
    assert!(!entity.to_dict().unwrap().contains_key("first_name"));

    entity.set_attribute_raw("first_name", "John").unwrap();
    assert_eq!(entity.to_dict().unwrap()["first_name"], json!("John"));
}

#[test]
fn place_amenity_links_are_unique() {
    let mut place = Place::default();
    assert!(place.add_amenity("a-1"));
    assert!(!place.add_amenity("a-1"));
    assert_eq!(place.amenity_ids.len(), 1);
    assert!(place.remove_amenity("a-1"));
    assert!(!place.remove_amenity("a-1"));
}

#[test]
fn display_shows_class_id_and_attributes() {
    let entity = state_named("Ohio");
    let shown = entity.to_string();
    assert!(shown.starts_with(&format!("[State] ({}) {{", entity.id())));
    assert!(shown.contains("\"name\":\"Ohio\""));
    assert!(!shown.contains(CLASS_KEY));
}

#[test]
fn class_names_parse_and_display() {
    for class in ClassName::ALL {
        assert_eq!(class.to_string().parse::<ClassName>().unwrap(), class);
        assert_eq!(class.instantiate().class(), class);
    }
    assert!("BaseModel".parse::<ClassName>().is_err());
}
