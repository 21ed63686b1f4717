//! Domain entities and their shared identity/timestamp metadata.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::utils::{current_timestamp, generate_entity_id, next_timestamp};
use super::{AttrValue, ClassName, ModelError, ModelResult};
use crate::serde_utils::iso_timestamp;

/// Opaque entity identifier.
pub type Id = String;

/// Serialized discriminator key.
pub const CLASS_KEY: &str = "__class__";

/// Names that identify or timestamp an entity and can never be assigned.
const READ_ONLY_ATTRIBUTES: [&str; 4] = ["id", "created_at", "updated_at", CLASS_KEY];

/// Storage key for an object: `"<Class>.<id>"`.
pub fn object_key(class: ClassName, id: &str) -> String {
    format!("{}.{}", class, id)
}

/// Identity and timestamps shared by every entity.
///
/// The id is fixed at construction. `created_at` never changes after that;
/// `updated_at` only moves forward through [`Meta::touch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default = "generate_entity_id")]
    id: Id,
    #[serde(with = "iso_timestamp", default = "current_timestamp")]
    created_at: NaiveDateTime,
    #[serde(with = "iso_timestamp", default = "current_timestamp")]
    updated_at: NaiveDateTime,
}

impl Default for Meta {
    fn default() -> Self {
        let now = current_timestamp();
        Self {
            id: generate_entity_id(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Meta {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// Refresh `updated_at`, strictly advancing it.
    pub fn touch(&mut self) -> ModelResult<()> {
        self.updated_at = next_timestamp(self.updated_at)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state_id: Id,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub city_id: Id,
    #[serde(default)]
    pub user_id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number_rooms: i64,
    #[serde(default)]
    pub number_bathrooms: i64,
    #[serde(default)]
    pub max_guest: i64,
    #[serde(default)]
    pub price_by_night: i64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Linked amenities (M:N relationship via place_amenity)
    #[serde(default)]
    pub amenity_ids: BTreeSet<Id>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub place_id: Id,
    #[serde(default)]
    pub user_id: Id,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl State {
    fn assign(&mut self, name: &str, value: AttrValue) -> Option<()> {
        match name {
            "name" => self.name = value.into_text()?,
            _ => return None,
        }
        Some(())
    }
}

impl City {
    fn assign(&mut self, name: &str, value: AttrValue) -> Option<()> {
        match name {
            "name" => self.name = value.into_text()?,
            "state_id" => self.state_id = value.into_text()?,
            _ => return None,
        }
        Some(())
    }
}

impl User {
    fn assign(&mut self, name: &str, value: AttrValue) -> Option<()> {
        match name {
            "email" => self.email = value.into_text()?,
            "password" => self.password = value.into_text()?,
            "first_name" => self.first_name = Some(value.into_text()?),
            "last_name" => self.last_name = Some(value.into_text()?),
            _ => return None,
        }
        Some(())
    }
}

impl Place {
    fn assign(&mut self, name: &str, value: AttrValue) -> Option<()> {
        match name {
            "city_id" => self.city_id = value.into_text()?,
            "user_id" => self.user_id = value.into_text()?,
            "name" => self.name = value.into_text()?,
            "number_rooms" => self.number_rooms = value.as_int()?,
            "number_bathrooms" => self.number_bathrooms = value.as_int()?,
            "max_guest" => self.max_guest = value.as_int()?,
            "price_by_night" => self.price_by_night = value.as_int()?,
            "latitude" => self.latitude = value.as_float()?,
            "longitude" => self.longitude = value.as_float()?,
            _ => return None,
        }
        Some(())
    }

    /// Link an amenity. Returns false if it was already linked.
    pub fn add_amenity(&mut self, amenity_id: impl Into<Id>) -> bool {
        self.amenity_ids.insert(amenity_id.into())
    }

    /// Unlink an amenity. Returns false if it wasn't linked.
    pub fn remove_amenity(&mut self, amenity_id: &str) -> bool {
        self.amenity_ids.remove(amenity_id)
    }
}

impl Review {
    fn assign(&mut self, name: &str, value: AttrValue) -> Option<()> {
        match name {
            "place_id" => self.place_id = value.into_text()?,
            "user_id" => self.user_id = value.into_text()?,
            "text" => self.text = value.into_text()?,
            _ => return None,
        }
        Some(())
    }
}

impl Amenity {
    fn assign(&mut self, name: &str, value: AttrValue) -> Option<()> {
        match name {
            "name" => self.name = value.into_text()?,
            _ => return None,
        }
        Some(())
    }
}

/// Typed access to one concrete entity class.
pub trait Model: Sized + Serialize + DeserializeOwned {
    const CLASS: ClassName;

    fn meta(&self) -> &Meta;

    /// Unwrap an [`Entity`] of this class.
    fn from_entity(entity: Entity) -> Option<Self>;

    fn into_entity(self) -> Entity;

    fn id(&self) -> &str {
        self.meta().id()
    }
}

macro_rules! impl_model {
    ($($class:ident),* $(,)?) => {
        $(
            impl Model for $class {
                const CLASS: ClassName = ClassName::$class;

                fn meta(&self) -> &Meta {
                    &self.meta
                }

                fn from_entity(entity: Entity) -> Option<Self> {
                    match entity {
                        Entity::$class(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_entity(self) -> Entity {
                    Entity::$class(self)
                }
            }

            impl From<$class> for Entity {
                fn from(inner: $class) -> Self {
                    Entity::$class(inner)
                }
            }
        )*
    };
}

impl_model!(State, City, User, Place, Review, Amenity);

/// Any entity, tagged with its class.
///
/// Serializes to the entity's attributes plus a `__class__` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "__class__")]
pub enum Entity {
    State(State),
    City(City),
    User(User),
    Place(Place),
    Review(Review),
    Amenity(Amenity),
}

impl Entity {
    pub fn class(&self) -> ClassName {
        match self {
            Entity::State(_) => ClassName::State,
            Entity::City(_) => ClassName::City,
            Entity::User(_) => ClassName::User,
            Entity::Place(_) => ClassName::Place,
            Entity::Review(_) => ClassName::Review,
            Entity::Amenity(_) => ClassName::Amenity,
        }
    }

    pub fn meta(&self) -> &Meta {
        match self {
            Entity::State(e) => &e.meta,
            Entity::City(e) => &e.meta,
            Entity::User(e) => &e.meta,
            Entity::Place(e) => &e.meta,
            Entity::Review(e) => &e.meta,
            Entity::Amenity(e) => &e.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut Meta {
        match self {
            Entity::State(e) => &mut e.meta,
            Entity::City(e) => &mut e.meta,
            Entity::User(e) => &mut e.meta,
            Entity::Place(e) => &mut e.meta,
            Entity::Review(e) => &mut e.meta,
            Entity::Amenity(e) => &mut e.meta,
        }
    }

    /// Untyped attributes carried over from a reconstruction payload.
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            Entity::State(e) => &e.extra,
            Entity::City(e) => &e.extra,
            Entity::User(e) => &e.extra,
            Entity::Place(e) => &e.extra,
            Entity::Review(e) => &e.extra,
            Entity::Amenity(e) => &e.extra,
        }
    }

    pub fn id(&self) -> &str {
        self.meta().id()
    }

    pub fn key(&self) -> String {
        object_key(self.class(), self.id())
    }

    /// Identity comparison: same class and same id.
    pub fn same_identity(&self, other: &Entity) -> bool {
        self.class() == other.class() && self.id() == other.id()
    }

    pub fn touch(&mut self) -> ModelResult<()> {
        self.meta_mut().touch()
    }

    /// All attributes plus the `__class__` discriminator.
    pub fn to_dict(&self) -> ModelResult<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ModelError::Serialize {
                message: format!("{} serialized to {}", self.key(), other),
            }),
            Err(e) => Err(ModelError::Serialize {
                message: format!("{}: {}", self.key(), e),
            }),
        }
    }

    /// All attributes without the discriminator.
    pub fn attributes(&self) -> ModelResult<Map<String, Value>> {
        let mut dict = self.to_dict()?;
        dict.remove(CLASS_KEY);
        Ok(dict)
    }

    /// Rebuild an entity of a known class. A `__class__` key, if present, is
    /// ignored; missing id or timestamps are generated.
    pub fn from_dict(class: ClassName, mut dict: Map<String, Value>) -> ModelResult<Entity> {
        dict.remove(CLASS_KEY);
        match class {
            ClassName::State => reconstruct::<State>(dict),
            ClassName::City => reconstruct::<City>(dict),
            ClassName::User => reconstruct::<User>(dict),
            ClassName::Place => reconstruct::<Place>(dict),
            ClassName::Review => reconstruct::<Review>(dict),
            ClassName::Amenity => reconstruct::<Amenity>(dict),
        }
    }

    /// Rebuild an entity from a serialized object, dispatching on its
    /// `__class__` discriminator.
    pub fn from_value(value: Value) -> ModelResult<Entity> {
        let Value::Object(dict) = value else {
            return Err(ModelError::Reconstruct {
                message: "expected a JSON object".to_string(),
            });
        };
        let class = match dict.get(CLASS_KEY) {
            Some(Value::String(name)) => name.parse::<ClassName>()?,
            _ => {
                return Err(ModelError::Reconstruct {
                    message: format!("missing '{}' discriminator", CLASS_KEY),
                });
            }
        };
        Entity::from_dict(class, dict)
    }

    /// Assign a declared attribute. Integers are widened for float
    /// attributes; other type mismatches are rejected.
    pub fn set_attribute(&mut self, name: &str, value: AttrValue) -> ModelResult<()> {
        let class = self.class();
        let ty = declared_type(class, name)?;
        let mismatch = || ModelError::TypeMismatch {
            name: name.to_string(),
            expected: ty,
        };
        let value = value.coerce(ty).ok_or_else(mismatch)?;
        let applied = match self {
            Entity::State(e) => e.assign(name, value),
            Entity::City(e) => e.assign(name, value),
            Entity::User(e) => e.assign(name, value),
            Entity::Place(e) => e.assign(name, value),
            Entity::Review(e) => e.assign(name, value),
            Entity::Amenity(e) => e.assign(name, value),
        };
        applied.ok_or_else(mismatch)
    }

    /// Assign a declared attribute from console text, converting it to the
    /// attribute's type.
    pub fn set_attribute_raw(&mut self, name: &str, raw: &str) -> ModelResult<()> {
        let ty = declared_type(self.class(), name)?;
        let value = AttrValue::parse_as(raw, ty).ok_or_else(|| ModelError::TypeMismatch {
            name: name.to_string(),
            expected: ty,
        })?;
        self.set_attribute(name, value)
    }
}

fn declared_type(class: ClassName, name: &str) -> ModelResult<super::AttrType> {
    if READ_ONLY_ATTRIBUTES.contains(&name) {
        return Err(ModelError::ReadOnlyAttribute {
            name: name.to_string(),
        });
    }
    class
        .attribute_type(name)
        .ok_or_else(|| ModelError::UnknownAttribute {
            class: class.to_string(),
            name: name.to_string(),
        })
}

fn reconstruct<M: Model>(dict: Map<String, Value>) -> ModelResult<Entity> {
    serde_json::from_value::<M>(Value::Object(dict))
        .map(Model::into_entity)
        .map_err(|e| ModelError::Reconstruct {
            message: format!("{}: {}", M::CLASS, e),
        })
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attributes() {
            Ok(attributes) => write!(
                f,
                "[{}] ({}) {}",
                self.class(),
                self.id(),
                Value::Object(attributes)
            ),
            Err(e) => write!(f, "[{}] ({}) <{}>", self.class(), self.id(), e),
        }
    }
}
