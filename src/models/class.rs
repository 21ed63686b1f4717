//! Closed registry of entity classes.

use std::fmt;
use std::str::FromStr;

use super::{AttrType, Entity, ModelError};

/// Every entity class known to the system.
///
/// `ALL` is ordered so that a class only references classes listed before it,
/// which is the order rows must be inserted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassName {
    State,
    User,
    Amenity,
    City,
    Place,
    Review,
}

impl ClassName {
    pub const ALL: [ClassName; 6] = [
        ClassName::State,
        ClassName::User,
        ClassName::Amenity,
        ClassName::City,
        ClassName::Place,
        ClassName::Review,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClassName::State => "State",
            ClassName::User => "User",
            ClassName::Amenity => "Amenity",
            ClassName::City => "City",
            ClassName::Place => "Place",
            ClassName::Review => "Review",
        }
    }

    /// Build a fresh entity of this class.
    pub fn instantiate(self) -> Entity {
        match self {
            ClassName::State => Entity::State(Default::default()),
            ClassName::User => Entity::User(Default::default()),
            ClassName::Amenity => Entity::Amenity(Default::default()),
            ClassName::City => Entity::City(Default::default()),
            ClassName::Place => Entity::Place(Default::default()),
            ClassName::Review => Entity::Review(Default::default()),
        }
    }

    /// Assignable attributes and their types, in declaration order.
    ///
    /// Collection-valued attributes (`Place::amenity_ids`) are managed through
    /// dedicated operations and are not listed here.
    pub fn attributes(self) -> &'static [(&'static str, AttrType)] {
        use AttrType::*;
        match self {
            ClassName::State => &[("name", Text)],
            ClassName::User => &[
                ("email", Text),
                ("password", Text),
                ("first_name", OptionalText),
                ("last_name", OptionalText),
            ],
            ClassName::Amenity => &[("name", Text)],
            ClassName::City => &[("name", Text), ("state_id", Text)],
            ClassName::Place => &[
                ("city_id", Text),
                ("user_id", Text),
                ("name", Text),
                ("number_rooms", Integer),
                ("number_bathrooms", Integer),
                ("max_guest", Integer),
                ("price_by_night", Integer),
                ("latitude", Float),
                ("longitude", Float),
            ],
            ClassName::Review => &[
                ("place_id", Text),
                ("user_id", Text),
                ("text", Text),
            ],
        }
    }

    /// Declared type of an attribute, if the class has it.
    pub fn attribute_type(self, name: &str) -> Option<AttrType> {
        self.attributes()
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, ty)| *ty)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassName::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| ModelError::UnknownClass {
                name: s.to_string(),
            })
    }
}
