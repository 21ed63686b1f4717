//! Table layout for each entity class.

use crate::models::{AttrType, ClassName};

/// Association table for the Place <-> Amenity relationship.
pub const PLACE_AMENITY: &str = "place_amenity";

/// Every table created by the migrations, children before parents.
pub const DROP_ORDER: [&str; 8] = [
    PLACE_AMENITY,
    "reviews",
    "places",
    "cities",
    "amenities",
    "users",
    "states",
    "_sqlx_migrations",
];

pub fn table(class: ClassName) -> &'static str {
    match class {
        ClassName::State => "states",
        ClassName::User => "users",
        ClassName::Amenity => "amenities",
        ClassName::City => "cities",
        ClassName::Place => "places",
        ClassName::Review => "reviews",
    }
}

/// Columns of a class table with their types: identity and timestamps first,
/// then the declared attributes.
pub fn columns(class: ClassName) -> Vec<(&'static str, AttrType)> {
    let mut columns = vec![
        ("id", AttrType::Text),
        ("created_at", AttrType::Text),
        ("updated_at", AttrType::Text),
    ];
    columns.extend_from_slice(class.attributes());
    columns
}

fn column_list(class: ClassName) -> String {
    columns(class)
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn select_sql(class: ClassName) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY created_at, id",
        column_list(class),
        table(class)
    )
}

pub fn select_one_sql(class: ClassName) -> String {
    format!(
        "SELECT {} FROM {} WHERE id = ?",
        column_list(class),
        table(class)
    )
}

/// Insert-or-update. Uses `ON CONFLICT DO UPDATE` rather than `REPLACE` so
/// updating a row never cascades into the rows that reference it.
pub fn upsert_sql(class: ClassName) -> String {
    let columns = columns(class);
    let placeholders = vec!["?"; columns.len()].join(", ");
    let updates = columns
        .iter()
        .filter(|(name, _)| *name != "id")
        .map(|(name, _)| format!("{name} = excluded.{name}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
        table(class),
        column_list(class),
        placeholders,
        updates
    )
}

pub fn delete_sql(class: ClassName) -> String {
    format!("DELETE FROM {} WHERE id = ?", table(class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_start_with_identity() {
        let cols = columns(ClassName::City);
        let names: Vec<&str> = cols.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["id", "created_at", "updated_at", "name", "state_id"]
        );
    }

    #[test]
    fn test_upsert_sql_updates_everything_but_id() {
        let sql = upsert_sql(ClassName::State);
        assert_eq!(
            sql,
            "INSERT INTO states (id, created_at, updated_at, name) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET created_at = excluded.created_at, \
             updated_at = excluded.updated_at, name = excluded.name"
        );
    }

    #[test]
    fn test_every_class_has_a_table_in_drop_order() {
        for class in ClassName::ALL {
            assert!(DROP_ORDER.contains(&table(class)));
        }
    }
}
