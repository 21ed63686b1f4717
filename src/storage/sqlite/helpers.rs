//! Shared helper functions for the SQLite store.

use serde_json::{Map, Number, Value};
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};

use super::schema::columns;
use crate::models::{AttrType, ClassName};
use crate::storage::StorageError;

pub type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Map a driver error, separating constraint violations from everything else.
pub fn map_sqlx_error(e: sqlx::Error) -> StorageError {
    if let Some(db_err) = e.as_database_error() {
        let is_constraint = matches!(
            db_err.kind(),
            ErrorKind::ForeignKeyViolation
                | ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        ) || db_err.message().contains("constraint failed");

        if is_constraint {
            return StorageError::Integrity {
                message: db_err.message().to_string(),
            };
        }
    }
    StorageError::Database {
        message: e.to_string(),
    }
}

/// Read a class row into a serialized-entity mapping.
pub fn row_to_dict(row: &SqliteRow, class: ClassName) -> Result<Map<String, Value>, sqlx::Error> {
    let mut dict = Map::new();
    for (name, ty) in columns(class) {
        let value = match ty {
            AttrType::Text => Value::String(row.try_get::<String, _>(name)?),
            AttrType::OptionalText => row
                .try_get::<Option<String>, _>(name)?
                .map(Value::String)
                .unwrap_or(Value::Null),
            AttrType::Integer => Value::from(row.try_get::<i64, _>(name)?),
            AttrType::Float => Number::from_f64(row.try_get::<f64, _>(name)?)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        };
        dict.insert(name.to_string(), value);
    }
    Ok(dict)
}

/// Bind a serialized entity's column values, in column order.
///
/// Missing or mistyped values bind as NULL so the table's NOT NULL
/// constraints report them.
pub fn bind_columns<'q>(
    mut query: SqliteQuery<'q>,
    class: ClassName,
    dict: &Map<String, Value>,
) -> SqliteQuery<'q> {
    for (name, ty) in columns(class) {
        let value = dict.get(name);
        query = match ty {
            AttrType::Text | AttrType::OptionalText => {
                query.bind(value.and_then(Value::as_str).map(str::to_string))
            }
            AttrType::Integer => query.bind(value.and_then(Value::as_i64)),
            AttrType::Float => query.bind(value.and_then(Value::as_f64)),
        };
    }
    query
}
