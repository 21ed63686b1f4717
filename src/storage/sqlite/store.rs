//! SQLite implementation of [`Storage`].
//!
//! Registered changes are staged per object key. Reads see the staged
//! changes on top of the committed rows; `save` writes the whole batch in one
//! transaction.

use std::collections::BTreeMap;
use std::mem;

use serde_json::Value;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, warn};

use super::connection::{Pending, SqliteStorage};
use super::helpers::{bind_columns, map_sqlx_error, row_to_dict};
use super::schema::{PLACE_AMENITY, delete_sql, select_one_sql, select_sql, upsert_sql};
use crate::models::{ClassName, Entity, Place, object_key};
use crate::storage::engine::{Objects, Storage};
use crate::storage::StorageResult;

impl SqliteStorage {
    /// Committed rows of one class.
    async fn fetch_class(&self, class: ClassName) -> StorageResult<Vec<Entity>> {
        let sql = select_sql(class);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut links = if class == ClassName::Place {
            self.fetch_links().await?
        } else {
            BTreeMap::new()
        };

        let mut entities = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut dict = row_to_dict(row, class).map_err(map_sqlx_error)?;
            if class == ClassName::Place {
                let id = dict.get("id").and_then(Value::as_str).unwrap_or_default();
                let amenity_ids = links.remove(id).unwrap_or_default();
                dict.insert("amenity_ids".to_string(), Value::from(amenity_ids));
            }
            entities.push(Entity::from_dict(class, dict)?);
        }
        Ok(entities)
    }

    /// Amenity ids of every place, grouped by place id.
    async fn fetch_links(&self) -> StorageResult<BTreeMap<String, Vec<String>>> {
        let pairs: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT place_id, amenity_id FROM {} ORDER BY place_id, amenity_id",
            PLACE_AMENITY
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut links: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (place_id, amenity_id) in pairs {
            links.entry(place_id).or_default().push(amenity_id);
        }
        Ok(links)
    }

    /// One committed row.
    async fn fetch_one(&self, class: ClassName, id: &str) -> StorageResult<Option<Entity>> {
        let sql = select_one_sql(class);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut dict = row_to_dict(&row, class).map_err(map_sqlx_error)?;
        if class == ClassName::Place {
            let amenity_ids: Vec<String> = sqlx::query_scalar(&format!(
                "SELECT amenity_id FROM {} WHERE place_id = ? ORDER BY amenity_id",
                PLACE_AMENITY
            ))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
            dict.insert("amenity_ids".to_string(), Value::from(amenity_ids));
        }
        Ok(Some(Entity::from_dict(class, dict)?))
    }

    /// Write a batch: deletions first, then insert-or-update with parents
    /// ahead of children.
    async fn flush(&self, batch: &BTreeMap<String, Pending>) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for pending in batch.values() {
            if let Pending::Delete(entity) = pending {
                let sql = delete_sql(entity.class());
                sqlx::query(&sql)
                    .bind(entity.id())
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }
        }

        let mut upserts: Vec<&Entity> = batch
            .values()
            .filter_map(|pending| match pending {
                Pending::Upsert(entity) => Some(entity),
                Pending::Delete(_) => None,
            })
            .collect();
        upserts.sort_by_key(|entity| entity.class());

        for entity in upserts {
            upsert(&mut tx, entity).await?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

async fn upsert(tx: &mut Transaction<'_, Sqlite>, entity: &Entity) -> StorageResult<()> {
    let class = entity.class();
    if !entity.extra().is_empty() {
        warn!(
            key = %entity.key(),
            attributes = ?entity.extra().keys().collect::<Vec<_>>(),
            "Undeclared attributes are not stored in the database"
        );
    }

    let sql = upsert_sql(class);
    bind_columns(sqlx::query(&sql), class, &entity.to_dict()?)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

    if let Entity::Place(place) = entity {
        replace_links(tx, place).await?;
    }
    Ok(())
}

/// Rewrite a place's association rows. Links to amenities that no longer
/// exist are skipped.
async fn replace_links(tx: &mut Transaction<'_, Sqlite>, place: &Place) -> StorageResult<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE place_id = ?", PLACE_AMENITY))
        .bind(place.meta.id())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} (place_id, amenity_id) \
         SELECT ?, id FROM amenities WHERE id = ?",
        PLACE_AMENITY
    );
    for amenity_id in &place.amenity_ids {
        sqlx::query(&insert)
            .bind(place.meta.id())
            .bind(amenity_id)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
    }
    Ok(())
}

impl Storage for SqliteStorage {
    async fn all(&self, class: Option<ClassName>) -> StorageResult<Objects> {
        let classes = match class {
            Some(class) => vec![class],
            None => ClassName::ALL.to_vec(),
        };

        let mut objects = Objects::new();
        for class in classes {
            for entity in self.fetch_class(class).await? {
                objects.insert(entity.key(), entity);
            }
        }

        for (key, pending) in &self.pending {
            match pending {
                Pending::Upsert(entity) if class.is_none_or(|c| entity.class() == c) => {
                    objects.insert(key.clone(), entity.clone());
                }
                Pending::Upsert(_) => {}
                Pending::Delete(_) => {
                    objects.remove(key);
                }
            }
        }
        Ok(objects)
    }

    async fn get(&self, class: ClassName, id: &str) -> StorageResult<Option<Entity>> {
        match self.pending.get(&object_key(class, id)) {
            Some(Pending::Upsert(entity)) => Ok(Some(entity.clone())),
            Some(Pending::Delete(_)) => Ok(None),
            None => self.fetch_one(class, id).await,
        }
    }

    async fn new(&mut self, entity: Entity) -> StorageResult<()> {
        self.pending.insert(entity.key(), Pending::Upsert(entity));
        Ok(())
    }

    async fn save(&mut self) -> StorageResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        // A failed batch is rolled back and dropped.
        let batch = mem::take(&mut self.pending);
        match self.flush(&batch).await {
            Ok(()) => {
                debug!(changes = batch.len(), "Committed database changes");
                Ok(())
            }
            Err(e) => {
                warn!(changes = batch.len(), error = %e, "Discarded database changes");
                Err(e)
            }
        }
    }

    async fn delete(&mut self, entity: &Entity) -> StorageResult<()> {
        self.pending
            .insert(entity.key(), Pending::Delete(entity.clone()));
        Ok(())
    }

    async fn reload(&mut self) -> StorageResult<()> {
        self.pending.clear();
        self.establish_schema().await
    }

    async fn close(self) -> StorageResult<()> {
        if !self.pending.is_empty() {
            warn!(
                changes = self.pending.len(),
                "Closing database with unsaved changes"
            );
        }
        self.pool.close().await;
        Ok(())
    }
}
