use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::db::repositories::record_store::{
    merge_fields, record_id, Collection, RecordPredicate, RecordStore,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct CollectionData {
    order: Vec<String>,
    records: HashMap<String, JsonValue>,
}

/// Process-local store used by tests and embedders without a database.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    collections: RwLock<HashMap<Collection, CollectionData>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record without the duplicate check `create` does.
    pub fn upsert(&self, collection: Collection, record: JsonValue) -> AppResult<()> {
        let id = record_id(&record)?;
        let mut guard = self.write()?;
        let data = guard.entry(collection).or_default();
        if data.records.insert(id.clone(), record).is_none() {
            data.order.push(id);
        }
        Ok(())
    }

    fn read(
        &self,
    ) -> AppResult<std::sync::RwLockReadGuard<'_, HashMap<Collection, CollectionData>>> {
        self.collections
            .read()
            .map_err(|_| AppError::database("record store lock poisoned"))
    }

    fn write(
        &self,
    ) -> AppResult<std::sync::RwLockWriteGuard<'_, HashMap<Collection, CollectionData>>> {
        self.collections
            .write()
            .map_err(|_| AppError::database("record store lock poisoned"))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn find_many(
        &self,
        collection: Collection,
        predicate: RecordPredicate<'_>,
    ) -> AppResult<Vec<JsonValue>> {
        let guard = self.read()?;
        let Some(data) = guard.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(data
            .order
            .iter()
            .filter_map(|id| data.records.get(id))
            .filter(|record| predicate(*record))
            .cloned()
            .collect())
    }

    fn find_by_id(&self, collection: Collection, id: &str) -> AppResult<Option<JsonValue>> {
        let guard = self.read()?;
        Ok(guard
            .get(&collection)
            .and_then(|data| data.records.get(id))
            .cloned())
    }

    fn create(&self, collection: Collection, record: JsonValue) -> AppResult<JsonValue> {
        let id = record_id(&record)?;
        let mut guard = self.write()?;
        let data = guard.entry(collection).or_default();
        if data.records.contains_key(&id) {
            return Err(AppError::invalid_state(format!(
                "{collection} record {id} already exists"
            )));
        }
        data.records.insert(id.clone(), record.clone());
        data.order.push(id.clone());
        debug!(target: "engine::db", %collection, %id, "record created");
        Ok(record)
    }

    fn update(&self, collection: Collection, id: &str, partial: JsonValue) -> AppResult<JsonValue> {
        let mut guard = self.write()?;
        let record = guard
            .get_mut(&collection)
            .and_then(|data| data.records.get_mut(id))
            .ok_or_else(|| AppError::not_found(collection.as_str(), id))?;
        merge_fields(record, partial)?;
        debug!(target: "engine::db", %collection, %id, "record updated");
        Ok(record.clone())
    }
}
