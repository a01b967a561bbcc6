use chrono::Utc;
use rusqlite::{named_params, Connection, OptionalExtension};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::db::repositories::record_store::{
    merge_fields, record_id, Collection, RecordPredicate, RecordStore,
};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

/// Record store persisting every collection into the shared `records` table.
#[derive(Clone, Debug)]
pub struct SqliteRecordStore {
    db: DbPool,
}

impl SqliteRecordStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl RecordStore for SqliteRecordStore {
    fn find_many(
        &self,
        collection: Collection,
        predicate: RecordPredicate<'_>,
    ) -> AppResult<Vec<JsonValue>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                r#"
                    SELECT id, payload
                    FROM records
                    WHERE collection = :collection
                    ORDER BY rowid
                "#,
            )?;

            let rows = stmt
                .query_map(named_params! {":collection": collection.as_str()}, |row| {
                    Ok((row.get::<_, String>("id")?, row.get::<_, String>("payload")?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut records = Vec::with_capacity(rows.len());
            for (id, payload) in rows {
                match serde_json::from_str::<JsonValue>(&payload) {
                    Ok(record) if predicate(&record) => records.push(record),
                    Ok(_) => {}
                    Err(err) => {
                        warn!(target: "engine::db", %collection, %id, error = %err, "skipping unreadable payload");
                    }
                }
            }
            Ok(records)
        })
    }

    fn find_by_id(&self, collection: Collection, id: &str) -> AppResult<Option<JsonValue>> {
        self.db.with_connection(|conn| {
            load_payload(conn, collection, id)?
                .map(|payload| serde_json::from_str(&payload).map_err(AppError::from))
                .transpose()
        })
    }

    fn create(&self, collection: Collection, record: JsonValue) -> AppResult<JsonValue> {
        let id = record_id(&record)?;
        let payload = serde_json::to_string(&record)?;
        let now = Utc::now().to_rfc3339();

        self.db.with_connection(|conn| {
            let result = conn.execute(
                r#"
                    INSERT INTO records (collection, id, payload, created_at, updated_at)
                    VALUES (:collection, :id, :payload, :created_at, :updated_at)
                "#,
                named_params! {
                    ":collection": collection.as_str(),
                    ":id": &id,
                    ":payload": &payload,
                    ":created_at": &now,
                    ":updated_at": &now,
                },
            );

            match result {
                Ok(_) => {
                    debug!(target: "engine::db", %collection, %id, "record created");
                    Ok(())
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(AppError::invalid_state(format!(
                        "{collection} record {id} already exists"
                    )))
                }
                Err(err) => Err(AppError::from(err)),
            }
        })?;

        Ok(record)
    }

    fn update(&self, collection: Collection, id: &str, partial: JsonValue) -> AppResult<JsonValue> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;

        let payload = load_payload(&tx, collection, id)?
            .ok_or_else(|| AppError::not_found(collection.as_str(), id))?;
        let mut record: JsonValue = serde_json::from_str(&payload)?;
        merge_fields(&mut record, partial)?;

        tx.execute(
            r#"
                UPDATE records
                SET payload = :payload, updated_at = :updated_at
                WHERE collection = :collection AND id = :id
            "#,
            named_params! {
                ":payload": serde_json::to_string(&record)?,
                ":updated_at": Utc::now().to_rfc3339(),
                ":collection": collection.as_str(),
                ":id": id,
            },
        )?;
        tx.commit()?;

        debug!(target: "engine::db", %collection, %id, "record updated");
        Ok(record)
    }
}

fn load_payload(conn: &Connection, collection: Collection, id: &str) -> AppResult<Option<String>> {
    let payload = conn
        .query_row(
            "SELECT payload FROM records WHERE collection = :collection AND id = :id",
            named_params! {":collection": collection.as_str(), ":id": id},
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(payload)
}
