use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};

/// Named record collections the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Tutors,
    Sessions,
    Classes,
    Enrollments,
    Availability,
    OptimizationPlans,
    Settings,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tutors => "tutors",
            Collection::Sessions => "sessions",
            Collection::Classes => "classes",
            Collection::Enrollments => "enrollments",
            Collection::Availability => "availability",
            Collection::OptimizationPlans => "optimization_plans",
            Collection::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type RecordPredicate<'a> = &'a dyn Fn(&JsonValue) -> bool;

/// Generic record store. Records are JSON objects keyed by a string `id`.
///
/// Implementations must give read-after-write consistency for single records
/// and return bulk reads in insertion order.
pub trait RecordStore: Send + Sync {
    fn find_many(
        &self,
        collection: Collection,
        predicate: RecordPredicate<'_>,
    ) -> AppResult<Vec<JsonValue>>;

    fn find_by_id(&self, collection: Collection, id: &str) -> AppResult<Option<JsonValue>>;

    fn create(&self, collection: Collection, record: JsonValue) -> AppResult<JsonValue>;

    /// Merges the top-level fields of `partial` into the stored record.
    fn update(&self, collection: Collection, id: &str, partial: JsonValue) -> AppResult<JsonValue>;

    fn read_all(&self, collection: Collection) -> AppResult<Vec<JsonValue>> {
        self.find_many(collection, &|_| true)
    }
}

pub(crate) fn record_id(record: &JsonValue) -> AppResult<String> {
    record
        .get("id")
        .and_then(JsonValue::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid_format("record is missing a string `id` field"))
}

pub(crate) fn merge_fields(target: &mut JsonValue, partial: JsonValue) -> AppResult<()> {
    let JsonValue::Object(fields) = partial else {
        return Err(AppError::invalid_format("partial update must be a JSON object"));
    };
    let JsonValue::Object(existing) = target else {
        return Err(AppError::invalid_format("stored record is not a JSON object"));
    };
    for (key, value) in fields {
        if key == "id" {
            continue;
        }
        existing.insert(key, value);
    }
    Ok(())
}

/// Field equality helper for building predicates.
pub fn field_eq<'a>(field: &'a str, expected: &'a str) -> impl Fn(&JsonValue) -> bool + 'a {
    move |record| record.get(field).and_then(JsonValue::as_str) == Some(expected)
}
