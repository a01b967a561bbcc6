use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::warn;

use crate::db::repositories::record_store::{field_eq, Collection, RecordStore};
use crate::error::{AppError, AppResult};
use crate::models::availability::Availability;
use crate::models::class::{ClassRecord, Enrollment};
use crate::models::optimization::OptimizationPlan;
use crate::models::session::Session;
use crate::models::settings::EngineSettings;
use crate::models::tutor::Tutor;

const SETTINGS_RECORD_ID: &str = "engine";

/// Result of a bulk read: decoded records plus the number that failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Loaded<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

/// Typed view over the injected record store.
#[derive(Clone)]
pub struct SchedulingRepository {
    store: Arc<dyn RecordStore>,
}

impl SchedulingRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn tutors(&self) -> AppResult<Loaded<Tutor>> {
        self.load_all(Collection::Tutors)
    }

    pub fn tutor(&self, id: &str) -> AppResult<Option<Tutor>> {
        self.load_one(Collection::Tutors, id)
    }

    pub fn sessions(&self) -> AppResult<Loaded<Session>> {
        self.load_all(Collection::Sessions)
    }

    pub fn sessions_for_tutor(&self, tutor_id: &str) -> AppResult<Loaded<Session>> {
        self.load_where(Collection::Sessions, "tutorId", tutor_id)
    }

    pub fn session(&self, id: &str) -> AppResult<Option<Session>> {
        self.load_one(Collection::Sessions, id)
    }

    pub fn classes(&self) -> AppResult<Loaded<ClassRecord>> {
        self.load_all(Collection::Classes)
    }

    pub fn classes_for_tutor(&self, tutor_id: &str) -> AppResult<Loaded<ClassRecord>> {
        self.load_where(Collection::Classes, "tutorId", tutor_id)
    }

    pub fn class(&self, id: &str) -> AppResult<Option<ClassRecord>> {
        self.load_one(Collection::Classes, id)
    }

    pub fn enrollments(&self) -> AppResult<Loaded<Enrollment>> {
        self.load_all(Collection::Enrollments)
    }

    pub fn active_enrollments_for_class(&self, class_id: &str) -> AppResult<Vec<Enrollment>> {
        let loaded: Loaded<Enrollment> =
            self.load_where(Collection::Enrollments, "classId", class_id)?;
        Ok(loaded.items.into_iter().filter(Enrollment::is_active).collect())
    }

    pub fn active_enrollments_for_student(&self, student_id: &str) -> AppResult<Vec<Enrollment>> {
        let loaded: Loaded<Enrollment> =
            self.load_where(Collection::Enrollments, "studentId", student_id)?;
        Ok(loaded.items.into_iter().filter(Enrollment::is_active).collect())
    }

    pub fn availability_for_tutor(&self, tutor_id: &str) -> AppResult<Loaded<Availability>> {
        self.load_where(Collection::Availability, "tutorId", tutor_id)
    }

    pub fn plans(&self) -> AppResult<Loaded<OptimizationPlan>> {
        self.load_all(Collection::OptimizationPlans)
    }

    pub fn plan(&self, id: &str) -> AppResult<Option<OptimizationPlan>> {
        self.load_one(Collection::OptimizationPlans, id)
    }

    pub fn insert_plan(&self, plan: &OptimizationPlan) -> AppResult<()> {
        self.store
            .create(Collection::OptimizationPlans, serialize_record(plan)?)?;
        Ok(())
    }

    pub fn update_plan(&self, plan: &OptimizationPlan) -> AppResult<()> {
        self.store.update(
            Collection::OptimizationPlans,
            &plan.id,
            serialize_record(plan)?,
        )?;
        Ok(())
    }

    pub fn assign_session_tutor(&self, session_id: &str, tutor_id: &str) -> AppResult<()> {
        self.store.update(
            Collection::Sessions,
            session_id,
            json!({ "tutorId": tutor_id }),
        )?;
        Ok(())
    }

    pub fn move_enrollment(&self, enrollment_id: &str, class_id: &str) -> AppResult<()> {
        self.store.update(
            Collection::Enrollments,
            enrollment_id,
            json!({ "classId": class_id }),
        )?;
        Ok(())
    }

    pub fn set_class_capacity(
        &self,
        class_id: &str,
        max_students: u32,
        current_enrollment: u32,
    ) -> AppResult<()> {
        self.store.update(
            Collection::Classes,
            class_id,
            json!({ "maxStudents": max_students, "currentEnrollment": current_enrollment }),
        )?;
        Ok(())
    }

    pub fn load_settings(&self) -> AppResult<Option<EngineSettings>> {
        self.load_one(Collection::Settings, SETTINGS_RECORD_ID)
    }

    pub fn save_settings(&self, settings: &EngineSettings) -> AppResult<()> {
        let mut record = serialize_record(settings)?;
        if let JsonValue::Object(fields) = &mut record {
            fields.insert("id".to_string(), json!(SETTINGS_RECORD_ID));
        }

        if self
            .store
            .find_by_id(Collection::Settings, SETTINGS_RECORD_ID)?
            .is_some()
        {
            self.store
                .update(Collection::Settings, SETTINGS_RECORD_ID, record)?;
        } else {
            self.store.create(Collection::Settings, record)?;
        }
        Ok(())
    }

    fn load_all<T: DeserializeOwned>(&self, collection: Collection) -> AppResult<Loaded<T>> {
        let records = self.store.read_all(collection)?;
        Ok(decode_all(collection, records))
    }

    fn load_where<T: DeserializeOwned>(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> AppResult<Loaded<T>> {
        let records = self.store.find_many(collection, &field_eq(field, value))?;
        Ok(decode_all(collection, records))
    }

    fn load_one<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> AppResult<Option<T>> {
        self.store
            .find_by_id(collection, id)?
            .map(|record| {
                serde_json::from_value(record).map_err(|err| {
                    AppError::invalid_format(format!("{collection} record {id} is malformed: {err}"))
                })
            })
            .transpose()
    }
}

fn decode_all<T: DeserializeOwned>(collection: Collection, records: Vec<JsonValue>) -> Loaded<T> {
    let mut loaded = Loaded::empty();
    for record in records {
        let id = record
            .get("id")
            .and_then(JsonValue::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        match serde_json::from_value::<T>(record) {
            Ok(item) => loaded.items.push(item),
            Err(err) => {
                loaded.skipped += 1;
                warn!(target: "engine::db", %collection, %id, error = %err, "skipping malformed record");
            }
        }
    }
    loaded
}

fn serialize_record<T: Serialize>(value: &T) -> AppResult<JsonValue> {
    serde_json::to_value(value).map_err(AppError::from)
}
