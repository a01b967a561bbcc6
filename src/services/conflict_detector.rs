use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::db::repositories::scheduling_repository::SchedulingRepository;
use crate::error::{AppError, AppResult, ValidationCode};
use crate::models::availability::Weekday;
use crate::models::session::Session;
use crate::services::schedule_utils;
use crate::services::settings_service::SettingsService;

/// An existing booking that collides with a proposed window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BookingConflict {
    Session {
        session_id: String,
        subject: String,
        start_time: String,
        end_time: String,
    },
    Class {
        class_id: String,
        name: String,
        day: Weekday,
        start_time: String,
        end_time: String,
    },
}

impl BookingConflict {
    pub fn describe(&self) -> String {
        match self {
            BookingConflict::Session {
                subject,
                start_time,
                end_time,
                ..
            } => format!("conflicts with {subject} session from {start_time} to {end_time}"),
            BookingConflict::Class {
                name,
                day,
                start_time,
                end_time,
                ..
            } => format!("conflicts with class {name} on {day} {start_time}-{end_time}"),
        }
    }

    fn code(&self) -> ValidationCode {
        match self {
            BookingConflict::Session { .. } => ValidationCode::SessionOverlap,
            BookingConflict::Class { .. } => ValidationCode::ClassOverlap,
        }
    }
}

/// Two calendar-blocking individual sessions of one tutor that overlap.
/// `first_session_id` sorts before `second_session_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct SessionConflict {
    pub tutor_id: String,
    pub first_session_id: String,
    pub second_session_id: String,
    pub first_subject: String,
    pub second_subject: String,
    pub date: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConflictScan {
    pub conflicts: Vec<SessionConflict>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: DateTime<FixedOffset>,
    start_minute: i64,
    end_minute: i64,
}

impl Window {
    fn parse(start: &str, end: &str) -> AppResult<Self> {
        let start = schedule_utils::parse_datetime(start)?;
        let end = schedule_utils::parse_datetime(end)?;
        Self::from_bounds(start, end)
            .ok_or_else(|| AppError::invalid_format("window must be non-empty and within a single day"))
    }

    fn from_bounds(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Option<Self> {
        if end <= start || !schedule_utils::same_day(start, end) {
            return None;
        }
        Some(Self {
            start,
            start_minute: schedule_utils::minutes_of_day(start),
            end_minute: schedule_utils::minutes_of_day(end),
        })
    }

    fn overlaps(&self, other: &Window, buffer_minutes: i64) -> bool {
        schedule_utils::same_day(self.start, other.start)
            && schedule_utils::overlaps(
                self.start_minute,
                self.end_minute,
                other.start_minute,
                other.end_minute,
                buffer_minutes,
            )
    }
}

pub struct ConflictDetector {
    repository: SchedulingRepository,
    settings: Arc<SettingsService>,
}

impl ConflictDetector {
    pub fn new(repository: SchedulingRepository, settings: Arc<SettingsService>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Proactive check before booking or rescheduling a session.
    pub fn validate_proposed_window(
        &self,
        tutor_id: &str,
        start: &str,
        end: &str,
        exclude_session_id: Option<&str>,
    ) -> AppResult<()> {
        let start_at = schedule_utils::parse_datetime(start)?;
        let end_at = schedule_utils::parse_datetime(end)?;
        let window = Window::from_bounds(start_at, end_at).ok_or_else(|| {
            AppError::validation(
                ValidationCode::InvalidWindow,
                format!("window {start} - {end} must be non-empty and within a single day"),
            )
        })?;

        if self.repository.tutor(tutor_id)?.is_none() {
            return Err(AppError::not_found("tutor", tutor_id));
        }

        self.check_availability_window(tutor_id, &window)?;

        let conflicts = self.find_conflicts_for_window(tutor_id, &window, exclude_session_id)?;
        if let Some(first) = conflicts.first() {
            return Err(AppError::validation_with_details(
                first.code(),
                first.describe(),
                json!({ "conflicts": conflicts }),
            ));
        }

        debug!(target: "engine::conflict", %tutor_id, %start, %end, "proposed window accepted");
        Ok(())
    }

    /// The window must sit fully inside the first availability slot for its weekday.
    pub fn check_availability(&self, tutor_id: &str, start: &str, end: &str) -> AppResult<()> {
        let window = Window::parse(start, end)?;
        self.check_availability_window(tutor_id, &window)
    }

    /// Every session or class colliding with the window; empty when the slot is free.
    pub fn find_booking_conflicts(
        &self,
        tutor_id: &str,
        start: &str,
        end: &str,
        exclude_session_id: Option<&str>,
    ) -> AppResult<Vec<BookingConflict>> {
        let window = Window::parse(start, end)?;
        self.find_conflicts_for_window(tutor_id, &window, exclude_session_id)
    }

    fn check_availability_window(&self, tutor_id: &str, window: &Window) -> AppResult<()> {
        let availability = self.repository.availability_for_tutor(tutor_id)?;
        if availability.items.is_empty() {
            return Err(AppError::validation(
                ValidationCode::NoAvailability,
                format!("tutor {tutor_id} has no availability configured"),
            ));
        }

        let weekday = schedule_utils::weekday_of(window.start);
        let slot = availability
            .items
            .iter()
            .flat_map(|record| record.slots.iter())
            .find(|slot| slot.day == weekday)
            .ok_or_else(|| {
                AppError::validation_with_details(
                    ValidationCode::NoSlotForWeekday,
                    format!("tutor {tutor_id} is not available on {weekday}"),
                    json!({ "day": weekday }),
                )
            })?;

        let slot_start = schedule_utils::parse_clock(&slot.start_time)?;
        let slot_end = schedule_utils::parse_clock(&slot.end_time)?;
        if !schedule_utils::contains(slot_start, slot_end, window.start_minute, window.end_minute) {
            return Err(AppError::validation_with_details(
                ValidationCode::OutsideAvailability,
                format!(
                    "requested time {}-{} is outside availability {}-{} on {weekday}",
                    schedule_utils::format_clock(window.start_minute),
                    schedule_utils::format_clock(window.end_minute),
                    slot.start_time,
                    slot.end_time,
                ),
                json!({ "day": weekday, "startTime": slot.start_time, "endTime": slot.end_time }),
            ));
        }

        Ok(())
    }

    fn find_conflicts_for_window(
        &self,
        tutor_id: &str,
        window: &Window,
        exclude_session_id: Option<&str>,
    ) -> AppResult<Vec<BookingConflict>> {
        let buffer_minutes = self.settings.get()?.buffer_minutes;
        let mut conflicts = Vec::new();

        let sessions = self.repository.sessions_for_tutor(tutor_id)?;
        for session in sessions.items.iter().filter(|session| {
            session.is_individual()
                && session.status.blocks_calendar()
                && Some(session.id.as_str()) != exclude_session_id
        }) {
            let existing = match Window::parse(&session.start_time, &session.end_time) {
                Ok(existing) => existing,
                Err(err) => {
                    warn!(target: "engine::conflict", session_id = %session.id, error = %err, "skipping session with unreadable times");
                    continue;
                }
            };

            if window.overlaps(&existing, buffer_minutes) {
                conflicts.push(BookingConflict::Session {
                    session_id: session.id.clone(),
                    subject: session.subject.clone(),
                    start_time: session.start_time.clone(),
                    end_time: session.end_time.clone(),
                });
            }
        }

        let weekday = schedule_utils::weekday_of(window.start);
        let classes = self.repository.classes_for_tutor(tutor_id)?;
        for class in classes
            .items
            .iter()
            .filter(|class| class.is_scheduled() && class.day == weekday)
        {
            let slot = schedule_utils::parse_clock(&class.start_time)
                .and_then(|start| schedule_utils::parse_clock(&class.end_time).map(|end| (start, end)));
            let (class_start, class_end) = match slot {
                Ok(slot) => slot,
                Err(err) => {
                    warn!(target: "engine::conflict", class_id = %class.id, error = %err, "skipping class with unreadable slot");
                    continue;
                }
            };

            if schedule_utils::overlaps(
                window.start_minute,
                window.end_minute,
                class_start,
                class_end,
                0,
            ) {
                conflicts.push(BookingConflict::Class {
                    class_id: class.id.clone(),
                    name: class.name.clone(),
                    day: class.day,
                    start_time: class.start_time.clone(),
                    end_time: class.end_time.clone(),
                });
            }
        }

        Ok(conflicts)
    }
}

/// Pairwise scan of calendar-blocking individual sessions, grouped by tutor.
///
/// Every overlapping pair is reported exactly once, ordered by tutor then pair.
pub fn scan_session_conflicts(sessions: &[Session]) -> ConflictScan {
    let mut skipped = 0;
    let mut by_tutor: BTreeMap<&str, Vec<(&Session, Window)>> = BTreeMap::new();

    for session in sessions
        .iter()
        .filter(|session| session.is_individual() && session.status.blocks_calendar())
    {
        match Window::parse(&session.start_time, &session.end_time) {
            Ok(window) => by_tutor
                .entry(session.tutor_id.as_str())
                .or_default()
                .push((session, window)),
            Err(err) => {
                skipped += 1;
                warn!(target: "engine::conflict", session_id = %session.id, error = %err, "skipping session with unreadable times");
            }
        }
    }

    let mut found = BTreeSet::new();
    for (tutor_id, entries) in &by_tutor {
        for (idx, (left, left_window)) in entries.iter().enumerate() {
            for (right, right_window) in &entries[idx + 1..] {
                if left.id == right.id || !left_window.overlaps(right_window, 0) {
                    continue;
                }

                let (first, second) = if left.id < right.id {
                    (left, right)
                } else {
                    (right, left)
                };
                found.insert(SessionConflict {
                    tutor_id: tutor_id.to_string(),
                    first_session_id: first.id.clone(),
                    second_session_id: second.id.clone(),
                    first_subject: first.subject.clone(),
                    second_subject: second.subject.clone(),
                    date: left_window.start.date_naive().to_string(),
                });
            }
        }
    }

    ConflictScan {
        conflicts: found.into_iter().collect(),
        skipped,
    }
}
