mod support;

use support::{ts, Fixture, MONDAY, TUESDAY};
use tutorhub_engine::error::ValidationCode;
use tutorhub_engine::models::settings::SettingsUpdateInput;
use tutorhub_engine::services::conflict_detector::BookingConflict;
use tutorhub_engine::{AppError, AppState};

fn monday_tutor() -> Fixture {
    let fx = Fixture::new();
    fx.tutor("t-1", "active")
        .availability("av-1", "t-1", &[("monday", "08:00", "17:00")]);
    fx
}

fn validate(fx: &Fixture, date: &str, start: &str, end: &str) -> Result<(), AppError> {
    fx.state
        .conflicts()
        .validate_proposed_window("t-1", &ts(date, start), &ts(date, end), None)
}

#[test]
fn test_availability_slot_bounds() {
    let fx = monday_tutor();

    assert!(validate(&fx, MONDAY, "09:00", "10:00").is_ok());

    let late = validate(&fx, MONDAY, "16:30", "17:30").unwrap_err();
    assert_eq!(late.validation_code(), Some(ValidationCode::OutsideAvailability));

    let tuesday = validate(&fx, TUESDAY, "09:00", "10:00").unwrap_err();
    assert_eq!(tuesday.validation_code(), Some(ValidationCode::NoSlotForWeekday));

    // a window ending exactly at the slot end fits
    assert!(validate(&fx, MONDAY, "16:00", "17:00").is_ok());
}

#[test]
fn test_tutor_without_availability_is_rejected() {
    let fx = Fixture::new();
    fx.tutor("t-1", "active");

    let error = validate(&fx, MONDAY, "09:00", "10:00").unwrap_err();
    assert_eq!(error.validation_code(), Some(ValidationCode::NoAvailability));
}

#[test]
fn test_unknown_tutor_is_not_found() {
    let fx = Fixture::new();
    let result = fx.state.conflicts().validate_proposed_window(
        "ghost",
        &ts(MONDAY, "09:00"),
        &ts(MONDAY, "10:00"),
        None,
    );
    assert!(matches!(result, Err(AppError::NotFound { entity: "tutor", .. })));
}

#[test]
fn test_session_buffer_is_enforced() {
    let fx = monday_tutor();
    fx.session("s-1", "t-1", MONDAY, "09:00", "10:00", 60, "confirmed", &["a"]);

    let error = validate(&fx, MONDAY, "10:15", "11:00").unwrap_err();
    assert_eq!(error.validation_code(), Some(ValidationCode::SessionOverlap));
    match error {
        AppError::Validation { details, .. } => {
            let details = details.expect("conflict details");
            assert_eq!(details["conflicts"][0]["sessionId"], "s-1");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(validate(&fx, MONDAY, "10:35", "11:00").is_ok());
}

#[test]
fn test_buffer_follows_settings() {
    let fx = monday_tutor();
    fx.session("s-1", "t-1", MONDAY, "09:00", "10:00", 60, "confirmed", &["a"]);

    fx.state
        .settings()
        .update(SettingsUpdateInput {
            buffer_minutes: Some(10),
            ..Default::default()
        })
        .unwrap();

    assert!(validate(&fx, MONDAY, "10:15", "11:00").is_ok());
    assert!(validate(&fx, MONDAY, "10:05", "11:00").is_err());
}

#[test]
fn test_buffer_update_from_another_state_is_seen() {
    let fx = monday_tutor();
    fx.session("s-1", "t-1", MONDAY, "09:00", "10:00", 60, "confirmed", &["a"]);
    let other = AppState::new(fx.store.clone());

    assert_eq!(fx.state.settings().get().unwrap().buffer_minutes, 30);
    assert!(validate(&fx, MONDAY, "10:15", "11:00").is_err());

    other
        .settings()
        .update(SettingsUpdateInput {
            buffer_minutes: Some(10),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(fx.state.settings().get().unwrap().buffer_minutes, 10);
    assert!(validate(&fx, MONDAY, "10:15", "11:00").is_ok());
}

#[test]
fn test_rescheduling_excludes_the_session_itself() {
    let fx = monday_tutor();
    fx.session("s-1", "t-1", MONDAY, "09:00", "10:00", 60, "confirmed", &["a"]);

    let result = fx.state.conflicts().validate_proposed_window(
        "t-1",
        &ts(MONDAY, "09:30"),
        &ts(MONDAY, "10:30"),
        Some("s-1"),
    );
    assert!(result.is_ok());
}

#[test]
fn test_inactive_sessions_and_class_sessions_do_not_block() {
    let fx = monday_tutor();
    fx.session("done", "t-1", MONDAY, "09:00", "10:00", 60, "completed", &["a"])
        .session("gone", "t-1", MONDAY, "11:00", "12:00", 60, "cancelled", &["b"])
        .class_session("group", "t-1", "c-9", MONDAY, "13:00", "14:00");

    assert!(validate(&fx, MONDAY, "09:00", "10:00").is_ok());
    assert!(validate(&fx, MONDAY, "11:00", "12:00").is_ok());
    assert!(validate(&fx, MONDAY, "13:00", "14:00").is_ok());
}

#[test]
fn test_active_class_on_same_weekday_blocks_without_buffer() {
    let fx = monday_tutor();
    fx.class("c-1", "t-1", "monday", "13:00", "14:00", 60, 10, "active")
        .class("c-2", "t-1", "monday", "15:00", "16:00", 60, 10, "inactive");

    let error = validate(&fx, MONDAY, "13:30", "14:30").unwrap_err();
    assert_eq!(error.validation_code(), Some(ValidationCode::ClassOverlap));

    // touching the class end is allowed; classes carry no buffer
    assert!(validate(&fx, MONDAY, "14:00", "14:30").is_ok());
    assert!(validate(&fx, MONDAY, "15:00", "16:00").is_ok());
}

#[test]
fn test_full_class_still_blocks_its_window() {
    let fx = monday_tutor();
    fx.class("c-1", "t-1", "monday", "13:00", "14:00", 60, 2, "full");

    let error = validate(&fx, MONDAY, "13:30", "14:30").unwrap_err();
    assert_eq!(error.validation_code(), Some(ValidationCode::ClassOverlap));
}

#[test]
fn test_find_booking_conflicts_lists_every_collision() {
    let fx = monday_tutor();
    fx.session("s-1", "t-1", MONDAY, "09:00", "10:00", 60, "confirmed", &["a"])
        .session("s-2", "t-1", MONDAY, "10:00", "11:00", 60, "pending", &["b"])
        .class("c-1", "t-1", "monday", "10:30", "11:30", 60, 10, "active");

    let conflicts = fx
        .state
        .conflicts()
        .find_booking_conflicts("t-1", &ts(MONDAY, "10:00"), &ts(MONDAY, "10:45"), None)
        .unwrap();

    assert_eq!(conflicts.len(), 3);
    assert!(conflicts
        .iter()
        .any(|c| matches!(c, BookingConflict::Class { class_id, .. } if class_id == "c-1")));
}

#[test]
fn test_malformed_windows_are_rejected() {
    let fx = monday_tutor();

    let inverted = validate(&fx, MONDAY, "11:00", "10:00").unwrap_err();
    assert_eq!(inverted.validation_code(), Some(ValidationCode::InvalidWindow));

    let garbage = fx
        .state
        .conflicts()
        .validate_proposed_window("t-1", "monday morning", &ts(MONDAY, "10:00"), None);
    assert!(matches!(garbage, Err(AppError::InvalidFormat { .. })));
}

#[test]
fn test_check_availability_ignores_bookings() {
    let fx = monday_tutor();
    fx.session("s-1", "t-1", MONDAY, "09:00", "10:00", 60, "confirmed", &["a"]);

    let detector = fx.state.conflicts();
    // overlaps s-1 but sits inside the slot
    assert!(detector
        .check_availability("t-1", &ts(MONDAY, "09:00"), &ts(MONDAY, "10:00"))
        .is_ok());
    let early = detector
        .check_availability("t-1", &ts(MONDAY, "07:30"), &ts(MONDAY, "08:30"))
        .unwrap_err();
    assert_eq!(early.validation_code(), Some(ValidationCode::OutsideAvailability));
}
