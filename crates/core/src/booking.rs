//! Single-patient booking: book, cancel, cancel-all and reschedule.
//!
//! Every operation runs against a working copy of the practice and keeps the
//! slot book and the ledger in step: an active appointment's slot is never
//! listed as open.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::appointment::{Appointment, AppointmentId, CancelReason};
use crate::domain::patient::PatientId;
use crate::domain::slot::SlotTime;
use crate::errors::{BookingError, ValidationError};
use crate::ledger::NewAppointment;
use crate::slots::SlotCalendar;
use crate::snapshot::PracticeSnapshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingRequest {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub date: String,
    pub time: String,
    pub appointment_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RescheduleRequest {
    pub appointment_id: AppointmentId,
    pub new_date: String,
    pub new_time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    /// Same-day appointments cancelled to make room for this one.
    pub superseded: Vec<AppointmentId>,
}

#[derive(Clone, Copy, Debug)]
pub struct BookingCoordinator {
    calendar: SlotCalendar,
}

impl BookingCoordinator {
    pub fn new(calendar: SlotCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &SlotCalendar {
        &self.calendar
    }

    pub fn book(
        &self,
        practice: &mut PracticeSnapshot,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, BookingError> {
        practice.transact(|working| {
            let patient = working.patients.require(&request.patient_id)?.clone();
            let supplied = request.patient_name.trim();
            if supplied != patient.full_name {
                return Err(BookingError::PatientMismatch {
                    patient_id: patient.id.clone(),
                    supplied: supplied.to_string(),
                });
            }

            let date = self.parse_date(&request.date)?;
            let time = parse_time(&request.time)?;
            let appointment_type = required(&request.appointment_type, "type")?;

            let superseded = supersede_same_day(
                working,
                &HashSet::from([patient.id.clone()]),
                date,
                CancelReason::OverwrittenByNewBooking,
                now,
            )?;

            working.slots.reserve(date, time)?;
            let appointment = working.appointments.create(
                NewAppointment {
                    patient_id: patient.id,
                    patient_name: patient.full_name,
                    relationship: None,
                    date,
                    time,
                    appointment_type,
                },
                now,
            );

            Ok(BookingConfirmation { appointment, superseded })
        })
    }

    pub fn cancel(
        &self,
        practice: &mut PracticeSnapshot,
        appointment_id: &AppointmentId,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        practice.transact(|working| {
            let cancelled =
                working.appointments.mark_cancelled(appointment_id, CancelReason::PatientRequest, now)?;
            working.slots.release(cancelled.date, cancelled.time);
            Ok(cancelled)
        })
    }

    pub fn cancel_all(
        &self,
        practice: &mut PracticeSnapshot,
        patient_id: &PatientId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError> {
        practice.transact(|working| {
            working.patients.require(patient_id)?;
            let active = working.appointments.find_by_patient(patient_id, true);
            if active.is_empty() {
                return Err(BookingError::NoActiveAppointments(patient_id.clone()));
            }

            let mut cancelled = Vec::with_capacity(active.len());
            for appointment in active {
                let record = working.appointments.mark_cancelled(
                    &appointment.id,
                    CancelReason::PatientRequest,
                    now,
                )?;
                working.slots.release(record.date, record.time);
                cancelled.push(record);
            }
            Ok(cancelled)
        })
    }

    pub fn reschedule(
        &self,
        practice: &mut PracticeSnapshot,
        request: &RescheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        practice.transact(|working| {
            let current = working
                .appointments
                .get(&request.appointment_id)
                .cloned()
                .ok_or_else(|| BookingError::AppointmentNotFound(request.appointment_id.clone()))?;
            if !current.is_active() {
                return Err(BookingError::AlreadyCancelled(current.id));
            }

            let date = self.parse_date(&request.new_date)?;
            let time = parse_time(&request.new_time)?;

            working.slots.reserve(date, time)?;
            working.slots.release(current.date, current.time);
            working.appointments.mark_rescheduled(&current.id, date, time, now)
        })
    }

    /// Write paths take the date exactly as given. The deployment-year clamp
    /// belongs to slot listing only.
    pub fn parse_date(&self, raw: &str) -> Result<NaiveDate, ValidationError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(ValidationError::missing("date"));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(value.to_string()))
    }
}

pub fn parse_time(raw: &str) -> Result<SlotTime, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::missing("time"));
    }
    raw.parse().map_err(|_| ValidationError::InvalidTime(raw.trim().to_string()))
}

pub(crate) fn required(raw: &str, field: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::missing(field));
    }
    Ok(value.to_string())
}

/// Cancels every active appointment on `date` held by `patient_ids` and puts
/// their slots back. Returns the cancelled ids in ledger order.
pub(crate) fn supersede_same_day(
    practice: &mut PracticeSnapshot,
    patient_ids: &HashSet<PatientId>,
    date: NaiveDate,
    reason: CancelReason,
    now: DateTime<Utc>,
) -> Result<Vec<AppointmentId>, BookingError> {
    let existing = practice.appointments.find_by_date_and_patients(date, patient_ids);
    let mut superseded = Vec::with_capacity(existing.len());
    for appointment in existing {
        let cancelled = practice.appointments.mark_cancelled(&appointment.id, reason, now)?;
        practice.slots.release(cancelled.date, cancelled.time);
        superseded.push(cancelled.id);
    }
    Ok(superseded)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::{BookingCoordinator, BookingRequest, RescheduleRequest};
    use crate::directory::Registration;
    use crate::domain::appointment::{AppointmentId, AppointmentStatus, CancelReason};
    use crate::domain::patient::{Patient, PatientId};
    use crate::domain::slot::{SlotDay, SlotTime};
    use crate::errors::{BookingError, ValidationError};
    use crate::slots::{SlotBook, SlotCalendar};
    use crate::snapshot::PracticeSnapshot;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
    }

    fn time(raw: &str) -> SlotTime {
        raw.parse().expect("time")
    }

    fn coordinator() -> BookingCoordinator {
        BookingCoordinator::new(SlotCalendar::new(date("2025-10-20")))
    }

    fn practice() -> (PracticeSnapshot, Patient) {
        let mut practice = PracticeSnapshot {
            slots: SlotBook::new(vec![
                SlotDay::new(date("2025-10-25"), vec![time("9:00 AM"), time("2:00 PM"), time("3:00 PM")]),
                SlotDay::new(date("2025-10-27"), vec![time("10:00 AM")]),
            ]),
            ..PracticeSnapshot::default()
        };
        let patient = practice
            .patients
            .register(
                &Registration {
                    full_name: "John Doe".to_string(),
                    phone: "1234567890".to_string(),
                    date_of_birth: "01151990".to_string(),
                    insurance: "Blue Cross".to_string(),
                },
                date("2025-10-20"),
            )
            .expect("register");
        (practice, patient)
    }

    fn request(patient: &Patient, day: &str, at: &str) -> BookingRequest {
        BookingRequest {
            patient_id: patient.id.clone(),
            patient_name: patient.full_name.clone(),
            date: day.to_string(),
            time: at.to_string(),
            appointment_type: "Cleaning".to_string(),
        }
    }

    #[test]
    fn book_then_cancel_round_trips_the_slot() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();

        let confirmation = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "2:00 PM"), Utc::now())
            .expect("book");
        assert_eq!(confirmation.appointment.status, AppointmentStatus::Scheduled);
        assert!(confirmation.superseded.is_empty());
        assert!(!practice.slots.is_open(date("2025-10-25"), time("2:00 PM")));

        coordinator.cancel(&mut practice, &confirmation.appointment.id, Utc::now()).expect("cancel");
        assert!(practice.slots.is_open(date("2025-10-25"), time("2:00 PM")));
        assert_eq!(practice.slots.open_count(date("2025-10-25")), 3);
    }

    #[test]
    fn second_same_day_booking_supersedes_the_first() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();

        let first = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "9:00 AM"), Utc::now())
            .expect("first");
        let second = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "3:00 PM"), Utc::now())
            .expect("second");

        assert_eq!(second.superseded, vec![first.appointment.id.clone()]);
        let active = practice.appointments.find_by_patient(&patient.id, true);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.appointment.id);

        let old = practice.appointments.get(&first.appointment.id).expect("old record");
        assert_eq!(old.cancel_reason, Some(CancelReason::OverwrittenByNewBooking));
        assert!(practice.slots.is_open(date("2025-10-25"), time("9:00 AM")));
    }

    #[test]
    fn failed_booking_leaves_prior_same_day_appointment_intact() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();
        coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "9:00 AM"), Utc::now())
            .expect("first");
        let before = practice.clone();

        let error = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "11:00 AM"), Utc::now())
            .expect_err("slot not offered");

        assert!(matches!(error, BookingError::SlotUnavailable { .. }));
        assert_eq!(practice, before);
    }

    #[test]
    fn book_checks_patient_and_name() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();

        let mut stale = request(&patient, "2025-10-25", "2:00 PM");
        stale.patient_name = "Jon Doe".to_string();
        let error = coordinator.book(&mut practice, &stale, Utc::now()).expect_err("mismatch");
        assert!(matches!(error, BookingError::PatientMismatch { .. }));

        let mut padded = request(&patient, "2025-10-25", "2:00 PM");
        padded.patient_name = "  John Doe ".to_string();
        assert!(coordinator.book(&mut practice, &padded, Utc::now()).is_ok());

        let mut unknown = request(&patient, "2025-10-25", "3:00 PM");
        unknown.patient_id = PatientId("P0099".to_string());
        let error = coordinator.book(&mut practice, &unknown, Utc::now()).expect_err("unknown");
        assert_eq!(error, BookingError::PatientNotFound(PatientId("P0099".to_string())));

        let error = coordinator
            .book(&mut practice, &request(&patient, "October 25", "3:00 PM"), Utc::now())
            .expect_err("bad date");
        assert!(matches!(error, BookingError::Validation(ValidationError::InvalidDate(_))));
    }

    #[test]
    fn booking_outside_the_listing_years_keeps_the_requested_date() {
        let (mut practice, patient) = practice();
        assert!(practice.slots.insert_day(SlotDay::new(date("2026-10-25"), vec![time("2:00 PM")])));
        let coordinator = BookingCoordinator::new(SlotCalendar::new(date("2026-10-18")));

        let confirmation = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "2:00 PM"), Utc::now())
            .expect("book");

        assert_eq!(confirmation.appointment.date, date("2025-10-25"));
        assert!(!practice.slots.is_open(date("2025-10-25"), time("2:00 PM")));
        assert!(practice.slots.is_open(date("2026-10-25"), time("2:00 PM")));
    }

    #[test]
    fn cancel_twice_does_not_release_again() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();
        let booked = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "2:00 PM"), Utc::now())
            .expect("book");
        coordinator.cancel(&mut practice, &booked.appointment.id, Utc::now()).expect("cancel");
        let before = practice.clone();

        let error = coordinator
            .cancel(&mut practice, &booked.appointment.id, Utc::now())
            .expect_err("second cancel");

        assert_eq!(error, BookingError::AlreadyCancelled(booked.appointment.id.clone()));
        assert_eq!(practice, before);
    }

    #[test]
    fn cancel_all_releases_each_slot() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();

        let error = coordinator.cancel_all(&mut practice, &patient.id, Utc::now()).expect_err("none");
        assert_eq!(error, BookingError::NoActiveAppointments(patient.id.clone()));

        coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "2:00 PM"), Utc::now())
            .expect("first");
        coordinator
            .book(&mut practice, &request(&patient, "2025-10-27", "10:00 AM"), Utc::now())
            .expect("second");

        let cancelled = coordinator.cancel_all(&mut practice, &patient.id, Utc::now()).expect("cancel all");
        assert_eq!(cancelled.len(), 2);
        assert!(practice.appointments.find_by_patient(&patient.id, true).is_empty());
        assert_eq!(practice.slots.open_count(date("2025-10-25")), 3);
        assert_eq!(practice.slots.open_count(date("2025-10-27")), 1);
    }

    #[test]
    fn reschedule_moves_in_place() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();
        let booked = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "2:00 PM"), Utc::now())
            .expect("book");

        let moved = coordinator
            .reschedule(
                &mut practice,
                &RescheduleRequest {
                    appointment_id: booked.appointment.id.clone(),
                    new_date: "2025-10-27".to_string(),
                    new_time: "10:00 AM".to_string(),
                },
                Utc::now(),
            )
            .expect("reschedule");

        assert_eq!(moved.id, booked.appointment.id);
        assert_eq!(moved.previous_date, Some(date("2025-10-25")));
        assert_eq!(moved.previous_time, Some(time("2:00 PM")));
        assert_eq!(practice.appointments.appointments().len(), 1);
        assert!(practice.slots.is_open(date("2025-10-25"), time("2:00 PM")));
        assert!(!practice.slots.is_open(date("2025-10-27"), time("10:00 AM")));
    }

    #[test]
    fn reschedule_failures() {
        let (mut practice, patient) = practice();
        let coordinator = coordinator();
        let booked = coordinator
            .book(&mut practice, &request(&patient, "2025-10-25", "2:00 PM"), Utc::now())
            .expect("book");

        let taken = RescheduleRequest {
            appointment_id: booked.appointment.id.clone(),
            new_date: "2025-10-25".to_string(),
            new_time: "2:00 PM".to_string(),
        };
        let error = coordinator.reschedule(&mut practice, &taken, Utc::now()).expect_err("taken");
        assert!(matches!(error, BookingError::SlotUnavailable { .. }));

        let missing = RescheduleRequest {
            appointment_id: AppointmentId("apt_missing".to_string()),
            ..taken.clone()
        };
        let error = coordinator.reschedule(&mut practice, &missing, Utc::now()).expect_err("missing");
        assert!(matches!(error, BookingError::AppointmentNotFound(_)));

        coordinator.cancel(&mut practice, &booked.appointment.id, Utc::now()).expect("cancel");
        let revived = RescheduleRequest { new_time: "3:00 PM".to_string(), ..taken };
        let error = coordinator.reschedule(&mut practice, &revived, Utc::now()).expect_err("cancelled");
        assert!(matches!(error, BookingError::AlreadyCancelled(_)));
    }
}
