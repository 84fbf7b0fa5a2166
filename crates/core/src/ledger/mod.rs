//! Appointment record keeping.
//!
//! The ledger never touches slot availability. Callers reserve or release the
//! slot themselves before or after mutating a record here.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::appointment::{
    Appointment, AppointmentId, AppointmentStatus, CancelReason,
};
use crate::domain::patient::PatientId;
use crate::domain::slot::SlotTime;
use crate::errors::BookingError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAppointment {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub relationship: Option<String>,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub appointment_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentLedger {
    appointments: Vec<Appointment>,
}

impl AppointmentLedger {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        Self { appointments }
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn get(&self, id: &AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|appointment| &appointment.id == id)
    }

    pub fn create(&mut self, new: NewAppointment, now: DateTime<Utc>) -> Appointment {
        let appointment = Appointment {
            id: AppointmentId::generate(),
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            relationship: new.relationship,
            date: new.date,
            time: new.time,
            appointment_type: new.appointment_type,
            status: AppointmentStatus::Scheduled,
            created_at: now,
            cancelled_at: None,
            cancel_reason: None,
            rescheduled_at: None,
            previous_date: None,
            previous_time: None,
        };
        self.appointments.push(appointment.clone());
        appointment
    }

    pub fn mark_cancelled(
        &mut self,
        id: &AppointmentId,
        reason: CancelReason,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.active_mut(id)?;
        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancelled_at = Some(now);
        appointment.cancel_reason = Some(reason);
        Ok(appointment.clone())
    }

    pub fn mark_rescheduled(
        &mut self,
        id: &AppointmentId,
        date: NaiveDate,
        time: SlotTime,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.active_mut(id)?;
        appointment.previous_date = Some(appointment.date);
        appointment.previous_time = Some(appointment.time);
        appointment.date = date;
        appointment.time = time;
        appointment.rescheduled_at = Some(now);
        Ok(appointment.clone())
    }

    pub fn find_by_patient(&self, patient_id: &PatientId, exclude_cancelled: bool) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter(|appointment| &appointment.patient_id == patient_id)
            .filter(|appointment| !exclude_cancelled || appointment.is_active())
            .cloned()
            .collect()
    }

    /// Active appointments on `date` held by any of `patient_ids`.
    pub fn find_by_date_and_patients(
        &self,
        date: NaiveDate,
        patient_ids: &HashSet<PatientId>,
    ) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter(|appointment| {
                appointment.date == date
                    && appointment.is_active()
                    && patient_ids.contains(&appointment.patient_id)
            })
            .cloned()
            .collect()
    }

    fn active_mut(&mut self, id: &AppointmentId) -> Result<&mut Appointment, BookingError> {
        let appointment = self
            .appointments
            .iter_mut()
            .find(|appointment| &appointment.id == id)
            .ok_or_else(|| BookingError::AppointmentNotFound(id.clone()))?;

        if !appointment.is_active() {
            return Err(BookingError::AlreadyCancelled(id.clone()));
        }
        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{NaiveDate, Utc};

    use super::{AppointmentLedger, NewAppointment};
    use crate::domain::appointment::{AppointmentId, AppointmentStatus, CancelReason};
    use crate::domain::patient::PatientId;
    use crate::errors::BookingError;

    fn new_appointment(patient: &str, date: &str, time: &str) -> NewAppointment {
        NewAppointment {
            patient_id: PatientId(patient.to_string()),
            patient_name: "Pat Smith".to_string(),
            relationship: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
            time: time.parse().expect("time"),
            appointment_type: "Cleaning".to_string(),
        }
    }

    #[test]
    fn create_starts_scheduled() {
        let mut ledger = AppointmentLedger::default();
        let appointment = ledger.create(new_appointment("P0001", "2025-10-25", "2:00 PM"), Utc::now());

        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert!(appointment.id.0.starts_with("apt_"));
        assert_eq!(ledger.get(&appointment.id), Some(&appointment));
    }

    #[test]
    fn cancel_is_soft_and_not_repeatable() {
        let mut ledger = AppointmentLedger::default();
        let appointment = ledger.create(new_appointment("P0001", "2025-10-25", "2:00 PM"), Utc::now());

        let cancelled = ledger
            .mark_cancelled(&appointment.id, CancelReason::PatientRequest, Utc::now())
            .expect("cancel");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancel_reason, Some(CancelReason::PatientRequest));
        assert_eq!(ledger.appointments().len(), 1, "records are never deleted");

        let again = ledger
            .mark_cancelled(&appointment.id, CancelReason::PatientRequest, Utc::now())
            .expect_err("second cancel");
        assert_eq!(again, BookingError::AlreadyCancelled(appointment.id.clone()));

        let missing = ledger
            .mark_cancelled(&AppointmentId("apt_missing".to_string()), CancelReason::PatientRequest, Utc::now())
            .expect_err("missing");
        assert!(matches!(missing, BookingError::AppointmentNotFound(_)));
    }

    #[test]
    fn reschedule_records_previous_slot() {
        let mut ledger = AppointmentLedger::default();
        let appointment = ledger.create(new_appointment("P0001", "2025-10-25", "2:00 PM"), Utc::now());

        let moved = ledger
            .mark_rescheduled(
                &appointment.id,
                NaiveDate::from_ymd_opt(2025, 10, 27).expect("date"),
                "9:00 AM".parse().expect("time"),
                Utc::now(),
            )
            .expect("reschedule");

        assert_eq!(moved.id, appointment.id);
        assert_eq!(moved.previous_date, Some(appointment.date));
        assert_eq!(moved.previous_time, Some(appointment.time));
        assert!(moved.rescheduled_at.is_some());
    }

    #[test]
    fn finders_filter_by_patient_date_and_status() {
        let mut ledger = AppointmentLedger::default();
        let first = ledger.create(new_appointment("P0001", "2025-10-25", "9:00 AM"), Utc::now());
        ledger.create(new_appointment("P0001", "2025-10-27", "9:00 AM"), Utc::now());
        ledger.create(new_appointment("P0002", "2025-10-25", "10:00 AM"), Utc::now());
        ledger.mark_cancelled(&first.id, CancelReason::PatientRequest, Utc::now()).expect("cancel");

        let patient = PatientId("P0001".to_string());
        assert_eq!(ledger.find_by_patient(&patient, true).len(), 1);
        assert_eq!(ledger.find_by_patient(&patient, false).len(), 2);

        let ids = HashSet::from([PatientId("P0001".to_string()), PatientId("P0002".to_string())]);
        let same_day = ledger
            .find_by_date_and_patients(NaiveDate::from_ymd_opt(2025, 10, 25).expect("date"), &ids);
        assert_eq!(same_day.len(), 1);
        assert_eq!(same_day[0].patient_id, PatientId("P0002".to_string()));
    }
}
