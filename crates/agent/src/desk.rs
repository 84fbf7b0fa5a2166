//! The booking desk: every practice operation behind one serialization lock.
//!
//! Each call loads the practice from the store, runs the operation against a
//! working copy and commits only the collections the operation changed. A
//! failed operation commits nothing.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use frontdesk_core::booking::{BookingConfirmation, BookingCoordinator, BookingRequest, RescheduleRequest};
use frontdesk_core::config::AppConfig;
use frontdesk_core::directory::Registration;
use frontdesk_core::domain::appointment::{Appointment, AppointmentId};
use frontdesk_core::domain::patient::{Patient, PatientId};
use frontdesk_core::emergency::{EmergencyNotifier, EmergencyReport, NotifyOutcome};
use frontdesk_core::errors::{ApplicationError, BookingError};
use frontdesk_core::family::{FamilyBookingCoordinator, FamilyBookingOutcome, FamilyBookingRequest};
use frontdesk_core::slots::{AvailableSlots, SlotCalendar, SlotQuery};
use frontdesk_core::snapshot::PracticeSnapshot;
use frontdesk_db::PracticeStore;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant, for tests and replay.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeskSettings {
    /// Pins "today" for date resolution; the clock's date is used otherwise.
    pub reference_date: Option<NaiveDate>,
    pub deployment_year: Option<i32>,
    pub default_window_days: u32,
    pub emergency_dedup_window: Duration,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl DeskSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            reference_date: config.practice.reference_date,
            deployment_year: config.booking.deployment_year,
            default_window_days: config.booking.default_window_days,
            emergency_dedup_window: config.booking.emergency_dedup_window(),
        }
    }
}

pub struct BookingDesk {
    store: Arc<dyn PracticeStore>,
    clock: Arc<dyn Clock>,
    settings: DeskSettings,
    serial: Mutex<()>,
}

impl BookingDesk {
    pub fn new(store: Arc<dyn PracticeStore>, clock: Arc<dyn Clock>, settings: DeskSettings) -> Self {
        Self { store, clock, settings, serial: Mutex::new(()) }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> &DeskSettings {
        &self.settings
    }

    pub fn today(&self) -> NaiveDate {
        self.settings.reference_date.unwrap_or_else(|| self.clock.now().date_naive())
    }

    pub fn calendar(&self) -> SlotCalendar {
        let today = self.today();
        SlotCalendar {
            reference_date: today,
            deployment_year: self.settings.deployment_year.unwrap_or_else(|| today.year()),
            default_window_days: self.settings.default_window_days,
        }
    }

    pub async fn search_patients(
        &self,
        phone: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Patient>, ApplicationError> {
        self.read(|practice| practice.patients.search(phone, name)).await
    }

    pub async fn available_slots(&self, query: &SlotQuery) -> Result<AvailableSlots, ApplicationError> {
        let calendar = self.calendar();
        self.read(|practice| Ok(calendar.query(&practice.slots, query))).await
    }

    pub async fn register_patient(&self, registration: &Registration) -> Result<Patient, ApplicationError> {
        let today = self.today();
        let patient = self.write(|practice| practice.patients.register(registration, today)).await?;
        info!(
            event_name = "directory.patient.registered",
            patient_id = %patient.id,
            insurance = %patient.insurance,
            "patient registered"
        );
        Ok(patient)
    }

    pub async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation, ApplicationError> {
        let coordinator = BookingCoordinator::new(self.calendar());
        let now = self.clock.now();
        let confirmation = self.write(|practice| coordinator.book(practice, request, now)).await?;
        info!(
            event_name = "booking.appointment.booked",
            appointment_id = %confirmation.appointment.id,
            patient_id = %confirmation.appointment.patient_id,
            date = %confirmation.appointment.date,
            time = %confirmation.appointment.time,
            superseded = confirmation.superseded.len(),
            "appointment booked"
        );
        Ok(confirmation)
    }

    pub async fn book_family(
        &self,
        request: &FamilyBookingRequest,
    ) -> Result<FamilyBookingOutcome, ApplicationError> {
        let coordinator = FamilyBookingCoordinator::new(self.calendar());
        let now = self.clock.now();
        let today = self.today();
        let outcome =
            self.write(|practice| coordinator.book_family(practice, request, now, today)).await?;

        match &outcome {
            FamilyBookingOutcome::Booked(booking) => info!(
                event_name = "booking.family.booked",
                primary_patient_id = %request.primary_patient_id,
                date = %booking.date,
                appointments = booking.appointments.len(),
                created_patients = booking.created_patients.len(),
                "family appointments booked"
            ),
            FamilyBookingOutcome::InsufficientSlots(shortfall) => info!(
                event_name = "booking.family.insufficient_slots",
                primary_patient_id = %request.primary_patient_id,
                requested_date = %shortfall.requested_date,
                needed = shortfall.needed,
                available = shortfall.available,
                "not enough open slots for the family"
            ),
        }
        Ok(outcome)
    }

    pub async fn cancel(&self, appointment_id: &AppointmentId) -> Result<Appointment, ApplicationError> {
        let coordinator = BookingCoordinator::new(self.calendar());
        let now = self.clock.now();
        let cancelled = self.write(|practice| coordinator.cancel(practice, appointment_id, now)).await?;
        info!(
            event_name = "booking.appointment.cancelled",
            appointment_id = %cancelled.id,
            patient_id = %cancelled.patient_id,
            "appointment cancelled"
        );
        Ok(cancelled)
    }

    pub async fn cancel_all(&self, patient_id: &PatientId) -> Result<Vec<Appointment>, ApplicationError> {
        let coordinator = BookingCoordinator::new(self.calendar());
        let now = self.clock.now();
        let cancelled =
            self.write(|practice| coordinator.cancel_all(practice, patient_id, now)).await?;
        info!(
            event_name = "booking.appointment.cancelled_all",
            patient_id = %patient_id,
            cancelled = cancelled.len(),
            "all appointments cancelled"
        );
        Ok(cancelled)
    }

    pub async fn reschedule(&self, request: &RescheduleRequest) -> Result<Appointment, ApplicationError> {
        let coordinator = BookingCoordinator::new(self.calendar());
        let now = self.clock.now();
        let moved = self.write(|practice| coordinator.reschedule(practice, request, now)).await?;
        info!(
            event_name = "booking.appointment.rescheduled",
            appointment_id = %moved.id,
            date = %moved.date,
            time = %moved.time,
            "appointment rescheduled"
        );
        Ok(moved)
    }

    pub async fn notify_emergency(&self, report: &EmergencyReport) -> Result<NotifyOutcome, ApplicationError> {
        let notifier = EmergencyNotifier::new(self.settings.emergency_dedup_window);
        let now = self.clock.now();
        let outcome = self.write(|practice| notifier.notify(&mut practice.alerts, report, now)).await?;

        match &outcome {
            NotifyOutcome::Raised(alert) => warn!(
                event_name = "emergency.alert.raised",
                alert_id = %alert.id,
                contact_phone = %alert.contact_phone,
                "emergency alert raised for staff"
            ),
            NotifyOutcome::DuplicateSuppressed(alert) => info!(
                event_name = "emergency.alert.suppressed",
                alert_id = %alert.id,
                contact_phone = %alert.contact_phone,
                "duplicate emergency alert suppressed"
            ),
        }
        Ok(outcome)
    }

    pub async fn patient_appointments(
        &self,
        patient_id: &PatientId,
        include_cancelled: bool,
    ) -> Result<Vec<Appointment>, ApplicationError> {
        self.read(|practice| {
            practice.patients.require(patient_id)?;
            Ok(practice.appointments.find_by_patient(patient_id, !include_cancelled))
        })
        .await
    }

    async fn read<T, F>(&self, op: F) -> Result<T, ApplicationError>
    where
        T: Send,
        F: FnOnce(&PracticeSnapshot) -> Result<T, BookingError> + Send,
    {
        let _serial = self.serial.lock().await;
        let practice = self.store.load().await?;
        Ok(op(&practice)?)
    }

    async fn write<T, F>(&self, op: F) -> Result<T, ApplicationError>
    where
        T: Send,
        F: FnOnce(&mut PracticeSnapshot) -> Result<T, BookingError> + Send,
    {
        let _serial = self.serial.lock().await;
        let before = self.store.load().await?;
        let mut practice = before.clone();
        let value = op(&mut practice)?;

        let changed = practice.changed_collections(&before);
        if !changed.is_empty() {
            self.store.commit(&practice, &changed).await?;
        }
        Ok(value)
    }
}
