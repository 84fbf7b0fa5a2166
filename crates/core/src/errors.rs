use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::domain::appointment::AppointmentId;
use crate::domain::patient::{Patient, PatientId};
use crate::domain::slot::SlotTime;

/// Coarse classification surfaced to the conversational layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Capacity,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("phone number `{0}` must contain exactly 10 digits")]
    InvalidPhone(String),
    #[error(
        "name `{0}` must be at least 2 characters and use only letters, spaces, hyphens, or apostrophes"
    )]
    InvalidName(String),
    #[error("date of birth `{value}` is invalid: {reason}")]
    InvalidDateOfBirth { value: String, reason: &'static str },
    #[error("insurance `{supplied}` is not accepted (accepted: {accepted})")]
    UnknownInsurance { supplied: String, accepted: String },
    #[error("emergency details must be at least 5 characters")]
    EmergencyDetailsTooShort,
    #[error("provide a phone number or a name to search")]
    MissingSearchCriteria,
    #[error("date `{0}` must be formatted YYYY-MM-DD")]
    InvalidDate(String),
    #[error("time `{0}` must be a clock time such as 2:00 PM")]
    InvalidTime(String),
    #[error("family member `{0}` is listed twice or is the primary patient")]
    DuplicateFamilyMember(String),
    #[error("{field} is required")]
    MissingField { field: String },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPhone(_) => "invalid_phone",
            Self::InvalidName(_) => "invalid_name",
            Self::InvalidDateOfBirth { .. } => "invalid_date_of_birth",
            Self::UnknownInsurance { .. } => "unknown_insurance",
            Self::EmergencyDetailsTooShort => "emergency_details_too_short",
            Self::MissingSearchCriteria => "missing_search_criteria",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidTime(_) => "invalid_time",
            Self::DuplicateFamilyMember(_) => "duplicate_family_member",
            Self::MissingField { .. } => "missing_field",
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }
}

/// Expected, user-correctable outcomes of a booking operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("patient {0} was not found")]
    PatientNotFound(PatientId),
    #[error("appointment {0} was not found")]
    AppointmentNotFound(AppointmentId),
    #[error("{0}")]
    NoPatientMatch(String),
    #[error("{time} on {date} is no longer available")]
    SlotUnavailable { date: NaiveDate, time: SlotTime },
    #[error("patient name `{supplied}` does not match the record for {patient_id}")]
    PatientMismatch { patient_id: PatientId, supplied: String },
    #[error("appointment {0} is already cancelled")]
    AlreadyCancelled(AppointmentId),
    #[error("a patient with phone {} is already registered as {}", .0.phone, .0.id)]
    DuplicatePatient(Box<Patient>),
    #[error("patient {0} has no active appointments")]
    NoActiveAppointments(PatientId),
    #[error("no date on or after {date} has {needed} open slots")]
    NoCapacity { date: NaiveDate, needed: usize },
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::PatientNotFound(_)
            | Self::AppointmentNotFound(_)
            | Self::NoPatientMatch(_)
            | Self::NoActiveAppointments(_) => ErrorKind::NotFound,
            Self::SlotUnavailable { .. }
            | Self::PatientMismatch { .. }
            | Self::AlreadyCancelled(_)
            | Self::DuplicatePatient(_) => ErrorKind::Conflict,
            Self::NoCapacity { .. } => ErrorKind::Capacity,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.code(),
            Self::PatientNotFound(_) => "patient_not_found",
            Self::AppointmentNotFound(_) => "appointment_not_found",
            Self::NoPatientMatch(_) => "no_patient_match",
            Self::SlotUnavailable { .. } => "slot_unavailable",
            Self::PatientMismatch { .. } => "patient_mismatch",
            Self::AlreadyCancelled(_) => "already_cancelled",
            Self::DuplicatePatient(_) => "duplicate_patient",
            Self::NoActiveAppointments(_) => "no_active_appointments",
            Self::NoCapacity { .. } => "no_capacity",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] BookingError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("session store failure: {0}")]
    Session(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Expected booking outcomes are reported back to the caller; everything
    /// else aborts the enclosing request.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Domain(_))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The booking system is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    /// Apology shown to the patient, pointing at the front desk phone line.
    pub fn apology(&self, practice_phone: &str) -> String {
        format!(
            "I'm sorry, something went wrong on our side. {} You can also call the office at {practice_phone}.",
            self.user_message()
        )
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) | ApplicationError::Session(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Serialization(message)
            | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::appointment::AppointmentId;
    use crate::domain::patient::PatientId;
    use crate::errors::{ApplicationError, BookingError, ErrorKind, InterfaceError, ValidationError};

    #[test]
    fn booking_errors_classify_into_the_taxonomy() {
        assert_eq!(
            BookingError::from(ValidationError::InvalidPhone("12".to_owned())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BookingError::AppointmentNotFound(AppointmentId("apt_1".to_owned())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BookingError::AlreadyCancelled(AppointmentId("apt_1".to_owned())).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            BookingError::NoCapacity {
                date: chrono::NaiveDate::from_ymd_opt(2025, 10, 25).expect("date"),
                needed: 3
            }
            .kind(),
            ErrorKind::Capacity
        );
    }

    #[test]
    fn validation_codes_pass_through_booking_error() {
        let error = BookingError::from(ValidationError::MissingSearchCriteria);
        assert_eq!(error.code(), "missing_search_criteria");
        assert_eq!(error.to_string(), "provide a phone number or a name to search");
    }

    #[test]
    fn domain_error_is_not_fatal() {
        let error =
            ApplicationError::from(BookingError::NoActiveAppointments(PatientId("P0001".into())));
        assert!(!error.is_fatal());
        assert!(ApplicationError::Persistence("disk full".to_owned()).is_fatal());
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Persistence("database lock timeout".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
        assert_eq!(
            interface.user_message(),
            "The booking system is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn apology_names_the_practice_phone() {
        let interface =
            ApplicationError::Serialization("bad float".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        let apology = interface.apology("555-010-0200");
        assert!(apology.starts_with("I'm sorry"));
        assert!(apology.contains("555-010-0200"));
    }
}
