//! The fixed table of operations a turn may request, with the typed argument
//! payload each one accepts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use frontdesk_core::booking::{BookingRequest, RescheduleRequest};
use frontdesk_core::directory::Registration;
use frontdesk_core::domain::appointment::AppointmentId;
use frontdesk_core::domain::patient::PatientId;
use frontdesk_core::emergency::EmergencyReport;
use frontdesk_core::family::{FamilyBookingRequest, FamilyMemberRequest};
use frontdesk_core::slots::SlotQuery;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    SearchPatient,
    GetAvailableSlots,
    BookAppointment,
    BookFamilyAppointments,
    RegisterNewPatient,
    CancelAppointment,
    CancelAllAppointments,
    RescheduleAppointment,
    NotifyStaffEmergency,
    GetPatientAppointments,
}

impl ActionName {
    pub const ALL: [Self; 10] = [
        Self::SearchPatient,
        Self::GetAvailableSlots,
        Self::BookAppointment,
        Self::BookFamilyAppointments,
        Self::RegisterNewPatient,
        Self::CancelAppointment,
        Self::CancelAllAppointments,
        Self::RescheduleAppointment,
        Self::NotifyStaffEmergency,
        Self::GetPatientAppointments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchPatient => "search_patient",
            Self::GetAvailableSlots => "get_available_slots",
            Self::BookAppointment => "book_appointment",
            Self::BookFamilyAppointments => "book_family_appointments",
            Self::RegisterNewPatient => "register_new_patient",
            Self::CancelAppointment => "cancel_appointment",
            Self::CancelAllAppointments => "cancel_all_appointments",
            Self::RescheduleAppointment => "reschedule_appointment",
            Self::NotifyStaffEmergency => "notify_staff_emergency",
            Self::GetPatientAppointments => "get_patient_appointments",
        }
    }

    /// Names are matched exactly; the grammar is case-sensitive.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPatientArgs {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAvailableSlotsArgs {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub preferred_times: Vec<String>,
    #[serde(default)]
    pub subjective_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentArgs {
    pub patient_id: String,
    pub patient_name: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberArgs {
    pub name: String,
    pub relationship: String,
    pub appointment_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFamilyAppointmentsArgs {
    pub primary_patient_id: String,
    pub family_members: Vec<FamilyMemberArgs>,
    pub preferred_date: String,
    #[serde(default)]
    pub timing: Option<String>,
    pub primary_patient_appointment_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNewPatientArgs {
    pub full_name: String,
    pub phone: String,
    /// MMDDYYYY
    pub date_of_birth: String,
    pub insurance: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentArgs {
    pub appointment_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllAppointmentsArgs {
    pub patient_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentArgs {
    pub appointment_id: String,
    pub new_date: String,
    pub new_time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyStaffEmergencyArgs {
    pub patient_name: String,
    pub emergency_details: String,
    pub contact_phone: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPatientAppointmentsArgs {
    pub patient_id: String,
    #[serde(default)]
    pub include_cancelled: bool,
}

/// A requested operation with its decoded arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionRequest {
    SearchPatient(SearchPatientArgs),
    GetAvailableSlots(GetAvailableSlotsArgs),
    BookAppointment(BookAppointmentArgs),
    BookFamilyAppointments(BookFamilyAppointmentsArgs),
    RegisterNewPatient(RegisterNewPatientArgs),
    CancelAppointment(CancelAppointmentArgs),
    CancelAllAppointments(CancelAllAppointmentsArgs),
    RescheduleAppointment(RescheduleAppointmentArgs),
    NotifyStaffEmergency(NotifyStaffEmergencyArgs),
    GetPatientAppointments(GetPatientAppointmentsArgs),
}

impl ActionRequest {
    pub fn name(&self) -> ActionName {
        match self {
            Self::SearchPatient(_) => ActionName::SearchPatient,
            Self::GetAvailableSlots(_) => ActionName::GetAvailableSlots,
            Self::BookAppointment(_) => ActionName::BookAppointment,
            Self::BookFamilyAppointments(_) => ActionName::BookFamilyAppointments,
            Self::RegisterNewPatient(_) => ActionName::RegisterNewPatient,
            Self::CancelAppointment(_) => ActionName::CancelAppointment,
            Self::CancelAllAppointments(_) => ActionName::CancelAllAppointments,
            Self::RescheduleAppointment(_) => ActionName::RescheduleAppointment,
            Self::NotifyStaffEmergency(_) => ActionName::NotifyStaffEmergency,
            Self::GetPatientAppointments(_) => ActionName::GetPatientAppointments,
        }
    }

    /// Decodes a JSON argument object into the payload `name` expects.
    pub fn decode(name: ActionName, payload: &str) -> Result<Self, serde_json::Error> {
        Ok(match name {
            ActionName::SearchPatient => Self::SearchPatient(args(payload)?),
            ActionName::GetAvailableSlots => Self::GetAvailableSlots(args(payload)?),
            ActionName::BookAppointment => Self::BookAppointment(args(payload)?),
            ActionName::BookFamilyAppointments => Self::BookFamilyAppointments(args(payload)?),
            ActionName::RegisterNewPatient => Self::RegisterNewPatient(args(payload)?),
            ActionName::CancelAppointment => Self::CancelAppointment(args(payload)?),
            ActionName::CancelAllAppointments => Self::CancelAllAppointments(args(payload)?),
            ActionName::RescheduleAppointment => Self::RescheduleAppointment(args(payload)?),
            ActionName::NotifyStaffEmergency => Self::NotifyStaffEmergency(args(payload)?),
            ActionName::GetPatientAppointments => Self::GetPatientAppointments(args(payload)?),
        })
    }
}

fn args<T: DeserializeOwned>(payload: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}

impl From<GetAvailableSlotsArgs> for SlotQuery {
    fn from(args: GetAvailableSlotsArgs) -> Self {
        Self {
            start_date: args.start_date,
            end_date: args.end_date,
            preferred_times: args.preferred_times,
            subjective_date: args.subjective_date,
        }
    }
}

impl From<BookAppointmentArgs> for BookingRequest {
    fn from(args: BookAppointmentArgs) -> Self {
        Self {
            patient_id: PatientId(args.patient_id.trim().to_string()),
            patient_name: args.patient_name,
            date: args.date,
            time: args.time,
            appointment_type: args.appointment_type,
        }
    }
}

impl From<BookFamilyAppointmentsArgs> for FamilyBookingRequest {
    fn from(args: BookFamilyAppointmentsArgs) -> Self {
        Self {
            primary_patient_id: PatientId(args.primary_patient_id.trim().to_string()),
            family_members: args
                .family_members
                .into_iter()
                .map(|member| FamilyMemberRequest {
                    name: member.name,
                    relationship: member.relationship,
                    appointment_type: member.appointment_type,
                })
                .collect(),
            preferred_date: args.preferred_date,
            timing: args.timing,
            primary_appointment_type: args.primary_patient_appointment_type,
        }
    }
}

impl From<RegisterNewPatientArgs> for Registration {
    fn from(args: RegisterNewPatientArgs) -> Self {
        Self {
            full_name: args.full_name,
            phone: args.phone,
            date_of_birth: args.date_of_birth,
            insurance: args.insurance,
        }
    }
}

impl From<RescheduleAppointmentArgs> for RescheduleRequest {
    fn from(args: RescheduleAppointmentArgs) -> Self {
        Self {
            appointment_id: AppointmentId(args.appointment_id.trim().to_string()),
            new_date: args.new_date,
            new_time: args.new_time,
        }
    }
}

impl From<NotifyStaffEmergencyArgs> for EmergencyReport {
    fn from(args: NotifyStaffEmergencyArgs) -> Self {
        Self {
            patient_name: args.patient_name,
            details: args.emergency_details,
            contact_phone: args.contact_phone,
        }
    }
}
