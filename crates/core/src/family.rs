//! Multi-party booking for a primary patient and their household.
//!
//! The party is booked on one day against the earliest open slots, or nothing
//! is booked. Pre-emption of the party's existing same-day appointments and
//! the capacity check both run on the same working copy, so a shortfall
//! leaves the practice untouched.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::booking::{required, supersede_same_day, BookingCoordinator};
use crate::directory::validate_name;
use crate::domain::appointment::{Appointment, AppointmentId, CancelReason};
use crate::domain::patient::{Patient, PatientId};
use crate::domain::slot::SlotTime;
use crate::errors::{BookingError, ValidationError};
use crate::ledger::NewAppointment;
use crate::slots::SlotCalendar;
use crate::snapshot::PracticeSnapshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilyMemberRequest {
    pub name: String,
    pub relationship: String,
    pub appointment_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilyBookingRequest {
    pub primary_patient_id: PatientId,
    pub family_members: Vec<FamilyMemberRequest>,
    pub preferred_date: String,
    pub timing: Option<String>,
    pub primary_appointment_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FamilyBookingOutcome {
    Booked(FamilyBooking),
    /// The preferred day is short; nothing was booked.
    InsufficientSlots(SlotShortfall),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyBooking {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    /// Primary first, then members in request order.
    pub appointments: Vec<Appointment>,
    pub created_patients: Vec<Patient>,
    pub superseded: Vec<AppointmentId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotShortfall {
    pub requested_date: NaiveDate,
    pub needed: usize,
    pub available: usize,
    pub shortfall: usize,
    pub alternative_date: NaiveDate,
    pub alternative_slots: Vec<SlotTime>,
}

struct ValidatedMember {
    name: String,
    relationship: String,
    appointment_type: String,
}

#[derive(Clone, Copy, Debug)]
pub struct FamilyBookingCoordinator {
    bookings: BookingCoordinator,
}

impl FamilyBookingCoordinator {
    pub fn new(calendar: SlotCalendar) -> Self {
        Self { bookings: BookingCoordinator::new(calendar) }
    }

    pub fn book_family(
        &self,
        practice: &mut PracticeSnapshot,
        request: &FamilyBookingRequest,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<FamilyBookingOutcome, BookingError> {
        let mut working = practice.clone();
        let outcome = self.allocate(&mut working, request, now, today)?;
        if matches!(outcome, FamilyBookingOutcome::Booked(_)) {
            *practice = working;
        }
        Ok(outcome)
    }

    fn allocate(
        &self,
        working: &mut PracticeSnapshot,
        request: &FamilyBookingRequest,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<FamilyBookingOutcome, BookingError> {
        let primary = working.patients.require(&request.primary_patient_id)?.clone();
        let members = validate_members(&primary, &request.family_members)?;
        let primary_type = required(&request.primary_appointment_type, "primaryPatientAppointmentType")?;
        let date = self.bookings.parse_date(&request.preferred_date)?;

        let mut party = HashSet::from([primary.id.clone()]);
        party.extend(members.iter().filter_map(|member| {
            working
                .patients
                .find_household_member(&member.name, &primary.phone, &primary.id)
                .map(|patient| patient.id.clone())
        }));
        let superseded = supersede_same_day(
            working,
            &party,
            date,
            CancelReason::OverwrittenByFamilyBooking,
            now,
        )?;

        let needed = members.len() + 1;
        let available = working.slots.open_count(date);
        if available < needed {
            let alternative = working
                .slots
                .nearest_day_with_capacity(date, needed)
                .ok_or(BookingError::NoCapacity { date, needed })?;
            return Ok(FamilyBookingOutcome::InsufficientSlots(SlotShortfall {
                requested_date: date,
                needed,
                available,
                shortfall: needed - available,
                alternative_date: alternative.date,
                alternative_slots: alternative.slots.iter().copied().take(needed).collect(),
            }));
        }

        let times = working.slots.first_open(date, needed);
        let mut appointments = Vec::with_capacity(needed);
        appointments.push(working.appointments.create(
            NewAppointment {
                patient_id: primary.id.clone(),
                patient_name: primary.full_name.clone(),
                relationship: None,
                date,
                time: times[0],
                appointment_type: primary_type,
            },
            now,
        ));

        let mut created_patients = Vec::new();
        for (member, time) in members.into_iter().zip(times.iter().skip(1).copied()) {
            let existing = working
                .patients
                .find_household_member(&member.name, &primary.phone, &primary.id)
                .cloned();
            let patient = match existing {
                Some(patient) => patient,
                None => {
                    let created = working.patients.create_family_member(&member.name, &primary, today);
                    created_patients.push(created.clone());
                    created
                }
            };

            appointments.push(working.appointments.create(
                NewAppointment {
                    patient_id: patient.id,
                    patient_name: patient.full_name,
                    relationship: Some(member.relationship.clone()),
                    date,
                    time,
                    appointment_type: member.appointment_type,
                },
                now,
            ));
            working.patients.append_family_ref(&primary.id, &member.name, &member.relationship, today)?;
        }

        working.slots.reserve_batch(date, &times)?;

        Ok(FamilyBookingOutcome::Booked(FamilyBooking {
            date,
            timing: request.timing.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(str::to_string),
            appointments,
            created_patients,
            superseded,
        }))
    }
}

/// Each party member takes exactly one slot, so names must be distinct from
/// each other and from the primary, ignoring case.
fn validate_members(
    primary: &Patient,
    members: &[FamilyMemberRequest],
) -> Result<Vec<ValidatedMember>, ValidationError> {
    if members.is_empty() {
        return Err(ValidationError::missing("familyMembers"));
    }

    let mut seen = HashSet::from([primary.full_name.to_lowercase()]);
    let mut validated = Vec::with_capacity(members.len());
    for (index, member) in members.iter().enumerate() {
        let name = validate_name(&member.name)?;
        if !seen.insert(name.to_lowercase()) {
            return Err(ValidationError::DuplicateFamilyMember(name));
        }
        validated.push(ValidatedMember {
            name,
            relationship: required(
                &member.relationship,
                &format!("familyMembers[{index}].relationship"),
            )?,
            appointment_type: required(
                &member.appointment_type,
                &format!("familyMembers[{index}].appointmentType"),
            )?,
        });
    }
    Ok(validated)
}
