use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::patient::{FamilyMemberRef, InsuranceProvider, Patient, PatientId, PhoneNumber};
use crate::errors::{BookingError, ValidationError};

const MIN_NAME_CHARS: usize = 2;
const MIN_BIRTH_YEAR: i32 = 1900;

/// Raw registration fields as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub full_name: String,
    pub phone: String,
    pub date_of_birth: String,
    pub insurance: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientDirectory {
    patients: Vec<Patient>,
}

impl PatientDirectory {
    pub fn new(patients: Vec<Patient>) -> Self {
        Self { patients }
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn get(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.iter().find(|patient| &patient.id == id)
    }

    pub fn require(&self, id: &PatientId) -> Result<&Patient, BookingError> {
        self.get(id).ok_or_else(|| BookingError::PatientNotFound(id.clone()))
    }

    /// Phone lookup wins; the name is only consulted when the phone (if any)
    /// matched nobody. A malformed phone is a validation failure, not a miss.
    pub fn search(
        &self,
        phone: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Patient>, BookingError> {
        let phone = phone.map(str::trim).filter(|value| !value.is_empty());
        let name = name.map(str::trim).filter(|value| !value.is_empty());
        if phone.is_none() && name.is_none() {
            return Err(ValidationError::MissingSearchCriteria.into());
        }

        if let Some(raw_phone) = phone {
            let normalized = PhoneNumber::parse(raw_phone)
                .ok_or_else(|| ValidationError::InvalidPhone(raw_phone.to_string()))?;
            let matches = self.find_by_phone(&normalized).cloned().collect::<Vec<_>>();
            if !matches.is_empty() {
                return Ok(matches);
            }
            if name.is_none() {
                return Err(BookingError::NoPatientMatch(format!(
                    "no patient is registered with phone {normalized}"
                )));
            }
        }

        let needle = name.unwrap_or_default().to_lowercase();
        let matches = self
            .patients
            .iter()
            .filter(|patient| patient.full_name.to_lowercase().contains(&needle))
            .cloned()
            .collect::<Vec<_>>();

        if matches.is_empty() {
            return Err(BookingError::NoPatientMatch(match phone {
                Some(raw_phone) => {
                    format!("no patient matched phone {raw_phone} or name `{}`", name.unwrap_or_default())
                }
                None => format!("no patient matched name `{}`", name.unwrap_or_default()),
            }));
        }

        Ok(matches)
    }

    pub fn register(
        &mut self,
        registration: &Registration,
        today: NaiveDate,
    ) -> Result<Patient, BookingError> {
        let full_name = validate_name(&registration.full_name)?;
        let phone = PhoneNumber::parse(&registration.phone)
            .ok_or_else(|| ValidationError::InvalidPhone(registration.phone.trim().to_string()))?;
        let date_of_birth = validate_date_of_birth(&registration.date_of_birth, today.year())?;
        let insurance = InsuranceProvider::parse(&registration.insurance).ok_or_else(|| {
            ValidationError::UnknownInsurance {
                supplied: registration.insurance.trim().to_string(),
                accepted: InsuranceProvider::accepted_list(),
            }
        })?;

        if let Some(existing) = self.find_by_phone(&phone).next() {
            return Err(BookingError::DuplicatePatient(Box::new(existing.clone())));
        }

        let patient = Patient {
            id: self.next_id(),
            full_name,
            phone,
            date_of_birth,
            insurance,
            registered_on: today,
            family_members: Vec::new(),
        };
        self.patients.push(patient.clone());
        Ok(patient)
    }

    pub fn find_by_phone<'a>(
        &'a self,
        phone: &'a PhoneNumber,
    ) -> impl Iterator<Item = &'a Patient> + 'a {
        self.patients.iter().filter(move |patient| &patient.phone == phone)
    }

    /// A patient other than `exclude` sharing `phone` whose name matches
    /// case-insensitively.
    pub fn find_household_member(
        &self,
        name: &str,
        phone: &PhoneNumber,
        exclude: &PatientId,
    ) -> Option<&Patient> {
        let name = name.trim();
        self.patients.iter().find(|patient| {
            &patient.phone == phone
                && &patient.id != exclude
                && patient.full_name.eq_ignore_ascii_case(name)
        })
    }

    /// Creates a patient implied by a family booking. Such patients share the
    /// primary's phone, birth date, and insurance, and skip the phone
    /// uniqueness check.
    pub fn create_family_member(
        &mut self,
        name: &str,
        primary: &Patient,
        today: NaiveDate,
    ) -> Patient {
        let patient = Patient {
            id: self.next_id(),
            full_name: name.trim().to_string(),
            phone: primary.phone.clone(),
            date_of_birth: primary.date_of_birth.clone(),
            insurance: primary.insurance,
            registered_on: today,
            family_members: Vec::new(),
        };
        self.patients.push(patient.clone());
        patient
    }

    /// Returns `false` when a ref with the same name already exists.
    pub fn append_family_ref(
        &mut self,
        primary_id: &PatientId,
        name: &str,
        relationship: &str,
        today: NaiveDate,
    ) -> Result<bool, BookingError> {
        let primary = self
            .patients
            .iter_mut()
            .find(|patient| &patient.id == primary_id)
            .ok_or_else(|| BookingError::PatientNotFound(primary_id.clone()))?;

        if primary.has_family_ref(name) {
            return Ok(false);
        }

        primary.family_members.push(FamilyMemberRef {
            name: name.trim().to_string(),
            relationship: relationship.trim().to_string(),
            date_added: today,
        });
        Ok(true)
    }

    fn next_id(&self) -> PatientId {
        let highest = self.patients.iter().filter_map(|patient| patient.id.sequence()).max();
        PatientId::from_sequence(highest.unwrap_or(0) + 1)
    }
}

pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let allowed =
        name.chars().all(|ch| ch.is_alphabetic() || ch == ' ' || ch == '-' || ch == '\'');
    if name.chars().count() < MIN_NAME_CHARS || !allowed {
        return Err(ValidationError::InvalidName(raw.trim().to_string()));
    }
    Ok(name)
}

/// Checks an MMDDYYYY birth date. Calendar validity beyond the month/day
/// ranges is not enforced.
pub fn validate_date_of_birth(raw: &str, current_year: i32) -> Result<String, ValidationError> {
    let value = raw.trim();
    let invalid = |reason| ValidationError::InvalidDateOfBirth { value: value.to_string(), reason };

    if value.len() != 8 || !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(invalid("expected 8 digits formatted MMDDYYYY"));
    }

    let month = value[0..2].parse::<u32>().map_err(|_| invalid("month is not a number"))?;
    let day = value[2..4].parse::<u32>().map_err(|_| invalid("day is not a number"))?;
    let year = value[4..8].parse::<i32>().map_err(|_| invalid("year is not a number"))?;

    if !(1..=12).contains(&month) {
        return Err(invalid("month must be between 01 and 12"));
    }
    if !(1..=31).contains(&day) {
        return Err(invalid("day must be between 01 and 31"));
    }
    if year < MIN_BIRTH_YEAR || year > current_year {
        return Err(invalid("year must be between 1900 and the current year"));
    }

    Ok(value.to_string())
}
