use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub String);

impl PatientId {
    pub fn from_sequence(sequence: u32) -> Self {
        Self(format!("P{sequence:04}"))
    }

    pub fn sequence(&self) -> Option<u32> {
        self.0.strip_prefix('P')?.parse().ok()
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A North American phone number reduced to its 10 significant digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Strips formatting and a leading country code `1`. Anything that does not
    /// reduce to exactly 10 digits is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.chars().filter(char::is_ascii_digit).collect::<String>();
        let digits = match digits.len() {
            11 if digits.starts_with('1') => digits[1..].to_string(),
            _ => digits,
        };

        (digits.len() == 10).then_some(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsuranceProvider {
    Aetna,
    #[serde(rename = "Blue Cross")]
    BlueCross,
    Cigna,
    #[serde(rename = "Delta Dental")]
    DeltaDental,
    Guardian,
    Humana,
    MetLife,
    #[serde(rename = "United Healthcare")]
    UnitedHealthcare,
    #[serde(rename = "Self Pay")]
    SelfPay,
}

impl InsuranceProvider {
    pub const ALL: [Self; 9] = [
        Self::Aetna,
        Self::BlueCross,
        Self::Cigna,
        Self::DeltaDental,
        Self::Guardian,
        Self::Humana,
        Self::MetLife,
        Self::UnitedHealthcare,
        Self::SelfPay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aetna => "Aetna",
            Self::BlueCross => "Blue Cross",
            Self::Cigna => "Cigna",
            Self::DeltaDental => "Delta Dental",
            Self::Guardian => "Guardian",
            Self::Humana => "Humana",
            Self::MetLife => "MetLife",
            Self::UnitedHealthcare => "United Healthcare",
            Self::SelfPay => "Self Pay",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        Self::ALL.into_iter().find(|provider| provider.as_str().to_ascii_lowercase() == wanted)
    }

    pub fn accepted_list() -> String {
        Self::ALL.iter().map(Self::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for InsuranceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberRef {
    pub name: String,
    pub relationship: String,
    pub date_added: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub full_name: String,
    pub phone: PhoneNumber,
    /// MMDDYYYY, as validated at registration.
    pub date_of_birth: String,
    pub insurance: InsuranceProvider,
    pub registered_on: NaiveDate,
    #[serde(default)]
    pub family_members: Vec<FamilyMemberRef>,
}

impl Patient {
    pub fn has_family_ref(&self, name: &str) -> bool {
        self.family_members.iter().any(|member| member.name.eq_ignore_ascii_case(name.trim()))
    }
}
