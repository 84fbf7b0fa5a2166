use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::validate_name;
use crate::domain::alert::{AlertId, AlertStatus, EmergencyAlert};
use crate::domain::patient::PhoneNumber;
use crate::errors::{BookingError, ValidationError};

const MIN_DETAIL_CHARS: usize = 5;
pub const DEFAULT_DEDUP_WINDOW_SECS: i64 = 600;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertLog {
    alerts: Vec<EmergencyAlert>,
}

impl AlertLog {
    pub fn new(alerts: Vec<EmergencyAlert>) -> Self {
        Self { alerts }
    }

    pub fn alerts(&self) -> &[EmergencyAlert] {
        &self.alerts
    }

    pub fn pending(&self) -> impl Iterator<Item = &EmergencyAlert> {
        self.alerts.iter().filter(|alert| alert.status == AlertStatus::Pending)
    }

    fn latest_for(&self, phone: &PhoneNumber) -> Option<&EmergencyAlert> {
        self.alerts
            .iter()
            .filter(|alert| &alert.contact_phone == phone)
            .max_by_key(|alert| alert.alerted_at)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmergencyReport {
    pub patient_name: String,
    pub details: String,
    pub contact_phone: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "alert", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Raised(EmergencyAlert),
    /// Same caller within the dedup window; the earlier alert stands.
    DuplicateSuppressed(EmergencyAlert),
}

impl NotifyOutcome {
    pub fn alert(&self) -> &EmergencyAlert {
        match self {
            Self::Raised(alert) | Self::DuplicateSuppressed(alert) => alert,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EmergencyNotifier {
    dedup_window: Duration,
}

impl Default for EmergencyNotifier {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS))
    }
}

impl EmergencyNotifier {
    pub fn new(dedup_window: Duration) -> Self {
        Self { dedup_window }
    }

    pub fn notify(
        &self,
        log: &mut AlertLog,
        report: &EmergencyReport,
        now: DateTime<Utc>,
    ) -> Result<NotifyOutcome, BookingError> {
        let patient_name = validate_name(&report.patient_name)?;
        let contact_phone = PhoneNumber::parse(&report.contact_phone)
            .ok_or_else(|| ValidationError::InvalidPhone(report.contact_phone.trim().to_string()))?;
        let details = report.details.trim();
        if details.chars().count() < MIN_DETAIL_CHARS {
            return Err(ValidationError::EmergencyDetailsTooShort.into());
        }

        if let Some(recent) = log.latest_for(&contact_phone) {
            let age = now - recent.alerted_at;
            if age >= Duration::zero() && age < self.dedup_window {
                return Ok(NotifyOutcome::DuplicateSuppressed(recent.clone()));
            }
        }

        let alert = EmergencyAlert {
            id: AlertId::generate(),
            patient_name,
            details: details.to_string(),
            contact_phone,
            alerted_at: now,
            status: AlertStatus::Pending,
        };
        log.alerts.push(alert.clone());
        Ok(NotifyOutcome::Raised(alert))
    }
}
