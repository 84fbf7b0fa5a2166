use serde::{Deserialize, Serialize};

use crate::directory::PatientDirectory;
use crate::emergency::AlertLog;
use crate::ledger::AppointmentLedger;
use crate::slots::SlotBook;

/// One persisted document per collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Patients,
    SlotDays,
    Appointments,
    Alerts,
}

impl Collection {
    pub const ALL: [Self; 4] = [Self::Patients, Self::SlotDays, Self::Appointments, Self::Alerts];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::SlotDays => "slot_days",
            Self::Appointments => "appointments",
            Self::Alerts => "alerts",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|collection| collection.key() == value.trim())
    }
}

/// The whole practice state as read from the store. Operations mutate a copy
/// and only the collections that changed are written back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PracticeSnapshot {
    pub patients: PatientDirectory,
    pub slots: SlotBook,
    pub appointments: AppointmentLedger,
    pub alerts: AlertLog,
}

impl PracticeSnapshot {
    /// Runs `op` against a working copy, keeping its changes only on success.
    pub fn transact<T, E>(&mut self, op: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let mut working = self.clone();
        let value = op(&mut working)?;
        *self = working;
        Ok(value)
    }

    pub fn changed_collections(&self, before: &Self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|collection| match collection {
                Collection::Patients => self.patients != before.patients,
                Collection::SlotDays => self.slots != before.slots,
                Collection::Appointments => self.appointments != before.appointments,
                Collection::Alerts => self.alerts != before.alerts,
            })
            .collect()
    }

    pub fn document(&self, collection: Collection) -> Result<String, serde_json::Error> {
        match collection {
            Collection::Patients => serde_json::to_string(&self.patients),
            Collection::SlotDays => serde_json::to_string(&self.slots),
            Collection::Appointments => serde_json::to_string(&self.appointments),
            Collection::Alerts => serde_json::to_string(&self.alerts),
        }
    }

    pub fn apply_document(
        &mut self,
        collection: Collection,
        body: &str,
    ) -> Result<(), serde_json::Error> {
        match collection {
            Collection::Patients => self.patients = serde_json::from_str(body)?,
            Collection::SlotDays => {
                let slots: SlotBook = serde_json::from_str(body)?;
                self.slots = SlotBook::new(slots.days().to_vec());
            }
            Collection::Appointments => self.appointments = serde_json::from_str(body)?,
            Collection::Alerts => self.alerts = serde_json::from_str(body)?,
        }
        Ok(())
    }
}
