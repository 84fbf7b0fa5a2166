use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use frontdesk_core::booking::{BookingRequest, RescheduleRequest};
use frontdesk_core::directory::Registration;
use frontdesk_core::domain::appointment::AppointmentId;
use frontdesk_core::domain::patient::PatientId;
use frontdesk_core::emergency::EmergencyReport;
use frontdesk_core::errors::{ApplicationError, BookingError, ErrorKind, InterfaceError};
use frontdesk_core::family::{FamilyBookingOutcome, FamilyBookingRequest};
use frontdesk_core::slots::SlotQuery;

use crate::actions::{ActionName, ActionRequest};
use crate::desk::BookingDesk;
use crate::grammar::{parse_turn, ParsedAction};
use crate::session::{ConversationStore, ConversationTurn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Ok,
    Error,
    UnknownOperation,
    InvalidArguments,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionResult {
    pub action: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActionResult {
    fn ok(action: ActionName, data: Value) -> Self {
        Self { action: action.as_str().to_string(), status: ActionStatus::Ok, data: Some(data), error: None }
    }

    fn rejected(action: ActionName, error: &BookingError) -> Self {
        let data = match error {
            BookingError::DuplicatePatient(existing) => Some(json!({ "existingPatient": existing })),
            _ => None,
        };
        Self {
            action: action.as_str().to_string(),
            status: ActionStatus::Error,
            data,
            error: Some(ActionError {
                kind: error.kind(),
                code: error.code().to_string(),
                message: error.to_string(),
            }),
        }
    }

    fn unknown(name: &str) -> Self {
        Self {
            action: name.to_string(),
            status: ActionStatus::UnknownOperation,
            data: None,
            error: Some(ActionError {
                kind: ErrorKind::Validation,
                code: "unknown_operation".to_string(),
                message: format!("`{name}` is not a supported operation"),
            }),
        }
    }

    fn invalid_arguments(name: &str, message: &str) -> Self {
        Self {
            action: name.to_string(),
            status: ActionStatus::InvalidArguments,
            data: None,
            error: Some(ActionError {
                kind: ErrorKind::Validation,
                code: "invalid_arguments".to_string(),
                message: message.to_string(),
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ActionStatus::Ok
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub conversation_id: String,
    pub correlation_id: String,
    pub stripped_text: String,
    pub results: Vec<ActionResult>,
}

/// What the conversational front end shows after a turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum TurnReply {
    Completed(TurnOutcome),
    Degraded { correlation_id: String, message: String },
}

pub struct AgentRuntime {
    desk: Arc<BookingDesk>,
    conversations: Arc<dyn ConversationStore>,
    practice_phone: String,
}

impl AgentRuntime {
    pub fn new(
        desk: Arc<BookingDesk>,
        conversations: Arc<dyn ConversationStore>,
        practice_phone: impl Into<String>,
    ) -> Self {
        Self { desk, conversations, practice_phone: practice_phone.into() }
    }

    pub fn desk(&self) -> &Arc<BookingDesk> {
        &self.desk
    }

    /// Runs every action in `text` in order. A fault outside the booking rules
    /// aborts the turn; actions already executed stay committed.
    pub async fn handle_turn(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<TurnOutcome, InterfaceError> {
        let correlation_id = format!("req-{}", Uuid::new_v4());
        let parsed = parse_turn(text);

        let mut results = Vec::with_capacity(parsed.actions.len());
        for action in parsed.actions {
            let result = match action {
                ParsedAction::Invocation(request) => self.execute(request).await,
                ParsedAction::Unknown { name } => Ok(ActionResult::unknown(&name)),
                ParsedAction::Malformed { name, error } => {
                    Ok(ActionResult::invalid_arguments(&name, &error))
                }
            };
            match result {
                Ok(result) => results.push(result),
                Err(fault) => {
                    error!(
                        event_name = "dispatch.turn.failed",
                        correlation_id = %correlation_id,
                        conversation_id = %conversation_id,
                        error = %fault,
                        "turn aborted"
                    );
                    return Err(fault.into_interface(correlation_id));
                }
            }
        }

        let received_at = self.desk.clock().now();
        let turn = ConversationTurn {
            correlation_id: correlation_id.clone(),
            received_at,
            text: text.to_string(),
            stripped_text: parsed.stripped_text.clone(),
            results: results.clone(),
        };
        if let Err(fault) = self.record(conversation_id, turn).await {
            error!(
                event_name = "dispatch.session.failed",
                correlation_id = %correlation_id,
                conversation_id = %conversation_id,
                error = %fault,
                "conversation history unavailable"
            );
            return Err(fault.into_interface(correlation_id));
        }

        info!(
            event_name = "dispatch.turn.completed",
            correlation_id = %correlation_id,
            conversation_id = %conversation_id,
            actions = results.len(),
            failed = results.iter().filter(|result| !result.is_ok()).count(),
            "turn completed"
        );

        Ok(TurnOutcome {
            conversation_id: conversation_id.to_string(),
            correlation_id,
            stripped_text: parsed.stripped_text,
            results,
        })
    }

    /// Like [`Self::handle_turn`], but a fault becomes an apology naming the
    /// practice phone line.
    pub async fn respond(&self, conversation_id: &str, text: &str) -> TurnReply {
        match self.handle_turn(conversation_id, text).await {
            Ok(outcome) => TurnReply::Completed(outcome),
            Err(error) => TurnReply::Degraded {
                correlation_id: error.correlation_id().to_string(),
                message: error.apology(&self.practice_phone),
            },
        }
    }

    async fn record(&self, conversation_id: &str, turn: ConversationTurn) -> Result<(), ApplicationError> {
        let session_error = |error: anyhow::Error| ApplicationError::Session(format!("{error:#}"));
        self.conversations.expire(turn.received_at).await.map_err(session_error)?;
        self.conversations.append_turn(conversation_id, turn).await.map_err(session_error)?;
        Ok(())
    }

    async fn execute(&self, request: ActionRequest) -> Result<ActionResult, ApplicationError> {
        let name = request.name();
        let desk = &self.desk;

        let outcome = match request {
            ActionRequest::SearchPatient(args) => desk
                .search_patients(args.phone.as_deref(), args.name.as_deref())
                .await
                .map(|patients| json!({ "patients": patients })),
            ActionRequest::GetAvailableSlots(args) => {
                desk.available_slots(&SlotQuery::from(args)).await.and_then(|slots| to_value(&slots))
            }
            ActionRequest::BookAppointment(args) => {
                desk.book(&BookingRequest::from(args)).await.and_then(|confirmation| to_value(&confirmation))
            }
            ActionRequest::BookFamilyAppointments(args) => {
                return match desk.book_family(&FamilyBookingRequest::from(args)).await {
                    Ok(FamilyBookingOutcome::Booked(booking)) => {
                        Ok(ActionResult::ok(name, to_value(&booking)?))
                    }
                    Ok(FamilyBookingOutcome::InsufficientSlots(shortfall)) => Ok(ActionResult {
                        action: name.as_str().to_string(),
                        status: ActionStatus::Error,
                        data: Some(to_value(&shortfall)?),
                        error: Some(ActionError {
                            kind: ErrorKind::Capacity,
                            code: "insufficient_slots".to_string(),
                            message: format!(
                                "{} has {} open slots but {} are needed",
                                shortfall.requested_date, shortfall.available, shortfall.needed
                            ),
                        }),
                    }),
                    Err(error) => settle(name, Err(error)),
                };
            }
            ActionRequest::RegisterNewPatient(args) => desk
                .register_patient(&Registration::from(args))
                .await
                .map(|patient| json!({ "patient": patient })),
            ActionRequest::CancelAppointment(args) => desk
                .cancel(&AppointmentId(args.appointment_id.trim().to_string()))
                .await
                .map(|appointment| json!({ "appointment": appointment })),
            ActionRequest::CancelAllAppointments(args) => desk
                .cancel_all(&PatientId(args.patient_id.trim().to_string()))
                .await
                .map(|cancelled| json!({ "cancelled": cancelled })),
            ActionRequest::RescheduleAppointment(args) => desk
                .reschedule(&RescheduleRequest::from(args))
                .await
                .map(|appointment| json!({ "appointment": appointment })),
            ActionRequest::NotifyStaffEmergency(args) => desk
                .notify_emergency(&EmergencyReport::from(args))
                .await
                .and_then(|outcome| to_value(&outcome)),
            ActionRequest::GetPatientAppointments(args) => desk
                .patient_appointments(&PatientId(args.patient_id.trim().to_string()), args.include_cancelled)
                .await
                .map(|appointments| json!({ "appointments": appointments })),
        };

        settle(name, outcome)
    }
}

/// Booking rule violations become error results; anything else is fatal.
fn settle(name: ActionName, outcome: Result<Value, ApplicationError>) -> Result<ActionResult, ApplicationError> {
    match outcome {
        Ok(data) => Ok(ActionResult::ok(name, data)),
        Err(ApplicationError::Domain(error)) => Ok(ActionResult::rejected(name, &error)),
        Err(fault) => Err(fault),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ApplicationError> {
    serde_json::to_value(value).map_err(|error| ApplicationError::Serialization(error.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};

    use frontdesk_core::domain::slot::{SlotDay, SlotTime};
    use frontdesk_core::errors::ErrorKind;
    use frontdesk_core::snapshot::{Collection, PracticeSnapshot};
    use frontdesk_db::{InMemoryPracticeStore, PracticeStore, RepositoryError};

    use super::{ActionStatus, AgentRuntime, TurnReply};
    use crate::desk::{BookingDesk, DeskSettings, FixedClock};
    use crate::session::{ConversationStore, InMemoryConversationStore};

    fn practice() -> PracticeSnapshot {
        let mut practice = PracticeSnapshot::default();
        let date = NaiveDate::from_ymd_opt(2025, 10, 22).expect("date");
        let times = ["9:00 AM", "10:00 AM"].iter().map(|raw| raw.parse::<SlotTime>().expect("time"));
        practice.slots.insert_day(SlotDay::new(date, times.collect()));
        practice
    }

    fn runtime_over(store: Arc<dyn PracticeStore>) -> (AgentRuntime, Arc<InMemoryConversationStore>) {
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 10, 20, 14, 0, 0).single().expect("now"));
        let settings = DeskSettings {
            reference_date: NaiveDate::from_ymd_opt(2025, 10, 20),
            ..DeskSettings::default()
        };
        let desk = Arc::new(BookingDesk::new(store, Arc::new(clock), settings));
        let conversations = Arc::new(InMemoryConversationStore::default());
        (AgentRuntime::new(desk, conversations.clone(), "5550100200"), conversations)
    }

    struct UnavailableStore;

    #[async_trait]
    impl PracticeStore for UnavailableStore {
        async fn load(&self) -> Result<PracticeSnapshot, RepositoryError> {
            Err(RepositoryError::Decode("database file is unreadable".to_string()))
        }

        async fn commit(
            &self,
            _snapshot: &PracticeSnapshot,
            _changed: &[Collection],
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("database file is unreadable".to_string()))
        }
    }

    #[tokio::test]
    async fn executes_actions_in_order_and_records_the_turn() {
        let store = Arc::new(InMemoryPracticeStore::with_snapshot(&practice()).expect("store"));
        let (runtime, conversations) = runtime_over(store);

        let outcome = runtime
            .handle_turn(
                "conv-1",
                r#"Registering you now. register_new_patient({"fullName":"Jane Roe","phone":"555-222-3333","dateOfBirth":"02021990","insurance":"Aetna"}) book_appointment({"patientId":"P0001","patientName":"Jane Roe","date":"2025-10-22","time":"9:00 AM","type":"Exam"}) All set!"#,
            )
            .await
            .expect("turn");

        assert_eq!(outcome.stripped_text, "Registering you now. All set!");
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results.iter().all(|result| result.status == ActionStatus::Ok));
        assert_eq!(outcome.results[1].action, "book_appointment");

        let conversation = conversations.get("conv-1").await.expect("get").expect("recorded");
        assert_eq!(conversation.turns.len(), 1);
        assert_eq!(conversation.turns[0].results, outcome.results);
    }

    #[tokio::test]
    async fn booking_rule_violations_are_error_results() {
        let store = Arc::new(InMemoryPracticeStore::with_snapshot(&practice()).expect("store"));
        let (runtime, _) = runtime_over(store);

        let outcome = runtime
            .handle_turn(
                "conv-2",
                r#"cancel_appointment({"appointmentId":"apt_missing"}) frobnicate({"a":1}) search_patient({})"#,
            )
            .await
            .expect("turn");

        let statuses = outcome.results.iter().map(|result| result.status).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![ActionStatus::Error, ActionStatus::UnknownOperation, ActionStatus::Error]
        );
        let not_found = outcome.results[0].error.as_ref().expect("error");
        assert_eq!(not_found.kind, ErrorKind::NotFound);
        assert_eq!(not_found.code, "appointment_not_found");
        assert_eq!(
            outcome.results[2].error.as_ref().map(|error| error.code.as_str()),
            Some("missing_search_criteria")
        );
    }

    #[tokio::test]
    async fn persistence_fault_degrades_to_an_apology() {
        let (runtime, conversations) = runtime_over(Arc::new(UnavailableStore));

        let reply = runtime
            .respond("conv-3", r#"search_patient({"phone":"5552223333"})"#)
            .await;

        let TurnReply::Degraded { correlation_id, message } = reply else {
            panic!("expected a degraded reply, got {reply:?}");
        };
        assert!(correlation_id.starts_with("req-"));
        assert!(message.contains("5550100200"));
        assert!(conversations.is_empty().await);
    }

    #[tokio::test]
    async fn prose_only_turn_has_no_results() {
        let store = Arc::new(InMemoryPracticeStore::default());
        let (runtime, _) = runtime_over(store);

        let outcome = runtime.handle_turn("conv-4", "  Hello,   how can I help?  ").await.expect("turn");

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.stripped_text, "Hello, how can I help?");
    }
}
