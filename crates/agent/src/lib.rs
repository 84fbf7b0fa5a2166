//! Action dispatch for the front desk assistant.
//!
//! The conversational model writes replies that embed operation calls such as
//! `book_appointment({"patientId": "P0001", ...})`. This crate turns one such
//! turn into executed operations:
//!
//! 1. **Parsing** (`grammar`) - scan the text for `name({json})` tokens and
//!    keep the surrounding prose.
//! 2. **Decoding** (`actions`) - map each name onto the fixed operation table
//!    and deserialize its typed argument payload.
//! 3. **Execution** (`desk`) - run the operation against the practice under a
//!    single serialization lock, committing only on success.
//! 4. **Reporting** (`runtime`) - return one `ActionResult` per token and
//!    record the turn in the conversation store (`session`).
//!
//! # Failure model
//!
//! Booking rule violations (unknown patient, taken slot, bad date) are
//! ordinary results the model can read and respond to. Store faults abort the
//! turn and surface as an `InterfaceError` carrying a correlation id; the
//! caller should answer with `InterfaceError::apology`.
//!
//! The model never books anything itself. Every decision about availability,
//! identity and capacity is made by the coordinators in `frontdesk-core`.

pub mod actions;
pub mod desk;
pub mod grammar;
pub mod runtime;
pub mod session;

pub use actions::{ActionName, ActionRequest};
pub use desk::{BookingDesk, Clock, DeskSettings, FixedClock, SystemClock};
pub use grammar::{parse_turn, ParsedAction, ParsedTurn};
pub use runtime::{ActionError, ActionResult, ActionStatus, AgentRuntime, TurnOutcome, TurnReply};
pub use session::{Conversation, ConversationStore, ConversationTurn, InMemoryConversationStore};
