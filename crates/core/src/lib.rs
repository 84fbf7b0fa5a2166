pub mod booking;
pub mod config;
pub mod directory;
pub mod domain;
pub mod emergency;
pub mod errors;
pub mod family;
pub mod ledger;
pub mod slots;
pub mod snapshot;

pub use booking::{BookingConfirmation, BookingCoordinator, BookingRequest, RescheduleRequest};
pub use directory::{PatientDirectory, Registration};
pub use domain::alert::{AlertId, AlertStatus, EmergencyAlert};
pub use domain::appointment::{Appointment, AppointmentId, AppointmentStatus, CancelReason};
pub use domain::patient::{FamilyMemberRef, InsuranceProvider, Patient, PatientId, PhoneNumber};
pub use domain::slot::{SlotDay, SlotTime, TimeOfDay};
pub use emergency::{AlertLog, EmergencyNotifier, EmergencyReport, NotifyOutcome};
pub use errors::{ApplicationError, BookingError, ErrorKind, InterfaceError, ValidationError};
pub use family::{
    FamilyBooking, FamilyBookingCoordinator, FamilyBookingOutcome, FamilyBookingRequest,
    FamilyMemberRequest, SlotShortfall,
};
pub use ledger::{AppointmentLedger, NewAppointment};
pub use slots::{AvailableSlots, DateWindow, SlotBook, SlotCalendar, SlotQuery};
pub use snapshot::{Collection, PracticeSnapshot};
