//! Simulated report distribution: nothing leaves the machine. A "sent" report
//! is copied into the outbox directory and logged in the distribution table.

pub mod outbox;

pub use outbox::{Envelope, SimulatedMailer};
