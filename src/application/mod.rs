//! Application layer: the booking workflow and the services around it.
//!
//! `BookingOrchestrator` drives one ticket purchase through submission and
//! payment confirmation. The other managers are thin use cases over the ports
//! in `domain::ports`, each taking the `Session` explicitly.

pub mod catalog;
pub mod dashboard;
pub mod orchestrator;
pub mod session;
pub mod wallet;
