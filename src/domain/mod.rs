//! Domain types of the booking client and the ports to the services it talks to.

pub mod booking;
pub mod money;
pub mod payment;
pub mod ports;
pub mod route;
pub mod session;
pub mod ticket;
pub mod wallet;
