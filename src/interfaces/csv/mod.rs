pub mod route_writer;
pub mod ticket_writer;
pub mod wallet_writer;
