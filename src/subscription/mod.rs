// WebSocket subscription management

pub mod manager;
pub mod protocol;

#[cfg(test)]
mod tests;

pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, ErrorMessage, PropertyStatusMessage};
