pub mod coordinator;
pub mod error;
pub mod location_acquirer;
pub mod media_acquirer;
pub mod navigator;
pub mod notifier;
pub mod registration;
pub mod transport;
