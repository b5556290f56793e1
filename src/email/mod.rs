pub mod address;
pub mod envelope;
pub mod message;
pub mod providers;
pub mod sender;
pub mod smtp;
pub mod transport;
