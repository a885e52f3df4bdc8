pub mod admin;
pub mod candidate;
pub mod donation;
pub mod election;
pub mod resolve;
pub mod vendor;
