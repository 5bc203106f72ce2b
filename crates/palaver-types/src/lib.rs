pub mod api;
pub mod documents;
pub mod envelopes;
pub mod error;
pub mod identity;
pub mod models;

pub use error::ChatError;
