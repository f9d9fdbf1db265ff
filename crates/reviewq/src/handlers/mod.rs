pub mod completed;
pub mod error;
pub mod health;
pub mod methods;
pub mod pending;

pub use error::ApiError;
