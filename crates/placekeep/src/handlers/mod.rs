pub mod error;
pub mod health;
pub mod placeholders;

pub use error::AppError;
