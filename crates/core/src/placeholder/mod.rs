mod types;
mod validation;

pub use types::Placeholder;
pub use validation::{validate_placeholder, ValidationFailure};
