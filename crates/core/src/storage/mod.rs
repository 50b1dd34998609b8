mod error;
mod filter;
mod http_mapping;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use filter::{validate_field_name, Comparison, FieldValue, Filter};
pub use http_mapping::repository_error_to_status_code;
pub use traits::{PlaceholderRepository, Store};
pub use types::{Change, ChangeKind, FetchRequest, Record};

pub(crate) use filter::is_identifier;
