pub mod errors;
pub mod id;
pub mod types;

pub use errors::{CobrowseError, ConfigError};
pub use id::{new_id, EnvelopeId, SessionId};
pub use types::Role;

pub type Result<T> = std::result::Result<T, CobrowseError>;
