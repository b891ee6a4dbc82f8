pub mod credentials;
pub mod enums;
pub mod error;

// Re-export the core types to provide a clean public API.
pub use credentials::{validate_credentials, CredentialSet, REQUIRED_KEYS, SSL_MODE_KEY};
pub use enums::{Environment, ErrorKind, SslMode};
pub use error::CoreError;
