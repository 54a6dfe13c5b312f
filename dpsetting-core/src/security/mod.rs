//! Credential handling.
//!
//! - `credentials`: the complete credential set, and the caller-supplied
//!   overrides with all-or-none validation
//!
//! # Security Guarantees
//! - Passwords are stored in `Zeroizing` containers for automatic clearing
//! - Passwords never appear in `Debug` output, logs or error messages

mod credentials;

pub use credentials::{
    CREDENTIAL_FIELDS, CredentialOverrides, DatabaseCredentials, SuppliedCredentials,
};
