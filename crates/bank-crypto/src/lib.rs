//! Credential hashing for the banking core.
//!
//! Credentials are never stored in plaintext. [`CredentialHasher`] derives a
//! salted, iterated BLAKE3 digest and encodes it together with its parameters
//! so verification needs nothing but the stored string.
//!
//! All crypto operations wrap established libraries.

pub mod credential;

pub use credential::{CredentialError, CredentialHasher};
