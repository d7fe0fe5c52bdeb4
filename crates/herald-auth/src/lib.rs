//! Credential handling: password hashing and bearer token issue/verify.
//!
//! The rest of the workspace treats this crate as an opaque authenticator;
//! nothing outside it touches argon2 or jsonwebtoken directly.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{TokenError, TokenKeys};
