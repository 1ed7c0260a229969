//! Credential generation, signing and rotation.
//!
//! This module provides:
//!
//! - Refresh secret generation and Argon2id digests
//! - HS512 access credential signing and verification
//! - The rotation engine tying both to storage

pub mod jwt;
pub mod rotation;
pub mod secret;

pub use jwt::{AccessClaims, AccessTokenCodec, JwtError};
pub use rotation::{CredentialPair, RotationEngine, TokenLifetimes};
pub use secret::{SecretHasher, generate_refresh_secret};
