//! Domain types shared by the token, storage and HTTP modules.
//!
//! - [`RefreshCredentialRecord`] - persisted state of one refresh secret

pub mod credential;

pub use credential::{MAX_ORIGIN_LEN, RefreshCredentialRecord};
