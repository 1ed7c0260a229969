//! Storage for refresh credential records.
//!
//! # Implementations
//!
//! - [`InMemoryRefreshCredentialStorage`] - process-local, used by tests and
//!   the `memory` backend
//! - `tokensmith-auth-postgres` - PostgreSQL storage backend

pub mod memory;
pub mod refresh_credential;

pub use memory::InMemoryRefreshCredentialStorage;
pub use refresh_credential::RefreshCredentialStorage;
