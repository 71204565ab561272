//! Session management for Leadbook.
//!
//! [`SessionStore`] owns the signed-in user and bearer token. It persists
//! both through a [`SessionStorage`] backend (keys `token` and `user`, always
//! written and cleared together), restores them once at startup, and plugs
//! into the HTTP gateway so a 401 anywhere ends the session.

mod error;
mod storage;
mod store;

pub use error::{SessionError, SessionResult, StorageError, StorageResult};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, TOKEN_KEY, USER_KEY};
pub use store::{Session, SessionEvent, SessionStatus, SessionStore};
