//! Shared session state for SessionBridge.
//!
//! A [`SessionStore`] maps session ids to [`SessionRecord`]s and is shared
//! by every participating service.  Services never talk to the store
//! directly: they go through a [`SessionAccessor`], which turns a raw cookie
//! value into a live record, applies default initialization and expiry, and
//! serializes concurrent writes with compare-and-swap on the record version.

pub mod accessor;
pub mod file_store;
pub mod id;
pub mod lifecycle;
pub mod record;
pub mod store;

pub use accessor::{Resolved, SessionAccessor, SessionPolicy};
pub use file_store::FileStore;
pub use id::{CookieId, SessionId};
pub use lifecycle::Lifecycle;
pub use record::SessionRecord;
pub use store::{CasOutcome, MemoryStore, SessionStore};
