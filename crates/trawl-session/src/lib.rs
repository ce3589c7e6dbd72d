//! Session Store: cookie + web-storage snapshot persistence, expiry, and
//! cleanup (spec §4.12).

pub mod filesystem;
pub mod store;

pub use filesystem::FilesystemSessionStore;
pub use store::{session_key, SessionStore};
