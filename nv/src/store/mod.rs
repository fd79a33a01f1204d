//! Note storage with actor pattern
//!
//! NoteStore owns the vault directory and the name -> content cache and
//! processes messages via channels, providing thread-safe access to both.

mod manager;
mod messages;
pub mod vault;

pub use manager::NoteStore;
pub use messages::{NamePredicate, NoteCommand, NoteError, NoteEvent, NoteResponse};
pub use vault::{Vault, validate_name};
