//! NoteVault - markdown note vault with a write-through cache
//!
//! Keeps a flat directory of `{name}.md` files and an in-memory map of note
//! name to content. A single actor task owns both the cache and all file I/O,
//! so the cache never disagrees with what this process last wrote to disk.
//!
//! # Architecture
//!
//! ```text
//! {vault}/
//! ├── groceries.md
//! ├── meeting-2024-01-08.md
//! └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use notevault::NoteStore;
//!
//! let store = NoteStore::open("vault")?;
//! store.create_note("ideas", "# Ideas\n").await?;
//! store.add_tags("ideas", &["rust", "notes"]).await?;
//! let tags = store.get_tags("ideas").await?;
//! let hits = store.search_notes("IDEAS").await?;
//! ```

pub mod config;
pub mod markdown;
pub mod store;

pub use config::Config;
pub use store::{NoteCommand, NoteError, NoteEvent, NoteResponse, NoteStore};

/// File extension for note files
pub const NOTE_EXTENSION: &str = "md";

/// Default depth of the store's command queue
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default buffer size of the change event broadcast
pub const DEFAULT_EVENT_CAPACITY: usize = 64;
