//! Note store messages
//!
//! Commands, responses and events for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

/// Errors from note operations
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Note already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel error")]
    ChannelError,
}

impl NoteError {
    /// Check if this error means the target note does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, NoteError::NotFound(_))
    }

    /// Check if this error was caused by bad caller input
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, NoteError::InvalidArgument(_))
    }
}

/// Response from note operations
pub type NoteResponse<T> = Result<T, NoteError>;

/// Name filter used by bulk delete
pub type NamePredicate = Box<dyn Fn(&str) -> bool + Send>;

/// Commands sent to the NoteStore actor
pub enum NoteCommand {
    Write {
        name: String,
        content: String,
        reply: oneshot::Sender<NoteResponse<()>>,
    },
    Append {
        name: String,
        content: String,
        reply: oneshot::Sender<NoteResponse<()>>,
    },
    Read {
        name: String,
        reply: oneshot::Sender<NoteResponse<String>>,
    },
    Rename {
        from: String,
        to: String,
        reply: oneshot::Sender<NoteResponse<()>>,
    },
    Delete {
        name: String,
        reply: oneshot::Sender<NoteResponse<()>>,
    },
    BulkDelete {
        predicate: NamePredicate,
        reply: oneshot::Sender<NoteResponse<Vec<String>>>,
    },
    Search {
        term: String,
        reply: oneshot::Sender<NoteResponse<Vec<String>>>,
    },
    List {
        reply: oneshot::Sender<NoteResponse<Vec<String>>>,
    },
    IsCached {
        name: String,
        reply: oneshot::Sender<bool>,
    },

    // Shutdown
    Shutdown,
}

impl std::fmt::Debug for NoteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { name, content, .. } => write!(f, "Write({}, {} bytes)", name, content.len()),
            Self::Append { name, content, .. } => write!(f, "Append({}, {} bytes)", name, content.len()),
            Self::Read { name, .. } => write!(f, "Read({})", name),
            Self::Rename { from, to, .. } => write!(f, "Rename({} -> {})", from, to),
            Self::Delete { name, .. } => write!(f, "Delete({})", name),
            Self::BulkDelete { .. } => write!(f, "BulkDelete"),
            Self::Search { term, .. } => write!(f, "Search({})", term),
            Self::List { .. } => write!(f, "List"),
            Self::IsCached { name, .. } => write!(f, "IsCached({})", name),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Event broadcast after a note changed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent {
    /// Note was created or overwritten
    Written { name: String },
    /// Content was appended to a note
    Appended { name: String },
    /// Note was renamed
    Renamed { from: String, to: String },
    /// Note was deleted (individually or by bulk delete)
    Deleted { name: String },
}
