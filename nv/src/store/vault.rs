//! Vault directory and note file operations
//!
//! Maps note names to `{root}/{name}.md` and translates filesystem failures
//! into [`NoteError`] kinds. Holds no cache; the actor owns that.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::messages::{NoteError, NoteResponse};
use crate::NOTE_EXTENSION;

/// Reject empty or whitespace-only names, labels and list entries
pub fn validate_name(value: &str, what: &str) -> NoteResponse<()> {
    if value.trim().is_empty() {
        return Err(NoteError::InvalidArgument(format!(
            "{} cannot be empty or whitespace",
            what
        )));
    }
    Ok(())
}

/// Flat directory of note files
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Open the vault, creating the directory and any missing parents
    pub fn open(root: impl AsRef<Path>) -> NoteResponse<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Vault::open: directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a note
    pub fn note_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, NOTE_EXTENSION))
    }

    pub async fn exists(&self, name: &str) -> NoteResponse<bool> {
        Ok(fs::try_exists(self.note_path(name)).await?)
    }

    /// Replace the whole file
    pub async fn write(&self, name: &str, content: &str) -> NoteResponse<()> {
        fs::write(self.note_path(name), content).await?;
        Ok(())
    }

    /// Append to the end of the file, creating it if absent
    pub async fn append(&self, name: &str, content: &str) -> NoteResponse<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.note_path(name))
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn read(&self, name: &str) -> NoteResponse<String> {
        fs::read_to_string(self.note_path(name))
            .await
            .map_err(|e| not_found_or_io(e, name))
    }

    /// Rename a note file; the target must not exist
    pub async fn rename(&self, from: &str, to: &str) -> NoteResponse<()> {
        if !self.exists(from).await? {
            return Err(NoteError::NotFound(from.to_string()));
        }
        if self.exists(to).await? {
            return Err(NoteError::AlreadyExists(to.to_string()));
        }
        // Source was checked above, so NotFound here is an I/O failure
        fs::rename(self.note_path(from), self.note_path(to)).await?;
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> NoteResponse<()> {
        fs::remove_file(self.note_path(name))
            .await
            .map_err(|e| not_found_or_io(e, name))
    }

    /// Names of all note files directly inside the vault, sorted
    pub async fn list(&self) -> NoteResponse<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().map(|e| e == NOTE_EXTENSION).unwrap_or(false)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }

        names.sort();
        debug!(count = names.len(), "Vault::list: scanned vault");
        Ok(names)
    }
}

fn not_found_or_io(e: std::io::Error, name: &str) -> NoteError {
    if e.kind() == ErrorKind::NotFound {
        NoteError::NotFound(name.to_string())
    } else {
        NoteError::Io(e)
    }
}
