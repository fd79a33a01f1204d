//! NoteStore - actor that owns the vault and the note cache
//!
//! Every file operation and the cache update that follows it run inside one
//! command of the actor loop, so callers never see the cache out of step with
//! the files this process wrote.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::messages::{NamePredicate, NoteCommand, NoteError, NoteEvent, NoteResponse};
use super::vault::{Vault, validate_name};
use crate::config::Config;
use crate::markdown;

/// Handle to send commands to the NoteStore actor
#[derive(Clone)]
pub struct NoteStore {
    tx: mpsc::Sender<NoteCommand>,
    /// Broadcast sender for change notifications
    event_tx: broadcast::Sender<NoteEvent>,
    root: PathBuf,
}

impl NoteStore {
    /// Open a vault with default queue sizes and spawn the actor
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(vault_root: impl AsRef<Path>) -> NoteResponse<Self> {
        Self::open_with_capacity(
            vault_root,
            crate::DEFAULT_CHANNEL_CAPACITY,
            crate::DEFAULT_EVENT_CAPACITY,
        )
    }

    /// Open the vault described by a config
    pub fn from_config(config: &Config) -> NoteResponse<Self> {
        Self::open_with_capacity(&config.vault_path, config.channel_capacity, config.event_capacity)
    }

    fn open_with_capacity(
        vault_root: impl AsRef<Path>,
        channel_capacity: usize,
        event_capacity: usize,
    ) -> NoteResponse<Self> {
        debug!(vault_root = %vault_root.as_ref().display(), "open: called");
        let vault = Vault::open(vault_root)?;
        let root = vault.root().to_path_buf();

        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));

        tokio::spawn(actor_loop(vault, HashMap::new(), rx, event_tx.clone()));

        info!(root = %root.display(), "NoteStore spawned");
        Ok(Self { tx, event_tx, root })
    }

    /// Vault root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subscribe to change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<NoteEvent> {
        self.event_tx.subscribe()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> NoteCommand) -> NoteResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| NoteError::ChannelError)?;
        reply_rx.await.map_err(|_| NoteError::ChannelError)
    }

    // === Core operations ===

    /// Create a note, overwriting any existing file with the same name
    pub async fn create_note(&self, name: &str, content: &str) -> NoteResponse<()> {
        debug!(%name, content_len = content.len(), "create_note: called");
        validate_name(name, "Note name")?;
        self.request(|reply| NoteCommand::Write {
            name: name.to_string(),
            content: content.to_string(),
            reply,
        })
        .await?
    }

    /// Append to the end of a note, creating the file if needed
    ///
    /// Only updates the cache when the note is already cached.
    pub async fn append_content(&self, name: &str, content: &str) -> NoteResponse<()> {
        debug!(%name, content_len = content.len(), "append_content: called");
        validate_name(name, "Note name")?;
        self.request(|reply| NoteCommand::Append {
            name: name.to_string(),
            content: content.to_string(),
            reply,
        })
        .await?
    }

    /// Read a note, serving from the cache when possible
    pub async fn read_note(&self, name: &str) -> NoteResponse<String> {
        debug!(%name, "read_note: called");
        validate_name(name, "Note name")?;
        self.request(|reply| NoteCommand::Read {
            name: name.to_string(),
            reply,
        })
        .await?
    }

    /// Rename a note; fails if the source is missing or the target exists
    pub async fn rename_note(&self, original_name: &str, new_name: &str) -> NoteResponse<()> {
        debug!(%original_name, %new_name, "rename_note: called");
        validate_name(original_name, "Original note name")?;
        validate_name(new_name, "New note name")?;
        self.request(|reply| NoteCommand::Rename {
            from: original_name.to_string(),
            to: new_name.to_string(),
            reply,
        })
        .await?
    }

    /// Delete a note file and its cache entry
    pub async fn delete_note(&self, name: &str) -> NoteResponse<()> {
        debug!(%name, "delete_note: called");
        validate_name(name, "Note name")?;
        self.request(|reply| NoteCommand::Delete {
            name: name.to_string(),
            reply,
        })
        .await?
    }

    /// Delete every note whose name matches `predicate`
    ///
    /// Stops at the first failed delete. Notes removed before the failure stay
    /// removed. Returns the deleted names in the order they were removed.
    /// A panicking `predicate` fails the call with `InvalidArgument` and
    /// leaves the store running.
    pub async fn bulk_delete<F>(&self, predicate: F) -> NoteResponse<Vec<String>>
    where
        F: Fn(&str) -> bool + Send + 'static,
    {
        debug!("bulk_delete: called");
        let predicate: NamePredicate = Box::new(predicate);
        self.request(|reply| NoteCommand::BulkDelete { predicate, reply })
            .await?
    }

    /// Names of notes containing `term`, ignoring case
    ///
    /// Loads the whole vault into the cache first if the cache is empty.
    /// Result order follows the cache and is not sorted.
    pub async fn search_notes(&self, term: &str) -> NoteResponse<Vec<String>> {
        debug!(%term, "search_notes: called");
        if term.is_empty() {
            return Err(NoteError::InvalidArgument("Search term cannot be empty".to_string()));
        }
        self.request(|reply| NoteCommand::Search {
            term: term.to_string(),
            reply,
        })
        .await?
    }

    /// All note names in the vault, sorted
    pub async fn list_notes(&self) -> NoteResponse<Vec<String>> {
        debug!("list_notes: called");
        self.request(|reply| NoteCommand::List { reply }).await?
    }

    /// Whether the note currently has a cache entry
    pub async fn is_cached(&self, name: &str) -> NoteResponse<bool> {
        debug!(%name, "is_cached: called");
        self.request(|reply| NoteCommand::IsCached {
            name: name.to_string(),
            reply,
        })
        .await
    }

    /// Shutdown the NoteStore
    pub async fn shutdown(&self) -> NoteResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(NoteCommand::Shutdown)
            .await
            .map_err(|_| NoteError::ChannelError)
    }

    // === Markdown helpers (all go through append_content) ===

    /// Append a labelled list of `[[wikilinks]]` to a note
    pub async fn link_notes<S: AsRef<str>>(&self, name: &str, list_label: &str, targets: &[S]) -> NoteResponse<()> {
        debug!(%name, %list_label, target_count = targets.len(), "link_notes: called");
        validate_name(name, "Note name")?;
        validate_name(list_label, "List name")?;
        for target in targets {
            validate_name(target.as_ref(), "Linked note name")?;
        }
        self.append_content(name, &markdown::link_block(list_label, targets))
            .await
    }

    /// Append a "Tags" list to a note
    pub async fn add_tags<S: AsRef<str>>(&self, name: &str, tags: &[S]) -> NoteResponse<()> {
        debug!(%name, tag_count = tags.len(), "add_tags: called");
        validate_name(name, "Note name")?;
        for tag in tags {
            validate_name(tag.as_ref(), "Tag")?;
        }
        self.append_content(name, &markdown::tags_block(tags)).await
    }

    /// Every `#tag` token in a note, in order, duplicates included
    pub async fn get_tags(&self, name: &str) -> NoteResponse<Vec<String>> {
        debug!(%name, "get_tags: called");
        let content = self.read_note(name).await?;
        Ok(markdown::extract_tags(&content))
    }

    /// Append a pipe table; the first row is the header
    pub async fn apply_table<R, S>(&self, name: &str, rows: &[R]) -> NoteResponse<()>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        debug!(%name, row_count = rows.len(), "apply_table: called");
        validate_name(name, "Note name")?;
        let Some(header) = rows.first() else {
            return Err(NoteError::InvalidArgument("Table needs at least one row".to_string()));
        };
        let cols = header.as_ref().len();
        if cols == 0 {
            return Err(NoteError::InvalidArgument("Table needs at least one column".to_string()));
        }
        if let Some(i) = rows.iter().position(|row| row.as_ref().len() != cols) {
            return Err(NoteError::InvalidArgument(format!(
                "Table row {} has {} cells, expected {}",
                i,
                rows[i].as_ref().len(),
                cols
            )));
        }
        self.append_content(name, &markdown::table(rows)).await
    }
}

/// The actor loop that owns the vault and the cache and processes commands
async fn actor_loop(
    vault: Vault,
    mut cache: HashMap<String, String>,
    mut rx: mpsc::Receiver<NoteCommand>,
    event_tx: broadcast::Sender<NoteEvent>,
) {
    debug!("NoteStore actor started");

    // Receivers may not exist; a failed send only means nobody is listening
    let emit = |event: NoteEvent| {
        let _ = event_tx.send(event);
    };

    while let Some(cmd) = rx.recv().await {
        debug!(?cmd, "actor_loop: command");
        match cmd {
            NoteCommand::Write { name, content, reply } => {
                let result = vault.write(&name, &content).await;
                if result.is_ok() {
                    cache.insert(name.clone(), content);
                    emit(NoteEvent::Written { name });
                }
                let _ = reply.send(result);
            }

            NoteCommand::Append { name, content, reply } => {
                let result = vault.append(&name, &content).await;
                if result.is_ok() {
                    if let Some(cached) = cache.get_mut(&name) {
                        cached.push_str(&content);
                    }
                    emit(NoteEvent::Appended { name });
                }
                let _ = reply.send(result);
            }

            NoteCommand::Read { name, reply } => {
                let result = match cache.get(&name) {
                    Some(content) => {
                        debug!(%name, "actor_loop: cache hit");
                        Ok(content.clone())
                    }
                    None => vault.read(&name).await.map(|content| {
                        cache.insert(name.clone(), content.clone());
                        content
                    }),
                };
                let _ = reply.send(result);
            }

            NoteCommand::Rename { from, to, reply } => {
                let result = vault.rename(&from, &to).await;
                if result.is_ok() {
                    cache.remove(&to);
                    if let Some(content) = cache.remove(&from) {
                        cache.insert(to.clone(), content);
                    }
                    emit(NoteEvent::Renamed { from, to });
                }
                let _ = reply.send(result);
            }

            NoteCommand::Delete { name, reply } => {
                let result = vault.remove(&name).await;
                if result.is_ok() {
                    cache.remove(&name);
                    emit(NoteEvent::Deleted { name });
                }
                let _ = reply.send(result);
            }

            NoteCommand::BulkDelete { predicate, reply } => {
                let result = bulk_delete(&vault, &mut cache, predicate, &emit).await;
                if let Err(e) = &result {
                    warn!(error = %e, "actor_loop: bulk delete aborted");
                }
                let _ = reply.send(result);
            }

            NoteCommand::Search { term, reply } => {
                let result = search(&vault, &mut cache, &term).await;
                let _ = reply.send(result);
            }

            NoteCommand::List { reply } => {
                let _ = reply.send(vault.list().await);
            }

            NoteCommand::IsCached { name, reply } => {
                let _ = reply.send(cache.contains_key(&name));
            }

            NoteCommand::Shutdown => {
                info!("NoteStore shutting down");
                break;
            }
        }
    }

    debug!("NoteStore actor stopped");
}

async fn bulk_delete(
    vault: &Vault,
    cache: &mut HashMap<String, String>,
    predicate: NamePredicate,
    emit: &impl Fn(NoteEvent),
) -> NoteResponse<Vec<String>> {
    let mut deleted = Vec::new();
    for name in vault.list().await? {
        // The filter is caller code; a panic must not take the actor down
        let matched = panic::catch_unwind(AssertUnwindSafe(|| predicate(&name))).map_err(|_| {
            NoteError::InvalidArgument(format!("Bulk delete filter panicked on note '{}'", name))
        })?;
        if !matched {
            continue;
        }
        vault.remove(&name).await?;
        cache.remove(&name);
        emit(NoteEvent::Deleted { name: name.clone() });
        deleted.push(name);
    }
    info!(count = deleted.len(), "Bulk deleted notes");
    Ok(deleted)
}

async fn search(vault: &Vault, cache: &mut HashMap<String, String>, term: &str) -> NoteResponse<Vec<String>> {
    if cache.is_empty() {
        // All-or-nothing so a failed read leaves the cache untouched.
        // Files that are not UTF-8 text are not notes and are skipped.
        let mut loaded = HashMap::new();
        for name in vault.list().await? {
            match vault.read(&name).await {
                Ok(content) => {
                    loaded.insert(name, content);
                }
                Err(NoteError::Io(e)) if e.kind() == ErrorKind::InvalidData => {
                    warn!(%name, error = %e, "Skipping unreadable note during warm-up");
                }
                Err(e) => return Err(e),
            }
        }
        info!(count = loaded.len(), "Warmed note cache from vault");
        cache.extend(loaded);
    }

    let needle = term.to_lowercase();
    Ok(cache
        .iter()
        .filter(|(_, content)| content.to_lowercase().contains(&needle))
        .map(|(name, _)| name.clone())
        .collect())
}
