//! Integration tests for NoteVault
//!
//! These tests drive the public NoteStore API against real temp directories.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use notevault::config::Config;
use notevault::{NoteError, NoteEvent, NoteStore};
use proptest::prelude::*;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open_store() -> (TempDir, NoteStore) {
    init_tracing();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = NoteStore::open(temp_dir.path().join("vault")).expect("Failed to open store");
    (temp_dir, store)
}

// =============================================================================
// Create / Read / Append
// =============================================================================

#[tokio::test]
async fn test_create_then_read_returns_content() {
    let (_temp, store) = open_store();

    store.create_note("journal", "# Monday\nShipped it.").await.unwrap();
    assert_eq!(store.read_note("journal").await.unwrap(), "# Monday\nShipped it.");
}

#[tokio::test]
async fn test_create_overwrites_existing_note() {
    let (temp, store) = open_store();

    store.create_note("draft", "v1").await.unwrap();
    store.create_note("draft", "v2").await.unwrap();

    assert_eq!(store.read_note("draft").await.unwrap(), "v2");
    assert_eq!(fs::read_to_string(temp.path().join("vault/draft.md")).unwrap(), "v2");
}

#[tokio::test]
async fn test_append_concatenates_without_separator() {
    let (temp, store) = open_store();

    store.create_note("n", "abc").await.unwrap();
    store.append_content("n", "def").await.unwrap();

    assert_eq!(store.read_note("n").await.unwrap(), "abcdef");
    assert_eq!(fs::read_to_string(temp.path().join("vault/n.md")).unwrap(), "abcdef");
}

#[tokio::test]
async fn test_read_missing_note_is_not_found() {
    let (_temp, store) = open_store();

    let err = store.read_note("nope").await.unwrap_err();
    assert!(matches!(err, NoteError::NotFound(ref name) if name == "nope"));
}

#[tokio::test]
async fn test_open_creates_vault_directory() {
    let (temp, store) = open_store();

    assert!(temp.path().join("vault").is_dir());
    assert_eq!(store.root(), temp.path().join("vault"));
}

#[tokio::test]
async fn test_from_config_uses_vault_path() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_vault(temp_dir.path().join("configured"));

    let store = NoteStore::from_config(&config).unwrap();
    store.create_note("hello", "world").await.unwrap();

    assert!(temp_dir.path().join("configured/hello.md").exists());
}

// =============================================================================
// Rename / Delete
// =============================================================================

#[tokio::test]
async fn test_rename_moves_cache_entry() {
    let (temp, store) = open_store();

    store.create_note("a", "payload").await.unwrap();
    store.rename_note("a", "b").await.unwrap();

    assert!(store.read_note("a").await.unwrap_err().is_not_found());

    // Remove the file so only a cache hit can produce the content
    fs::remove_file(temp.path().join("vault/b.md")).unwrap();
    assert_eq!(store.read_note("b").await.unwrap(), "payload");
}

#[tokio::test]
async fn test_rename_to_existing_fails_without_touching_cache() {
    let (temp, store) = open_store();

    store.create_note("src", "source").await.unwrap();
    store.create_note("dst", "target").await.unwrap();

    let err = store.rename_note("src", "dst").await.unwrap_err();
    assert!(matches!(err, NoteError::AlreadyExists(ref name) if name == "dst"));

    assert!(store.is_cached("src").await.unwrap());
    assert_eq!(store.read_note("src").await.unwrap(), "source");
    assert_eq!(store.read_note("dst").await.unwrap(), "target");
    assert!(temp.path().join("vault/src.md").exists());
}

#[tokio::test]
async fn test_rename_missing_source_fails_without_touching_cache() {
    let (_temp, store) = open_store();

    store.create_note("other", "x").await.unwrap();

    let err = store.rename_note("ghost", "other2").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(store.is_cached("other").await.unwrap());
    assert!(!store.is_cached("other2").await.unwrap());
}

#[tokio::test]
async fn test_delete_removes_file_and_cache() {
    let (temp, store) = open_store();

    store.create_note("a", "x").await.unwrap();
    store.delete_note("a").await.unwrap();

    assert!(!temp.path().join("vault/a.md").exists());
    assert!(store.read_note("a").await.unwrap_err().is_not_found());
    assert!(store.delete_note("a").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_bulk_delete_matching_notes() {
    let (temp, store) = open_store();

    for name in ["tmp-1", "tmp-2", "keep"] {
        store.create_note(name, name).await.unwrap();
    }

    let deleted = store.bulk_delete(|name| name.starts_with("tmp-")).await.unwrap();
    assert_eq!(deleted, vec!["tmp-1", "tmp-2"]);

    assert_eq!(store.list_notes().await.unwrap(), vec!["keep"]);
    assert!(!store.is_cached("tmp-1").await.unwrap());
    assert!(store.is_cached("keep").await.unwrap());
    assert!(!temp.path().join("vault/tmp-2.md").exists());
}

#[tokio::test]
async fn test_bulk_delete_aborts_on_failure_and_keeps_progress() {
    let (temp, store) = open_store();

    for name in ["a", "b", "c"] {
        store.create_note(name, name).await.unwrap();
    }

    // Pull "b" out from under the store while it is mid-operation
    let b_path = temp.path().join("vault/b.md");
    let err = store
        .bulk_delete(move |name| {
            if name == "b" {
                let _ = fs::remove_file(&b_path);
            }
            true
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // "a" stays deleted, "c" was never reached
    assert_eq!(store.list_notes().await.unwrap(), vec!["c"]);
    assert!(!store.is_cached("a").await.unwrap());
    assert!(store.is_cached("c").await.unwrap());
}

// =============================================================================
// Search / Tags / Markdown blocks
// =============================================================================

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let (_temp, store) = open_store();

    store.create_note("n1", "Hello World").await.unwrap();
    store.create_note("n2", "goodbye").await.unwrap();

    let hits = store.search_notes("hello").await.unwrap();
    assert_eq!(hits, vec!["n1"]);

    let hits: HashSet<String> = store.search_notes("O").await.unwrap().into_iter().collect();
    assert_eq!(hits, HashSet::from(["n1".to_string(), "n2".to_string()]));
}

#[tokio::test]
async fn test_search_warms_empty_cache_from_disk() {
    let (temp, store) = open_store();

    fs::write(temp.path().join("vault/recipe.md"), "Add SALT to taste").unwrap();
    fs::write(temp.path().join("vault/list.md"), "pepper").unwrap();
    fs::write(temp.path().join("vault/ignored.txt"), "salt").unwrap();

    assert!(!store.is_cached("recipe").await.unwrap());
    assert_eq!(store.search_notes("salt").await.unwrap(), vec!["recipe"]);
    assert!(store.is_cached("recipe").await.unwrap());
    assert!(store.is_cached("list").await.unwrap());
    assert!(!store.is_cached("ignored").await.unwrap());
}

#[tokio::test]
async fn test_get_tags_in_order() {
    let (_temp, store) = open_store();

    store.create_note("t", "note #alpha body #beta2").await.unwrap();
    assert_eq!(store.get_tags("t").await.unwrap(), vec!["#alpha", "#beta2"]);
}

#[tokio::test]
async fn test_add_tags_then_get_tags() {
    let (_temp, store) = open_store();

    store.create_note("t", "intro #draft").await.unwrap();
    store.add_tags("t", &["rust", "draft"]).await.unwrap();

    assert_eq!(
        store.read_note("t").await.unwrap(),
        "intro #draft\n- Tags\n\t- #rust\n- #draft\n\n"
    );
    assert_eq!(store.get_tags("t").await.unwrap(), vec!["#draft", "#rust", "#draft"]);
}

#[tokio::test]
async fn test_add_tags_rejects_empty_tag() {
    let (temp, store) = open_store();

    let err = store.add_tags("t", &["ok", ""]).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(!temp.path().join("vault/t.md").exists());
}

#[tokio::test]
async fn test_apply_table_appends_exact_block() {
    let (_temp, store) = open_store();

    store.create_note("tbl", "").await.unwrap();
    store
        .apply_table("tbl", &[["H1", "H2"], ["v1", "v2"]])
        .await
        .unwrap();

    assert_eq!(
        store.read_note("tbl").await.unwrap(),
        "| H1 | H2 |\n| --- | --- |\n| v1 | v2 |\n"
    );
}

#[tokio::test]
async fn test_link_notes_appends_link_block() {
    let (_temp, store) = open_store();

    store.create_note("index", "# Index").await.unwrap();
    store.link_notes("index", "Projects", &["alpha", "beta"]).await.unwrap();

    assert_eq!(
        store.read_note("index").await.unwrap(),
        "# Index\n - Projects\n\t - [[alpha]]\n\t - [[beta]]\n"
    );
}

#[tokio::test]
async fn test_link_notes_validation() {
    let (_temp, store) = open_store();

    assert!(store.link_notes("index", "", &["a"]).await.unwrap_err().is_invalid_argument());
    assert!(store.link_notes("", "L", &["a"]).await.unwrap_err().is_invalid_argument());
    assert!(store.link_notes("index", "L", &["a", " "]).await.unwrap_err().is_invalid_argument());
    assert!(store.list_notes().await.unwrap().is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_lose_no_updates() {
    let (temp, store) = open_store();

    let mut handles = Vec::new();
    for i in 0..64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.create_note(&format!("note-{i}"), &format!("content {i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Every entry must be a cache hit with the right content
    for i in 0..64 {
        let name = format!("note-{i}");
        assert!(store.is_cached(&name).await.unwrap());
        fs::remove_file(temp.path().join(format!("vault/{name}.md"))).unwrap();
        assert_eq!(store.read_note(&name).await.unwrap(), format!("content {i}"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_to_cached_note() {
    let (temp, store) = open_store();
    store.create_note("shared", "").await.unwrap();

    let store = Arc::new(store);
    let mut handles = Vec::new();
    for _ in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.append_content("shared", "x").await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cached = store.read_note("shared").await.unwrap();
    let on_disk = fs::read_to_string(temp.path().join("vault/shared.md")).unwrap();
    assert_eq!(cached.len(), 32);
    assert_eq!(cached, on_disk);
}

#[tokio::test]
async fn test_events_for_bulk_delete() {
    let (_temp, store) = open_store();
    store.create_note("x1", "").await.unwrap();
    store.create_note("x2", "").await.unwrap();

    let mut events = store.subscribe_events();
    store.bulk_delete(|_| true).await.unwrap();

    assert_eq!(events.recv().await.unwrap(), NoteEvent::Deleted { name: "x1".to_string() });
    assert_eq!(events.recv().await.unwrap(), NoteEvent::Deleted { name: "x2".to_string() });
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_create_append_read(
        name in "[a-z][a-z0-9_-]{0,15}",
        first in "\\PC*",
        second in "\\PC*",
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (read_back, on_disk) = rt.block_on(async {
            let (temp, store) = open_store();
            store.create_note(&name, &first).await.unwrap();
            assert_eq!(store.read_note(&name).await.unwrap(), first);

            store.append_content(&name, &second).await.unwrap();
            let read_back = store.read_note(&name).await.unwrap();
            let on_disk = fs::read_to_string(temp.path().join("vault").join(format!("{name}.md"))).unwrap();
            (read_back, on_disk)
        });

        let expected = format!("{first}{second}");
        prop_assert_eq!(&read_back, &expected);
        prop_assert_eq!(&on_disk, &expected);
    }

    #[test]
    fn prop_tags_block_round_trips_through_get_tags(
        tags in prop::collection::vec("[A-Za-z0-9_]{1,12}", 1..8),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let found = rt.block_on(async {
            let (_temp, store) = open_store();
            store.add_tags("tagged", &tags).await.unwrap();
            store.get_tags("tagged").await.unwrap()
        });

        let expected: Vec<String> = tags.iter().map(|t| format!("#{t}")).collect();
        prop_assert_eq!(found, expected);
    }
}
