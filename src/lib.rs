//! clipkeep - Clipboard history core
//!
//! Observes the system clipboard, retains recent and favorited entries in a
//! local SQLite database, and answers recency, favorite, and search queries.
//!
//! The crate deliberately stops at the storage/capture boundary: menus,
//! popup windows, global hotkeys, and permission prompts belong to the
//! embedding application. That application owns a [`HistoryStore`], shares
//! it (via [`Arc`](std::sync::Arc)) between the capture loop and its UI
//! query paths, and wires a hotkey to whatever consumer it likes.
//!
//! ```no_run
//! use std::sync::Arc;
//! use clipkeep::{ArboardSource, CapturePolicy, ClipboardMonitor, Config, HistoryStore};
//!
//! let config = Config::default();
//! let store = Arc::new(match HistoryStore::open(&config) {
//!     Ok(store) => store,
//!     Err(e) => {
//!         log::error!("History disabled: {}", e);
//!         HistoryStore::disabled()
//!     }
//! });
//!
//! let monitor = ClipboardMonitor::new(config.poll_interval_ms);
//! monitor.start(ArboardSource, CapturePolicy::new(Arc::clone(&store)));
//!
//! // UI side: query and mutate through the same store
//! let latest = store.recent(10);
//! let matches = store.search("meeting", 10);
//! ```

pub mod clipboard;
pub mod config;
pub mod storage;

pub use clipboard::{
    ArboardSource, CapturePolicy, ClipboardMonitor, Entry, EntryContent, EntryKind, Snapshot,
    SnapshotContent, SnapshotSource,
};
pub use config::Config;
pub use storage::{HistoryStore, StorageError};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// End-to-end: a capture thread inserting while a UI thread queries and
    /// toggles favorites, sharing one store
    #[test]
    fn capture_and_ui_share_one_store() {
        let _ = env_logger::builder().is_test(true).try_init();

        let dir = tempfile::TempDir::new().expect("temp dir");
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            max_items: 5,
            ..Config::default()
        };
        let store = Arc::new(HistoryStore::open(&config).expect("open store"));

        let capture_store = Arc::clone(&store);
        let capture = thread::spawn(move || {
            let mut policy = CapturePolicy::new(capture_store);
            for i in 0..20u64 {
                policy
                    .handle(Snapshot {
                        token: i,
                        content: Some(SnapshotContent::Text(format!("copy-{}", i))),
                    })
                    .expect("insert");
            }
        });

        let ui_store = Arc::clone(&store);
        let ui = thread::spawn(move || {
            for _ in 0..20 {
                let recent = ui_store.recent(10);
                if let Some(entry) = recent.first() {
                    // id may already be cleaned up; either way this must succeed
                    ui_store.set_favorite(&entry.id, true).expect("toggle");
                }
                let _ = ui_store.search("copy", 10);
            }
        });

        capture.join().unwrap();
        ui.join().unwrap();

        let all = store.recent(100);
        let non_favorites = all.iter().filter(|e| !e.favorite).count();
        assert!(non_favorites <= 5);
        assert!(!all.is_empty());
    }
}
