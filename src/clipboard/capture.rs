//! clipkeep - Capture policy
//!
//! Turns raw clipboard snapshots into stored history entries, exactly once
//! per distinct clipboard change

use std::io::Cursor;
use std::sync::Arc;

use crate::clipboard::Entry;
use crate::storage::{HistoryStore, StorageError};

/// One observation of the system clipboard
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Opaque change token; inequality with the previous token means the
    /// clipboard changed, nothing else about its value is interpreted
    pub token: u64,
    /// Clipboard content, if any was readable
    pub content: Option<SnapshotContent>,
}

/// Raw clipboard payload as reported by a snapshot source
#[derive(Debug, Clone)]
pub enum SnapshotContent {
    Text(String),
    /// Encoded image bytes in whatever format the source produced
    Image(Vec<u8>),
}

/// Supplier of clipboard snapshots, polled at a fixed cadence
pub trait SnapshotSource: Send {
    fn poll(&mut self) -> Snapshot;
}

/// Decides, per clipboard change, whether a snapshot becomes a stored entry
///
/// A change is detected by token delta, not content delta, so re-copying
/// identical content still triggers a check (and is then suppressed as a
/// duplicate of the most recent entry).
pub struct CapturePolicy {
    store: Arc<HistoryStore>,
    last_token: Option<u64>,
}

impl CapturePolicy {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self {
            store,
            last_token: None,
        }
    }

    /// Process one snapshot; returns the stored entry, if any
    ///
    /// Insert failures are returned for the caller to log; they are never
    /// retried here, the next distinct clipboard change will attempt a
    /// fresh insert on its own.
    pub fn handle(&mut self, snapshot: Snapshot) -> Result<Option<Entry>, StorageError> {
        if self.last_token == Some(snapshot.token) {
            return Ok(None);
        }
        self.last_token = Some(snapshot.token);

        let Some(content) = snapshot.content else {
            return Ok(None);
        };
        let Some(entry) = classify(content) else {
            return Ok(None);
        };

        if self.store.is_duplicate_of_most_recent(&entry) {
            log::debug!("Skipping duplicate of most recent entry");
            return Ok(None);
        }

        self.store.insert(&entry)?;
        log::debug!("Captured {:?} entry {}", entry.kind(), entry.id);
        Ok(Some(entry))
    }
}

/// Classify snapshot content into a fresh entry
///
/// Text is stored raw (trimming is display-only). Images are re-encoded to
/// canonical PNG before comparison and storage, so the same pixels arriving
/// in different encodings dedup against each other.
fn classify(content: SnapshotContent) -> Option<Entry> {
    match content {
        SnapshotContent::Text(text) if !text.is_empty() => Some(Entry::new_text(text)),
        SnapshotContent::Text(_) => None,
        SnapshotContent::Image(bytes) => canonical_png(&bytes).map(Entry::new_image),
    }
}

fn canonical_png(data: &[u8]) -> Option<Vec<u8>> {
    let img = match image::load_from_memory(data) {
        Ok(img) => img,
        Err(e) => {
            log::error!("Failed to decode clipboard image: {}", e);
            return None;
        }
    };

    let mut png_data = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png) {
        log::error!("Failed to re-encode clipboard image as PNG: {}", e);
        return None;
    }
    Some(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::EntryContent;
    use crate::config::Config;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn test_policy() -> (CapturePolicy, Arc<HistoryStore>, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let store = Arc::new(HistoryStore::open(&config).expect("open store"));
        (CapturePolicy::new(Arc::clone(&store)), store, dir)
    }

    fn text_snapshot(token: u64, text: &str) -> Snapshot {
        Snapshot {
            token,
            content: Some(SnapshotContent::Text(text.to_string())),
        }
    }

    // RGB without alpha survives both PNG and BMP round trips unchanged,
    // so both encodings canonicalize to identical PNG bytes
    fn test_pixels() -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        ImageBuffer::from_fn(2, 2, |x, y| Rgb([x as u8 * 100, y as u8 * 100, 50]))
    }

    fn encode(img: &ImageBuffer<Rgb<u8>, Vec<u8>>, format: image::ImageFormat) -> Vec<u8> {
        let mut data = Vec::new();
        img.write_to(&mut Cursor::new(&mut data), format).unwrap();
        data
    }

    #[test]
    fn stores_new_text_once() {
        let (mut policy, store, _dir) = test_policy();

        let stored = policy.handle(text_snapshot(1, "hello")).unwrap();
        assert!(stored.is_some());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn unchanged_token_is_ignored() {
        let (mut policy, store, _dir) = test_policy();

        policy.handle(text_snapshot(1, "hello")).unwrap();
        let second = policy.handle(text_snapshot(1, "hello")).unwrap();

        assert!(second.is_none());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn recopying_identical_content_is_suppressed_as_duplicate() {
        let (mut policy, store, _dir) = test_policy();

        // distinct tokens force a fresh check; content dedup kicks in
        policy.handle(text_snapshot(1, "hello")).unwrap();
        let second = policy.handle(text_snapshot(2, "hello")).unwrap();

        assert!(second.is_none());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn empty_text_produces_no_entry() {
        let (mut policy, store, _dir) = test_policy();

        assert!(policy.handle(text_snapshot(1, "")).unwrap().is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn empty_snapshot_still_advances_the_token() {
        let (mut policy, store, _dir) = test_policy();

        policy
            .handle(Snapshot {
                token: 1,
                content: None,
            })
            .unwrap();
        policy.handle(text_snapshot(2, "after clear")).unwrap();

        assert_eq!(store.count(), 1);
    }

    #[test]
    fn text_is_stored_untrimmed() {
        let (mut policy, store, _dir) = test_policy();

        policy.handle(text_snapshot(1, "  padded  ")).unwrap();

        let entries = store.recent(1);
        assert_eq!(entries[0].content, EntryContent::Text("  padded  ".into()));
    }

    #[test]
    fn image_is_normalized_to_png() {
        let (mut policy, store, _dir) = test_policy();
        let bmp = encode(&test_pixels(), image::ImageFormat::Bmp);

        policy
            .handle(Snapshot {
                token: 1,
                content: Some(SnapshotContent::Image(bmp)),
            })
            .unwrap();

        let entries = store.recent(1);
        let EntryContent::Image(stored) = &entries[0].content else {
            panic!("expected image entry");
        };
        // stored bytes decode as PNG
        let format = image::guess_format(stored).unwrap();
        assert_eq!(format, image::ImageFormat::Png);
    }

    #[test]
    fn same_pixels_in_different_encodings_dedup() {
        let (mut policy, store, _dir) = test_policy();
        let pixels = test_pixels();

        policy
            .handle(Snapshot {
                token: 1,
                content: Some(SnapshotContent::Image(encode(&pixels, image::ImageFormat::Bmp))),
            })
            .unwrap();
        let second = policy
            .handle(Snapshot {
                token: 2,
                content: Some(SnapshotContent::Image(encode(&pixels, image::ImageFormat::Png))),
            })
            .unwrap();

        assert!(second.is_none());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn undecodable_image_produces_no_entry() {
        let (mut policy, store, _dir) = test_policy();

        let result = policy
            .handle(Snapshot {
                token: 1,
                content: Some(SnapshotContent::Image(b"garbage bytes".to_vec())),
            })
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn alternating_content_is_all_kept() {
        let (mut policy, store, _dir) = test_policy();

        policy.handle(text_snapshot(1, "a")).unwrap();
        policy.handle(text_snapshot(2, "b")).unwrap();
        policy.handle(text_snapshot(3, "a")).unwrap();

        // only the immediately preceding entry counts as a duplicate
        assert_eq!(store.count(), 3);
    }
}
