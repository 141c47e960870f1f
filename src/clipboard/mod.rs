//! clipkeep - Clipboard module
//!
//! Entry models, capture policy, and the clipboard poll loop

pub mod capture;
pub mod models;
pub mod monitor;

pub use capture::{CapturePolicy, Snapshot, SnapshotContent, SnapshotSource};
pub use models::{Entry, EntryContent, EntryKind};
pub use monitor::{ArboardSource, ClipboardMonitor};
