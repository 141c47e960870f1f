//! clipkeep - Clipboard monitoring module
//!
//! Polls a snapshot source at a fixed cadence and feeds the capture policy

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arboard::Clipboard;
use blake3::Hasher;

use super::capture::{CapturePolicy, Snapshot, SnapshotContent, SnapshotSource};

/// Clipboard poll loop
///
/// A single spawned thread drives all clipboard checks; there are no
/// concurrent pollers. A slow store write delays at most the current tick.
pub struct ClipboardMonitor {
    /// Whether the poll thread should keep running
    running: Arc<AtomicBool>,
    /// Polling interval (milliseconds)
    poll_interval_ms: u64,
    /// Whether capture is paused (used while the app itself writes to the
    /// clipboard, so its own writes are not recorded)
    paused: Arc<AtomicBool>,
}

impl ClipboardMonitor {
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            poll_interval_ms,
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start polling `source`, handing each snapshot to `policy`
    ///
    /// Insert failures are logged and the loop proceeds; the next distinct
    /// clipboard change attempts a fresh insert on its own.
    pub fn start<S>(&self, mut source: S, mut policy: CapturePolicy)
    where
        S: SnapshotSource + 'static,
    {
        if self.running.load(Ordering::SeqCst) {
            log::warn!("Clipboard monitor is already running");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let interval = self.poll_interval_ms;

        thread::spawn(move || {
            log::info!("Clipboard monitor started with {}ms interval", interval);

            while running.load(Ordering::SeqCst) {
                if paused.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(interval));
                    continue;
                }

                match policy.handle(source.poll()) {
                    Ok(Some(entry)) => {
                        log::debug!("[Monitor] Stored {:?} entry {}", entry.kind(), entry.id)
                    }
                    Ok(None) => {}
                    Err(e) => log::error!("[Monitor] Failed to store clipboard entry: {}", e),
                }

                thread::sleep(Duration::from_millis(interval));
            }

            log::info!("Clipboard monitor stopped");
        });
    }

    /// Stop monitoring
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Pause monitoring
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume monitoring
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl Default for ClipboardMonitor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POLL_INTERVAL_MS)
    }
}

/// Snapshot source backed by the system clipboard via `arboard`
///
/// `arboard` exposes no OS change counter, so the token is synthesized as a
/// content hash; token inequality still means "the clipboard changed". The
/// capture policy never interprets the token beyond comparing it.
pub struct ArboardSource;

impl ArboardSource {
    /// Token for an empty or unreadable clipboard
    const EMPTY_TOKEN: u64 = 0;

    fn read_clipboard(clipboard: &mut Clipboard) -> Snapshot {
        // Text wins over images when both are present
        if let Ok(text) = clipboard.get_text() {
            if !text.is_empty() {
                return Snapshot {
                    token: Self::token(text.as_bytes()),
                    content: Some(SnapshotContent::Text(text)),
                };
            }
        }

        match clipboard.get_image() {
            Ok(image) => {
                log::debug!(
                    "[Clipboard] Detected image: {}x{}",
                    image.width,
                    image.height
                );
                // Token over the raw RGBA bytes; PNG canonicalization for
                // storage happens downstream in the capture policy
                let token = Self::token(&image.bytes);
                match Self::rgba_to_png(&image) {
                    Some(png_data) => Snapshot {
                        token,
                        content: Some(SnapshotContent::Image(png_data)),
                    },
                    None => Snapshot {
                        token: Self::EMPTY_TOKEN,
                        content: None,
                    },
                }
            }
            Err(e) => {
                log::debug!("[Clipboard] No readable content: {}", e);
                Snapshot {
                    token: Self::EMPTY_TOKEN,
                    content: None,
                }
            }
        }
    }

    fn rgba_to_png(image: &arboard::ImageData) -> Option<Vec<u8>> {
        use image::{ImageBuffer, Rgba};

        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(
            image.width as u32,
            image.height as u32,
            image.bytes.to_vec(),
        )?;

        let mut png_data = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut png_data);
        if let Err(e) = img.write_to(&mut cursor, image::ImageFormat::Png) {
            log::error!("Failed to encode clipboard image as PNG: {}", e);
            return None;
        }
        Some(png_data)
    }

    fn token(data: &[u8]) -> u64 {
        let mut hasher = Hasher::new();
        hasher.update(data);
        let hash = hasher.finalize();
        let mut token_bytes = [0u8; 8];
        token_bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(token_bytes)
    }
}

impl SnapshotSource for ArboardSource {
    fn poll(&mut self) -> Snapshot {
        // Fresh Clipboard instance each poll to observe the latest data
        match Clipboard::new() {
            Ok(mut clipboard) => Self::read_clipboard(&mut clipboard),
            Err(e) => {
                log::error!("Failed to open clipboard: {}", e);
                Snapshot {
                    token: Self::EMPTY_TOKEN,
                    content: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_stable_for_equal_bytes() {
        assert_eq!(
            ArboardSource::token(b"same bytes"),
            ArboardSource::token(b"same bytes")
        );
        assert_ne!(
            ArboardSource::token(b"same bytes"),
            ArboardSource::token(b"other bytes")
        );
    }

    #[test]
    fn monitor_stop_flags_the_loop() {
        let monitor = ClipboardMonitor::new(10);
        assert!(!monitor.running.load(Ordering::SeqCst));
        monitor.stop();
        assert!(!monitor.running.load(Ordering::SeqCst));
    }

    #[test]
    fn pause_and_resume_toggle_the_flag() {
        let monitor = ClipboardMonitor::new(10);
        monitor.pause();
        assert!(monitor.paused.load(Ordering::SeqCst));
        monitor.resume();
        assert!(!monitor.paused.load(Ordering::SeqCst));
    }
}
