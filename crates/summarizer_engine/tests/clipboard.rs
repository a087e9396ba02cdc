use std::fs;

use summarizer_engine::{Clipboard, ClipboardError, FileClipboard, MemoryClipboard};
use tempfile::tempdir;

#[test]
fn file_clipboard_replaces_previous_contents() {
    let dir = tempdir().unwrap();
    let mut clipboard = FileClipboard::new(dir.path().join("clipboard.txt"));

    clipboard.write_text("https://example.com/processed/1.mp4").unwrap();
    clipboard.write_text("https://example.com/processed/2.mp4").unwrap();

    let written = fs::read_to_string(clipboard.path()).unwrap();
    assert_eq!(written, "https://example.com/processed/2.mp4\n");
    // No temp files are left next to the target.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn file_clipboard_without_directory_is_unavailable() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    let mut clipboard = FileClipboard::new(blocker.join("clipboard.txt"));
    let err = clipboard.write_text("url").unwrap_err();
    assert!(matches!(err, ClipboardError::Unavailable(_)), "{err}");
}

#[test]
fn memory_clipboard_clones_share_contents() {
    let observer = MemoryClipboard::new();
    let mut writer = observer.clone();
    assert_eq!(observer.contents(), None);

    writer.write_text("https://example.com/processed/1.mp4").unwrap();
    assert_eq!(
        observer.contents().as_deref(),
        Some("https://example.com/processed/1.mp4")
    );
}

#[test]
fn denied_clipboard_rejects_writes() {
    let mut clipboard = MemoryClipboard::denied();
    let err = clipboard.write_text("url").unwrap_err();
    assert_eq!(err.to_string(), "clipboard unavailable: write permission denied");
    assert_eq!(clipboard.contents(), None);
}
