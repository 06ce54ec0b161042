//! Session store behaviour: registration, one-time consumption, cleanup.

use std::fs;

use fotograma::{FotogramaError, SessionStore};
use tempfile::tempdir;

#[test]
fn consume_returns_encoded_frames_and_deletes_the_directory() {
    let root = tempdir().expect("tempdir");
    let frames_dir = root.path().join("session-a");
    fs::create_dir(&frames_dir).expect("create frames dir");
    fs::write(frames_dir.join("frame_one.jpg"), b"hello").expect("write frame");
    fs::write(frames_dir.join("frame_two.jpg"), b"world").expect("write frame");

    let store = SessionStore::new();
    store.register("session-a".to_string(), frames_dir.clone());
    assert_eq!(store.len(), 1);

    let frames = store.consume("session-a").expect("consume");

    assert_eq!(frames.len(), 2);
    assert_eq!(frames["frame_one.jpg"], "aGVsbG8=");
    assert_eq!(frames["frame_two.jpg"], "d29ybGQ=");
    assert!(!frames_dir.exists(), "frame directory should be deleted");
    assert!(store.is_empty(), "entry should be removed");
}

#[test]
fn a_session_is_consumable_exactly_once() {
    let root = tempdir().expect("tempdir");
    let frames_dir = root.path().join("session-b");
    fs::create_dir(&frames_dir).expect("create frames dir");
    fs::write(frames_dir.join("frame.jpg"), b"x").expect("write frame");

    let store = SessionStore::new();
    store.register("session-b".to_string(), frames_dir);

    assert!(store.consume("session-b").is_ok());

    let err = store.consume("session-b").unwrap_err();
    assert!(matches!(err, FotogramaError::SessionNotFound(_)));
}

#[test]
fn unknown_session_is_not_found() {
    let store = SessionStore::new();
    let err = store.consume("no-such-session").unwrap_err();
    assert!(matches!(err, FotogramaError::SessionNotFound(_)));
}

#[test]
fn take_removes_the_entry_atomically() {
    let store = SessionStore::new();
    store.register("session-c".to_string(), "somewhere".into());

    assert!(store.take("session-c").is_some());
    assert!(store.take("session-c").is_none());
}

#[test]
fn consume_skips_subdirectories() {
    let root = tempdir().expect("tempdir");
    let frames_dir = root.path().join("session-d");
    fs::create_dir_all(frames_dir.join("nested")).expect("create dirs");
    fs::write(frames_dir.join("frame.jpg"), b"x").expect("write frame");

    let store = SessionStore::new();
    store.register("session-d".to_string(), frames_dir.clone());

    let frames = store.consume("session-d").expect("consume");
    assert_eq!(frames.len(), 1);
    assert!(!frames_dir.exists());
}

#[test]
fn an_empty_session_yields_an_empty_map() {
    let root = tempdir().expect("tempdir");
    let frames_dir = root.path().join("session-e");
    fs::create_dir(&frames_dir).expect("create frames dir");

    let store = SessionStore::new();
    store.register("session-e".to_string(), frames_dir.clone());

    let frames = store.consume("session-e").expect("consume");
    assert!(frames.is_empty());
    assert!(!frames_dir.exists());
}
