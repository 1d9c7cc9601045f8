use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct CountingProcess {
    kills: Arc<AtomicUsize>,
}

impl StreamProcess for CountingProcess {
    fn id(&self) -> Option<u32> {
        Some(42)
    }

    fn kill(&mut self) -> Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn record(video_ssrc: u32) -> SessionRecord {
    SessionRecord::new(
        "10.0.0.2".parse().unwrap(),
        51000,
        51002,
        None,
        None,
        video_ssrc,
        video_ssrc + 1,
    )
}

#[test]
fn test_session_id_display() {
    let id = SessionId::new([0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(id.to_string(), "deadbeef");
    assert_eq!(format!("{id:?}"), "SessionId(deadbeef)");
}

#[test]
fn test_key_material() {
    let keys = SrtpKeys {
        master_key: Bytes::from_static(&[0x01, 0x02]),
        master_salt: Bytes::from_static(&[0x03]),
    };
    assert_eq!(&keys.key_material()[..], &[0x01, 0x02, 0x03]);
}

#[test]
fn test_store_insert_lookup_remove() {
    let mut store = SessionStore::new();
    let id = SessionId::new([0x01]);
    assert!(store.insert(id.clone(), record(100)).is_none());

    let stored = store.lookup(&id).unwrap();
    assert_eq!(stored.video_port, 51000);
    assert_eq!(stored.ip_version, IpVersion::V4);
    assert_eq!(stored.state(), SessionState::Configured);
    assert!(store.ssrc_in_use(100));
    assert!(store.ssrc_in_use(101));
    assert!(!store.ssrc_in_use(102));

    assert!(store.remove(&id).is_some());
    assert!(store.is_empty());
    assert_eq!(
        store.lookup(&id).unwrap_err(),
        Error::ErrUnknownSession("01".to_string())
    );
}

#[test]
fn test_insert_overwrites_and_releases_process() {
    let kills = Arc::new(AtomicUsize::new(0));
    let mut store = SessionStore::new();
    let id = SessionId::new([0x07]);

    store.insert(id.clone(), record(100));
    store.lookup_mut(&id).unwrap().attach(Box::new(CountingProcess {
        kills: Arc::clone(&kills),
    }));
    assert_eq!(store.streaming_count(), 1);
    assert_eq!(store.lookup(&id).unwrap().process_id(), Some(42));

    let previous = store.insert(id.clone(), record(200));
    assert!(previous.is_some());
    drop(previous);
    assert_eq!(kills.load(Ordering::SeqCst), 1);

    assert_eq!(store.len(), 1);
    assert_eq!(store.streaming_count(), 0);
    assert_eq!(store.lookup(&id).unwrap().video_ssrc, 200);
}

#[test]
fn test_detached_process_not_killed_on_drop() {
    let kills = Arc::new(AtomicUsize::new(0));
    let mut rec = record(100);
    rec.attach(Box::new(CountingProcess {
        kills: Arc::clone(&kills),
    }));
    assert_eq!(rec.state(), SessionState::Streaming);

    let process = rec.detach();
    assert!(process.is_some());
    drop(rec);
    assert_eq!(kills.load(Ordering::SeqCst), 0);
}
