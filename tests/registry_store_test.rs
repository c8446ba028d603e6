//! Registry persistence and concurrency tests

use std::sync::Arc;
use std::thread;

use blinkguard::{MaliciousUrlEntry, RegistryMatcher, RegistryStore};
use tempfile::TempDir;

fn entry(url: &str, reason: &str) -> MaliciousUrlEntry {
    MaliciousUrlEntry::report(url, reason, "tester").unwrap()
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");

    {
        let store = RegistryStore::open(&path).unwrap();
        store.upsert(entry("http://a.example/", "one")).unwrap();
        store.upsert(entry("http://b.example/", "two")).unwrap();
        store.set_verified("http://b.example/", true).unwrap();
        store.close();
    }

    let reopened = RegistryStore::open(&path).unwrap();
    let entries = reopened.read().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].url, "http://a.example/");
    assert!(!entries[0].verified);
    assert!(entries[1].verified);
}

#[test]
fn test_upsert_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = RegistryStore::open(dir.path().join("registry.json")).unwrap();

    let e = entry("http://a.example/", "one");
    store.upsert(e.clone()).unwrap();
    store.upsert(e.clone()).unwrap();

    let entries = store.read().unwrap();
    assert_eq!(entries, vec![e]);
}

#[test]
fn test_read_reflects_last_state_of_each_key() {
    let dir = TempDir::new().unwrap();
    let store = RegistryStore::open(dir.path().join("registry.json")).unwrap();

    store.upsert(entry("http://a.example/", "first")).unwrap();
    store.set_verified("http://a.example/", true).unwrap();
    store.upsert(entry("http://b.example/", "b")).unwrap();
    // upsert replaces the whole entry, including the verified flag
    store.upsert(entry("http://a.example/", "second")).unwrap();
    store.set_verified("http://b.example/", true).unwrap();
    store.set_verified("http://b.example/", false).unwrap();

    let entries = store.read().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].reason, "second");
    assert!(!entries[0].verified);
    assert!(!entries[1].verified);
}

#[test]
fn test_file_is_pretty_camel_case_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");
    let store = RegistryStore::open(&path).unwrap();
    store.upsert(entry("http://a.example/", "r")).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"reportedBy\""));
    assert!(raw.contains("\"reportedAt\""));
    assert!(raw.contains('\n'));

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(value.is_array());
}

#[test]
fn test_concurrent_writers_lose_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RegistryStore::open(dir.path().join("registry.json")).unwrap());

    let writers: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    let url = format!("http://t{}.example/{}", t, i);
                    store.upsert(entry(&url, "spam")).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    // Never a partial file: every read parses
                    let entries = store.read().unwrap();
                    assert!(entries.len() <= 80);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    let entries = store.read().unwrap();
    assert_eq!(entries.len(), 80);
}

#[test]
fn test_concurrent_verification_of_distinct_entries() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RegistryStore::open(dir.path().join("registry.json")).unwrap());
    for i in 0..10 {
        store.upsert(entry(&format!("http://e{}.example/", i), "r")).unwrap();
    }

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                assert!(store.set_verified(&format!("http://e{}.example/", i), true).unwrap());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(store.read().unwrap().iter().all(|e| e.verified));
}

#[test]
fn test_unverified_entries_never_match() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RegistryStore::open(dir.path().join("registry.json")).unwrap());
    let matcher = RegistryMatcher::new(store.clone());

    store.upsert(entry("http://evil.example/x", "phishing")).unwrap();
    assert!(!matcher.check("http://evil.example/x").unwrap().is_malicious);

    store.set_verified("http://evil.example/x", true).unwrap();
    assert!(matcher.check("http://evil.example/x").unwrap().is_malicious);

    store.set_verified("http://evil.example/x", false).unwrap();
    assert!(!matcher.check("http://evil.example/x").unwrap().is_malicious);
}

#[test]
fn test_storage_failure_is_not_an_empty_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");
    let store = Arc::new(RegistryStore::open(&path).unwrap());
    let matcher = RegistryMatcher::new(store.clone());

    std::fs::write(&path, "[{\"truncated\":").unwrap();

    let err = matcher.check("http://evil.example/x").unwrap_err();
    assert_eq!(err.code_str(), "REGISTRY_CORRUPT");
    assert_eq!(
        store.upsert(entry("http://a.example/", "r")).unwrap_err().code_str(),
        "REGISTRY_CORRUPT"
    );
}
