use std::collections::HashSet;

use crate::index::{IndexError, RecordIndex};

/// Helper building an index holding a handful of titles
fn setup_title_index() -> RecordIndex<String, u32> {
    let mut index = RecordIndex::new();
    for (pages, title) in [(412, "Dune"), (328, "1984"), (310, "Solaris")] {
        drop(index.insert(title.to_string(), pages));
    }
    index
}

#[test]
fn test_insert_and_find() {
    let index = setup_title_index();
    assert_eq!(index.len(), 3);
    assert_eq!(index.find("Dune"), Some(&412));
    assert_eq!(index.find("Neuromancer"), None);
}

#[test]
fn test_duplicate_key_is_rejected() {
    let mut index = setup_title_index();

    let result = index.insert("Dune".to_string(), 1);
    assert_eq!(result, Err(IndexError::DuplicateKey));

    // Original value is kept and nothing was added
    assert_eq!(index.find("Dune"), Some(&412));
    assert_eq!(index.len(), 3);
}

#[test]
fn test_remove() {
    let mut index = setup_title_index();

    assert_eq!(index.remove("1984"), Some(328));
    assert_eq!(index.remove("1984"), None);
    assert!(!index.contains_key("1984"));
    assert_eq!(index.len(), 2);
}

#[test]
fn test_find_mut_updates_in_place() {
    let mut index = setup_title_index();
    if let Some(pages) = index.find_mut("Solaris") {
        *pages = 204;
    }
    assert_eq!(index.find("Solaris"), Some(&204));
}

#[test]
fn test_single_bucket_chains_collisions() {
    // Every key lands in one chain until the table grows
    let mut index: RecordIndex<u64, u64> = RecordIndex::with_buckets(1);
    assert!(index.insert(1, 10).is_ok());
    assert!(index.insert(2, 20).is_ok());
    assert_eq!(index.bucket_count(), 1);

    assert_eq!(index.find(&1), Some(&10));
    assert_eq!(index.find(&2), Some(&20));
    assert_eq!(index.remove(&1), Some(10));
    assert_eq!(index.find(&2), Some(&20));
}

#[test]
fn test_growth_keeps_every_entry() {
    let mut index: RecordIndex<u64, u64> = RecordIndex::with_buckets(2);
    for key in 0..500 {
        assert!(index.insert(key, key * 2).is_ok());
    }
    assert!(index.bucket_count() > 2);
    assert_eq!(index.len(), 500);
    for key in 0..500 {
        assert_eq!(index.find(&key), Some(&(key * 2)));
    }
}

#[test]
fn test_iteration_is_restartable() {
    let index = setup_title_index();

    let first: HashSet<&String> = index.iter().map(|(k, _)| k).collect();
    let second: HashSet<&String> = index.iter().map(|(k, _)| k).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(index.values().sum::<u32>(), 412 + 328 + 310);
}

#[test]
fn test_zero_buckets_is_clamped() {
    let mut index: RecordIndex<&str, ()> = RecordIndex::with_buckets(0);
    assert_eq!(index.bucket_count(), 1);
    assert!(index.insert("only", ()).is_ok());
    assert!(index.contains_key("only"));
    assert!(!index.is_empty());
}
