mod common;

use common::{Corpus, caps_with_comments, decode_failing_caps, tweaked_caps};
use stubdex_api::StubError;
use stubdex_core::index::IndexStore;
use stubdex_core::stub::deserialize;
use stubdex_core::{StubdexError, content_hash};

#[tokio::test]
async fn saved_index_loads_into_a_new_manager() {
    let corpus = Corpus::new();
    let path = corpus.write("a.properties", "greeting=hello\n");
    {
        let manager = corpus.manager();
        manager.rebuild().await.unwrap();
        manager.save().await.unwrap();
    }

    let manager = corpus.manager();
    let report = manager.load().await.unwrap();
    assert!(report.loaded);
    assert!(report.outdated_kinds.is_empty());
    assert!(report.invalidated_files.is_empty());

    let hits = manager.lookup("greeting").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file.path, path);

    let tree = manager.stub_tree(&path).await.unwrap();
    assert_eq!(tree.len(), 3);
    assert!(manager.refresh().await.unwrap().is_noop());
}

#[tokio::test]
async fn version_bump_rebuilds_every_file_of_that_kind() {
    let corpus = Corpus::new();
    let a = corpus.write("a.properties", "a=1\n");
    let b = corpus.write("b.properties", "b=2\n");
    let empty = corpus.write("empty.properties", "# nothing here\n");

    let hash_of_a;
    {
        let manager = corpus.manager_with(tweaked_caps(1, false));
        manager.rebuild().await.unwrap();
        manager.save().await.unwrap();
        hash_of_a = manager.snapshot().await.file(&a).unwrap().identity.content_hash;
    }

    let manager = corpus.manager_with(tweaked_caps(2, false));

    // Old bytes no longer decode against the bumped registry.
    let store = IndexStore::new(manager.index_dir());
    let old_bytes = store.read_stub(&a, hash_of_a).unwrap();
    assert!(matches!(
        deserialize(&old_bytes, manager.registry()),
        Err(StubError::FormatMismatch(_))
    ));

    let report = manager.load().await.unwrap();
    assert!(report.loaded);
    assert_eq!(report.outdated_kinds, vec!["properties.property".to_string()]);
    let mut invalidated = report.invalidated_files.clone();
    invalidated.sort();
    assert_eq!(invalidated, vec![a.clone(), b.clone()]);
    assert!(manager.lookup("a").await.is_empty());
    // A file without properties holds no stubs of the bumped kind.
    assert!(manager.snapshot().await.file(&empty).is_some());

    let refreshed = manager.refresh().await.unwrap();
    let mut indexed = refreshed.indexed.clone();
    indexed.sort();
    assert_eq!(indexed, vec![a.clone(), b.clone()]);

    let snapshot = manager.snapshot().await;
    for path in [&a, &b] {
        let record = snapshot.file(path).unwrap();
        assert_eq!(record.stamps.get("properties.property"), Some(&2));
    }
    assert_eq!(manager.lookup("b").await.len(), 1);
    assert!(manager.stub_tree(&a).await.is_ok());
}

#[tokio::test]
async fn corrupt_stub_only_affects_its_own_file() {
    let corpus = Corpus::new();
    let a = corpus.write("a.properties", "alpha=1\n");
    let b = corpus.write("b.properties", "beta=2\n");
    {
        let manager = corpus.manager();
        manager.rebuild().await.unwrap();
        manager.save().await.unwrap();
    }

    let manager = corpus.manager();
    manager.load().await.unwrap();

    let stub_path = IndexStore::new(manager.index_dir()).stub_path(&a);
    let bytes = std::fs::read(&stub_path).unwrap();
    std::fs::write(&stub_path, &bytes[..bytes.len() - 3]).unwrap();

    let err = manager.stub_tree(&a).await.unwrap_err();
    assert!(matches!(err, StubdexError::Stub(StubError::FormatMismatch(_))));
    assert!(manager.lookup("alpha").await.is_empty());
    assert!(manager.dirty_files().contains(&a));

    let hits = manager.lookup("beta").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file.path, b);
    assert!(manager.stub_tree(&b).await.is_ok());

    let report = manager.refresh().await.unwrap();
    assert_eq!(report.indexed, vec![a.clone()]);
    assert_eq!(manager.lookup("alpha").await.len(), 1);
    assert!(manager.stub_tree(&a).await.is_ok());
}

#[tokio::test]
async fn stub_of_edited_file_is_rejected() {
    let corpus = Corpus::new();
    let a = corpus.write("a.properties", "alpha=1\n");
    {
        let manager = corpus.manager();
        manager.rebuild().await.unwrap();
        manager.save().await.unwrap();
    }

    // The stub on disk belongs to other content than the saved record.
    let manager = corpus.manager();
    manager.load().await.unwrap();
    let store = IndexStore::new(manager.index_dir());
    store.write_stub(&a, 1, b"STB1").unwrap();

    assert!(manager.stub_tree(&a).await.is_err());
    assert!(manager.snapshot().await.file(&a).is_none());
}

#[tokio::test]
async fn unregistered_kind_invalidates_only_files_that_used_it() {
    let corpus = Corpus::new();
    let commented = corpus.write("commented.properties", "# note\nfirst=1\n");
    let plain = corpus.write("plain.properties", "second=2\n");
    {
        let manager = corpus.manager_with(caps_with_comments());
        manager.rebuild().await.unwrap();
        let stats = manager.stats().await;
        assert_eq!(stats.stubs_per_kind.get("properties.comment"), Some(&1));
        manager.save().await.unwrap();
    }

    let manager = corpus.manager();
    let store = IndexStore::new(manager.index_dir());
    let bytes = store
        .read_stub(&commented, content_hash(b"# note\nfirst=1\n"))
        .unwrap();
    assert!(matches!(
        deserialize(&bytes, manager.registry()),
        Err(StubError::UnknownKind { .. })
    ));

    let report = manager.load().await.unwrap();
    assert_eq!(report.outdated_kinds, vec!["properties.comment".to_string()]);
    assert_eq!(report.invalidated_files, vec![commented.clone()]);
    assert!(manager.lookup("first").await.is_empty());
    assert!(!store.stub_path(&commented).exists());

    let hits = manager.lookup("second").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file.path, plain);
    assert!(manager.stub_tree(&plain).await.is_ok());

    let report = manager.refresh().await.unwrap();
    assert_eq!(report.indexed, vec![commented.clone()]);
    assert_eq!(report.unchanged, 1);
    assert_eq!(manager.lookup("first").await.len(), 1);
}

#[tokio::test]
async fn undecodable_payload_drops_its_subtree_and_queues_the_file() {
    let corpus = Corpus::new();
    let path = corpus.write("a.properties", "good=1\nbad=2\nalso.good=3\n");
    {
        let manager = corpus.manager_with(decode_failing_caps("bad"));
        manager.rebuild().await.unwrap();
        manager.save().await.unwrap();
    }

    let manager = corpus.manager_with(decode_failing_caps("bad"));
    manager.load().await.unwrap();

    let tree = manager.stub_tree(&path).await.unwrap();
    assert_eq!(tree.len(), 4);
    assert!(manager.dirty_files().contains(&path));
    assert_eq!(manager.lookup("bad").await.len(), 1);

    let hit = manager.lookup("good").await.remove(0);
    let err = manager.materialize(&hit).await.unwrap_err();
    assert!(matches!(err, StubdexError::Stub(StubError::StaleStub { .. })));
}
