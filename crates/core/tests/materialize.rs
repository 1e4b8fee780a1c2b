mod common;

use common::Corpus;
use stubdex_api::StubError;
use stubdex_api::models::{Element, StubId};
use stubdex_core::StubdexError;

const SOURCE: &str = "# database\ndb.url = jdbc:h2:mem\ndb.user=sa\n";

#[tokio::test]
async fn proxy_and_full_views_of_a_hit() {
    let corpus = Corpus::new();
    let path = corpus.write("app.properties", SOURCE);
    let manager = corpus.manager();
    manager.rebuild().await.unwrap();

    let hit = manager.lookup("db.user").await.remove(0);
    let handle = manager.materialize(&hit).await.unwrap();
    assert_eq!(handle.file().path, path);
    assert_eq!(handle.stub().unwrap().id(), hit.owner);

    let proxy = handle.proxy().unwrap();
    assert_eq!(proxy.kind.as_str(), "PROPERTY");
    assert_eq!(proxy.attr("key"), Some("db.user"));
    assert_eq!(proxy.attr("value"), Some("sa"));
    assert!(proxy.range.is_none());
    assert!(!handle.is_parsed());

    let full = handle.full().unwrap();
    assert!(handle.is_parsed());
    let range = full.range.unwrap();
    assert_eq!(&SOURCE[range.start as usize..range.end as usize], "db.user=sa");
    assert!(full.content_eq(&proxy));
    handle.release();
}

#[tokio::test]
async fn stub_round_trip_matches_parse_modulo_comments() {
    let corpus = Corpus::new();
    let path = corpus.write("app.properties", SOURCE);
    let manager = corpus.manager();
    manager.rebuild().await.unwrap();

    let tree = manager.stub_tree(&path).await.unwrap();
    let rebuilt = manager.materializer().proxy(&tree, StubId::ROOT).unwrap();

    let parsed = stubdex_properties::parse(SOURCE).unwrap();
    let without_comments = strip(&parsed, "COMMENT");
    assert!(rebuilt.content_eq(&without_comments));
}

#[tokio::test]
async fn edited_file_makes_full_view_stale() {
    let corpus = Corpus::new();
    let path = corpus.write("app.properties", SOURCE);
    let manager = corpus.manager();
    manager.rebuild().await.unwrap();

    let hit = manager.lookup("db.url").await.remove(0);
    let handle = manager.materialize(&hit).await.unwrap();
    std::fs::write(&path, "db.url=changed\n").unwrap();

    // The proxy only needs the stub.
    assert_eq!(handle.proxy().unwrap().attr("value"), Some("jdbc:h2:mem"));
    assert!(matches!(
        handle.full(),
        Err(StubdexError::Stub(StubError::StaleStub { .. }))
    ));

    manager.update_files(vec![path]).await.unwrap();
    assert!(matches!(
        manager.materialize(&hit).await,
        Err(StubdexError::Stub(StubError::StaleStub { .. }))
    ));
}

fn strip(element: &Element, kind: &str) -> Element {
    let mut out = element.clone();
    out.children = element
        .children
        .iter()
        .filter(|c| c.kind.as_str() != kind)
        .map(|c| strip(c, kind))
        .collect();
    out
}
