use std::collections::BTreeSet;
use std::path::Path;
use stubdex_api::models::Element;
use stubdex_properties::model::{COMMENT, FILE, PROPERTIES_LIST, PROPERTY};
use stubdex_properties::properties_caps;

fn kinds(element: &Element, out: &mut BTreeSet<String>) {
    out.insert(element.kind.to_string());
    for child in &element.children {
        kinds(child, out);
    }
}

#[test]
fn matcher_accepts_properties_files_only() {
    let caps = properties_caps();
    assert!(caps.matcher.supports_path(Path::new("conf/app.properties")));
    assert!(caps.matcher.supports_path(Path::new("Messages.PROPERTIES")));
    assert!(!caps.matcher.supports_path(Path::new("app.yaml")));
    assert!(!caps.matcher.supports_path(Path::new("properties")));
}

#[test]
fn parsed_kinds_are_covered_by_stub_types() {
    let caps = properties_caps();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.properties");
    let source = "# db\ndb.user=sa\ndb.url = jdbc:h2:mem \\\n    ;MODE=PG\n";
    std::fs::write(&path, source).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let root = caps.parser.parse_file(&text, &path).unwrap();
    assert_eq!(root.kind.as_str(), FILE);

    let mut seen = BTreeSet::new();
    kinds(&root, &mut seen);
    let expected: BTreeSet<String> = [FILE, PROPERTIES_LIST, PROPERTY, COMMENT]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(seen, expected);

    let types = caps.stubs.stub_types();
    let debug_names: BTreeSet<&str> = types.iter().map(|t| t.debug_name()).collect();
    assert!(debug_names.contains(FILE));
    assert!(debug_names.contains(PROPERTIES_LIST));
    assert!(debug_names.contains(PROPERTY));
    assert!(!debug_names.contains(COMMENT));

    let ids: BTreeSet<&str> = types.iter().map(|t| t.external_id()).collect();
    assert_eq!(ids.len(), types.len());
    assert!(types.iter().all(|t| t.language() == "properties"));
}

#[test]
fn continuation_lines_join_into_one_value() {
    let caps = properties_caps();
    let root = caps
        .parser
        .parse_file("db.url = jdbc:h2:mem \\\n    ;MODE=PG\n", Path::new("a.properties"))
        .unwrap();
    let list = &root.children[0];
    let property = &list.children[0];
    assert_eq!(property.kind.as_str(), PROPERTY);
    assert_eq!(property.attrs.get("key").map(String::as_str), Some("db.url"));
    assert_eq!(
        property.attrs.get("value").map(String::as_str),
        Some("jdbc:h2:mem ;MODE=PG")
    );
}
