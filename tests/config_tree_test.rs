//! Tests for ConfigTree parsing, querying and serialization

use rstest::rstest;

use bootscrub::domain::{ConfigPath, ConfigTree, DomainError, NodeKind, ParseErrorKind};
use bootscrub::util::testing;

const FIXTURE: &str = include_str!("resources/config.boot");

fn path(segments: &[&str]) -> ConfigPath {
    ConfigPath::from(segments)
}

// ============================================================
// Round trip
// ============================================================

#[test]
fn given_fixture_when_serialized_and_reparsed_then_tree_is_equivalent() {
    testing::init_test_setup();
    let tree = ConfigTree::parse(FIXTURE).unwrap();

    let reparsed = ConfigTree::parse(&tree.serialize()).unwrap();

    assert_eq!(tree, reparsed);
}

#[test]
fn given_serialized_tree_when_serialized_again_then_text_is_stable() {
    let first = ConfigTree::parse(FIXTURE).unwrap().serialize();
    let second = ConfigTree::parse(&first).unwrap().serialize();
    assert_eq!(first, second);
}

#[test]
fn given_messy_whitespace_when_parsed_then_serializes_normalized() {
    let input = "system{\n\thost-name   vyos\n  name-server 1.1.1.1 }\n";
    let tree = ConfigTree::parse(input).unwrap();
    assert_eq!(
        tree.serialize(),
        "system {\n    host-name vyos\n    name-server 1.1.1.1\n}\n"
    );
}

#[test]
fn given_comments_and_footer_when_round_tripped_then_preserved() {
    let tree = ConfigTree::parse(FIXTURE).unwrap();
    let text = tree.serialize();

    assert!(text.contains("    /* upstream resolvers */\n    name-server 1.1.1.1\n"));
    assert!(text.ends_with(
        "// vyos-config-version: \"bgp@5:broadcast-relay@4:system@27\"\n// Release version: 1.4.0\n"
    ));
    assert_eq!(tree.footer().len(), 3);
}

#[test]
fn given_quoted_values_when_round_tripped_then_values_survive() {
    let tree = ConfigTree::parse(FIXTURE).unwrap();
    let reparsed = ConfigTree::parse(&tree.serialize()).unwrap();

    let description = path(&["interfaces", "ethernet", "eth0", "description"]);
    let empty = path(&[
        "system",
        "login",
        "user",
        "vyos",
        "authentication",
        "plaintext-password",
    ]);
    assert_eq!(reparsed.return_value(&description), Some("WAN uplink"));
    assert_eq!(reparsed.return_value(&empty), Some(""));
}

// ============================================================
// Structure
// ============================================================

#[test]
fn given_tag_blocks_when_parsed_then_merged_under_one_tag_node_in_order() {
    let tree = ConfigTree::parse(FIXTURE).unwrap();

    let ethernet = tree.get(&path(&["interfaces", "ethernet"])).unwrap();
    assert_eq!(ethernet.kind, NodeKind::Tag);
    assert_eq!(
        tree.list_nodes(&path(&["interfaces", "ethernet"])).unwrap(),
        vec!["eth0", "eth1", "eth2"]
    );
    assert_eq!(
        tree.list_nodes(&path(&["interfaces"])).unwrap(),
        vec!["ethernet", "loopback"]
    );
}

#[test]
fn given_repeated_leaf_when_parsed_then_list_keeps_order() {
    let tree = ConfigTree::parse(FIXTURE).unwrap();
    assert_eq!(
        tree.return_values(&path(&["system", "name-server"])),
        vec!["1.1.1.1", "8.8.8.8"]
    );
}

#[test]
fn given_valueless_leaf_when_parsed_then_exists_without_value() {
    let tree = ConfigTree::parse(FIXTURE).unwrap();
    let disable = path(&["interfaces", "ethernet", "eth2", "disable"]);

    assert!(tree.exists(&disable));
    assert_eq!(tree.return_value(&disable), None);
    assert!(tree.get(&disable).unwrap().is_leaf());
}

#[test]
fn given_empty_document_when_parsed_then_tree_is_empty() {
    let tree = ConfigTree::parse("\n\n").unwrap();
    assert_eq!(tree.node_count(), 0);
    assert!(tree.list_nodes(&ConfigPath::root()).unwrap().is_empty());
    assert_eq!(tree.serialize(), "");
}

#[test]
fn given_all_tag_children_deleted_when_serialized_then_reparses_equivalent() {
    let mut tree = ConfigTree::parse("interfaces {\n    loopback lo {\n    }\n}\n").unwrap();
    tree.delete(&path(&["interfaces", "loopback", "lo"])).unwrap();

    let text = tree.serialize();
    let reparsed = ConfigTree::parse(&text).unwrap();

    assert_eq!(text, "interfaces {\n    loopback {\n    }\n}\n");
    assert_eq!(tree, reparsed);
}

// ============================================================
// Queries and deletion
// ============================================================

#[test]
fn given_missing_intermediate_when_checking_exists_then_false() {
    let tree = ConfigTree::parse(FIXTURE).unwrap();
    assert!(!tree.exists(&path(&["protocols", "bgp", "65000"])));
    assert!(!tree.exists(&path(&["interfaces", "ethernet", "eth9", "hw-id"])));
}

#[test]
fn given_missing_path_when_listing_then_not_found() {
    let tree = ConfigTree::parse(FIXTURE).unwrap();
    let missing = path(&["interfaces", "bonding"]);
    assert_eq!(
        tree.list_nodes(&missing),
        Err(DomainError::NotFound(missing.clone()))
    );
}

#[test]
fn given_subtree_when_deleted_then_siblings_untouched_and_order_kept() {
    let mut tree = ConfigTree::parse(FIXTURE).unwrap();
    let before = tree.node_count();

    tree.delete(&path(&["interfaces", "ethernet", "eth1"])).unwrap();

    assert_eq!(tree.node_count(), before - 3);
    assert_eq!(
        tree.list_nodes(&path(&["interfaces", "ethernet"])).unwrap(),
        vec!["eth0", "eth2"]
    );
    assert!(tree.exists(&path(&["interfaces", "ethernet", "eth0", "offload", "gro"])));
}

#[test]
fn given_deleted_node_when_deleted_again_then_not_found() {
    let mut tree = ConfigTree::parse(FIXTURE).unwrap();
    let eth2 = path(&["interfaces", "ethernet", "eth2"]);

    tree.delete(&eth2).unwrap();

    assert_eq!(tree.delete(&eth2), Err(DomainError::NotFound(eth2.clone())));
}

// ============================================================
// Parse errors
// ============================================================

#[rstest]
#[case::unclosed_block("system {\n    host-name vyos\n", 2, ParseErrorKind::UnexpectedEof(1))]
#[case::stray_close("system {\n}\n}\n", 3, ParseErrorKind::UnbalancedBrace)]
#[case::duplicate_block(
    "system {\n}\nsystem {\n}\n",
    3,
    ParseErrorKind::DuplicateNode("system".into())
)]
#[case::duplicate_tag_child(
    "interfaces {\n    ethernet eth0 {\n    }\n    ethernet eth0 {\n    }\n}\n",
    4,
    ParseErrorKind::DuplicateNode("ethernet eth0".into())
)]
#[case::leaf_and_block(
    "system {\n    host-name vyos\n    host-name {\n    }\n}\n",
    3,
    ParseErrorKind::DuplicateNode("host-name".into())
)]
#[case::repeated_valueless_leaf(
    "system {\n    disable\n    disable\n}\n",
    3,
    ParseErrorKind::DuplicateNode("disable".into())
)]
#[case::too_many_words("system {\n    host-name vyos router\n}\n", 2, ParseErrorKind::InvalidToken("router".into()))]
#[case::brace_without_name("{\n}\n", 1, ParseErrorKind::InvalidToken("{".into()))]
#[case::unterminated_string("system {\n    host-name \"vyos\n}\n", 2, ParseErrorKind::UnterminatedString)]
#[case::unterminated_comment("/* never closed\nsystem {\n}\n", 1, ParseErrorKind::UnterminatedComment)]
fn given_malformed_input_when_parsing_then_reports_kind_and_line(
    #[case] input: &str,
    #[case] line: usize,
    #[case] kind: ParseErrorKind,
) {
    let err = ConfigTree::parse(input).unwrap_err();
    match err {
        DomainError::Parse(parse) => {
            assert_eq!(parse.kind, kind);
            assert_eq!(parse.line, line);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}
