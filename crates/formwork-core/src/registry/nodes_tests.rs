use serde_json::json;

use crate::id::{IdCategory, IdGenerator};
use crate::node::{Node, NodeType, Payload, PseudoKind, PseudoNode};
use crate::registry::NodeRegistry;
use crate::RegistryError;

fn pseudo(ids: &mut IdGenerator, kind: PseudoKind, key: &str) -> Node {
    Node::new(
        ids.next(IdCategory::CompilePseudo),
        Payload::Pseudo(PseudoNode {
            kind,
            key: key.to_owned(),
            field: None,
        }),
        json!(null),
    )
}

#[test]
fn register_then_lookup() {
    let mut ids = IdGenerator::new();
    let mut registry = NodeRegistry::new();

    let node = pseudo(&mut ids, PseudoKind::Data, "goal");
    let id = node.id.clone();
    registry.register(node).unwrap();

    assert!(registry.has(&id));
    assert_eq!(registry.get(&id).unwrap().node_type(), NodeType::Pseudo);
    assert_eq!(registry.len(), 1);
}

#[test]
fn duplicate_id_is_rejected() {
    let mut ids = IdGenerator::new();
    let mut registry = NodeRegistry::new();

    let node = pseudo(&mut ids, PseudoKind::Data, "goal");
    let twin = node.clone();
    registry.register(node).unwrap();

    let err = registry.register(twin).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateNode(_)));
}

#[test]
fn find_by_type_returns_exactly_the_matching_set() {
    let mut ids = IdGenerator::new();
    let mut registry = NodeRegistry::new();

    let first = pseudo(&mut ids, PseudoKind::Data, "a");
    let second = pseudo(&mut ids, PseudoKind::Query, "b");
    let expected = vec![first.id.clone(), second.id.clone()];
    registry.register(first).unwrap();
    registry.register(second).unwrap();

    let found: Vec<_> = registry.find_by_type(NodeType::Pseudo).cloned().collect();
    assert_eq!(found, expected);
    assert_eq!(registry.find_by_type(NodeType::Journey).count(), 0);
}
