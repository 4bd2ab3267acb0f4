//! Pseudo-node synthesis.
//!
//! References to external inputs (answers, data, request fields) have no
//! producing node in the authored tree. For each distinct `(source root,
//! key)` pair a placeholder source node is synthesized into the step overlay
//! and wired as a dependency of the referencing node, so cache invalidation
//! can cascade from external writes.

use indexmap::IndexMap;

use formwork_core::{
    BlockKind, IdCategory, IdGenerator, Node, NodeId, NodeType, Payload, PseudoKind, PseudoNode,
};
use formwork_graph::{EdgeKind, EdgeMeta, OverlayGraph};

use crate::artifact::ArtifactNodes;
use crate::normalize::{SCOPE_ROOT, SELF_ROOT};

pub fn synthesize_pseudo_nodes(
    ids: &mut IdGenerator,
    nodes: &mut ArtifactNodes,
    graph: &mut OverlayGraph,
    current_step: &NodeId,
) -> IndexMap<(PseudoKind, String), NodeId> {
    let field_codes = current_step_fields(nodes, current_step);

    // (reference id, kind, key, owning field) for every external reference.
    let mut wanted: Vec<(NodeId, PseudoKind, String, Option<NodeId>)> = Vec::new();
    for reference_id in nodes.find_by_type(NodeType::Expression) {
        let Some(node) = nodes.get(reference_id) else {
            continue;
        };
        let Payload::Reference(reference) = &node.payload else {
            continue;
        };
        if reference.base.is_some() {
            continue;
        }
        let Some((kind, key, field)) = classify(&reference.path, &field_codes) else {
            continue;
        };
        wanted.push((reference_id.clone(), kind, key, field));
    }

    let mut index: IndexMap<(PseudoKind, String), NodeId> = IndexMap::new();
    for (reference_id, kind, key, field) in wanted {
        let pseudo_id = get_or_create(ids, nodes, graph, &mut index, kind, &key, field);
        graph.add_edge(
            pseudo_id,
            reference_id,
            EdgeKind::DataFlow,
            EdgeMeta::property("source"),
        );
    }

    // Every field of the current step is fed by its answer, even when the
    // field's value is only the implicit `@self` reference. The edge is what
    // lets answer writes invalidate cached field blocks.
    for (code, block_id) in &field_codes {
        let pseudo_id = get_or_create(
            ids,
            nodes,
            graph,
            &mut index,
            PseudoKind::AnswerLocal,
            code,
            Some(block_id.clone()),
        );
        graph.add_edge(
            pseudo_id,
            block_id.clone(),
            EdgeKind::DataFlow,
            EdgeMeta::property("answer"),
        );
    }
    index
}

fn get_or_create(
    ids: &mut IdGenerator,
    nodes: &mut ArtifactNodes,
    graph: &mut OverlayGraph,
    index: &mut IndexMap<(PseudoKind, String), NodeId>,
    kind: PseudoKind,
    key: &str,
    field: Option<NodeId>,
) -> NodeId {
    if let Some(existing) = index.get(&(kind, key.to_owned())) {
        return existing.clone();
    }
    let id = ids.next(IdCategory::CompilePseudo);
    let node = Node::new(
        id.clone(),
        Payload::Pseudo(PseudoNode {
            kind,
            key: key.to_owned(),
            field,
        }),
        serde_json::Value::Null,
    );
    if nodes.register_overlay(node).is_ok() {
        graph.add_node(id.clone());
    }
    index.insert((kind, key.to_owned()), id.clone());
    id
}

/// Map a reference's root segment to the pseudo-node kind backing it.
fn classify(
    path: &[String],
    field_codes: &IndexMap<String, NodeId>,
) -> Option<(PseudoKind, String, Option<NodeId>)> {
    let root = path.first()?;
    if root == SELF_ROOT || root == SCOPE_ROOT {
        return None;
    }
    let key = path.get(1)?.clone();
    match root.as_str() {
        "answers" => match field_codes.get(&key) {
            Some(field) => Some((PseudoKind::AnswerLocal, key, Some(field.clone()))),
            None => Some((PseudoKind::AnswerRemote, key, None)),
        },
        "data" => Some((PseudoKind::Data, key, None)),
        "post" => Some((PseudoKind::Post, key, None)),
        "query" => Some((PseudoKind::Query, key, None)),
        "params" => Some((PseudoKind::Params, key, None)),
        _ => None,
    }
}

/// Field codes of the current step, mapped to their block ids.
fn current_step_fields(
    nodes: &ArtifactNodes,
    current_step: &NodeId,
) -> IndexMap<String, NodeId> {
    let mut out = IndexMap::new();
    let Some(step) = nodes.get(current_step) else {
        return out;
    };
    let Payload::Step(step) = &step.payload else {
        return out;
    };
    for block_id in &step.blocks {
        if let Some(block_node) = nodes.get(block_id)
            && let Payload::Block(block) = &block_node.payload
            && block.kind == BlockKind::Field
            && let Some(code) = &block.code
        {
            out.insert(code.clone(), block_id.clone());
        }
    }
    out
}
