//! Post-lowering normalization.
//!
//! Three rewrites, all operating on the arena before registration:
//! - field blocks without a `value` get a synthesized `@self` reference
//! - pipelines whose input is itself a pipeline are collapsed into one
//! - nested `AND`/`OR` chains of the same kind are flattened
//!
//! Rewrites only touch operand lists, so nodes orphaned by a collapse simply
//! become unreachable and are dropped at registration.

use indexmap::IndexMap;
use serde_json::Value;

use formwork_core::{
    BlockKind, IdCategory, IdGenerator, Node, NodeId, Operand, Payload, PredicateKind,
    PredicatePayload, ReferenceNode,
};

pub const SELF_ROOT: &str = "@self";
pub const SCOPE_ROOT: &str = "@scope";

pub fn normalize(ids: &mut IdGenerator, arena: &mut IndexMap<NodeId, Node>) {
    inject_self_values(ids, arena);
    collapse_pipelines(arena);
    flatten_composites(arena);
}

/// Every field block exposes its own value; authors rarely spell that out,
/// so a missing `value` becomes `REFERENCE(["@self"])`.
fn inject_self_values(ids: &mut IdGenerator, arena: &mut IndexMap<NodeId, Node>) {
    let targets: Vec<NodeId> = arena
        .iter()
        .filter(|(_, node)| {
            matches!(
                &node.payload,
                Payload::Block(block) if block.kind == BlockKind::Field && block.value.is_none()
            )
        })
        .map(|(id, _)| id.clone())
        .collect();

    for block_id in targets {
        let reference = ids.next(IdCategory::CompileAst);
        arena.insert(
            reference.clone(),
            Node::new(
                reference.clone(),
                Payload::Reference(ReferenceNode {
                    path: vec![SELF_ROOT.to_owned()],
                    base: None,
                }),
                Value::Null,
            ),
        );
        if let Some(node) = arena.get_mut(&block_id)
            && let Payload::Block(block) = &mut node.payload
        {
            block.value = Some(Operand::Node(reference));
        }
    }
}

/// `PIPELINE(PIPELINE(i, s2), s1)` evaluates identically to
/// `PIPELINE(i, s2 ++ s1)`; collapse until no pipeline feeds another.
fn collapse_pipelines(arena: &mut IndexMap<NodeId, Node>) {
    loop {
        let mut rewrite: Option<(NodeId, Operand, Vec<NodeId>)> = None;
        for (id, node) in arena.iter() {
            let Payload::Pipeline(outer) = &node.payload else {
                continue;
            };
            let Some(inner_id) = outer.input.as_node() else {
                continue;
            };
            if let Some(inner_node) = arena.get(inner_id)
                && let Payload::Pipeline(inner) = &inner_node.payload
            {
                let mut steps = inner.steps.clone();
                steps.extend(outer.steps.iter().cloned());
                rewrite = Some((id.clone(), inner.input.clone(), steps));
                break;
            }
        }
        let Some((id, input, steps)) = rewrite else {
            return;
        };
        if let Some(node) = arena.get_mut(&id)
            && let Payload::Pipeline(outer) = &mut node.payload
        {
            outer.input = input;
            outer.steps = steps;
        }
    }
}

/// `AND(AND(a, b), c)` becomes `AND(a, b, c)`; same for `OR`. `XOR` keeps
/// its nesting because "exactly one truthy" is not associative.
fn flatten_composites(arena: &mut IndexMap<NodeId, Node>) {
    loop {
        let mut rewrite: Option<(NodeId, Vec<Operand>)> = None;
        'outer: for (id, node) in arena.iter() {
            let Payload::Predicate(PredicatePayload::Composite { kind, operands }) = &node.payload
            else {
                continue;
            };
            if !matches!(*kind, PredicateKind::And | PredicateKind::Or) {
                continue;
            }
            for operand in operands {
                let Some(child_id) = operand.as_node() else {
                    continue;
                };
                let Some(child) = arena.get(child_id) else {
                    continue;
                };
                if let Payload::Predicate(PredicatePayload::Composite {
                    kind: child_kind, ..
                }) = &child.payload
                    && child_kind == kind
                {
                    rewrite = Some((id.clone(), flattened_operands(arena, operands, *kind)));
                    break 'outer;
                }
            }
        }
        let Some((id, operands)) = rewrite else {
            return;
        };
        if let Some(node) = arena.get_mut(&id)
            && let Payload::Predicate(PredicatePayload::Composite {
                operands: existing, ..
            }) = &mut node.payload
        {
            *existing = operands;
        }
    }
}

fn flattened_operands(
    arena: &IndexMap<NodeId, Node>,
    operands: &[Operand],
    kind: PredicateKind,
) -> Vec<Operand> {
    let mut out = Vec::with_capacity(operands.len());
    for operand in operands {
        if let Some(child_id) = operand.as_node()
            && let Some(child) = arena.get(child_id)
            && let Payload::Predicate(PredicatePayload::Composite {
                kind: child_kind,
                operands: child_operands,
            }) = &child.payload
            && *child_kind == kind
        {
            out.extend(flattened_operands(arena, child_operands, kind));
        } else {
            out.push(operand.clone());
        }
    }
    out
}
