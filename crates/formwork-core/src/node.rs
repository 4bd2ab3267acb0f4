//! The normalized AST node model.
//!
//! Lowering turns the author-facing definition tree into [`Node`]s: uniformly
//! identified, typed payloads whose operand positions hold either a literal
//! JSON value or a reference to another node. The outer discriminator is
//! [`NodeType`]; expression-like kinds carry a secondary discriminator
//! ([`ExpressionKind`], [`PredicateKind`], [`TransitionKind`], [`OutcomeKind`]).
//!
//! Nodes never hold pointers to each other. All cross-node structure goes
//! through [`NodeId`], so registries and graphs can own their sides
//! independently.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::id::NodeId;

/// Outer type discriminator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Journey,
    Step,
    Block,
    Expression,
    Predicate,
    Transition,
    Outcome,
    Pseudo,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpressionKind {
    Reference,
    Function,
    Pipeline,
    Format,
    Iterate,
    Collection,
    Conditional,
    Validation,
    Next,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockKind {
    Basic,
    Field,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredicateKind {
    Test,
    And,
    Or,
    Xor,
    Not,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionKind {
    Load,
    Access,
    Submit,
    Action,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionKind::Load => "load",
            TransitionKind::Access => "access",
            TransitionKind::Submit => "submit",
            TransitionKind::Action => "action",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Redirect,
    ThrowError,
}

/// Synthesized source nodes standing in for external inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PseudoKind {
    Post,
    Query,
    Params,
    Data,
    AnswerLocal,
    AnswerRemote,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionRole {
    Transformer,
    Condition,
    Effect,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IteratorKind {
    Map,
    Filter,
    Find,
}

/// An operand position: either a literal author value passed through
/// unchanged, or a lowered child node.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Literal(Value),
    Node(NodeId),
}

impl Operand {
    pub fn null() -> Self {
        Operand::Literal(Value::Null)
    }

    pub fn as_node(&self) -> Option<&NodeId> {
        match self {
            Operand::Node(id) => Some(id),
            Operand::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Operand::Literal(value) => Some(value),
            Operand::Node(_) => None,
        }
    }
}

/// A structural child position, used by traversers to walk the tree.
#[derive(Clone, Debug)]
pub struct ChildRef<'a> {
    /// Property path on the parent (e.g. `"predicate"`, `"metadata.theme"`).
    pub property: String,
    /// Position within a list-valued property, if any.
    pub index: Option<usize>,
    pub id: &'a NodeId,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct JourneyNode {
    pub path: String,
    pub code: String,
    pub title: Operand,
    pub description: Option<Operand>,
    pub version: Option<String>,
    pub entry_path: Option<String>,
    pub on_load: Vec<NodeId>,
    pub on_access: Vec<NodeId>,
    pub steps: Vec<NodeId>,
    /// Nested journeys.
    pub children: Vec<NodeId>,
    pub metadata: IndexMap<String, Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct StepNode {
    pub path: String,
    pub title: Operand,
    pub description: Option<Operand>,
    pub on_load: Vec<NodeId>,
    pub on_access: Vec<NodeId>,
    pub on_action: Vec<NodeId>,
    pub on_submission: Vec<NodeId>,
    pub blocks: Vec<NodeId>,
    pub is_entry_point: bool,
    pub backlink: Option<Operand>,
    pub metadata: IndexMap<String, Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BlockNode {
    pub kind: BlockKind,
    pub variant: String,
    /// Field code; `None` for basic blocks.
    pub code: Option<String>,
    /// The field's value expression. Normalization injects a `@self`
    /// reference here when the author did not supply one.
    pub value: Option<Operand>,
    pub default_value: Option<Operand>,
    /// Transformer function nodes applied to the raw value on display.
    pub formatters: Vec<NodeId>,
    pub hidden: Option<Operand>,
    /// Validation expression nodes.
    pub validate: Vec<NodeId>,
    pub dependent: Option<Operand>,
    pub multiple: bool,
    /// Variant-specific parameters.
    pub params: IndexMap<String, Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ReferenceNode {
    /// Dotted/indexed lookup segments, root first (e.g. `["answers", "name"]`).
    pub path: Vec<String>,
    /// Optional base expression the path resolves against instead of a root.
    pub base: Option<Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct FunctionNode {
    pub name: String,
    pub role: FunctionRole,
    pub arguments: Vec<Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct PipelineNode {
    pub input: Operand,
    /// Transformer function nodes, applied left to right.
    pub steps: Vec<NodeId>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct FormatNode {
    /// Template with `%1`-style positional placeholders.
    pub template: String,
    pub arguments: Vec<Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct IterateNode {
    pub input: Operand,
    pub iterator: IteratorKind,
    /// The per-element sub-expression; sees the element as `@scope` key `"0"`.
    pub expression: Operand,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct CollectionNode {
    pub collection: Operand,
    /// Block template rendered once per element.
    pub template: NodeId,
    pub fallback: Option<Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ConditionalNode {
    pub predicate: Operand,
    pub then_value: Operand,
    pub else_value: Operand,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ValidationNode {
    pub when: Operand,
    pub message: Operand,
    pub submission_only: bool,
    pub details: Option<Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct NextNode {
    pub goto: Operand,
    pub when: Option<Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub enum PredicatePayload {
    Test {
        subject: Operand,
        condition: Operand,
        negate: bool,
    },
    /// `And`, `Or` or `Xor` over two or more operands.
    Composite {
        kind: PredicateKind,
        operands: Vec<Operand>,
    },
    Not {
        operand: Operand,
    },
}

impl PredicatePayload {
    pub fn kind(&self) -> PredicateKind {
        match self {
            PredicatePayload::Test { .. } => PredicateKind::Test,
            PredicatePayload::Composite { kind, .. } => *kind,
            PredicatePayload::Not { .. } => PredicateKind::Not,
        }
    }
}

/// One branch of a transition: effects run first, then navigation outcomes.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct TransitionBranch {
    /// Effect function nodes, executed in declared order.
    pub effects: Vec<NodeId>,
    /// Outcome nodes, evaluated in order with first-match-wins.
    pub next: Vec<NodeId>,
}

impl TransitionBranch {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.next.is_empty()
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct TransitionNode {
    pub kind: TransitionKind,
    pub when: Option<Operand>,
    pub guards: Option<Operand>,
    pub validate: bool,
    /// For `LOAD`/`ACCESS`/`ACTION`, the only populated branch.
    pub always: TransitionBranch,
    pub valid: TransitionBranch,
    pub invalid: TransitionBranch,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct OutcomeNode {
    pub kind: OutcomeKind,
    pub goto: Option<Operand>,
    pub status: u16,
    pub message: Option<Operand>,
    pub when: Option<Operand>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct PseudoNode {
    pub kind: PseudoKind,
    pub key: String,
    /// For `ANSWER_LOCAL`, the id of the owning field block.
    pub field: Option<NodeId>,
}

/// Typed payload, one variant per node kind.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub enum Payload {
    Journey(JourneyNode),
    Step(StepNode),
    Block(BlockNode),
    Reference(ReferenceNode),
    Function(FunctionNode),
    Pipeline(PipelineNode),
    Format(FormatNode),
    Iterate(IterateNode),
    Collection(CollectionNode),
    Conditional(ConditionalNode),
    Validation(ValidationNode),
    Next(NextNode),
    Predicate(PredicatePayload),
    Transition(TransitionNode),
    Outcome(OutcomeNode),
    Pseudo(PseudoNode),
}

impl Payload {
    pub fn node_type(&self) -> NodeType {
        match self {
            Payload::Journey(_) => NodeType::Journey,
            Payload::Step(_) => NodeType::Step,
            Payload::Block(_) => NodeType::Block,
            Payload::Reference(_)
            | Payload::Function(_)
            | Payload::Pipeline(_)
            | Payload::Format(_)
            | Payload::Iterate(_)
            | Payload::Collection(_)
            | Payload::Conditional(_)
            | Payload::Validation(_)
            | Payload::Next(_) => NodeType::Expression,
            Payload::Predicate(_) => NodeType::Predicate,
            Payload::Transition(_) => NodeType::Transition,
            Payload::Outcome(_) => NodeType::Outcome,
            Payload::Pseudo(_) => NodeType::Pseudo,
        }
    }

    pub fn expression_kind(&self) -> Option<ExpressionKind> {
        Some(match self {
            Payload::Reference(_) => ExpressionKind::Reference,
            Payload::Function(_) => ExpressionKind::Function,
            Payload::Pipeline(_) => ExpressionKind::Pipeline,
            Payload::Format(_) => ExpressionKind::Format,
            Payload::Iterate(_) => ExpressionKind::Iterate,
            Payload::Collection(_) => ExpressionKind::Collection,
            Payload::Conditional(_) => ExpressionKind::Conditional,
            Payload::Validation(_) => ExpressionKind::Validation,
            Payload::Next(_) => ExpressionKind::Next,
            _ => return None,
        })
    }

    /// Enumerate every structural child position, in declaration order.
    ///
    /// This is the traversal surface: registration, parent metadata, and
    /// step-scope marking all walk these. Wiring applies its own per-kind
    /// data-flow selection instead of reusing this list wholesale.
    pub fn child_refs(&self) -> Vec<ChildRef<'_>> {
        let mut out = Vec::new();
        match self {
            Payload::Journey(journey) => {
                push_operand(&mut out, "title", &journey.title);
                push_opt(&mut out, "description", journey.description.as_ref());
                push_list(&mut out, "onLoad", &journey.on_load);
                push_list(&mut out, "onAccess", &journey.on_access);
                push_list(&mut out, "steps", &journey.steps);
                push_list(&mut out, "children", &journey.children);
                push_map(&mut out, "metadata", &journey.metadata);
            }
            Payload::Step(step) => {
                push_operand(&mut out, "title", &step.title);
                push_opt(&mut out, "description", step.description.as_ref());
                push_list(&mut out, "onLoad", &step.on_load);
                push_list(&mut out, "onAccess", &step.on_access);
                push_list(&mut out, "onAction", &step.on_action);
                push_list(&mut out, "onSubmission", &step.on_submission);
                push_list(&mut out, "blocks", &step.blocks);
                push_opt(&mut out, "backlink", step.backlink.as_ref());
                push_map(&mut out, "metadata", &step.metadata);
            }
            Payload::Block(block) => {
                push_opt(&mut out, "value", block.value.as_ref());
                push_opt(&mut out, "defaultValue", block.default_value.as_ref());
                push_list(&mut out, "formatters", &block.formatters);
                push_opt(&mut out, "hidden", block.hidden.as_ref());
                push_list(&mut out, "validate", &block.validate);
                push_opt(&mut out, "dependent", block.dependent.as_ref());
                push_map(&mut out, "params", &block.params);
            }
            Payload::Reference(reference) => {
                push_opt(&mut out, "base", reference.base.as_ref());
            }
            Payload::Function(function) => {
                push_operands(&mut out, "arguments", &function.arguments);
            }
            Payload::Pipeline(pipeline) => {
                push_operand(&mut out, "input", &pipeline.input);
                push_list(&mut out, "steps", &pipeline.steps);
            }
            Payload::Format(format) => {
                push_operands(&mut out, "arguments", &format.arguments);
            }
            Payload::Iterate(iterate) => {
                push_operand(&mut out, "input", &iterate.input);
                push_operand(&mut out, "expression", &iterate.expression);
            }
            Payload::Collection(collection) => {
                push_operand(&mut out, "collection", &collection.collection);
                push_id(&mut out, "template", None, &collection.template);
                push_opt(&mut out, "fallback", collection.fallback.as_ref());
            }
            Payload::Conditional(conditional) => {
                push_operand(&mut out, "predicate", &conditional.predicate);
                push_operand(&mut out, "thenValue", &conditional.then_value);
                push_operand(&mut out, "elseValue", &conditional.else_value);
            }
            Payload::Validation(validation) => {
                push_operand(&mut out, "when", &validation.when);
                push_operand(&mut out, "message", &validation.message);
                push_opt(&mut out, "details", validation.details.as_ref());
            }
            Payload::Next(next) => {
                push_operand(&mut out, "goto", &next.goto);
                push_opt(&mut out, "when", next.when.as_ref());
            }
            Payload::Predicate(predicate) => match predicate {
                PredicatePayload::Test {
                    subject, condition, ..
                } => {
                    push_operand(&mut out, "subject", subject);
                    push_operand(&mut out, "condition", condition);
                }
                PredicatePayload::Composite { operands, .. } => {
                    push_operands(&mut out, "operands", operands);
                }
                PredicatePayload::Not { operand } => {
                    push_operand(&mut out, "operand", operand);
                }
            },
            Payload::Transition(transition) => {
                push_opt(&mut out, "when", transition.when.as_ref());
                push_opt(&mut out, "guards", transition.guards.as_ref());
                push_branch(&mut out, "onAlways", &transition.always);
                push_branch(&mut out, "onValid", &transition.valid);
                push_branch(&mut out, "onInvalid", &transition.invalid);
            }
            Payload::Outcome(outcome) => {
                push_opt(&mut out, "goto", outcome.goto.as_ref());
                push_opt(&mut out, "message", outcome.message.as_ref());
                push_opt(&mut out, "when", outcome.when.as_ref());
            }
            Payload::Pseudo(_) => {}
        }
        out
    }
}

fn push_id<'a>(
    out: &mut Vec<ChildRef<'a>>,
    property: &str,
    index: Option<usize>,
    id: &'a NodeId,
) {
    out.push(ChildRef {
        property: property.to_owned(),
        index,
        id,
    });
}

fn push_operand<'a>(out: &mut Vec<ChildRef<'a>>, property: &str, operand: &'a Operand) {
    if let Operand::Node(id) = operand {
        push_id(out, property, None, id);
    }
}

fn push_opt<'a>(out: &mut Vec<ChildRef<'a>>, property: &str, operand: Option<&'a Operand>) {
    if let Some(operand) = operand {
        push_operand(out, property, operand);
    }
}

fn push_list<'a>(out: &mut Vec<ChildRef<'a>>, property: &str, ids: &'a [NodeId]) {
    for (index, id) in ids.iter().enumerate() {
        push_id(out, property, Some(index), id);
    }
}

fn push_operands<'a>(out: &mut Vec<ChildRef<'a>>, property: &str, operands: &'a [Operand]) {
    for (index, operand) in operands.iter().enumerate() {
        if let Operand::Node(id) = operand {
            push_id(out, property, Some(index), id);
        }
    }
}

fn push_map<'a>(
    out: &mut Vec<ChildRef<'a>>,
    property: &str,
    map: &'a IndexMap<String, Operand>,
) {
    for (key, operand) in map {
        if let Operand::Node(id) = operand {
            out.push(ChildRef {
                property: format!("{property}.{key}"),
                index: None,
                id,
            });
        }
    }
}

fn push_branch<'a>(out: &mut Vec<ChildRef<'a>>, property: &str, branch: &'a TransitionBranch) {
    for (index, id) in branch.effects.iter().enumerate() {
        out.push(ChildRef {
            property: format!("{property}.effects"),
            index: Some(index),
            id,
        });
    }
    for (index, id) in branch.next.iter().enumerate() {
        out.push(ChildRef {
            property: format!("{property}.next"),
            index: Some(index),
            id,
        });
    }
}

/// A lowered AST node.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub payload: Payload,
    /// The original author definition, kept for diagnostics only.
    pub raw: Value,
}

impl Node {
    pub fn new(id: NodeId, payload: Payload, raw: Value) -> Self {
        Self { id, payload, raw }
    }

    pub fn node_type(&self) -> NodeType {
        self.payload.node_type()
    }
}
