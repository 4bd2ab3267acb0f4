//! Handler construction: one evaluator per compiled node.

pub(crate) mod block;
pub(crate) mod collection;
pub(crate) mod conditional;
pub(crate) mod format;
pub(crate) mod function;
pub(crate) mod iterate;
pub(crate) mod journey;
pub(crate) mod outcome;
pub(crate) mod pipeline;
pub(crate) mod predicate;
pub(crate) mod pseudo;
pub(crate) mod reference;
pub(crate) mod step;
pub(crate) mod transition;
pub(crate) mod validation;

use formwork_compiler::StepArtifact;
use formwork_core::{BlockKind, Node, NodeId, NodeType, Payload, TransitionKind};

use crate::handler::{Handler, HandlerCore};

pub use validation::ValidationOutcome;

use self::transition::FieldCheck;

/// Instantiate the handler for one node.
pub(crate) fn build_handler(node: &Node, artifact: &StepArtifact) -> Box<dyn Handler> {
    let core = HandlerCore::new(node.id.clone());
    match &node.payload {
        Payload::Journey(data) => Box::new(journey::JourneyHandler {
            core,
            data: data.clone(),
        }),
        Payload::Step(data) => Box::new(step::StepHandler {
            core,
            data: data.clone(),
        }),
        Payload::Block(data) => Box::new(block::BlockHandler {
            core,
            data: data.clone(),
        }),
        Payload::Reference(data) => Box::new(reference::ReferenceHandler {
            core,
            data: data.clone(),
        }),
        Payload::Function(data) => Box::new(function::FunctionHandler {
            core,
            data: data.clone(),
        }),
        Payload::Pipeline(data) => Box::new(pipeline::PipelineHandler {
            core,
            data: data.clone(),
        }),
        Payload::Format(data) => Box::new(format::FormatHandler {
            core,
            data: data.clone(),
        }),
        Payload::Iterate(data) => Box::new(iterate::IterateHandler {
            core,
            data: data.clone(),
        }),
        Payload::Collection(data) => Box::new(collection::CollectionHandler {
            core,
            data: data.clone(),
        }),
        Payload::Conditional(data) => Box::new(conditional::ConditionalHandler {
            core,
            data: data.clone(),
        }),
        Payload::Validation(data) => Box::new(validation::ValidationHandler {
            core,
            data: data.clone(),
        }),
        Payload::Next(data) => Box::new(outcome::NextHandler {
            core,
            data: data.clone(),
        }),
        Payload::Predicate(data) => Box::new(predicate::PredicateHandler {
            core,
            data: data.clone(),
        }),
        Payload::Transition(data) => {
            let fields = if data.kind == TransitionKind::Submit && data.validate {
                collect_field_checks(artifact, &node.id)
            } else {
                Vec::new()
            };
            Box::new(transition::TransitionHandler {
                core,
                data: data.clone(),
                fields,
            })
        }
        Payload::Outcome(data) => Box::new(outcome::OutcomeHandler {
            core,
            data: data.clone(),
        }),
        Payload::Pseudo(data) => Box::new(pseudo::PseudoHandler {
            core,
            data: data.clone(),
        }),
    }
}

/// Field blocks (with their validations) of the step owning a submit
/// transition.
fn collect_field_checks(artifact: &StepArtifact, transition: &NodeId) -> Vec<FieldCheck> {
    let step_ids: Vec<NodeId> = artifact.nodes.find_by_type(NodeType::Step).cloned().collect();
    for step_id in step_ids {
        let Some(Payload::Step(step)) = artifact.nodes.get(&step_id).map(|n| &n.payload) else {
            continue;
        };
        if !step.on_submission.contains(transition) {
            continue;
        }
        let mut fields = Vec::new();
        for block_id in &step.blocks {
            if let Some(Payload::Block(block)) = artifact.nodes.get(block_id).map(|n| &n.payload)
                && block.kind == BlockKind::Field
                && let Some(code) = &block.code
            {
                fields.push(FieldCheck {
                    code: code.clone(),
                    default_value: block.default_value.clone(),
                    validations: block.validate.clone(),
                });
            }
        }
        return fields;
    }
    Vec::new()
}
