//! Transition factory.

use serde_json::{Map, Value};

use formwork_core::{Payload, TransitionBranch, TransitionKind, TransitionNode};

use super::{
    LowerFailed, LowerResult, Lowering, effect_list, opt_transform, outcome, strict_true,
};

pub(crate) fn lower(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
    default_kind: Option<TransitionKind>,
) -> LowerResult {
    let kind = match def.get("transitionType").and_then(Value::as_str) {
        Some("load") => TransitionKind::Load,
        Some("access") => TransitionKind::Access,
        Some("submit") => TransitionKind::Submit,
        Some("action") => TransitionKind::Action,
        Some(other) => {
            lowering.invalid(path, format!("unknown transitionType `{other}`"));
            return Err(LowerFailed);
        }
        None => match default_kind {
            Some(kind) => kind,
            None => {
                lowering.invalid(path, "transition is missing `transitionType`");
                return Err(LowerFailed);
            }
        },
    };

    let when = opt_transform(lowering, def, "when", path);
    let guards = opt_transform(lowering, def, "guards", path);
    // `validate` is strict: anything but a literal `true` means no validation.
    let validate = strict_true(def, "validate");

    let (always, valid, invalid) = if kind == TransitionKind::Submit {
        (
            lower_branch(lowering, def.get("onAlways"), &format!("{path}.onAlways")),
            lower_branch(lowering, def.get("onValid"), &format!("{path}.onValid")),
            lower_branch(lowering, def.get("onInvalid"), &format!("{path}.onInvalid")),
        )
    } else {
        // LOAD/ACCESS/ACTION carry flat `effects` + `redirect` lists.
        let effects = effect_list(lowering, def.get("effects"), &format!("{path}.effects"));
        let next = outcome::outcome_list(
            lowering,
            def.get("redirect").or_else(|| def.get("next")),
            &format!("{path}.redirect"),
        );
        (
            TransitionBranch { effects, next },
            TransitionBranch::default(),
            TransitionBranch::default(),
        )
    };

    let payload = Payload::Transition(TransitionNode {
        kind,
        when,
        guards,
        validate,
        always,
        valid,
        invalid,
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_branch(
    lowering: &mut Lowering<'_>,
    branch: Option<&Value>,
    path: &str,
) -> TransitionBranch {
    let Some(branch) = branch.and_then(Value::as_object) else {
        return TransitionBranch::default();
    };
    TransitionBranch {
        effects: effect_list(lowering, branch.get("effects"), &format!("{path}.effects")),
        next: outcome::outcome_list(lowering, branch.get("next"), &format!("{path}.next")),
    }
}
