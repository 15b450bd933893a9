//! Built-in plan modifiers
//!
//! Plan modifiers run after the framework has built the proposed plan and can:
//! - Modify the planned value
//! - Mark an attribute as requiring replacement
//! - Add warnings or errors to the plan

use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::Diagnostic;

/// Marks an attribute as requiring replacement when it changes
pub struct RequiresReplaceIfChanged;

impl PlanModifier for RequiresReplaceIfChanged {
    fn description(&self) -> String {
        "changing this attribute forces a new resource".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let state = &request.state_value.value;
        let plan = &request.plan_value.value;

        // Nothing to replace while creating, or while the new value is pending
        let requires_replace = !state.is_null() && plan.is_fully_known() && state != plan;

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: vec![],
        }
    }
}

/// A plan modifier that uses the current state value when the planned value is unknown
///
/// This is particularly useful for computed attributes that should retain their value
/// during planning when Terraform doesn't know what the new value will be.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value of this attribute in state will not change".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let plan_value = if request.plan_value.is_unknown() && !request.state_value.is_null() {
            request.state_value
        } else {
            request.plan_value
        };

        PlanModifierResponse {
            plan_value,
            requires_replace: false,
            diagnostics: vec![],
        }
    }
}

/// Rejects any change to an attribute once the resource exists.
///
/// Used for arguments the remote API cannot update in place and that must
/// not silently force a replacement either.
pub struct ImmutableAfterCreate;

impl PlanModifier for ImmutableAfterCreate {
    fn description(&self) -> String {
        "this attribute cannot be changed after creation".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let state = &request.state_value.value;
        let plan = &request.plan_value.value;

        let mut diagnostics = vec![];
        if !state.is_null() && plan.is_fully_known() && state != plan {
            diagnostics.push(
                Diagnostic::error(
                    format!("argument `{}` cannot be changed", request.path),
                    "Changing this argument is not supported by the API. Restore the previous value or recreate the resource.",
                )
                .with_attribute(request.path.clone()),
            );
        }

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace: false,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, Dynamic, DynamicValue};

    fn request(state: Dynamic, plan: Dynamic) -> PlanModifierRequest {
        PlanModifierRequest {
            config_value: DynamicValue::new(plan.clone()),
            state_value: DynamicValue::new(state),
            plan_value: DynamicValue::new(plan),
            path: AttributePath::new("instance_id"),
        }
    }

    #[test]
    fn requires_replace_when_value_changes() {
        let response = RequiresReplaceIfChanged.modify(request(
            Dynamic::from("mssql-1"),
            Dynamic::from("mssql-2"),
        ));
        assert!(response.requires_replace);
    }

    #[test]
    fn no_replace_on_create_or_unknown() {
        let create = RequiresReplaceIfChanged.modify(request(Dynamic::Null, Dynamic::from("a")));
        assert!(!create.requires_replace);

        let pending = RequiresReplaceIfChanged.modify(request(Dynamic::from("a"), Dynamic::Unknown));
        assert!(!pending.requires_replace);
    }

    #[test]
    fn no_replace_when_unchanged() {
        let response =
            RequiresReplaceIfChanged.modify(request(Dynamic::from("a"), Dynamic::from("a")));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_keeps_prior_value() {
        let response = UseStateForUnknown.modify(request(Dynamic::from("id-1"), Dynamic::Unknown));
        assert_eq!(response.plan_value.value, Dynamic::from("id-1"));
    }

    #[test]
    fn use_state_for_unknown_leaves_create_unknown() {
        let response = UseStateForUnknown.modify(request(Dynamic::Null, Dynamic::Unknown));
        assert!(response.plan_value.is_unknown());
    }

    #[test]
    fn immutable_rejects_change_with_attribute_path() {
        let response =
            ImmutableAfterCreate.modify(request(Dynamic::from("ins-1"), Dynamic::from("ins-2")));
        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].is_error());
        assert_eq!(
            response.diagnostics[0].summary,
            "argument `instance_id` cannot be changed"
        );
        assert!(!response.requires_replace);
    }

    #[test]
    fn immutable_allows_create_and_no_change() {
        assert!(ImmutableAfterCreate
            .modify(request(Dynamic::Null, Dynamic::from("ins-1")))
            .diagnostics
            .is_empty());
        assert!(ImmutableAfterCreate
            .modify(request(Dynamic::from("ins-1"), Dynamic::from("ins-1")))
            .diagnostics
            .is_empty());
    }
}
