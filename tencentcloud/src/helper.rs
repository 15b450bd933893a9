//! Small helpers shared by resources and data sources

use crate::api::ApiError;
use crate::id::IdError;
use crate::TencentCloudProviderData;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Logs how long an operation took when dropped
pub struct LogElapsed {
    operation: &'static str,
    log_id: String,
    started: Instant,
}

impl LogElapsed {
    pub fn new(operation: &'static str, log_id: &str) -> Self {
        Self {
            operation,
            log_id: log_id.to_string(),
            started: Instant::now(),
        }
    }
}

impl Drop for LogElapsed {
    fn drop(&mut self) {
        tracing::debug!(
            "[{}] {} elapsed time: {}ms",
            self.log_id,
            self.operation,
            self.started.elapsed().as_millis()
        );
    }
}

/// Downcasts what the provider handed out from `configure`
pub fn extract_provider_data(
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
) -> Result<TencentCloudProviderData, Diagnostic> {
    let data = provider_data.ok_or_else(|| {
        Diagnostic::error(
            "No provider data",
            "No provider data was provided to the resource",
        )
    })?;

    data.downcast_ref::<TencentCloudProviderData>()
        .cloned()
        .ok_or_else(|| {
            Diagnostic::error(
                "Invalid provider data",
                "Failed to extract TencentCloudProviderData from provider data",
            )
        })
}

pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

/// Diagnostic for a failed vendor API call
pub fn api_error(summary: &str, err: ApiError) -> Diagnostic {
    Diagnostic::error(summary, format!("API error: {}", err))
}

pub fn id_error(err: IdError) -> Diagnostic {
    Diagnostic::error("Invalid resource id", err.to_string()).with_attribute(AttributePath::new("id"))
}

/// The `id` attribute of a state object
pub fn state_id(state: &DynamicValue) -> Result<String, Diagnostic> {
    state
        .get_string(&AttributePath::new("id"))
        .map_err(|e| Diagnostic::error("Missing resource id", e.to_string()))
}

/// Optional string attribute; null, unknown and empty all read as None
pub fn optional_string(value: &DynamicValue, name: &str) -> Option<String> {
    value
        .get_string(&AttributePath::new(name))
        .ok()
        .filter(|s| !s.is_empty())
}

/// Optional set or list of strings; null reads as empty
pub fn string_set(value: &DynamicValue, name: &str) -> Vec<String> {
    value
        .get_string_list(&AttributePath::new(name))
        .unwrap_or_default()
}

/// Builds a string list value, dropping duplicates while keeping order
pub fn to_string_set<I, S>(items: I) -> Dynamic
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    Dynamic::List(
        items
            .into_iter()
            .map(Into::into)
            .filter(|item: &String| seen.insert(item.clone()))
            .map(Dynamic::String)
            .collect(),
    )
}

/// Value for an optional set read back from the API.
///
/// An empty result keeps an empty list the configuration already holds and
/// is null otherwise, so unset attributes stay unset.
pub fn optional_string_set(current: Option<&Dynamic>, items: &[String]) -> Dynamic {
    if !items.is_empty() {
        return to_string_set(items.iter().cloned());
    }
    match current {
        Some(Dynamic::List(existing)) if existing.is_empty() => Dynamic::List(vec![]),
        _ => Dynamic::Null,
    }
}

/// Strings of a set nested inside a block element
pub fn nested_strings(value: Option<&Dynamic>) -> Vec<String> {
    value
        .and_then(Dynamic::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Dynamic::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// String field of a block element, empty when unset
pub fn nested_string(value: Option<&Dynamic>) -> String {
    value
        .and_then(Dynamic::as_str)
        .unwrap_or_default()
        .to_string()
}

/// True when `name` differs between prior state and plan
pub fn has_change(prior: &DynamicValue, planned: &DynamicValue, name: &str) -> bool {
    let path = AttributePath::new(name);
    let before = prior.get(&path).unwrap_or(&Dynamic::Null);
    let after = planned.get(&path).unwrap_or(&Dynamic::Null);
    !after.is_unknown() && before != after
}

/// Rejects changes to attributes the remote API cannot modify in place
pub fn check_immutable(
    prior: &DynamicValue,
    planned: &DynamicValue,
    names: &[&str],
) -> Result<(), Diagnostic> {
    match names.iter().find(|name| has_change(prior, planned, name)) {
        Some(name) => Err(Diagnostic::error(
            format!("argument `{}` cannot be changed", name),
            format!("`{}` is fixed once the resource exists", name),
        )
        .with_attribute(AttributePath::new(name))),
        None => Ok(()),
    }
}
