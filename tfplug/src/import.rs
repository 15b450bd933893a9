//! Import by composite id

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Imports a resource whose composite id is all the read needs.
///
/// The id lands in `attr_path` and the read Terraform runs right after
/// import fills in everything else, e.g. `ins-1#db1` becomes `id = "ins-1#db1"`.
pub fn import_state_passthrough_id(
    ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
) -> ImportResourceStateResponse {
    let mut response = ImportResourceStateResponse::empty();
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!(
                    "Could not set attribute '{}' to value '{}'",
                    attr_path, request.id
                ),
            )
            .with_attribute(attr_path),
        );
        return response;
    }

    tracing::debug!("[{}] importing {} {}", ctx.log_id(), request.type_name, request.id);
    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
        private: Vec::new(),
    });
    response
}
