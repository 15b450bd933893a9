//! Request-scoped context
//!
//! Each RPC gets its own Context with a fresh log id. Implementations prefix
//! their log lines with `[log_id]` so the lines of one Terraform operation can
//! be grepped out of TF_LOG output.

use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Context {
    log_id: Arc<str>,
    rpc: Option<&'static str>,
}

impl Context {
    /// Context not tied to any RPC, with a freshly generated log id
    pub fn new() -> Self {
        Self::with_log_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_log_id(log_id: impl Into<String>) -> Self {
        Self {
            log_id: Arc::from(log_id.into()),
            rpc: None,
        }
    }

    /// Context for serving the named protocol RPC, e.g. `ReadResource`
    pub fn for_rpc(rpc: &'static str) -> Self {
        Self {
            rpc: Some(rpc),
            ..Self::new()
        }
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    pub fn rpc(&self) -> Option<&'static str> {
        self.rpc
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
