//! Terraform plugin protocol v6 plumbing
//!
//! Providers implement [`Provider`], [`Resource`] and [`DataSource`] against
//! plain Rust types ([`DynamicValue`], [`Schema`], [`Diagnostic`]); the
//! [`grpc`] layer does the msgpack and protobuf conversion, and [`serve`]
//! prints the go-plugin handshake and runs the gRPC server.

pub mod context;
pub mod error;
pub mod schema;
pub mod types;

pub mod data_source;
pub mod provider;
pub mod resource;

pub mod import;
pub mod plan_modifier;
pub mod validator;

pub mod grpc;
pub mod proto;
pub mod server;

pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{DataSourceFactory, Provider, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{AttributeBuilder, AttributeType, NestedBlock, Schema, SchemaBuilder};
pub use server::{serve, ServerConfig};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
