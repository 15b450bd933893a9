//! Wire types generated by tonic-build from `proto/tfplugin6.proto`
//!
//! RPC messages live in snake_case modules (`read_resource::Request`), and
//! several names clash with the framework types, so refer to them through
//! `proto::`.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

pub use provider_server::{Provider as ProviderService, ProviderServer};
