//! gRPC service implementation
//!
//! Bridges the Terraform Plugin Protocol v6 service onto the `Provider`,
//! `Resource` and `DataSource` traits. Resources and data sources are created
//! from their factories for every call and configured with the data the
//! provider returned from `configure`, so no per-resource state is shared
//! between calls.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::proto;
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderMetadataRequest,
    ProviderSchemaRequest, ResourceFactory, StopProviderRequest, ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, ResourceSchemaRequest, ResourceWithConfigure,
    UpdateResourceRequest, UpgradeResourceStateRequest, ValidateResourceConfigRequest,
};
use crate::schema::{
    Attribute, Block, NestedBlock, NestingMode, PlanModifierRequest, Schema, StringKind,
};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, ClientCapabilities, Deferred, DeferredReason,
    Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue, RawState,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tonic::{Request, Response, Status};
use tracing::Instrument;

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

/// Span tagging everything logged while an implementation serves one RPC
fn rpc_span(ctx: &Context, type_name: &str) -> tracing::Span {
    tracing::info_span!(
        "rpc",
        rpc = ctx.rpc().unwrap_or("unknown"),
        type_name,
        log_id = %ctx.log_id()
    )
}

pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    resource_factories: HashMap<String, ResourceFactory>,
    data_source_factories: HashMap<String, DataSourceFactory>,
    provider_data: RwLock<ProviderData>,
    provider_schema: OnceCell<Schema>,
    resource_schemas: OnceCell<HashMap<String, Schema>>,
    data_source_schemas: OnceCell<HashMap<String, Schema>>,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let resource_factories = provider.resources();
        let data_source_factories = provider.data_sources();

        Self {
            provider: Arc::new(RwLock::new(provider)),
            resource_factories,
            data_source_factories,
            provider_data: RwLock::new(None),
            provider_schema: OnceCell::new(),
            resource_schemas: OnceCell::new(),
            data_source_schemas: OnceCell::new(),
        }
    }

    async fn provider_schema(&self, ctx: &Context) -> &Schema {
        self.provider_schema
            .get_or_init(|| async {
                let provider = self.provider.read().await;
                provider
                    .schema(ctx.clone(), ProviderSchemaRequest)
                    .await
                    .schema
            })
            .await
    }

    async fn resource_schemas(&self, ctx: &Context) -> &HashMap<String, Schema> {
        self.resource_schemas
            .get_or_init(|| async {
                let mut schemas = HashMap::new();
                for (name, factory) in &self.resource_factories {
                    let resource = factory();
                    let response = resource.schema(ctx.clone(), ResourceSchemaRequest).await;
                    schemas.insert(name.clone(), response.schema);
                }
                schemas
            })
            .await
    }

    async fn data_source_schemas(&self, ctx: &Context) -> &HashMap<String, Schema> {
        self.data_source_schemas
            .get_or_init(|| async {
                let mut schemas = HashMap::new();
                for (name, factory) in &self.data_source_factories {
                    let data_source = factory();
                    let response = data_source
                        .schema(ctx.clone(), DataSourceSchemaRequest)
                        .await;
                    schemas.insert(name.clone(), response.schema);
                }
                schemas
            })
            .await
    }

    async fn resource_schema(&self, ctx: &Context, type_name: &str) -> Result<&Schema, Status> {
        self.resource_schemas(ctx)
            .await
            .get(type_name)
            .ok_or_else(|| Status::not_found(format!("Unknown resource type: {}", type_name)))
    }

    async fn data_source_schema(&self, ctx: &Context, type_name: &str) -> Result<&Schema, Status> {
        self.data_source_schemas(ctx)
            .await
            .get(type_name)
            .ok_or_else(|| Status::not_found(format!("Unknown data source type: {}", type_name)))
    }

    /// Builds a resource and hands it the provider data
    async fn resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<(Box<dyn ResourceWithConfigure>, Vec<Diagnostic>), Status> {
        let factory = self
            .resource_factories
            .get(type_name)
            .ok_or_else(|| Status::not_found(format!("Unknown resource type: {}", type_name)))?;

        let mut resource = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx.clone(), ConfigureResourceRequest { provider_data })
            .await;

        Ok((resource, response.diagnostics))
    }

    async fn data_source(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<(Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>), Status> {
        let factory = self.data_source_factories.get(type_name).ok_or_else(|| {
            Status::not_found(format!("Unknown data source type: {}", type_name))
        })?;

        let mut data_source = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;

        Ok((data_source, response.diagnostics))
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> proto::provider_server::Provider for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> Result<Response<proto::get_metadata::Response>, Status> {
        let ctx = Context::for_rpc("GetMetadata");
        let metadata = self
            .provider
            .read()
            .await
            .metadata(ctx, ProviderMetadataRequest)
            .await;

        let resources = self
            .resource_factories
            .keys()
            .map(|name| proto::get_metadata::ResourceMetadata {
                type_name: name.clone(),
            })
            .collect();
        let data_sources = self
            .data_source_factories
            .keys()
            .map(|name| proto::get_metadata::DataSourceMetadata {
                type_name: name.clone(),
            })
            .collect();

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(server_capabilities_to_proto(
                &metadata.server_capabilities,
            )),
            diagnostics: vec![],
            data_sources,
            resources,
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> Result<Response<proto::get_provider_schema::Response>, Status> {
        let ctx = Context::for_rpc("GetProviderSchema");
        tracing::debug!("[{}] GetProviderSchema", ctx.log_id());

        let provider = schema_to_proto(self.provider_schema(&ctx).await)?;
        let resource_schemas = self
            .resource_schemas(&ctx)
            .await
            .iter()
            .map(|(name, schema)| Ok((name.clone(), schema_to_proto(schema)?)))
            .collect::<Result<HashMap<_, _>, Status>>()?;
        let data_source_schemas = self
            .data_source_schemas(&ctx)
            .await
            .iter()
            .map(|(name, schema)| Ok((name.clone(), schema_to_proto(schema)?)))
            .collect::<Result<HashMap<_, _>, Status>>()?;

        let metadata = self
            .provider
            .read()
            .await
            .metadata(ctx, ProviderMetadataRequest)
            .await;

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(provider),
            resource_schemas,
            data_source_schemas,
            diagnostics: vec![],
            provider_meta: None,
            server_capabilities: Some(server_capabilities_to_proto(
                &metadata.server_capabilities,
            )),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> Result<Response<proto::validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ValidateProviderConfig");
        let config = decode_value(req.config.as_ref())?;

        let mut diagnostics = self
            .provider_schema(&ctx)
            .await
            .block
            .validate(&config.value, AttributePath::root());

        let response = self
            .provider
            .read()
            .await
            .validate(ctx, ValidateProviderConfigRequest { config })
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> Result<Response<proto::validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ValidateResourceConfig");

        let Ok(schema) = self.resource_schema(&ctx, &req.type_name).await else {
            return Ok(Response::new(proto::validate_resource_config::Response {
                diagnostics: diagnostics_to_proto(&[Diagnostic::error(
                    format!("Unknown resource type: {}", req.type_name),
                    "",
                )]),
            }));
        };

        let config = decode_value(req.config.as_ref())?;
        let mut diagnostics = schema.block.validate(&config.value, AttributePath::root());

        let (resource, _) = self.resource(&ctx, &req.type_name).await?;
        let response = resource
            .validate(
                ctx,
                ValidateResourceConfigRequest {
                    type_name: req.type_name,
                    config,
                    client_capabilities: client_capabilities_from_proto(req.client_capabilities),
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> Result<Response<proto::validate_data_resource_config::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ValidateDataResourceConfig");

        let Ok(schema) = self.data_source_schema(&ctx, &req.type_name).await else {
            return Ok(Response::new(
                proto::validate_data_resource_config::Response {
                    diagnostics: diagnostics_to_proto(&[Diagnostic::error(
                        format!("Unknown data source type: {}", req.type_name),
                        "",
                    )]),
                },
            ));
        };

        let config = decode_value(req.config.as_ref())?;
        let mut diagnostics = schema.block.validate(&config.value, AttributePath::root());

        let (data_source, _) = self.data_source(&ctx, &req.type_name).await?;
        let response = data_source
            .validate(
                ctx,
                ValidateDataSourceConfigRequest {
                    type_name: req.type_name,
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(
            proto::validate_data_resource_config::Response {
                diagnostics: diagnostics_to_proto(&diagnostics),
            },
        ))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> Result<Response<proto::upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("UpgradeResourceState");
        tracing::debug!(
            "[{}] UpgradeResourceState {} from version {}",
            ctx.log_id(),
            req.type_name,
            req.version
        );

        let raw_state = req
            .raw_state
            .map(|raw| RawState {
                json: (!raw.json.is_empty()).then_some(raw.json),
                flatmap: (!raw.flatmap.is_empty()).then_some(raw.flatmap),
            })
            .unwrap_or(RawState {
                json: None,
                flatmap: None,
            });

        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let (resource, _) = self.resource(&ctx, &req.type_name).await?;
        let mut response = resource
            .upgrade_state(
                ctx,
                UpgradeResourceStateRequest {
                    type_name: req.type_name,
                    version: req.version,
                    raw_state,
                },
            )
            .await;

        let upgraded_state = if response.upgraded_state.is_null() {
            None
        } else {
            schema.block.conform(&mut response.upgraded_state.value);
            Some(encode_value(&response.upgraded_state)?)
        };

        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state,
            diagnostics: diagnostics_to_proto(&response.diagnostics),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> Result<Response<proto::configure_provider::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ConfigureProvider");
        tracing::info!(
            "[{}] ConfigureProvider (terraform {})",
            ctx.log_id(),
            req.terraform_version
        );

        let config = decode_value(req.config.as_ref())?;
        let response = self
            .provider
            .write()
            .await
            .configure(
                ctx,
                ConfigureProviderRequest {
                    terraform_version: req.terraform_version,
                    config,
                    client_capabilities: client_capabilities_from_proto(req.client_capabilities),
                },
            )
            .await;

        if !has_errors(&response.diagnostics) {
            *self.provider_data.write().await = response.provider_data;
        }

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(&response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> Result<Response<proto::read_resource::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ReadResource");
        tracing::debug!("[{}] ReadResource {}", ctx.log_id(), req.type_name);

        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let current_state = decode_value(req.current_state.as_ref())?;

        let (resource, diagnostics) = self.resource(&ctx, &req.type_name).await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::read_resource::Response {
                new_state: Some(encode_value(&current_state)?),
                diagnostics: diagnostics_to_proto(&diagnostics),
                private: req.private,
                deferred: None,
            }));
        }

        let span = rpc_span(&ctx, &req.type_name);
        let response = resource
            .read(
                ctx,
                ReadResourceRequest {
                    type_name: req.type_name,
                    current_state,
                    private: req.private.clone(),
                    provider_meta: decode_optional(req.provider_meta.as_ref())?,
                    client_capabilities: client_capabilities_from_proto(req.client_capabilities),
                },
            )
            .instrument(span)
            .await;

        let new_state = match response.new_state {
            Some(mut state) => {
                state.value.unknowns_to_null();
                schema.block.conform(&mut state.value);
                encode_value(&state)?
            }
            None => encode_value(&DynamicValue::null())?,
        };

        let private = if response.private.is_empty() {
            req.private
        } else {
            response.private
        };

        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(new_state),
            diagnostics: diagnostics_to_proto(&response.diagnostics),
            private,
            deferred: response.deferred.as_ref().map(deferred_to_proto),
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> Result<Response<proto::plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("PlanResourceChange");
        tracing::debug!("[{}] PlanResourceChange {}", ctx.log_id(), req.type_name);

        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let prior_state = decode_value(req.prior_state.as_ref())?;
        let proposed_new_state = decode_value(req.proposed_new_state.as_ref())?;
        let config = decode_value(req.config.as_ref())?;

        // Destroy: nothing to plan
        if proposed_new_state.is_null() {
            return Ok(Response::new(proto::plan_resource_change::Response {
                planned_state: Some(encode_value(&DynamicValue::null())?),
                requires_replace: vec![],
                planned_private: req.prior_private,
                diagnostics: vec![],
                legacy_type_system: false,
                deferred: None,
            }));
        }

        let creating = prior_state.is_null();
        let mut planned_state = proposed_new_state;
        let mut requires_replace = Vec::new();
        let mut diagnostics = Vec::new();

        for attr in &schema.block.attributes {
            let path = AttributePath::new(&attr.name);
            let config_value = config.get(&path).cloned().unwrap_or(Dynamic::Null);

            // Computed values the user did not set are decided by the apply
            if creating && attr.computed && config_value.is_null() {
                planned_state
                    .mark_unknown(&path)
                    .map_err(|e| Status::internal(e.to_string()))?;
            }

            if attr.plan_modifiers.is_empty() {
                continue;
            }

            let state_value = prior_state.get(&path).cloned().unwrap_or(Dynamic::Null);
            let mut plan_value = planned_state.get(&path).cloned().unwrap_or(Dynamic::Null);

            for modifier in &attr.plan_modifiers {
                let response = modifier.modify(PlanModifierRequest {
                    config_value: DynamicValue::new(config_value.clone()),
                    state_value: DynamicValue::new(state_value.clone()),
                    plan_value: DynamicValue::new(plan_value),
                    path: path.clone(),
                });

                plan_value = response.plan_value.value;
                if response.requires_replace && !requires_replace.contains(&path) {
                    requires_replace.push(path.clone());
                }
                diagnostics.extend(response.diagnostics);
            }

            planned_state
                .set_value(&path, plan_value)
                .map_err(|e| Status::internal(e.to_string()))?;
        }

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(encode_value(&planned_state)?),
            requires_replace: requires_replace.iter().map(path_to_proto).collect(),
            planned_private: req.prior_private,
            diagnostics: diagnostics_to_proto(&diagnostics),
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> Result<Response<proto::apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ApplyResourceChange");

        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let prior_state = decode_value(req.prior_state.as_ref())?;
        let planned_state = decode_value(req.planned_state.as_ref())?;
        let config = decode_value(req.config.as_ref())?;
        let provider_meta = decode_optional(req.provider_meta.as_ref())?;

        let (resource, configure_diagnostics) = self.resource(&ctx, &req.type_name).await?;
        if has_errors(&configure_diagnostics) {
            return Ok(Response::new(proto::apply_resource_change::Response {
                new_state: Some(encode_value(&prior_state)?),
                private: req.planned_private,
                diagnostics: diagnostics_to_proto(&configure_diagnostics),
                legacy_type_system: false,
            }));
        }

        let (mut new_state, private, diagnostics) = if planned_state.is_null() {
            tracing::info!("[{}] Deleting {}", ctx.log_id(), req.type_name);
            let span = rpc_span(&ctx, &req.type_name);
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name: req.type_name,
                        prior_state: prior_state.clone(),
                        planned_private: req.planned_private.clone(),
                        provider_meta,
                    },
                )
                .instrument(span)
                .await;
            // A failed delete keeps the resource in state
            let state = if has_errors(&response.diagnostics) {
                prior_state
            } else {
                DynamicValue::null()
            };
            (state, Vec::new(), response.diagnostics)
        } else if prior_state.is_null() {
            tracing::info!("[{}] Creating {}", ctx.log_id(), req.type_name);
            let span = rpc_span(&ctx, &req.type_name);
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name: req.type_name,
                        planned_state,
                        config,
                        planned_private: req.planned_private.clone(),
                        provider_meta,
                    },
                )
                .instrument(span)
                .await;
            (response.new_state, response.private, response.diagnostics)
        } else {
            tracing::info!("[{}] Updating {}", ctx.log_id(), req.type_name);
            let span = rpc_span(&ctx, &req.type_name);
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name: req.type_name,
                        prior_state: prior_state.clone(),
                        planned_state,
                        config,
                        planned_private: req.planned_private.clone(),
                        provider_meta,
                    },
                )
                .instrument(span)
                .await;
            let state = if response.new_state.is_null() {
                prior_state
            } else {
                response.new_state
            };
            (state, response.private, response.diagnostics)
        };

        if !new_state.is_null() {
            new_state.value.unknowns_to_null();
            schema.block.conform(&mut new_state.value);
        }

        let private = if private.is_empty() {
            req.planned_private
        } else {
            private
        };

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(encode_value(&new_state)?),
            private,
            diagnostics: diagnostics_to_proto(&diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> Result<Response<proto::import_resource_state::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ImportResourceState");
        tracing::info!("[{}] Importing {} {}", ctx.log_id(), req.type_name, req.id);

        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let (resource, diagnostics) = self.resource(&ctx, &req.type_name).await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: diagnostics_to_proto(&diagnostics),
                deferred: None,
            }));
        }

        let span = rpc_span(&ctx, &req.type_name);
        let response = resource
            .import_state(
                ctx,
                ImportResourceStateRequest {
                    type_name: req.type_name,
                    id: req.id,
                    client_capabilities: client_capabilities_from_proto(req.client_capabilities),
                },
            )
            .instrument(span)
            .await;

        let imported_resources = response
            .imported_resources
            .into_iter()
            .map(|mut imported| {
                schema.block.conform(&mut imported.state.value);
                Ok(proto::import_resource_state::ImportedResource {
                    type_name: imported.type_name,
                    state: Some(encode_value(&imported.state)?),
                    private: imported.private,
                })
            })
            .collect::<Result<Vec<_>, Status>>()?;

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(&response.diagnostics),
            deferred: response.deferred.as_ref().map(deferred_to_proto),
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> Result<Response<proto::read_data_source::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::for_rpc("ReadDataSource");
        tracing::debug!("[{}] ReadDataSource {}", ctx.log_id(), req.type_name);

        let schema = self.data_source_schema(&ctx, &req.type_name).await?;
        let config = decode_value(req.config.as_ref())?;

        let (data_source, diagnostics) = self.data_source(&ctx, &req.type_name).await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::read_data_source::Response {
                state: Some(encode_value(&config)?),
                diagnostics: diagnostics_to_proto(&diagnostics),
                deferred: None,
            }));
        }

        let span = rpc_span(&ctx, &req.type_name);
        let mut response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: req.type_name,
                    config,
                    provider_meta: decode_optional(req.provider_meta.as_ref())?,
                    client_capabilities: client_capabilities_from_proto(req.client_capabilities),
                },
            )
            .instrument(span)
            .await;

        response.state.value.unknowns_to_null();
        schema.block.conform(&mut response.state.value);

        Ok(Response::new(proto::read_data_source::Response {
            state: Some(encode_value(&response.state)?),
            diagnostics: diagnostics_to_proto(&response.diagnostics),
            deferred: response.deferred.as_ref().map(deferred_to_proto),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> Result<Response<proto::stop_provider::Response>, Status> {
        let ctx = Context::for_rpc("StopProvider");
        let response = self
            .provider
            .read()
            .await
            .stop(ctx, StopProviderRequest)
            .await;

        Ok(Response::new(proto::stop_provider::Response {
            error: response.error.unwrap_or_default(),
        }))
    }
}

// Conversions between framework and wire types

fn decode_value(value: Option<&proto::DynamicValue>) -> Result<DynamicValue, Status> {
    let decoded = match value {
        Some(v) if !v.msgpack.is_empty() => DynamicValue::decode_msgpack(&v.msgpack),
        Some(v) if !v.json.is_empty() => DynamicValue::decode_json(&v.json),
        _ => Ok(DynamicValue::null()),
    };
    decoded.map_err(Status::from)
}

fn decode_optional(value: Option<&proto::DynamicValue>) -> Result<Option<DynamicValue>, Status> {
    let decoded = decode_value(value)?;
    Ok((!decoded.is_null()).then_some(decoded))
}

fn encode_value(value: &DynamicValue) -> Result<proto::DynamicValue, Status> {
    Ok(proto::DynamicValue {
        msgpack: value.encode_msgpack().map_err(Status::from)?,
        json: vec![],
    })
}

fn diagnostics_to_proto(diagnostics: &[Diagnostic]) -> Vec<proto::Diagnostic> {
    diagnostics
        .iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid,
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning,
            } as i32,
            summary: d.summary.clone(),
            detail: d.detail.clone(),
            attribute: d.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use proto::attribute_path::step::Selector;

    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| proto::attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

fn client_capabilities_from_proto(
    capabilities: Option<proto::ClientCapabilities>,
) -> ClientCapabilities {
    capabilities
        .map(|c| ClientCapabilities {
            deferral_allowed: c.deferral_allowed,
            write_only_attributes_allowed: c.write_only_attributes_allowed,
        })
        .unwrap_or_default()
}

fn server_capabilities_to_proto(
    capabilities: &crate::types::ServerCapabilities,
) -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: capabilities.plan_destroy,
        get_provider_schema_optional: capabilities.get_provider_schema_optional,
        move_resource_state: capabilities.move_resource_state,
    }
}

fn deferred_to_proto(deferred: &Deferred) -> proto::Deferred {
    let reason = match deferred.reason {
        DeferredReason::Unknown => proto::deferred::Reason::Unknown,
        DeferredReason::ResourceConfigUnknown => proto::deferred::Reason::ResourceConfigUnknown,
        DeferredReason::ProviderConfigUnknown => proto::deferred::Reason::ProviderConfigUnknown,
        DeferredReason::AbsentPrereq => proto::deferred::Reason::AbsentPrereq,
    };
    proto::Deferred {
        reason: reason as i32,
    }
}

fn schema_to_proto(schema: &Schema) -> Result<proto::Schema, Status> {
    Ok(proto::Schema {
        version: schema.version,
        block: Some(block_to_proto(&schema.block)?),
    })
}

fn block_to_proto(block: &Block) -> Result<proto::schema::Block, Status> {
    Ok(proto::schema::Block {
        version: block.version,
        attributes: block
            .attributes
            .iter()
            .map(attribute_to_proto)
            .collect::<Result<_, _>>()?,
        block_types: block
            .block_types
            .iter()
            .map(nested_block_to_proto)
            .collect::<Result<_, _>>()?,
        description: block.description.clone(),
        description_kind: string_kind_to_proto(block.description_kind),
        deprecated: block.deprecated,
    })
}

fn attribute_to_proto(attr: &Attribute) -> Result<proto::schema::Attribute, Status> {
    let r#type = serde_json::to_vec(&attr.r#type.to_json())
        .map_err(|e| Status::internal(format!("failed to encode type of {}: {}", attr.name, e)))?;

    Ok(proto::schema::Attribute {
        name: attr.name.clone(),
        r#type,
        nested_type: None,
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: string_kind_to_proto(StringKind::Plain),
        deprecated: attr.deprecated,
        write_only: false,
    })
}

fn nested_block_to_proto(nested: &NestedBlock) -> Result<proto::schema::NestedBlock, Status> {
    use proto::schema::nested_block::NestingMode as ProtoNesting;

    let nesting = match nested.nesting {
        NestingMode::Invalid => ProtoNesting::Invalid,
        NestingMode::Single => ProtoNesting::Single,
        NestingMode::List => ProtoNesting::List,
        NestingMode::Set => ProtoNesting::Set,
        NestingMode::Map => ProtoNesting::Map,
        NestingMode::Group => ProtoNesting::Group,
    };

    Ok(proto::schema::NestedBlock {
        type_name: nested.type_name.clone(),
        block: Some(block_to_proto(&nested.block)?),
        nesting: nesting as i32,
        min_items: nested.min_items,
        max_items: nested.max_items,
    })
}

fn string_kind_to_proto(kind: StringKind) -> i32 {
    match kind {
        StringKind::Plain => proto::StringKind::Plain as i32,
        StringKind::Markdown => proto::StringKind::Markdown as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dynamic_value_decodes_as_null() {
        assert!(decode_value(None).unwrap().is_null());
        assert!(decode_value(Some(&proto::DynamicValue::default()))
            .unwrap()
            .is_null());
    }

    #[test]
    fn json_dynamic_value_is_accepted() {
        let value = proto::DynamicValue {
            msgpack: vec![],
            json: br#"{"id":"a#b"}"#.to_vec(),
        };
        let decoded = decode_value(Some(&value)).unwrap();
        assert_eq!(
            decoded.get_string(&AttributePath::new("id")).unwrap(),
            "a#b"
        );
    }

    #[test]
    fn null_encodes_as_nil() {
        let encoded = encode_value(&DynamicValue::null()).unwrap();
        assert_eq!(encoded.msgpack, vec![0xc0]);
    }

    #[test]
    fn path_converts_every_step_kind() {
        let path = AttributePath::new("data").index(2).key("k");
        let proto_path = path_to_proto(&path);
        assert_eq!(proto_path.steps.len(), 3);
        assert_eq!(
            proto_path.steps[1].selector,
            Some(proto::attribute_path::step::Selector::ElementKeyInt(2))
        );
    }

    #[test]
    fn diagnostics_keep_severity_and_attribute() {
        let diags = diagnostics_to_proto(&[
            Diagnostic::error("bad", "detail").with_attribute(AttributePath::new("name")),
            Diagnostic::warning("meh", ""),
        ]);
        assert_eq!(diags[0].severity, proto::diagnostic::Severity::Error as i32);
        assert!(diags[0].attribute.is_some());
        assert_eq!(
            diags[1].severity,
            proto::diagnostic::Severity::Warning as i32
        );
    }
}
