//! Lifecycle registry: the surface an orchestration host talks to.
//!
//! Configuring the registry builds exactly one API client and hands it to
//! every controller and data source.

use std::collections::BTreeMap;
use std::sync::Arc;

use slackctl_api::{HttpSlackClient, SlackApi};
use slackctl_config::ProviderConfig;

use crate::binding::{Binding, ManagedResource};
use crate::controller::{ConversationController, UserGroupController};
use crate::datasource::{ConversationDataSource, DataSource, UserDataSource, UserGroupDataSource};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::RunnerError;

pub struct LifecycleRegistry {
    resources: BTreeMap<&'static str, Box<dyn ManagedResource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl LifecycleRegistry {
    /// Registers every resource type and data source against `api`.
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        let mut registry = Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        };

        registry.register_resource(Box::new(Binding::new(ConversationController::new(
            api.clone(),
        ))));
        registry.register_resource(Box::new(Binding::new(UserGroupController::new(
            api.clone(),
        ))));

        registry.register_data_source(Box::new(ConversationDataSource::new(api.clone())));
        registry.register_data_source(Box::new(UserDataSource::new(api.clone())));
        registry.register_data_source(Box::new(UserGroupDataSource::new(api)));

        registry
    }

    /// Builds the HTTP client from the provider token.
    pub fn configure(provider: &ProviderConfig) -> Result<Self, Diagnostics> {
        let token = provider
            .token()
            .map_err(|e| Diagnostic::error("failed to configure slack provider", e.to_string()))?;
        let client = HttpSlackClient::new(token)
            .map_err(|e| Diagnostic::error("failed to create slack client", e.to_string()))?;

        tracing::info!("configured slack provider");
        Ok(Self::new(Arc::new(client)))
    }

    fn register_resource(&mut self, resource: Box<dyn ManagedResource>) {
        self.resources.insert(resource.type_name(), resource);
    }

    fn register_data_source(&mut self, source: Box<dyn DataSource>) {
        self.data_sources.insert(source.type_name(), source);
    }

    pub fn resource(&self, type_name: &str) -> Result<&dyn ManagedResource, RunnerError> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| RunnerError::UnknownType {
                kind: "resource",
                type_name: type_name.to_string(),
            })
    }

    pub fn data_source(&self, type_name: &str) -> Result<&dyn DataSource, RunnerError> {
        self.data_sources
            .get(type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| RunnerError::UnknownType {
                kind: "data source",
                type_name: type_name.to_string(),
            })
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }
}
