use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::info;

use warrant_core::{AppError, AppResult};
use warrant_domain::{PermissionType, ResourceType};

use crate::permission_resolvers::{
    ExecutionPermissionsResolver, GrantEvaluator, KeyValuePairPermissionsResolver,
    NoopPermissionsResolver, PermissionsResolver, ResourcePermissionsResolver,
    RulePermissionsResolver, RuleReferenceResolver,
};
use crate::remote_group_syncer::{
    DefaultRemoteGroupToRoleSyncer, NoopRemoteGroupToRoleSyncer, RemoteGroupToRoleSyncer,
};
use crate::{ActionCatalog, DEFAULT_BACKEND, NOOP_BACKEND, RbacConfig, RbacService};


/// Pluggable RBAC implementation.
pub trait RbacBackend: Send + Sync {
    /// Returns the registered backend name.
    fn name(&self) -> &'static str;

    /// Returns the resolver responsible for a resource type.
    fn resolver_for_resource_type(&self, resource_type: ResourceType) -> Arc<dyn PermissionsResolver>;

    /// Returns the resolver responsible for a permission type.
    fn resolver_for_permission_type(
        &self,
        permission_type: PermissionType,
    ) -> Arc<dyn PermissionsResolver> {
        self.resolver_for_resource_type(permission_type.resource_type())
    }

    /// Returns the resolver for rule trigger and action references.
    fn rule_reference_resolver(&self) -> Arc<dyn RuleReferenceResolver>;

    /// Returns the remote group syncer.
    fn remote_group_to_role_syncer(&self) -> Arc<dyn RemoteGroupToRoleSyncer>;
}

/// Collaborators handed to backend constructors.
#[derive(Clone)]
pub struct BackendContext {
    /// RBAC settings.
    pub config: RbacConfig,
    /// Role assignment service.
    pub service: RbacService,
    /// Installed actions, for rule references.
    pub action_catalog: Arc<dyn ActionCatalog>,
}

/// Constructor registered for a backend name.
pub type BackendConstructor = fn(&BackendContext) -> Arc<dyn RbacBackend>;

/// Backend that runs the resolution engine against the store.
pub struct DefaultRbacBackend {
    resolvers: HashMap<ResourceType, Arc<dyn PermissionsResolver>>,
    rules: Arc<RulePermissionsResolver>,
    syncer: Arc<dyn RemoteGroupToRoleSyncer>,
}

impl DefaultRbacBackend {
    /// Builds one resolver per resource type.
    #[must_use]
    pub fn new(context: &BackendContext) -> Self {
        let evaluator = GrantEvaluator::new(context.service.clone(), context.config.enable);
        let rules = Arc::new(RulePermissionsResolver::new(
            evaluator.clone(),
            context.action_catalog.clone(),
        ));

        let mut resolvers: HashMap<ResourceType, Arc<dyn PermissionsResolver>> = HashMap::new();
        for resource_type in ResourceType::all() {
            let resolver: Arc<dyn PermissionsResolver> = match resource_type {
                ResourceType::KeyValuePair => {
                    Arc::new(KeyValuePairPermissionsResolver::new(evaluator.clone()))
                }
                ResourceType::Execution => {
                    Arc::new(ExecutionPermissionsResolver::new(evaluator.clone()))
                }
                ResourceType::Rule => rules.clone(),
                other => Arc::new(ResourcePermissionsResolver::new(*other, evaluator.clone())),
            };
            resolvers.insert(*resource_type, resolver);
        }

        Self {
            resolvers,
            rules,
            syncer: Arc::new(DefaultRemoteGroupToRoleSyncer::new(
                context.service.clone(),
                context.config.sync_remote_groups_case_sensitive,
            )),
        }
    }

    fn construct(context: &BackendContext) -> Arc<dyn RbacBackend> {
        Arc::new(Self::new(context))
    }
}

impl RbacBackend for DefaultRbacBackend {
    fn name(&self) -> &'static str {
        DEFAULT_BACKEND
    }

    fn resolver_for_resource_type(&self, resource_type: ResourceType) -> Arc<dyn PermissionsResolver> {
        match self.resolvers.get(&resource_type) {
            Some(resolver) => resolver.clone(),
            // Every resource type is registered in `new`.
            None => Arc::new(NoopPermissionsResolver),
        }
    }

    fn rule_reference_resolver(&self) -> Arc<dyn RuleReferenceResolver> {
        self.rules.clone()
    }

    fn remote_group_to_role_syncer(&self) -> Arc<dyn RemoteGroupToRoleSyncer> {
        self.syncer.clone()
    }
}

/// Backend that allows everything and never syncs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRbacBackend;

impl NoopRbacBackend {
    fn construct(_context: &BackendContext) -> Arc<dyn RbacBackend> {
        Arc::new(Self)
    }
}

impl RbacBackend for NoopRbacBackend {
    fn name(&self) -> &'static str {
        NOOP_BACKEND
    }

    fn resolver_for_resource_type(&self, _resource_type: ResourceType) -> Arc<dyn PermissionsResolver> {
        Arc::new(NoopPermissionsResolver)
    }

    fn rule_reference_resolver(&self) -> Arc<dyn RuleReferenceResolver> {
        Arc::new(NoopPermissionsResolver)
    }

    fn remote_group_to_role_syncer(&self) -> Arc<dyn RemoteGroupToRoleSyncer> {
        Arc::new(NoopRemoteGroupToRoleSyncer)
    }
}

/// Name-to-constructor map populated by the host application.
#[derive(Clone)]
pub struct BackendRegistry {
    constructors: BTreeMap<String, BackendConstructor>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_BACKEND, DefaultRbacBackend::construct);
        registry.register(NOOP_BACKEND, NoopRbacBackend::construct);
        registry
    }
}

impl BackendRegistry {
    /// Creates a registry without any backend.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registers or replaces a backend constructor.
    pub fn register(&mut self, name: impl Into<String>, constructor: BackendConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Returns registered backend names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Builds the backend selected by `context.config.backend`.
    pub fn build(&self, context: &BackendContext) -> AppResult<Arc<dyn RbacBackend>> {
        let name = context.config.backend.as_str();
        let Some(constructor) = self.constructors.get(name) else {
            return Err(AppError::Configuration(format!(
                "unknown rbac backend '{name}', available: {}",
                self.names().join(", ")
            )));
        };

        let backend = constructor(context);
        info!(backend = %backend.name(), enabled = context.config.enable, "selected rbac backend");
        Ok(backend)
    }
}
