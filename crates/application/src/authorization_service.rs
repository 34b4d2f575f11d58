use std::sync::Arc;

use tracing::debug;

use warrant_core::{AppError, AppResult};
use warrant_domain::{
    KeyValueListScope, KeyValuePairResource, PermissionType, RbacSummary, Resource, ResourceApi,
    ResourceType, RuleResource, SystemRole, User,
};

use crate::{BackendContext, BackendRegistry, RbacBackend, RbacConfig, RbacService};

mod key_value_pairs;
mod permissions;
mod roles;
mod rules;


/// Policy façade consumed by the API layer.
///
/// Predicates return booleans; `assert_*` variants turn a `false` into a
/// typed denial. Store failures propagate unchanged from both.
#[derive(Clone)]
pub struct AuthorizationService {
    config: RbacConfig,
    service: RbacService,
    backend: Arc<dyn RbacBackend>,
}

impl AuthorizationService {
    /// Creates the façade over an already selected backend.
    #[must_use]
    pub fn new(config: RbacConfig, service: RbacService, backend: Arc<dyn RbacBackend>) -> Self {
        Self {
            config,
            service,
            backend,
        }
    }

    /// Selects the configured backend from a registry and builds the façade.
    pub fn from_registry(registry: &BackendRegistry, context: BackendContext) -> AppResult<Self> {
        let backend = registry.build(&context)?;
        Ok(Self::new(context.config, context.service, backend))
    }

    /// Returns the active settings.
    #[must_use]
    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    /// Returns the active backend.
    #[must_use]
    pub fn backend(&self) -> Arc<dyn RbacBackend> {
        self.backend.clone()
    }

    fn access_denied(user: &User, message: impl Into<String>) -> AppError {
        let message = message.into();
        debug!(user = %user.name(), reason = %message, "access denied");
        AppError::AccessDenied {
            user: user.name().to_owned(),
            message,
        }
    }
}

fn ensure_permission_for(resource_type: ResourceType, permission_type: PermissionType) -> AppResult<()> {
    if permission_type.resource_type() == resource_type {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "permission '{}' does not apply to resource type '{}'",
        permission_type.as_str(),
        resource_type.as_str()
    )))
}
