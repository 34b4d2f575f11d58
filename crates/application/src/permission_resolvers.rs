use std::sync::Arc;

use async_trait::async_trait;

use warrant_core::{AppError, AppResult};
use warrant_domain::{
    ContentRef, PermissionType, Resource, ResourceApi, ResourceType, RuleTrigger, SystemRole, User,
};

use crate::{ActionCatalog, RbacService};

mod execution;
mod key_value_pair;
mod noop;
mod resource;
mod rule;

#[cfg(test)]
mod tests;

pub use execution::ExecutionPermissionsResolver;
pub use key_value_pair::KeyValuePairPermissionsResolver;
pub use noop::NoopPermissionsResolver;
pub use resource::ResourcePermissionsResolver;
pub use rule::RulePermissionsResolver;

/// Allow/deny decisions for one resource kind.
///
/// Resolvers never fail for an ordinary denial; they return `false`. Store
/// failures propagate as `AppError::Store`.
#[async_trait]
pub trait PermissionsResolver: Send + Sync {
    /// Type-level check with no concrete resource (list, create).
    async fn user_has_permission(
        &self,
        user: &User,
        permission_type: PermissionType,
    ) -> AppResult<bool>;

    /// Instance-level check against a stored resource.
    async fn user_has_resource_db_permission(
        &self,
        user: &User,
        resource: &Resource,
        permission_type: PermissionType,
    ) -> AppResult<bool>;

    /// Instance-level check against a payload that is not stored yet.
    async fn user_has_resource_api_permission(
        &self,
        user: &User,
        resource_api: &ResourceApi,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        let resource = resource_api.resolve(user.name())?;
        self.user_has_resource_db_permission(user, &resource, permission_type)
            .await
    }
}

/// Checks on the trigger and action a rule references.
#[async_trait]
pub trait RuleReferenceResolver: Send + Sync {
    /// Returns whether the user may bind a rule to `trigger`.
    async fn user_has_trigger_permission(
        &self,
        user: &User,
        trigger: &RuleTrigger,
    ) -> AppResult<bool>;

    /// Returns whether the user may run the action referenced by a rule.
    async fn user_has_action_permission(&self, user: &User, action_ref: &str) -> AppResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Standing {
    Unrestricted,
    Observer,
    Restricted,
}

/// Grant lookup and bypass rules shared by every resolver.
#[derive(Clone)]
pub struct GrantEvaluator {
    service: RbacService,
    enabled: bool,
}

impl GrantEvaluator {
    /// Creates an evaluator. With `enabled` off every check allows.
    #[must_use]
    pub fn new(service: RbacService, enabled: bool) -> Self {
        Self { service, enabled }
    }

    async fn standing(&self, user: &User) -> AppResult<Standing> {
        if !self.enabled {
            return Ok(Standing::Unrestricted);
        }

        let roles = self.service.role_names_for_user(user).await?;
        let holds = |role: SystemRole| roles.iter().any(|name| name == role.as_str());

        if holds(SystemRole::SystemAdmin) || holds(SystemRole::Admin) {
            return Ok(Standing::Unrestricted);
        }
        if holds(SystemRole::Observer) {
            return Ok(Standing::Observer);
        }
        Ok(Standing::Restricted)
    }

    /// Returns whether RBAC is off or the user is an administrator.
    pub(crate) async fn is_unrestricted(&self, user: &User) -> AppResult<bool> {
        Ok(self.standing(user).await? == Standing::Unrestricted)
    }

    /// Runs the bypass rules. `Some(true)` short-circuits; `None` means grants decide.
    async fn bypass(&self, user: &User, permission_type: PermissionType) -> AppResult<Option<bool>> {
        Ok(match self.standing(user).await? {
            Standing::Unrestricted => Some(true),
            Standing::Observer if permission_type.is_read_only() => Some(true),
            Standing::Observer | Standing::Restricted => None,
        })
    }

    /// Type-level algorithm: bypass, then a global grant covering the
    /// permission. List verbs are also satisfied by scoped grants.
    pub(crate) async fn check_type(
        &self,
        user: &User,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        if let Some(allowed) = self.bypass(user, permission_type).await? {
            return Ok(allowed);
        }

        let grants = self
            .service
            .get_all_permission_grants_for_user(user, Some(permission_type))
            .await?;

        Ok(grants
            .iter()
            .any(|grant| grant.is_global() || permission_type.is_list()))
    }

    /// Instance-level algorithm: bypass, then grants matching the resource.
    pub(crate) async fn check_resource(
        &self,
        user: &User,
        resource: &Resource,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        if let Some(allowed) = self.bypass(user, permission_type).await? {
            return Ok(allowed);
        }

        self.has_matching_grant(user, resource, permission_type)
            .await
    }

    /// Returns whether a grant matching the resource covers the permission.
    ///
    /// A matching list grant also covers view.
    pub(crate) async fn has_matching_grant(
        &self,
        user: &User,
        resource: &Resource,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        let grants = self
            .service
            .get_all_permission_grants_for_user(user, None)
            .await?;

        let implied_by_list = if permission_type.is_view() {
            permission_type.resource_type().list_permission()
        } else {
            None
        };

        Ok(grants
            .iter()
            .filter(|grant| grant.matches_resource(resource))
            .any(|grant| {
                grant.covers(permission_type)
                    || implied_by_list.is_some_and(|list_permission| grant.covers(list_permission))
            }))
    }
}

fn ensure_resource_type(resource: &Resource, expected: ResourceType) -> AppResult<()> {
    if resource.resource_type() == expected {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "resolver for '{}' can't check resource '{}'",
        expected.as_str(),
        resource.uid()
    )))
}
