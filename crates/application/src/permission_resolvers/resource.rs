use super::*;

/// Resolver for kinds without special scoping.
///
/// Content-pack kinds (action, alias, rule, sensor, trigger, policy) also
/// match grants on the UID of their pack.
#[derive(Clone)]
pub struct ResourcePermissionsResolver {
    resource_type: ResourceType,
    evaluator: GrantEvaluator,
}

impl ResourcePermissionsResolver {
    /// Creates a resolver for one resource type.
    #[must_use]
    pub fn new(resource_type: ResourceType, evaluator: GrantEvaluator) -> Self {
        Self {
            resource_type,
            evaluator,
        }
    }

    /// Returns the resource type this resolver decides for.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }
}

#[async_trait]
impl PermissionsResolver for ResourcePermissionsResolver {
    async fn user_has_permission(
        &self,
        user: &User,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        self.evaluator.check_type(user, permission_type).await
    }

    async fn user_has_resource_db_permission(
        &self,
        user: &User,
        resource: &Resource,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        ensure_resource_type(resource, self.resource_type)?;
        self.evaluator
            .check_resource(user, resource, permission_type)
            .await
    }
}
