use super::*;

/// Resolver that allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPermissionsResolver;

#[async_trait]
impl PermissionsResolver for NoopPermissionsResolver {
    async fn user_has_permission(
        &self,
        _user: &User,
        _permission_type: PermissionType,
    ) -> AppResult<bool> {
        Ok(true)
    }

    async fn user_has_resource_db_permission(
        &self,
        _user: &User,
        _resource: &Resource,
        _permission_type: PermissionType,
    ) -> AppResult<bool> {
        Ok(true)
    }

    async fn user_has_resource_api_permission(
        &self,
        _user: &User,
        _resource_api: &ResourceApi,
        _permission_type: PermissionType,
    ) -> AppResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl RuleReferenceResolver for NoopPermissionsResolver {
    async fn user_has_trigger_permission(
        &self,
        _user: &User,
        _trigger: &RuleTrigger,
    ) -> AppResult<bool> {
        Ok(true)
    }

    async fn user_has_action_permission(
        &self,
        _user: &User,
        _action_ref: &str,
    ) -> AppResult<bool> {
        Ok(true)
    }
}
