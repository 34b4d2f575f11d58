use super::*;

/// Resolver for executions.
///
/// Grants on the execution itself apply, and so do the equivalent grants on
/// the executed action.
#[derive(Clone)]
pub struct ExecutionPermissionsResolver {
    evaluator: GrantEvaluator,
    actions: ResourcePermissionsResolver,
}

impl ExecutionPermissionsResolver {
    /// Creates the execution resolver.
    #[must_use]
    pub fn new(evaluator: GrantEvaluator) -> Self {
        Self {
            actions: ResourcePermissionsResolver::new(ResourceType::Action, evaluator.clone()),
            evaluator,
        }
    }
}

fn action_permission_for(permission_type: PermissionType) -> Option<PermissionType> {
    match permission_type {
        PermissionType::ExecutionView => Some(PermissionType::ActionView),
        PermissionType::ExecutionReRun | PermissionType::ExecutionStop => {
            Some(PermissionType::ActionExecute)
        }
        PermissionType::ExecutionAll => Some(PermissionType::ActionAll),
        _ => None,
    }
}

#[async_trait]
impl PermissionsResolver for ExecutionPermissionsResolver {
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
        let Resource::Execution(execution) = resource else {
            return ensure_resource_type(resource, ResourceType::Execution).map(|()| false);
        };

        if self
            .evaluator
            .check_resource(user, resource, permission_type)
            .await?
        {
            return Ok(true);
        }

        let Some(action_permission) = action_permission_for(permission_type) else {
            return Ok(false);
        };

        let action = Resource::Action(execution.action().clone());
        self.actions
            .user_has_resource_db_permission(user, &action, action_permission)
            .await
    }
}
