use super::*;

/// Resolver for datastore items.
///
/// A user-scoped key belongs to its owner alone: the owner is always allowed,
/// everybody else except administrators is denied, whatever their grants or
/// observer role say. System-scoped keys follow the generic algorithm.
#[derive(Clone)]
pub struct KeyValuePairPermissionsResolver {
    evaluator: GrantEvaluator,
}

impl KeyValuePairPermissionsResolver {
    /// Creates the key-value pair resolver.
    #[must_use]
    pub fn new(evaluator: GrantEvaluator) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl PermissionsResolver for KeyValuePairPermissionsResolver {
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
        let Resource::KeyValuePair(pair) = resource else {
            return ensure_resource_type(resource, ResourceType::KeyValuePair).map(|()| false);
        };

        if let Some(owner) = pair.owner() {
            if owner == user.name() {
                return Ok(true);
            }
            return self.evaluator.is_unrestricted(user).await;
        }

        self.evaluator
            .check_resource(user, resource, permission_type)
            .await
    }
}
