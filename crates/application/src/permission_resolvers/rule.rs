use tracing::debug;

use super::*;

/// Resolver for rules and the trigger/action references they carry.
#[derive(Clone)]
pub struct RulePermissionsResolver {
    evaluator: GrantEvaluator,
    rules: ResourcePermissionsResolver,
    actions: ResourcePermissionsResolver,
    webhooks: ResourcePermissionsResolver,
    action_catalog: Arc<dyn ActionCatalog>,
}

impl RulePermissionsResolver {
    /// Creates the rule resolver.
    #[must_use]
    pub fn new(evaluator: GrantEvaluator, action_catalog: Arc<dyn ActionCatalog>) -> Self {
        Self {
            rules: ResourcePermissionsResolver::new(ResourceType::Rule, evaluator.clone()),
            actions: ResourcePermissionsResolver::new(ResourceType::Action, evaluator.clone()),
            webhooks: ResourcePermissionsResolver::new(ResourceType::Webhook, evaluator.clone()),
            evaluator,
            action_catalog,
        }
    }
}

#[async_trait]
impl PermissionsResolver for RulePermissionsResolver {
    async fn user_has_permission(
        &self,
        user: &User,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        self.rules.user_has_permission(user, permission_type).await
    }

    async fn user_has_resource_db_permission(
        &self,
        user: &User,
        resource: &Resource,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        self.rules
            .user_has_resource_db_permission(user, resource, permission_type)
            .await
    }
}

#[async_trait]
impl RuleReferenceResolver for RulePermissionsResolver {
    async fn user_has_trigger_permission(
        &self,
        user: &User,
        trigger: &RuleTrigger,
    ) -> AppResult<bool> {
        if self.evaluator.is_unrestricted(user).await? {
            return Ok(true);
        }

        // Only webhook triggers are guarded.
        if !trigger.is_webhook() {
            return Ok(true);
        }

        let webhook = Resource::Webhook {
            name: trigger.webhook_url().to_owned(),
        };
        self.webhooks
            .user_has_resource_db_permission(user, &webhook, PermissionType::WebhookCreate)
            .await
    }

    async fn user_has_action_permission(&self, user: &User, action_ref: &str) -> AppResult<bool> {
        if self.evaluator.is_unrestricted(user).await? {
            return Ok(true);
        }

        let action = match self.action_catalog.find_action_by_ref(action_ref).await? {
            Some(action) => action,
            None => {
                debug!(action_ref = %action_ref, "rule references an action that is not installed");
                ContentRef::parse(action_ref)?
            }
        };

        self.actions
            .user_has_resource_db_permission(
                user,
                &Resource::Action(action),
                PermissionType::ActionExecute,
            )
            .await
    }
}
