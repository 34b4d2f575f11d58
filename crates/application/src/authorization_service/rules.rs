use super::*;

impl AuthorizationService {
    /// Returns whether the user may bind a rule to its trigger.
    pub async fn user_has_rule_trigger_permission(
        &self,
        user: &User,
        rule: &RuleResource,
    ) -> AppResult<bool> {
        self.backend
            .rule_reference_resolver()
            .user_has_trigger_permission(user, rule.trigger())
            .await
    }

    /// Returns whether the user may run the rule's action.
    pub async fn user_has_rule_action_permission(
        &self,
        user: &User,
        rule: &RuleResource,
    ) -> AppResult<bool> {
        self.backend
            .rule_reference_resolver()
            .user_has_action_permission(user, rule.action_ref())
            .await
    }

    /// Fails unless the user may use both the trigger and the action a rule
    /// references.
    pub async fn assert_user_has_rule_trigger_and_action_permission(
        &self,
        user: &User,
        rule: &RuleResource,
    ) -> AppResult<()> {
        if !self.config.enable {
            return Ok(());
        }

        if !self.user_has_rule_trigger_permission(user, rule).await? {
            return Err(Self::access_denied(
                user,
                format!(
                    "User \"{}\" doesn't have required permission (webhook_create) to use trigger {}",
                    user.name(),
                    rule.trigger().trigger_type()
                ),
            ));
        }

        if !self.user_has_rule_action_permission(user, rule).await? {
            return Err(Self::access_denied(
                user,
                format!(
                    "User \"{}\" doesn't have required (action_execute) permission to use action {}",
                    user.name(),
                    rule.action_ref()
                ),
            ));
        }

        Ok(())
    }
}
