use super::*;

impl AuthorizationService {
    /// Returns whether the user may read the decrypted value of a secret.
    ///
    /// Only administrators and the owner of a user-scoped key may.
    pub async fn user_can_decrypt_key_value_pair(
        &self,
        user: &User,
        pair: &KeyValuePairResource,
    ) -> AppResult<bool> {
        if pair.owner() == Some(user.name()) {
            return Ok(true);
        }

        self.user_is_admin(user).await
    }

    /// Fails unless the user may decrypt the secret.
    pub async fn assert_user_can_decrypt_key_value_pair(
        &self,
        user: &User,
        pair: &KeyValuePairResource,
    ) -> AppResult<()> {
        if self.user_can_decrypt_key_value_pair(user, pair).await? {
            return Ok(());
        }

        Err(Self::access_denied(
            user,
            "Decrypt option requires administrator access",
        ))
    }

    /// Checks a key listing request.
    ///
    /// `all` needs an administrator, `system` needs `key_value_pair_list`
    /// and `user` lists only the caller's own keys.
    pub async fn assert_user_can_list_key_value_pairs(
        &self,
        user: &User,
        scope: KeyValueListScope,
    ) -> AppResult<()> {
        match scope {
            KeyValueListScope::All => {
                if self.user_is_admin(user).await? {
                    return Ok(());
                }
                Err(Self::access_denied(
                    user,
                    "\"all\" scope requires administrator access",
                ))
            }
            KeyValueListScope::System => {
                self.assert_user_has_permission(user, PermissionType::KeyValuePairList)
                    .await
            }
            KeyValueListScope::User => Ok(()),
        }
    }
}
