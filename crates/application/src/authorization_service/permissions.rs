use super::*;

impl AuthorizationService {
    /// Type-level check, used where no resource instance exists yet.
    pub async fn user_has_permission(
        &self,
        user: &User,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        self.backend
            .resolver_for_permission_type(permission_type)
            .user_has_permission(user, permission_type)
            .await
    }

    /// Instance-level check against a stored resource.
    pub async fn user_has_resource_db_permission(
        &self,
        user: &User,
        resource: &Resource,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        ensure_permission_for(resource.resource_type(), permission_type)?;
        self.backend
            .resolver_for_resource_type(resource.resource_type())
            .user_has_resource_db_permission(user, resource, permission_type)
            .await
    }

    /// Instance-level check against an incoming payload.
    pub async fn user_has_resource_api_permission(
        &self,
        user: &User,
        resource_api: &ResourceApi,
        permission_type: PermissionType,
    ) -> AppResult<bool> {
        ensure_permission_for(resource_api.resource_type(), permission_type)?;
        self.backend
            .resolver_for_resource_type(resource_api.resource_type())
            .user_has_resource_api_permission(user, resource_api, permission_type)
            .await
    }

    /// Fails with `ResourceTypeAccessDenied` when the type-level check fails.
    pub async fn assert_user_has_permission(
        &self,
        user: &User,
        permission_type: PermissionType,
    ) -> AppResult<()> {
        if self.user_has_permission(user, permission_type).await? {
            return Ok(());
        }

        debug!(
            user = %user.name(),
            permission = %permission_type,
            "resource type access denied"
        );
        Err(AppError::ResourceTypeAccessDenied {
            user: user.name().to_owned(),
            permission: permission_type.as_str().to_owned(),
        })
    }

    /// Fails with `ResourceAccessDenied` when the stored-resource check fails.
    pub async fn assert_user_has_resource_db_permission(
        &self,
        user: &User,
        resource: &Resource,
        permission_type: PermissionType,
    ) -> AppResult<()> {
        if self
            .user_has_resource_db_permission(user, resource, permission_type)
            .await?
        {
            return Ok(());
        }

        Err(resource_denied(user, resource.uid(), permission_type))
    }

    /// Fails with `ResourceAccessDenied` when the payload check fails.
    pub async fn assert_user_has_resource_api_permission(
        &self,
        user: &User,
        resource_api: &ResourceApi,
        permission_type: PermissionType,
    ) -> AppResult<()> {
        if self
            .user_has_resource_api_permission(user, resource_api, permission_type)
            .await?
        {
            return Ok(());
        }

        let resource_uid = resource_api.resolve(user.name())?.uid();
        Err(resource_denied(user, resource_uid, permission_type))
    }
}

fn resource_denied(user: &User, resource_uid: String, permission_type: PermissionType) -> AppError {
    debug!(
        user = %user.name(),
        permission = %permission_type,
        resource = %resource_uid,
        "resource access denied"
    );
    AppError::ResourceAccessDenied {
        user: user.name().to_owned(),
        permission: permission_type.as_str().to_owned(),
        resource_uid,
    }
}
