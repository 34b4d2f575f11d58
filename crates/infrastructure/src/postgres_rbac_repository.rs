use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warrant_application::RbacRepository;
use warrant_core::{AppError, AppResult};
use warrant_domain::{
    GroupToRoleMapping, PermissionGrant, PermissionGrantInput, PermissionType, ResourceType,
    Role, User, UserRoleAssignment,
};

mod assignments;
mod grants;
mod group_maps;
mod roles;
mod users;


/// PostgreSQL-backed RBAC repository.
#[derive(Clone)]
pub struct PostgresRbacRepository {
    pool: PgPool,
}

impl PostgresRbacRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    name: String,
    description: Option<String>,
    is_system: bool,
    grant_ids: Vec<String>,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let name = self.name.clone();
        Role::new(self.name, self.description, self.grant_ids, self.is_system).map_err(|error| {
            AppError::Internal(format!("persisted role '{name}' is invalid: {error}"))
        })
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    id: Uuid,
    resource_uid: Option<String>,
    resource_type: String,
    permission_types: Vec<String>,
}

impl GrantRow {
    fn into_grant(self) -> AppResult<PermissionGrant> {
        let id = self.id.to_string();
        let decode = |error: AppError| {
            AppError::Internal(format!("persisted permission grant '{id}' is invalid: {error}"))
        };

        let resource_type = ResourceType::from_str(&self.resource_type).map_err(decode)?;
        let permission_types = self
            .permission_types
            .iter()
            .map(|value| PermissionType::from_str(value))
            .collect::<AppResult<Vec<_>>>()
            .map_err(decode)?;

        PermissionGrantInput::new(self.resource_uid, resource_type, permission_types)
            .map(|input| input.into_grant(id.clone()))
            .map_err(decode)
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_name: String,
    role_name: String,
    source: String,
    description: Option<String>,
    is_remote: bool,
}

impl AssignmentRow {
    fn into_assignment(self) -> AppResult<UserRoleAssignment> {
        UserRoleAssignment::new(
            self.user_name,
            self.role_name,
            self.source,
            self.description,
            self.is_remote,
        )
        .map_err(|error| {
            AppError::Internal(format!("persisted role assignment is invalid: {error}"))
        })
    }
}

#[derive(Debug, FromRow)]
struct GroupMapRow {
    group_name: String,
    roles: Vec<String>,
    source: String,
    description: Option<String>,
    enabled: bool,
}

impl GroupMapRow {
    fn into_mapping(self) -> AppResult<GroupToRoleMapping> {
        let group = self.group_name.clone();
        GroupToRoleMapping::new(
            self.group_name,
            self.roles,
            self.source,
            self.description,
            self.enabled,
        )
        .map_err(|error| {
            AppError::Internal(format!("persisted group mapping '{group}' is invalid: {error}"))
        })
    }
}

fn store_error(action: &str, error: sqlx::Error) -> AppError {
    AppError::Store(format!("failed to {action}: {error}"))
}

#[async_trait]
impl RbacRepository for PostgresRbacRepository {
    async fn find_user(&self, name: &str) -> AppResult<Option<User>> {
        self.find_user_impl(name).await
    }

    async fn save_user(&self, user: User) -> AppResult<()> {
        self.save_user_impl(user).await
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.list_roles_impl().await
    }

    async fn find_role(&self, name: &str) -> AppResult<Option<Role>> {
        self.find_role_impl(name).await
    }

    async fn save_role(&self, role: Role) -> AppResult<()> {
        self.save_role_impl(role).await
    }

    async fn delete_role(&self, name: &str) -> AppResult<bool> {
        self.delete_role_impl(name).await
    }

    async fn create_permission_grant(
        &self,
        input: PermissionGrantInput,
    ) -> AppResult<PermissionGrant> {
        self.create_permission_grant_impl(input).await
    }

    async fn find_permission_grants(&self, ids: &[String]) -> AppResult<Vec<PermissionGrant>> {
        self.find_permission_grants_impl(ids).await
    }

    async fn delete_permission_grants(&self, ids: &[String]) -> AppResult<()> {
        self.delete_permission_grants_impl(ids).await
    }

    async fn list_role_assignments_for_user(
        &self,
        user: &str,
        include_remote: bool,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        self.list_role_assignments_for_user_impl(user, include_remote)
            .await
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<UserRoleAssignment>> {
        self.list_role_assignments_impl().await
    }

    async fn upsert_role_assignment(&self, assignment: UserRoleAssignment) -> AppResult<bool> {
        self.upsert_role_assignment_impl(assignment).await
    }

    async fn delete_role_assignment(
        &self,
        user: &str,
        role: &str,
        source: &str,
    ) -> AppResult<bool> {
        self.delete_role_assignment_impl(user, role, source).await
    }

    async fn list_group_to_role_maps(&self) -> AppResult<Vec<GroupToRoleMapping>> {
        self.list_group_to_role_maps_impl().await
    }

    async fn find_group_to_role_maps(
        &self,
        groups: &[String],
    ) -> AppResult<Vec<GroupToRoleMapping>> {
        self.find_group_to_role_maps_impl(groups).await
    }

    async fn save_group_to_role_map(&self, mapping: GroupToRoleMapping) -> AppResult<()> {
        self.save_group_to_role_map_impl(mapping).await
    }

    async fn delete_group_to_role_map(&self, group: &str) -> AppResult<bool> {
        self.delete_group_to_role_map_impl(group).await
    }
}
