use async_trait::async_trait;

use warrant_core::AppResult;
use warrant_domain::{
    ContentRef, GroupToRoleMapping, PermissionGrant, PermissionGrantInput, Role, User,
    UserRoleAssignment,
};

/// Repository port for users, roles, grants, assignments and group mappings.
///
/// Every implementation maps infrastructure failures to `AppError::Store`.
#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// Finds a user by name.
    async fn find_user(&self, name: &str) -> AppResult<Option<User>>;

    /// Inserts a user if absent.
    async fn save_user(&self, user: User) -> AppResult<()>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Finds a role by name.
    async fn find_role(&self, name: &str) -> AppResult<Option<Role>>;

    /// Inserts or replaces a role keyed by name.
    async fn save_role(&self, role: Role) -> AppResult<()>;

    /// Deletes a role. Assignments referencing it are kept and ignored on lookup.
    async fn delete_role(&self, name: &str) -> AppResult<bool>;

    /// Persists a grant and returns it with its store-assigned id.
    async fn create_permission_grant(&self, input: PermissionGrantInput)
    -> AppResult<PermissionGrant>;

    /// Returns the grants with the given ids. Unknown ids are skipped.
    async fn find_permission_grants(&self, ids: &[String]) -> AppResult<Vec<PermissionGrant>>;

    /// Deletes grants by id.
    async fn delete_permission_grants(&self, ids: &[String]) -> AppResult<()>;

    /// Lists a user's assignments in insertion order.
    async fn list_role_assignments_for_user(
        &self,
        user: &str,
        include_remote: bool,
    ) -> AppResult<Vec<UserRoleAssignment>>;

    /// Lists every stored assignment.
    async fn list_role_assignments(&self) -> AppResult<Vec<UserRoleAssignment>>;

    /// Inserts an assignment unless one with the same (user, role, source)
    /// exists. Returns whether a row was inserted.
    async fn upsert_role_assignment(&self, assignment: UserRoleAssignment) -> AppResult<bool>;

    /// Deletes the assignment keyed by (user, role, source).
    async fn delete_role_assignment(&self, user: &str, role: &str, source: &str)
    -> AppResult<bool>;

    /// Lists all group mappings ordered by group.
    async fn list_group_to_role_maps(&self) -> AppResult<Vec<GroupToRoleMapping>>;

    /// Returns mappings for the given groups, compared exactly.
    async fn find_group_to_role_maps(&self, groups: &[String])
    -> AppResult<Vec<GroupToRoleMapping>>;

    /// Inserts or replaces a mapping keyed by group.
    async fn save_group_to_role_map(&self, mapping: GroupToRoleMapping) -> AppResult<()>;

    /// Deletes the mapping for a group.
    async fn delete_group_to_role_map(&self, group: &str) -> AppResult<bool>;
}

/// Read port over installed actions, used to resolve rule references.
#[async_trait]
pub trait ActionCatalog: Send + Sync {
    /// Finds an installed action by its `pack.name` reference.
    async fn find_action_by_ref(&self, action_ref: &str) -> AppResult<Option<ContentRef>>;
}
