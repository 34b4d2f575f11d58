use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use warrant_application::RbacRepository;
use warrant_core::AppResult;
use warrant_domain::{
    GroupToRoleMapping, PermissionGrant, PermissionGrantInput, Role, User, UserRoleAssignment,
};

#[cfg(test)]
mod tests;

/// In-memory RBAC repository implementation.
///
/// Assignments keep insertion order so role lookups match the SQL store.
#[derive(Debug, Default)]
pub struct InMemoryRbacRepository {
    users: RwLock<BTreeMap<String, User>>,
    roles: RwLock<BTreeMap<String, Role>>,
    grants: RwLock<HashMap<String, PermissionGrant>>,
    assignments: RwLock<Vec<UserRoleAssignment>>,
    group_maps: RwLock<BTreeMap<String, GroupToRoleMapping>>,
}

impl InMemoryRbacRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RbacRepository for InMemoryRbacRepository {
    async fn find_user(&self, name: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(name).cloned())
    }

    async fn save_user(&self, user: User) -> AppResult<()> {
        self.users
            .write()
            .await
            .entry(user.name().to_owned())
            .or_insert(user);
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.read().await.values().cloned().collect())
    }

    async fn find_role(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(name).cloned())
    }

    async fn save_role(&self, role: Role) -> AppResult<()> {
        self.roles
            .write()
            .await
            .insert(role.name().to_owned(), role);
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> AppResult<bool> {
        Ok(self.roles.write().await.remove(name).is_some())
    }

    async fn create_permission_grant(
        &self,
        input: PermissionGrantInput,
    ) -> AppResult<PermissionGrant> {
        let grant = input.into_grant(Uuid::new_v4().to_string());
        self.grants
            .write()
            .await
            .insert(grant.id().to_owned(), grant.clone());
        Ok(grant)
    }

    async fn find_permission_grants(&self, ids: &[String]) -> AppResult<Vec<PermissionGrant>> {
        let grants = self.grants.read().await;
        Ok(ids.iter().filter_map(|id| grants.get(id).cloned()).collect())
    }

    async fn delete_permission_grants(&self, ids: &[String]) -> AppResult<()> {
        let mut grants = self.grants.write().await;
        for id in ids {
            grants.remove(id);
        }
        Ok(())
    }

    async fn list_role_assignments_for_user(
        &self,
        user: &str,
        include_remote: bool,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|assignment| {
                assignment.user() == user && (include_remote || !assignment.is_remote())
            })
            .cloned()
            .collect())
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self.assignments.read().await.clone())
    }

    async fn upsert_role_assignment(&self, assignment: UserRoleAssignment) -> AppResult<bool> {
        let mut assignments = self.assignments.write().await;
        if assignments.iter().any(|stored| stored.same_key(&assignment)) {
            return Ok(false);
        }

        assignments.push(assignment);
        Ok(true)
    }

    async fn delete_role_assignment(
        &self,
        user: &str,
        role: &str,
        source: &str,
    ) -> AppResult<bool> {
        let mut assignments = self.assignments.write().await;
        let before = assignments.len();
        assignments.retain(|stored| {
            stored.user() != user || stored.role() != role || stored.source() != source
        });
        Ok(assignments.len() != before)
    }

    async fn list_group_to_role_maps(&self) -> AppResult<Vec<GroupToRoleMapping>> {
        Ok(self.group_maps.read().await.values().cloned().collect())
    }

    async fn find_group_to_role_maps(
        &self,
        groups: &[String],
    ) -> AppResult<Vec<GroupToRoleMapping>> {
        let group_maps = self.group_maps.read().await;
        Ok(groups
            .iter()
            .filter_map(|group| group_maps.get(group).cloned())
            .collect())
    }

    async fn save_group_to_role_map(&self, mapping: GroupToRoleMapping) -> AppResult<()> {
        self.group_maps
            .write()
            .await
            .insert(mapping.group().to_owned(), mapping);
        Ok(())
    }

    async fn delete_group_to_role_map(&self, group: &str) -> AppResult<bool> {
        Ok(self.group_maps.write().await.remove(group).is_some())
    }
}
