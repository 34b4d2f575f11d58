use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use warrant_core::{AppError, AppResult};
use warrant_domain::{
    ContentRef, GroupToRoleMapping, PermissionGrant, PermissionGrantInput, Role, User,
    UserRoleAssignment,
};

use crate::{ActionCatalog, RbacRepository, RbacService};

#[derive(Default)]
pub(crate) struct FakeRbacRepository {
    users: Mutex<Vec<User>>,
    roles: Mutex<HashMap<String, Role>>,
    grants: Mutex<HashMap<String, PermissionGrant>>,
    assignments: Mutex<Vec<UserRoleAssignment>>,
    group_maps: Mutex<Vec<GroupToRoleMapping>>,
    next_grant_id: AtomicUsize,
    failing: AtomicBool,
}

impl FakeRbacRepository {
    pub(crate) fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Store("store is unreachable".to_owned()));
        }
        Ok(())
    }

    pub(crate) async fn assignment_count(&self) -> usize {
        self.assignments.lock().await.len()
    }
}

#[async_trait]
impl RbacRepository for FakeRbacRepository {
    async fn find_user(&self, name: &str) -> AppResult<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.name() == name)
            .cloned())
    }

    async fn save_user(&self, user: User) -> AppResult<()> {
        self.check()?;
        let mut users = self.users.lock().await;
        if !users.contains(&user) {
            users.push(user);
        }
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.check()?;
        let mut roles: Vec<Role> = self.roles.lock().await.values().cloned().collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn find_role(&self, name: &str) -> AppResult<Option<Role>> {
        self.check()?;
        Ok(self.roles.lock().await.get(name).cloned())
    }

    async fn save_role(&self, role: Role) -> AppResult<()> {
        self.check()?;
        self.roles
            .lock()
            .await
            .insert(role.name().to_owned(), role);
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> AppResult<bool> {
        self.check()?;
        Ok(self.roles.lock().await.remove(name).is_some())
    }

    async fn create_permission_grant(
        &self,
        input: PermissionGrantInput,
    ) -> AppResult<PermissionGrant> {
        self.check()?;
        let id = format!("grant-{}", self.next_grant_id.fetch_add(1, Ordering::SeqCst));
        let grant = input.into_grant(id.clone());
        self.grants.lock().await.insert(id, grant.clone());
        Ok(grant)
    }

    async fn find_permission_grants(&self, ids: &[String]) -> AppResult<Vec<PermissionGrant>> {
        self.check()?;
        let grants = self.grants.lock().await;
        Ok(ids.iter().filter_map(|id| grants.get(id).cloned()).collect())
    }

    async fn delete_permission_grants(&self, ids: &[String]) -> AppResult<()> {
        self.check()?;
        let mut grants = self.grants.lock().await;
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
        self.check()?;
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user() == user)
            .filter(|assignment| include_remote || !assignment.is_remote())
            .cloned()
            .collect())
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<UserRoleAssignment>> {
        self.check()?;
        Ok(self.assignments.lock().await.clone())
    }

    async fn upsert_role_assignment(&self, assignment: UserRoleAssignment) -> AppResult<bool> {
        self.check()?;
        let mut assignments = self.assignments.lock().await;
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
        self.check()?;
        let mut assignments = self.assignments.lock().await;
        let before = assignments.len();
        assignments.retain(|stored| {
            !(stored.user() == user && stored.role() == role && stored.source() == source)
        });
        Ok(assignments.len() != before)
    }

    async fn list_group_to_role_maps(&self) -> AppResult<Vec<GroupToRoleMapping>> {
        self.check()?;
        Ok(self.group_maps.lock().await.clone())
    }

    async fn find_group_to_role_maps(
        &self,
        groups: &[String],
    ) -> AppResult<Vec<GroupToRoleMapping>> {
        self.check()?;
        Ok(self
            .group_maps
            .lock()
            .await
            .iter()
            .filter(|mapping| groups.iter().any(|group| group == mapping.group()))
            .cloned()
            .collect())
    }

    async fn save_group_to_role_map(&self, mapping: GroupToRoleMapping) -> AppResult<()> {
        self.check()?;
        let mut group_maps = self.group_maps.lock().await;
        group_maps.retain(|stored| stored.group() != mapping.group());
        group_maps.push(mapping);
        Ok(())
    }

    async fn delete_group_to_role_map(&self, group: &str) -> AppResult<bool> {
        self.check()?;
        let mut group_maps = self.group_maps.lock().await;
        let before = group_maps.len();
        group_maps.retain(|stored| stored.group() != group);
        Ok(group_maps.len() != before)
    }
}

#[derive(Default)]
pub(crate) struct FakeActionCatalog {
    actions: Vec<ContentRef>,
}

impl FakeActionCatalog {
    pub(crate) fn with_actions(actions: Vec<ContentRef>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl ActionCatalog for FakeActionCatalog {
    async fn find_action_by_ref(&self, action_ref: &str) -> AppResult<Option<ContentRef>> {
        Ok(self
            .actions
            .iter()
            .find(|action| action.reference() == action_ref)
            .cloned())
    }
}

pub(crate) fn user(name: &str) -> User {
    User::new(name).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn service_with_repository() -> (RbacService, Arc<FakeRbacRepository>) {
    let repository = Arc::new(FakeRbacRepository::default());
    (RbacService::new(repository.clone()), repository)
}

/// Creates a role holding `grants` and assigns it locally to `user_name`.
pub(crate) async fn grant_role(
    service: &RbacService,
    user_name: &str,
    role_name: &str,
    grants: Vec<PermissionGrantInput>,
) {
    let result = service.create_role(role_name, None, grants, false).await;
    assert!(result.is_ok());
    assign(service, user_name, role_name).await;
}

/// Assigns an existing role locally to `user_name`.
pub(crate) async fn assign(service: &RbacService, user_name: &str, role_name: &str) {
    let result = service
        .assign_role_to_user(
            role_name,
            &user(user_name),
            &format!("assignments/{user_name}.yaml"),
            None,
            false,
        )
        .await;
    assert!(result.is_ok());
}
