use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use warrant_core::{AppError, AppResult, AuthenticatedIdentity};
use warrant_domain::{User, UserRoleAssignment};

use crate::{RbacConfig, RbacService};


/// Reconciles remote role assignments with identity-provider groups.
#[async_trait]
pub trait RemoteGroupToRoleSyncer: Send + Sync {
    /// Syncs the user's remote assignments and returns the ones held after
    /// the pass.
    async fn sync(&self, user: &User, groups: &[String]) -> AppResult<Vec<UserRoleAssignment>>;
}

/// Syncer that leaves assignments untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRemoteGroupToRoleSyncer;

#[async_trait]
impl RemoteGroupToRoleSyncer for NoopRemoteGroupToRoleSyncer {
    async fn sync(&self, _user: &User, _groups: &[String]) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(Vec::new())
    }
}

/// Store-backed syncer.
///
/// The read-diff-write sequence is serialised per user name and every write
/// is an upsert or delete keyed by (user, role, source), so concurrent logins
/// of the same user converge on the mapped set.
pub struct DefaultRemoteGroupToRoleSyncer {
    service: RbacService,
    case_sensitive: bool,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DefaultRemoteGroupToRoleSyncer {
    /// Creates a syncer.
    #[must_use]
    pub fn new(service: RbacService, case_sensitive: bool) -> Self {
        Self {
            service,
            case_sensitive,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, user: &str) -> Arc<Mutex<()>> {
        let mut user_locks = self.user_locks.lock().await;
        user_locks
            .entry(user.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release_user_lock(&self, user: &str, lock: Arc<Mutex<()>>) {
        let mut user_locks = self.user_locks.lock().await;
        // One reference is held by the map and one by the caller.
        if Arc::strong_count(&lock) <= 2 {
            user_locks.remove(user);
        }
    }

    fn normalise_groups(&self, groups: &[String]) -> Vec<String> {
        let mut normalised: Vec<String> = Vec::with_capacity(groups.len());
        for group in groups {
            let group = if self.case_sensitive {
                group.clone()
            } else {
                group.to_lowercase()
            };
            if !normalised.contains(&group) {
                normalised.push(group);
            }
        }
        normalised
    }

    async fn reconcile(&self, user: &User, groups: &[String]) -> AppResult<Vec<UserRoleAssignment>> {
        let mappings = self
            .service
            .get_group_to_role_maps_for_groups(groups, self.case_sensitive)
            .await?;

        let mut desired: Vec<UserRoleAssignment> = Vec::new();
        for mapping in mappings.iter().filter(|mapping| mapping.enabled()) {
            let description = format!(
                "Automatic role assignment based on the remote user membership in group \"{}\"",
                mapping.group()
            );

            for role in mapping.roles() {
                match self.service.get_role_by_name(role).await {
                    Ok(_) => {}
                    Err(AppError::NotFound(_)) => {
                        info!(
                            user = %user.name(),
                            group = %mapping.group(),
                            role = %role,
                            "skipping mapped role that does not exist"
                        );
                        continue;
                    }
                    Err(error) => return Err(error),
                }

                let assignment = UserRoleAssignment::new(
                    user.name(),
                    role.as_str(),
                    mapping.source(),
                    Some(description.clone()),
                    true,
                )?;
                if !desired.iter().any(|stored| stored.same_key(&assignment)) {
                    desired.push(assignment);
                }
            }
        }

        let current: Vec<UserRoleAssignment> = self
            .service
            .get_role_assignments_for_user(user, true)
            .await?
            .into_iter()
            .filter(UserRoleAssignment::is_remote)
            .collect();

        let mut removed = 0_usize;
        for stale in current
            .iter()
            .filter(|stored| !desired.iter().any(|wanted| wanted.same_key(stored)))
        {
            if self
                .service
                .revoke_role_from_user(stale.role(), user, stale.source())
                .await?
            {
                removed += 1;
            }
        }

        for wanted in &desired {
            self.service
                .assign_role_to_user(
                    wanted.role(),
                    user,
                    wanted.source(),
                    wanted.description().map(ToOwned::to_owned),
                    true,
                )
                .await?;
        }

        debug!(
            user = %user.name(),
            group_count = groups.len(),
            held = desired.len(),
            removed,
            "synced remote role assignments"
        );
        Ok(desired)
    }
}

#[async_trait]
impl RemoteGroupToRoleSyncer for DefaultRemoteGroupToRoleSyncer {
    async fn sync(&self, user: &User, groups: &[String]) -> AppResult<Vec<UserRoleAssignment>> {
        let groups = self.normalise_groups(groups);
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let lock = self.user_lock(user.name()).await;
        let result = {
            let _guard = lock.lock().await;
            self.reconcile(user, &groups).await
        };
        self.release_user_lock(user.name(), lock).await;

        result
    }
}

/// Runs remote group sync after each successful authentication.
#[derive(Clone)]
pub struct LoginRoleSyncHook {
    config: RbacConfig,
    service: RbacService,
    syncer: Arc<dyn RemoteGroupToRoleSyncer>,
}

impl LoginRoleSyncHook {
    /// Creates a login hook.
    #[must_use]
    pub fn new(
        config: RbacConfig,
        service: RbacService,
        syncer: Arc<dyn RemoteGroupToRoleSyncer>,
    ) -> Self {
        Self {
            config,
            service,
            syncer,
        }
    }

    /// Syncs the identity's groups. Failures are logged and never returned so
    /// they cannot fail the login.
    pub async fn on_successful_authentication(&self, identity: &AuthenticatedIdentity) {
        if !self.config.enable || !self.config.sync_remote_groups {
            return;
        }

        if let Err(error) = self.sync_identity(identity).await {
            warn!(
                user = %identity.username(),
                groups = ?identity.groups(),
                error = %error,
                "failed to sync remote user groups"
            );
        }
    }

    async fn sync_identity(&self, identity: &AuthenticatedIdentity) -> AppResult<()> {
        let user = self.service.ensure_user(identity.username()).await?;
        let assignments = self.syncer.sync(&user, identity.groups()).await?;

        info!(
            user = %user.name(),
            group_count = identity.groups().len(),
            remote_roles = assignments.len(),
            "synced remote user groups"
        );
        Ok(())
    }
}
