use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use warrant_core::{AppError, AppResult};
use warrant_domain::{
    GroupToRoleMapDefinition, PermissionGrantInput, RbacDefinitions, RoleDefinition, SystemRole,
    User, UserRoleAssignmentDefinition,
};

use crate::RbacService;


/// Counts reported after applying a set of definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefinitionsSyncSummary {
    /// Roles created or recreated.
    pub roles_created: usize,
    /// Roles removed because they are no longer defined or are disabled.
    pub roles_deleted: usize,
    /// Local assignments created.
    pub assignments_created: usize,
    /// Local assignments revoked.
    pub assignments_revoked: usize,
    /// Group mappings written.
    pub group_maps_saved: usize,
    /// Group mappings removed.
    pub group_maps_deleted: usize,
}

/// Applies declarative role, assignment and group mapping definitions.
///
/// Remote assignments belong to the login syncer and are never touched.
#[derive(Clone)]
pub struct DefinitionsSyncService {
    service: RbacService,
}

struct ValidatedRole<'a> {
    definition: &'a RoleDefinition,
    grants: Vec<PermissionGrantInput>,
}

impl DefinitionsSyncService {
    /// Creates a new syncer over the role assignment service.
    #[must_use]
    pub fn new(service: RbacService) -> Self {
        Self { service }
    }

    /// Converges stored state to `definitions`.
    ///
    /// Every definition is validated before the first write, so an invalid
    /// grant or an unknown role leaves the store unchanged.
    pub async fn sync(&self, definitions: &RbacDefinitions) -> AppResult<DefinitionsSyncSummary> {
        let roles = validate_roles(&definitions.roles)?;
        self.validate_assignment_roles(definitions, &roles).await?;

        let mut summary = DefinitionsSyncSummary::default();
        self.sync_roles(&roles, &mut summary).await?;
        self.sync_assignments(&definitions.assignments, &mut summary)
            .await?;
        self.sync_group_maps(&definitions.group_mappings, &mut summary)
            .await?;

        info!(
            roles_created = summary.roles_created,
            roles_deleted = summary.roles_deleted,
            assignments_created = summary.assignments_created,
            assignments_revoked = summary.assignments_revoked,
            group_maps_saved = summary.group_maps_saved,
            group_maps_deleted = summary.group_maps_deleted,
            "applied rbac definitions"
        );
        Ok(summary)
    }

    async fn validate_assignment_roles(
        &self,
        definitions: &RbacDefinitions,
        roles: &[ValidatedRole<'_>],
    ) -> AppResult<()> {
        let mut available: HashSet<String> = self
            .service
            .get_system_roles()
            .await?
            .into_iter()
            .map(|role| role.name().to_owned())
            .collect();
        available.extend(
            roles
                .iter()
                .filter(|role| role.definition.enabled)
                .map(|role| role.definition.name.clone()),
        );

        let missing: BTreeSet<&str> = definitions
            .assignments
            .iter()
            .filter(|assignment| assignment.enabled)
            .flat_map(|assignment| assignment.roles.iter())
            .filter(|role| !available.contains(role.as_str()))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        Err(AppError::Configuration(format!(
            "assignments reference undefined roles: {}",
            missing.into_iter().collect::<Vec<_>>().join(", ")
        )))
    }

    async fn sync_roles(
        &self,
        roles: &[ValidatedRole<'_>],
        summary: &mut DefinitionsSyncSummary,
    ) -> AppResult<()> {
        let enabled: HashSet<&str> = roles
            .iter()
            .filter(|role| role.definition.enabled)
            .map(|role| role.definition.name.as_str())
            .collect();

        for stored in self.service.get_all_roles().await? {
            // Enabled roles are deleted as well and recreated below with fresh grants.
            if stored.is_system() {
                continue;
            }
            self.service.delete_role(stored.name()).await?;
            if !enabled.contains(stored.name()) {
                debug!(role = %stored.name(), "removed role missing from definitions");
                summary.roles_deleted += 1;
            }
        }

        for role in roles.iter().filter(|role| role.definition.enabled) {
            self.service
                .create_role(
                    &role.definition.name,
                    role.definition.description.clone(),
                    role.grants.clone(),
                    false,
                )
                .await?;
            summary.roles_created += 1;
        }

        Ok(())
    }

    async fn sync_assignments(
        &self,
        definitions: &[UserRoleAssignmentDefinition],
        summary: &mut DefinitionsSyncSummary,
    ) -> AppResult<()> {
        let sources: HashSet<&str> = definitions
            .iter()
            .map(|definition| definition.source.as_str())
            .collect();

        for stored in self.service.list_role_assignments().await? {
            if stored.is_remote() || sources.contains(stored.source()) {
                continue;
            }
            let user = User::new(stored.user())?;
            if self
                .service
                .revoke_role_from_user(stored.role(), &user, stored.source())
                .await?
            {
                summary.assignments_revoked += 1;
            }
        }

        for definition in definitions {
            let user = self.service.ensure_user(&definition.username).await?;
            let desired: HashSet<&str> = if definition.enabled {
                definition.roles.iter().map(String::as_str).collect()
            } else {
                HashSet::new()
            };

            let held: Vec<String> = self
                .service
                .get_role_assignments_for_user(&user, false)
                .await?
                .into_iter()
                .filter(|assignment| assignment.source() == definition.source)
                .map(|assignment| assignment.role().to_owned())
                .collect();

            for role in held.iter().filter(|role| !desired.contains(role.as_str())) {
                if self
                    .service
                    .revoke_role_from_user(role, &user, &definition.source)
                    .await?
                {
                    summary.assignments_revoked += 1;
                }
            }

            for role in &definition.roles {
                if !definition.enabled || held.contains(role) {
                    continue;
                }
                self.service
                    .assign_role_to_user(
                        role,
                        &user,
                        &definition.source,
                        definition.description.clone(),
                        false,
                    )
                    .await?;
                summary.assignments_created += 1;
            }
        }

        Ok(())
    }

    async fn sync_group_maps(
        &self,
        definitions: &[GroupToRoleMapDefinition],
        summary: &mut DefinitionsSyncSummary,
    ) -> AppResult<()> {
        let defined: HashSet<&str> = definitions
            .iter()
            .map(|definition| definition.group.as_str())
            .collect();

        for stored in self.service.get_all_group_to_role_maps().await? {
            if defined.contains(stored.group()) {
                continue;
            }
            if self.service.delete_group_to_role_map(stored.group()).await? {
                summary.group_maps_deleted += 1;
            }
        }

        for definition in definitions {
            self.service
                .create_group_to_role_map(
                    &definition.group,
                    definition.roles.clone(),
                    &definition.source,
                    definition.description.clone(),
                    definition.enabled,
                )
                .await?;
            summary.group_maps_saved += 1;
        }

        Ok(())
    }
}

fn validate_roles(definitions: &[RoleDefinition]) -> AppResult<Vec<ValidatedRole<'_>>> {
    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if SystemRole::from_name(&definition.name).is_some() {
            return Err(AppError::Configuration(format!(
                "system role '{}' can't be redefined",
                definition.name
            )));
        }
        if !seen.insert(definition.name.as_str()) {
            return Err(AppError::Configuration(format!(
                "role '{}' is defined more than once",
                definition.name
            )));
        }

        let grants = definition
            .permission_grants
            .iter()
            .map(|grant| grant.to_input())
            .collect::<AppResult<Vec<_>>>()?;

        validated.push(ValidatedRole { definition, grants });
    }

    Ok(validated)
}
