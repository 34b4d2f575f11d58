use serde::{Deserialize, Serialize};
use warrant_core::{AppError, AppResult, NonEmptyString};

use crate::{
    PermissionType, Resource, ResourceType, SystemRole, grant_uid_matches,
    validate_grant_resource_uid, validate_permission_types_for_resource_type,
};

/// Authenticated principal, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    name: NonEmptyString,
}

impl User {
    /// Creates a user reference.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
        })
    }

    /// Returns the user name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Unsaved permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrantInput {
    resource_uid: Option<String>,
    resource_type: ResourceType,
    permission_types: Vec<PermissionType>,
}

impl PermissionGrantInput {
    /// Creates a grant on a concrete resource or scope prefix.
    ///
    /// The resource type is taken from the UID prefix.
    pub fn scoped(
        resource_uid: impl Into<String>,
        permission_types: Vec<PermissionType>,
    ) -> AppResult<Self> {
        let resource_uid = NonEmptyString::new(resource_uid)?;
        let type_value = resource_uid
            .as_str()
            .split_once(':')
            .map(|(prefix, _)| prefix)
            .unwrap_or(resource_uid.as_str());
        let resource_type = type_value.parse::<ResourceType>().map_err(|_| {
            AppError::Configuration(format!(
                "resource uid '{}' does not start with a known resource type",
                resource_uid.as_str()
            ))
        })?;

        Self::new(Some(resource_uid.into()), resource_type, permission_types)
    }

    /// Creates a grant without a resource, valid for type-level checks only.
    pub fn global(
        resource_type: ResourceType,
        permission_types: Vec<PermissionType>,
    ) -> AppResult<Self> {
        Self::new(None, resource_type, permission_types)
    }

    /// Creates a validated grant input.
    pub fn new(
        resource_uid: Option<String>,
        resource_type: ResourceType,
        permission_types: Vec<PermissionType>,
    ) -> AppResult<Self> {
        if permission_types.is_empty() {
            return Err(AppError::Configuration(
                "permission grant must contain at least one permission type".to_owned(),
            ));
        }

        if let Some(resource_uid) = resource_uid.as_deref() {
            validate_grant_resource_uid(resource_type, resource_uid)?;
        }
        validate_permission_types_for_resource_type(resource_type, &permission_types)?;

        let mut permission_types = permission_types;
        permission_types.sort();
        permission_types.dedup();

        Ok(Self {
            resource_uid,
            resource_type,
            permission_types,
        })
    }

    /// Returns the targeted resource UID or scope prefix.
    #[must_use]
    pub fn resource_uid(&self) -> Option<&str> {
        self.resource_uid.as_deref()
    }

    /// Returns the resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the granted permission types.
    #[must_use]
    pub fn permission_types(&self) -> &[PermissionType] {
        &self.permission_types
    }

    /// Attaches a store-assigned id.
    #[must_use]
    pub fn into_grant(self, id: impl Into<String>) -> PermissionGrant {
        PermissionGrant {
            id: id.into(),
            resource_uid: self.resource_uid,
            resource_type: self.resource_type,
            permission_types: self.permission_types,
        }
    }
}

/// Stored (resource pattern, permission set) pair attached to roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    id: String,
    resource_uid: Option<String>,
    resource_type: ResourceType,
    permission_types: Vec<PermissionType>,
}

impl PermissionGrant {
    /// Returns the store id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the targeted resource UID or scope prefix. `None` for global grants.
    #[must_use]
    pub fn resource_uid(&self) -> Option<&str> {
        self.resource_uid.as_deref()
    }

    /// Returns the resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the granted permission types as stored.
    #[must_use]
    pub fn permission_types(&self) -> &[PermissionType] {
        &self.permission_types
    }

    /// Returns whether any stored permission covers `requested` after ALL expansion.
    #[must_use]
    pub fn covers(&self, requested: PermissionType) -> bool {
        self.permission_types
            .iter()
            .any(|permission_type| permission_type.covers(requested))
    }

    /// Returns whether the grant carries no resource UID.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.resource_uid.is_none()
    }

    /// Returns whether the grant's UID addresses `resource`, directly or
    /// through the pack that ships it.
    #[must_use]
    pub fn matches_resource(&self, resource: &Resource) -> bool {
        let Some(grant_uid) = self.resource_uid.as_deref() else {
            return false;
        };

        if grant_uid_matches(grant_uid, resource.uid().as_str()) {
            return true;
        }

        resource
            .pack_uid()
            .is_some_and(|pack_uid| grant_uid_matches(grant_uid, pack_uid.as_str()))
    }
}

/// Named bundle of permission grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: NonEmptyString,
    description: Option<String>,
    permission_grant_ids: Vec<String>,
    is_system: bool,
}

impl Role {
    /// Creates a validated role.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        permission_grant_ids: Vec<String>,
        is_system: bool,
    ) -> AppResult<Self> {
        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            name: NonEmptyString::new(name)?,
            description,
            permission_grant_ids,
            is_system,
        })
    }

    /// Creates the bootstrap record of a reserved role.
    pub fn system(role: SystemRole) -> AppResult<Self> {
        Self::new(
            role.as_str(),
            Some(role.description().to_owned()),
            Vec::new(),
            true,
        )
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns an optional role description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns referenced grant ids in declaration order.
    #[must_use]
    pub fn permission_grant_ids(&self) -> &[String] {
        &self.permission_grant_ids
    }

    /// Returns whether this is one of the reserved roles.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }
}

/// Binds a user to a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    user: NonEmptyString,
    role: NonEmptyString,
    source: NonEmptyString,
    description: Option<String>,
    is_remote: bool,
}

impl UserRoleAssignment {
    /// Creates a validated assignment.
    pub fn new(
        user: impl Into<String>,
        role: impl Into<String>,
        source: impl Into<String>,
        description: Option<String>,
        is_remote: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            user: NonEmptyString::new(user)?,
            role: NonEmptyString::new(role)?,
            source: NonEmptyString::new(source)?,
            description,
            is_remote,
        })
    }

    /// Returns the assigned user name.
    #[must_use]
    pub fn user(&self) -> &str {
        self.user.as_str()
    }

    /// Returns the assigned role name.
    #[must_use]
    pub fn role(&self) -> &str {
        self.role.as_str()
    }

    /// Returns the provenance of the assignment.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Returns an optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the assignment was created by group sync.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// Returns whether two assignments share the (user, role, source) key.
    #[must_use]
    pub fn same_key(&self, other: &Self) -> bool {
        self.user == other.user && self.role == other.role && self.source == other.source
    }
}

/// Maps an identity-provider group to local roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupToRoleMapping {
    group: NonEmptyString,
    roles: Vec<String>,
    source: NonEmptyString,
    description: Option<String>,
    enabled: bool,
}

impl GroupToRoleMapping {
    /// Creates a validated group mapping.
    pub fn new(
        group: impl Into<String>,
        roles: Vec<String>,
        source: impl Into<String>,
        description: Option<String>,
        enabled: bool,
    ) -> AppResult<Self> {
        if roles.iter().any(|role| role.trim().is_empty()) {
            return Err(AppError::Validation(
                "group mapping roles must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            group: NonEmptyString::new(group)?,
            roles,
            source: NonEmptyString::new(source)?,
            description,
            enabled,
        })
    }

    /// Returns the external group identifier.
    #[must_use]
    pub fn group(&self) -> &str {
        self.group.as_str()
    }

    /// Returns the mapped role names in declaration order.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Returns the provenance of the mapping.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Returns an optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the mapping currently contributes roles.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Compact view of a user's RBAC standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacSummary {
    /// Whether RBAC enforcement is enabled.
    pub enabled: bool,
    /// Whether the user holds an administrator role.
    pub is_admin: bool,
    /// Role names held by the user.
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{PermissionGrantInput, Role, UserRoleAssignment};
    use crate::{PermissionType, Resource, ResourceType, SystemRole};

    #[test]
    fn scoped_grant_takes_type_from_uid() {
        let grant = PermissionGrantInput::scoped(
            "key_value_pair:st2kv.system:",
            vec![PermissionType::KeyValuePairList],
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(grant.resource_type(), ResourceType::KeyValuePair);
    }

    #[test]
    fn scoped_grant_rejects_mismatched_verbs() {
        let result = PermissionGrantInput::scoped(
            "key_value_pair:st2kv.system:",
            vec![PermissionType::ActionExecute],
        );
        assert!(matches!(
            result,
            Err(warrant_core::AppError::Configuration(_))
        ));

        let result = PermissionGrantInput::scoped("spaceship:one", vec![PermissionType::PackView]);
        assert!(result.is_err());
    }

    #[test]
    fn pack_grant_matches_content_of_the_pack() {
        let grant = PermissionGrantInput::scoped("pack:examples", vec![PermissionType::ActionView])
            .unwrap_or_else(|_| unreachable!())
            .into_grant("g1");
        let action = Resource::action("examples", "local").unwrap_or_else(|_| unreachable!());
        let other = Resource::action("core", "local").unwrap_or_else(|_| unreachable!());

        assert!(grant.matches_resource(&action));
        assert!(!grant.matches_resource(&other));
        assert!(grant.covers(PermissionType::ActionView));
        assert!(!grant.covers(PermissionType::ActionExecute));
    }

    #[test]
    fn global_grant_matches_no_instance() {
        let grant = PermissionGrantInput::global(ResourceType::Action, vec![PermissionType::ActionAll])
            .unwrap_or_else(|_| unreachable!())
            .into_grant("g2");
        let action = Resource::action("examples", "local").unwrap_or_else(|_| unreachable!());

        assert!(grant.is_global());
        assert!(!grant.matches_resource(&action));
        assert!(grant.covers(PermissionType::ActionExecute));
    }

    #[test]
    fn system_role_record_is_flagged() {
        let role = Role::system(SystemRole::Observer).unwrap_or_else(|_| unreachable!());
        assert_eq!(role.name(), "observer");
        assert!(role.is_system());
    }

    #[test]
    fn assignment_key_ignores_description() {
        let first = UserRoleAssignment::new("user1", "role1", "assignments/user1.yaml", None, false)
            .unwrap_or_else(|_| unreachable!());
        let second = UserRoleAssignment::new(
            "user1",
            "role1",
            "assignments/user1.yaml",
            Some("other".to_owned()),
            false,
        )
        .unwrap_or_else(|_| unreachable!());

        assert!(first.same_key(&second));
    }
}
