use serde::{Deserialize, Serialize};
use warrant_core::{AppError, AppResult};

use crate::{PermissionGrantInput, PermissionType};

fn enabled_by_default() -> bool {
    true
}

/// Declarative RBAC definitions applied by an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacDefinitions {
    /// Role definitions.
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
    /// Local user role assignment definitions.
    #[serde(default)]
    pub assignments: Vec<UserRoleAssignmentDefinition>,
    /// Group to role mapping definitions.
    #[serde(default)]
    pub group_mappings: Vec<GroupToRoleMapDefinition>,
}

/// Role definition with inline grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Role name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Disabled roles are removed on sync.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Grants attached to the role.
    #[serde(default)]
    pub permission_grants: Vec<PermissionGrantDefinition>,
}

/// Grant entry inside a role definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrantDefinition {
    /// Resource UID or scope prefix. Omitted for global grants.
    #[serde(default)]
    pub resource_uid: Option<String>,
    /// Granted permission types.
    pub permission_types: Vec<PermissionType>,
}

impl PermissionGrantDefinition {
    /// Validates the definition and converts it into a grant input.
    ///
    /// Global grants take their resource type from their permission types,
    /// which must all share one.
    pub fn to_input(&self) -> AppResult<PermissionGrantInput> {
        if let Some(resource_uid) = self.resource_uid.as_deref() {
            return PermissionGrantInput::scoped(resource_uid, self.permission_types.clone());
        }

        let Some(first) = self.permission_types.first() else {
            return Err(AppError::Configuration(
                "permission grant must contain at least one permission type".to_owned(),
            ));
        };

        PermissionGrantInput::global(first.resource_type(), self.permission_types.clone())
    }
}

/// Local role assignments for one user, as loaded from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignmentDefinition {
    /// Assigned user name.
    pub username: String,
    /// Role names assigned to the user.
    pub roles: Vec<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Provenance recorded on each assignment.
    pub source: String,
    /// Disabled definitions only revoke.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

/// Group to role mapping definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupToRoleMapDefinition {
    /// External group identifier.
    pub group: String,
    /// Mapped role names.
    pub roles: Vec<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Provenance recorded on the mapping and its remote assignments.
    pub source: String,
    /// Disabled mappings contribute no roles.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PermissionGrantDefinition, RbacDefinitions};
    use crate::{PermissionType, ResourceType};

    #[test]
    fn definitions_parse_with_defaults() {
        let parsed = serde_json::from_value::<RbacDefinitions>(json!({
            "roles": [{
                "name": "kvp_reader",
                "permission_grants": [{
                    "resource_uid": "key_value_pair:st2kv.system:",
                    "permission_types": ["key_value_pair_list"]
                }]
            }],
            "group_mappings": [{
                "group": "CN=stormers,OU=groups",
                "roles": ["role3", "role4"],
                "source": "mappings/stormers.yaml"
            }]
        }));

        let definitions = parsed.unwrap_or_default();
        assert_eq!(definitions.roles.len(), 1);
        assert!(definitions.roles[0].enabled);
        assert!(definitions.assignments.is_empty());
        assert!(definitions.group_mappings[0].enabled);
    }

    #[test]
    fn global_grant_takes_type_from_permissions() {
        let definition = PermissionGrantDefinition {
            resource_uid: None,
            permission_types: vec![PermissionType::ActionList, PermissionType::ActionCreate],
        };

        let input = definition.to_input().unwrap_or_else(|_| unreachable!());
        assert_eq!(input.resource_type(), ResourceType::Action);
        assert_eq!(input.resource_uid(), None);
    }

    #[test]
    fn global_grant_rejects_mixed_types() {
        let definition = PermissionGrantDefinition {
            resource_uid: None,
            permission_types: vec![PermissionType::ActionList, PermissionType::RuleList],
        };

        assert!(definition.to_input().is_err());
    }
}
