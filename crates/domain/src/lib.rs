//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod definitions;
mod permission;
mod rbac;
mod resource;

pub use definitions::{
    GroupToRoleMapDefinition, PermissionGrantDefinition, RbacDefinitions, RoleDefinition,
    UserRoleAssignmentDefinition,
};
pub use permission::{
    PermissionType, ResourceType, SystemRole, validate_permission_types_for_resource_type,
};
pub use rbac::{
    GroupToRoleMapping, PermissionGrant, PermissionGrantInput, RbacSummary, Role, User,
    UserRoleAssignment,
};
pub use resource::{
    ContentRef, ExecutionResource, KeyValueListScope, KeyValuePairApi, KeyValuePairResource,
    KeyValueScope, KeyValueScopeName, Resource, ResourceApi, RuleResource, RuleTrigger,
    SYSTEM_SCOPE, TriggerResource, USER_SCOPE, WEBHOOK_TRIGGER_TYPE, grant_uid_matches,
    validate_grant_resource_uid,
};
