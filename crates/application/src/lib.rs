//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod definitions_sync_service;
mod permission_resolvers;
mod rbac_backend;
mod rbac_config;
mod rbac_ports;
mod rbac_service;
mod remote_group_syncer;

#[cfg(test)]
mod test_support;

pub use authorization_service::AuthorizationService;
pub use definitions_sync_service::{DefinitionsSyncService, DefinitionsSyncSummary};
pub use permission_resolvers::{
    ExecutionPermissionsResolver, GrantEvaluator, KeyValuePairPermissionsResolver,
    NoopPermissionsResolver, PermissionsResolver, ResourcePermissionsResolver,
    RulePermissionsResolver, RuleReferenceResolver,
};
pub use rbac_backend::{
    BackendConstructor, BackendContext, BackendRegistry, DefaultRbacBackend, NoopRbacBackend,
    RbacBackend,
};
pub use rbac_config::{DEFAULT_BACKEND, NOOP_BACKEND, RbacConfig};
pub use rbac_ports::{ActionCatalog, RbacRepository};
pub use rbac_service::RbacService;
pub use remote_group_syncer::{
    DefaultRemoteGroupToRoleSyncer, LoginRoleSyncHook, NoopRemoteGroupToRoleSyncer,
    RemoteGroupToRoleSyncer,
};
