use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warrant_core::{AppError, AppResult};

/// Closed set of securable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Action runner registered with the platform.
    RunnerType,
    /// Content pack.
    Pack,
    /// Sensor shipped by a pack.
    SensorType,
    /// Action shipped by a pack.
    Action,
    /// Chat alias for an action.
    ActionAlias,
    /// Trigger-to-action rule.
    Rule,
    /// Record of a rule being enforced.
    RuleEnforcement,
    /// Policy type definition.
    PolicyType,
    /// Policy attached to an action.
    Policy,
    /// Action execution.
    Execution,
    /// Datastore key-value pair.
    KeyValuePair,
    /// Registered webhook.
    Webhook,
    /// Timer trigger.
    Timer,
    /// API key.
    ApiKey,
    /// Execution trace.
    Trace,
    /// Trigger instance definition.
    Trigger,
    /// Event stream.
    Stream,
    /// Pending inquiry.
    Inquiry,
}

impl ResourceType {
    /// Returns a stable storage value for this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunnerType => "runner_type",
            Self::Pack => "pack",
            Self::SensorType => "sensor_type",
            Self::Action => "action",
            Self::ActionAlias => "action_alias",
            Self::Rule => "rule",
            Self::RuleEnforcement => "rule_enforcement",
            Self::PolicyType => "policy_type",
            Self::Policy => "policy",
            Self::Execution => "execution",
            Self::KeyValuePair => "key_value_pair",
            Self::Webhook => "webhook",
            Self::Timer => "timer",
            Self::ApiKey => "api_key",
            Self::Trace => "trace",
            Self::Trigger => "trigger",
            Self::Stream => "stream",
            Self::Inquiry => "inquiry",
        }
    }

    /// Returns all known resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceType] = &[
            ResourceType::RunnerType,
            ResourceType::Pack,
            ResourceType::SensorType,
            ResourceType::Action,
            ResourceType::ActionAlias,
            ResourceType::Rule,
            ResourceType::RuleEnforcement,
            ResourceType::PolicyType,
            ResourceType::Policy,
            ResourceType::Execution,
            ResourceType::KeyValuePair,
            ResourceType::Webhook,
            ResourceType::Timer,
            ResourceType::ApiKey,
            ResourceType::Trace,
            ResourceType::Trigger,
            ResourceType::Stream,
            ResourceType::Inquiry,
        ];

        ALL
    }

    /// Returns whether resources of this type belong to a content pack.
    #[must_use]
    pub fn is_content_pack_type(&self) -> bool {
        matches!(
            self,
            Self::Action
                | Self::ActionAlias
                | Self::Rule
                | Self::SensorType
                | Self::Trigger
                | Self::Policy
        )
    }

    /// Returns every permission type valid for this resource type.
    #[must_use]
    pub fn permission_types(&self) -> Vec<PermissionType> {
        PERMISSION_TABLE
            .iter()
            .filter(|entry| entry.resource_type == *self)
            .map(|entry| entry.permission_type)
            .collect()
    }

    /// Returns the coarse "all" permission of this resource type, if any.
    #[must_use]
    pub fn all_permission(&self) -> Option<PermissionType> {
        PermissionType::for_resource(*self, "all")
    }

    /// Returns the "list" permission of this resource type, if any.
    #[must_use]
    pub fn list_permission(&self) -> Option<PermissionType> {
        PermissionType::for_resource(*self, "list")
    }
}

impl Display for ResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|resource_type| resource_type.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource type '{value}'")))
    }
}

/// Permission verbs, always bound to exactly one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum PermissionType {
    RunnerTypeList,
    RunnerTypeView,
    RunnerTypeModify,
    RunnerTypeAll,

    PackList,
    PackView,
    PackCreate,
    PackModify,
    PackDelete,
    PackInstall,
    PackUninstall,
    PackRegister,
    PackConfig,
    PackSearch,
    PackViewsIndexHealth,
    PackAll,

    SensorTypeList,
    SensorTypeView,
    SensorTypeModify,
    SensorTypeAll,

    ActionList,
    ActionView,
    ActionCreate,
    ActionModify,
    ActionDelete,
    ActionExecute,
    ActionAll,

    ActionAliasList,
    ActionAliasView,
    ActionAliasCreate,
    ActionAliasModify,
    ActionAliasMatch,
    ActionAliasHelp,
    ActionAliasDelete,
    ActionAliasAll,

    RuleList,
    RuleView,
    RuleCreate,
    RuleModify,
    RuleDelete,
    RuleAll,

    RuleEnforcementList,
    RuleEnforcementView,

    PolicyTypeList,
    PolicyTypeView,

    PolicyList,
    PolicyView,
    PolicyCreate,
    PolicyModify,
    PolicyDelete,
    PolicyAll,

    ExecutionList,
    ExecutionView,
    ExecutionReRun,
    ExecutionStop,
    ExecutionAll,
    ExecutionViewsFiltersList,

    KeyValuePairList,
    KeyValuePairView,
    KeyValuePairSet,
    KeyValuePairDelete,
    KeyValuePairAll,

    WebhookList,
    WebhookView,
    WebhookCreate,
    WebhookSend,
    WebhookDelete,
    WebhookAll,

    TimerList,
    TimerView,
    TimerAll,

    ApiKeyList,
    ApiKeyView,
    ApiKeyCreate,
    ApiKeyModify,
    ApiKeyDelete,
    ApiKeyAll,

    TraceList,
    TraceView,
    TraceAll,

    TriggerList,
    TriggerView,
    TriggerAll,

    StreamView,

    InquiryList,
    InquiryView,
    InquiryRespond,
    InquiryAll,
}

struct PermissionEntry {
    permission_type: PermissionType,
    resource_type: ResourceType,
    name: &'static str,
    verb: &'static str,
}

const fn entry(
    permission_type: PermissionType,
    resource_type: ResourceType,
    name: &'static str,
    verb: &'static str,
) -> PermissionEntry {
    PermissionEntry {
        permission_type,
        resource_type,
        name,
        verb,
    }
}

use PermissionType as P;
use ResourceType as R;

const PERMISSION_TABLE: &[PermissionEntry] = &[
    entry(P::RunnerTypeList, R::RunnerType, "runner_type_list", "list"),
    entry(P::RunnerTypeView, R::RunnerType, "runner_type_view", "view"),
    entry(P::RunnerTypeModify, R::RunnerType, "runner_type_modify", "modify"),
    entry(P::RunnerTypeAll, R::RunnerType, "runner_type_all", "all"),
    entry(P::PackList, R::Pack, "pack_list", "list"),
    entry(P::PackView, R::Pack, "pack_view", "view"),
    entry(P::PackCreate, R::Pack, "pack_create", "create"),
    entry(P::PackModify, R::Pack, "pack_modify", "modify"),
    entry(P::PackDelete, R::Pack, "pack_delete", "delete"),
    entry(P::PackInstall, R::Pack, "pack_install", "install"),
    entry(P::PackUninstall, R::Pack, "pack_uninstall", "uninstall"),
    entry(P::PackRegister, R::Pack, "pack_register", "register"),
    entry(P::PackConfig, R::Pack, "pack_config", "config"),
    entry(P::PackSearch, R::Pack, "pack_search", "search"),
    entry(
        P::PackViewsIndexHealth,
        R::Pack,
        "pack_views_index_health",
        "views_index_health",
    ),
    entry(P::PackAll, R::Pack, "pack_all", "all"),
    entry(P::SensorTypeList, R::SensorType, "sensor_type_list", "list"),
    entry(P::SensorTypeView, R::SensorType, "sensor_type_view", "view"),
    entry(P::SensorTypeModify, R::SensorType, "sensor_type_modify", "modify"),
    entry(P::SensorTypeAll, R::SensorType, "sensor_type_all", "all"),
    entry(P::ActionList, R::Action, "action_list", "list"),
    entry(P::ActionView, R::Action, "action_view", "view"),
    entry(P::ActionCreate, R::Action, "action_create", "create"),
    entry(P::ActionModify, R::Action, "action_modify", "modify"),
    entry(P::ActionDelete, R::Action, "action_delete", "delete"),
    entry(P::ActionExecute, R::Action, "action_execute", "execute"),
    entry(P::ActionAll, R::Action, "action_all", "all"),
    entry(P::ActionAliasList, R::ActionAlias, "action_alias_list", "list"),
    entry(P::ActionAliasView, R::ActionAlias, "action_alias_view", "view"),
    entry(P::ActionAliasCreate, R::ActionAlias, "action_alias_create", "create"),
    entry(P::ActionAliasModify, R::ActionAlias, "action_alias_modify", "modify"),
    entry(P::ActionAliasMatch, R::ActionAlias, "action_alias_match", "match"),
    entry(P::ActionAliasHelp, R::ActionAlias, "action_alias_help", "help"),
    entry(P::ActionAliasDelete, R::ActionAlias, "action_alias_delete", "delete"),
    entry(P::ActionAliasAll, R::ActionAlias, "action_alias_all", "all"),
    entry(P::RuleList, R::Rule, "rule_list", "list"),
    entry(P::RuleView, R::Rule, "rule_view", "view"),
    entry(P::RuleCreate, R::Rule, "rule_create", "create"),
    entry(P::RuleModify, R::Rule, "rule_modify", "modify"),
    entry(P::RuleDelete, R::Rule, "rule_delete", "delete"),
    entry(P::RuleAll, R::Rule, "rule_all", "all"),
    entry(
        P::RuleEnforcementList,
        R::RuleEnforcement,
        "rule_enforcement_list",
        "list",
    ),
    entry(
        P::RuleEnforcementView,
        R::RuleEnforcement,
        "rule_enforcement_view",
        "view",
    ),
    entry(P::PolicyTypeList, R::PolicyType, "policy_type_list", "list"),
    entry(P::PolicyTypeView, R::PolicyType, "policy_type_view", "view"),
    entry(P::PolicyList, R::Policy, "policy_list", "list"),
    entry(P::PolicyView, R::Policy, "policy_view", "view"),
    entry(P::PolicyCreate, R::Policy, "policy_create", "create"),
    entry(P::PolicyModify, R::Policy, "policy_modify", "modify"),
    entry(P::PolicyDelete, R::Policy, "policy_delete", "delete"),
    entry(P::PolicyAll, R::Policy, "policy_all", "all"),
    entry(P::ExecutionList, R::Execution, "execution_list", "list"),
    entry(P::ExecutionView, R::Execution, "execution_view", "view"),
    entry(P::ExecutionReRun, R::Execution, "execution_re_run", "re_run"),
    entry(P::ExecutionStop, R::Execution, "execution_stop", "stop"),
    entry(P::ExecutionAll, R::Execution, "execution_all", "all"),
    entry(
        P::ExecutionViewsFiltersList,
        R::Execution,
        "execution_views_filters_list",
        "views_filters_list",
    ),
    entry(P::KeyValuePairList, R::KeyValuePair, "key_value_pair_list", "list"),
    entry(P::KeyValuePairView, R::KeyValuePair, "key_value_pair_view", "view"),
    entry(P::KeyValuePairSet, R::KeyValuePair, "key_value_pair_set", "set"),
    entry(
        P::KeyValuePairDelete,
        R::KeyValuePair,
        "key_value_pair_delete",
        "delete",
    ),
    entry(P::KeyValuePairAll, R::KeyValuePair, "key_value_pair_all", "all"),
    entry(P::WebhookList, R::Webhook, "webhook_list", "list"),
    entry(P::WebhookView, R::Webhook, "webhook_view", "view"),
    entry(P::WebhookCreate, R::Webhook, "webhook_create", "create"),
    entry(P::WebhookSend, R::Webhook, "webhook_send", "send"),
    entry(P::WebhookDelete, R::Webhook, "webhook_delete", "delete"),
    entry(P::WebhookAll, R::Webhook, "webhook_all", "all"),
    entry(P::TimerList, R::Timer, "timer_list", "list"),
    entry(P::TimerView, R::Timer, "timer_view", "view"),
    entry(P::TimerAll, R::Timer, "timer_all", "all"),
    entry(P::ApiKeyList, R::ApiKey, "api_key_list", "list"),
    entry(P::ApiKeyView, R::ApiKey, "api_key_view", "view"),
    entry(P::ApiKeyCreate, R::ApiKey, "api_key_create", "create"),
    entry(P::ApiKeyModify, R::ApiKey, "api_key_modify", "modify"),
    entry(P::ApiKeyDelete, R::ApiKey, "api_key_delete", "delete"),
    entry(P::ApiKeyAll, R::ApiKey, "api_key_all", "all"),
    entry(P::TraceList, R::Trace, "trace_list", "list"),
    entry(P::TraceView, R::Trace, "trace_view", "view"),
    entry(P::TraceAll, R::Trace, "trace_all", "all"),
    entry(P::TriggerList, R::Trigger, "trigger_list", "list"),
    entry(P::TriggerView, R::Trigger, "trigger_view", "view"),
    entry(P::TriggerAll, R::Trigger, "trigger_all", "all"),
    entry(P::StreamView, R::Stream, "stream_view", "view"),
    entry(P::InquiryList, R::Inquiry, "inquiry_list", "list"),
    entry(P::InquiryView, R::Inquiry, "inquiry_view", "view"),
    entry(P::InquiryRespond, R::Inquiry, "inquiry_respond", "respond"),
    entry(P::InquiryAll, R::Inquiry, "inquiry_all", "all"),
];

impl PermissionType {
    fn entry(&self) -> &'static PermissionEntry {
        // Every variant has exactly one row; the fallback row is never hit.
        PERMISSION_TABLE
            .iter()
            .find(|entry| entry.permission_type == *self)
            .unwrap_or(&PERMISSION_TABLE[0])
    }

    /// Returns a stable storage value for this permission type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.entry().name
    }

    /// Returns the resource type this permission applies to.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.entry().resource_type
    }

    /// Returns the verb part of the permission, e.g. `view` for `action_view`.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        self.entry().verb
    }

    /// Returns all known permission types.
    pub fn all() -> impl Iterator<Item = PermissionType> {
        PERMISSION_TABLE.iter().map(|entry| entry.permission_type)
    }

    /// Looks up the permission type for a resource type and verb.
    #[must_use]
    pub fn for_resource(resource_type: ResourceType, verb: &str) -> Option<Self> {
        PERMISSION_TABLE
            .iter()
            .find(|entry| entry.resource_type == resource_type && entry.verb == verb)
            .map(|entry| entry.permission_type)
    }

    /// Returns whether this is the coarse "all" verb of its resource type.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.verb() == "all"
    }

    /// Returns whether this is the "list" verb of its resource type.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.verb() == "list"
    }

    /// Returns whether this is the "view" verb of its resource type.
    #[must_use]
    pub fn is_view(&self) -> bool {
        self.verb() == "view"
    }

    /// Returns whether the permission only reads state.
    ///
    /// Read-only permissions are the ones granted by the observer role.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.is_list()
            || self.is_view()
            || matches!(
                self,
                Self::PackSearch
                    | Self::PackViewsIndexHealth
                    | Self::ExecutionViewsFiltersList
                    | Self::ActionAliasHelp
            )
    }

    /// Expands a coarse "all" permission into the fine-grained verbs of its
    /// resource type. Any other permission expands to itself.
    #[must_use]
    pub fn expand(&self) -> Vec<PermissionType> {
        if !self.is_all() {
            return vec![*self];
        }

        self.resource_type()
            .permission_types()
            .into_iter()
            .filter(|permission_type| !permission_type.is_all())
            .collect()
    }

    /// Returns whether holding this permission satisfies `requested`.
    #[must_use]
    pub fn covers(&self, requested: PermissionType) -> bool {
        *self == requested
            || (self.is_all() && self.resource_type() == requested.resource_type())
    }
}

impl Display for PermissionType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PermissionType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PERMISSION_TABLE
            .iter()
            .find(|entry| entry.name == value)
            .map(|entry| entry.permission_type)
            .ok_or_else(|| AppError::Validation(format!("unknown permission type '{value}'")))
    }
}

/// Validates that every permission type may be granted on `resource_type`.
///
/// Grants on a pack may also carry the verbs of the content it ships.
pub fn validate_permission_types_for_resource_type(
    resource_type: ResourceType,
    permission_types: &[PermissionType],
) -> AppResult<()> {
    let invalid: Vec<&'static str> = permission_types
        .iter()
        .filter(|permission_type| {
            let own_type = permission_type.resource_type();
            own_type != resource_type
                && !(resource_type == ResourceType::Pack && own_type.is_content_pack_type())
        })
        .map(PermissionType::as_str)
        .collect();

    if invalid.is_empty() {
        return Ok(());
    }

    Err(AppError::Configuration(format!(
        "invalid permission types for resource type '{}': {}",
        resource_type.as_str(),
        invalid.join(", ")
    )))
}

/// Reserved roles with hard-coded bypass semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Unrestricted access, including system administration.
    SystemAdmin,
    /// Unrestricted access to platform resources.
    Admin,
    /// Read-only access to platform resources.
    Observer,
}

impl SystemRole {
    /// Returns the reserved role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::Admin => "admin",
            Self::Observer => "observer",
        }
    }

    /// Returns the reserved roles in bootstrap order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::SystemAdmin, Self::Admin, Self::Observer]
    }

    /// Returns the system role with the given name, if it is reserved.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == name)
    }

    /// Returns the description stored alongside the bootstrap role.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "Role with full system administrator access.",
            Self::Admin => "Role with full administrator access.",
            Self::Observer => "Role with read-only access to all the resources.",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{
        PERMISSION_TABLE, PermissionType, ResourceType, SystemRole,
        validate_permission_types_for_resource_type,
    };

    #[test]
    fn every_permission_type_has_one_table_row() {
        for permission_type in PermissionType::all() {
            let rows = PERMISSION_TABLE
                .iter()
                .filter(|entry| entry.permission_type == permission_type)
                .count();
            assert_eq!(rows, 1, "{permission_type:?}");
        }
    }

    #[test]
    fn permission_name_is_prefixed_by_resource_type() {
        for permission_type in PermissionType::all() {
            let expected = format!(
                "{}_{}",
                permission_type.resource_type().as_str(),
                permission_type.verb()
            );
            assert_eq!(permission_type.as_str(), expected);
        }
    }

    #[test]
    fn all_expands_to_every_fine_verb() {
        let expanded = PermissionType::KeyValuePairAll.expand();
        assert_eq!(
            expanded,
            vec![
                PermissionType::KeyValuePairList,
                PermissionType::KeyValuePairView,
                PermissionType::KeyValuePairSet,
                PermissionType::KeyValuePairDelete,
            ]
        );
    }

    #[test]
    fn fine_verb_does_not_cover_siblings() {
        assert!(PermissionType::KeyValuePairSet.covers(PermissionType::KeyValuePairSet));
        assert!(!PermissionType::KeyValuePairSet.covers(PermissionType::KeyValuePairDelete));
        assert!(!PermissionType::KeyValuePairSet.covers(PermissionType::KeyValuePairView));
        assert!(!PermissionType::ActionAll.covers(PermissionType::RuleView));
    }

    #[test]
    fn read_only_permissions_include_search_and_help() {
        assert!(PermissionType::PackSearch.is_read_only());
        assert!(PermissionType::ActionAliasHelp.is_read_only());
        assert!(PermissionType::StreamView.is_read_only());
        assert!(!PermissionType::ActionExecute.is_read_only());
        assert!(!PermissionType::KeyValuePairAll.is_read_only());
    }

    #[test]
    fn serde_value_matches_storage_value() {
        let serialized = serde_json::to_string(&PermissionType::ExecutionReRun);
        assert_eq!(
            serialized.unwrap_or_default(),
            "\"execution_re_run\"".to_owned()
        );
    }

    #[test]
    fn validation_rejects_foreign_verbs() {
        let result = validate_permission_types_for_resource_type(
            ResourceType::Action,
            &[PermissionType::ActionView, PermissionType::RuleView],
        );
        assert!(matches!(
            result,
            Err(warrant_core::AppError::Configuration(_))
        ));

        let result = validate_permission_types_for_resource_type(
            ResourceType::Action,
            &[PermissionType::ActionView, PermissionType::ActionAll],
        );
        assert!(result.is_ok());

        let result = validate_permission_types_for_resource_type(
            ResourceType::Pack,
            &[PermissionType::PackView, PermissionType::ActionExecute],
        );
        assert!(result.is_ok());

        let result = validate_permission_types_for_resource_type(
            ResourceType::Pack,
            &[PermissionType::KeyValuePairView],
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(PermissionType::from_str("action_fly").is_err());
        assert!(ResourceType::from_str("spaceship").is_err());
    }

    #[test]
    fn system_roles_resolve_by_name() {
        assert_eq!(SystemRole::from_name("observer"), Some(SystemRole::Observer));
        assert_eq!(SystemRole::from_name("operator"), None);
    }

    fn any_permission_type() -> impl Strategy<Value = PermissionType> {
        let all: Vec<PermissionType> = PermissionType::all().collect();
        proptest::sample::select(all)
    }

    proptest! {
        #[test]
        fn storage_value_roundtrips(permission_type in any_permission_type()) {
            let restored = PermissionType::from_str(permission_type.as_str());
            prop_assert!(restored.is_ok());
            prop_assert_eq!(restored.unwrap_or(PermissionType::StreamView), permission_type);
        }

        #[test]
        fn all_permission_covers_every_verb_of_its_type(permission_type in any_permission_type()) {
            let resource_type = permission_type.resource_type();
            if let Some(all_permission) = resource_type.all_permission() {
                prop_assert!(all_permission.covers(permission_type));
                if !permission_type.is_all() {
                    prop_assert!(all_permission.expand().contains(&permission_type));
                }
            }
        }
    }
}
