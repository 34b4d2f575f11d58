use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use warrant_core::{AppError, AppResult, NonEmptyString};

use crate::ResourceType;

/// Fully qualified name of the shared key-value scope.
pub const SYSTEM_SCOPE: &str = "st2kv.system";

/// Fully qualified name of the per-user key-value scope.
pub const USER_SCOPE: &str = "st2kv.user";

/// Trigger type whose instances are bound to a webhook URL.
pub const WEBHOOK_TRIGGER_TYPE: &str = "core.st2.webhook";

/// Scope of a stored key-value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValueScope {
    /// Shared scope visible to every user allowed by grants.
    System,
    /// Private scope owned by a single user.
    User(String),
}

/// Scope name accepted when addressing a key-value pair before the owner is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValueScopeName {
    /// `st2kv.system`
    System,
    /// `st2kv.user`
    User,
}

impl FromStr for KeyValueScopeName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" | SYSTEM_SCOPE => Ok(Self::System),
            "user" | USER_SCOPE => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "invalid key-value scope '{value}'"
            ))),
        }
    }
}

/// Scope filter used when listing key-value pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValueListScope {
    /// Only shared keys.
    System,
    /// Only the requester's own keys.
    User,
    /// Keys of every scope and owner.
    All,
}

impl FromStr for KeyValueListScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Self::All),
            other => KeyValueScopeName::from_str(other).map(|scope| match scope {
                KeyValueScopeName::System => Self::System,
                KeyValueScopeName::User => Self::User,
            }),
        }
    }
}

/// Reference to a resource shipped inside a content pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pack: NonEmptyString,
    name: NonEmptyString,
}

impl ContentRef {
    /// Creates a validated content reference.
    pub fn new(pack: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            pack: NonEmptyString::new(pack)?,
            name: NonEmptyString::new(name)?,
        })
    }

    /// Parses a `pack.name` reference. The name may itself contain dots.
    pub fn parse(reference: &str) -> AppResult<Self> {
        let Some((pack, name)) = reference.split_once('.') else {
            return Err(AppError::Validation(format!(
                "invalid content reference '{reference}', expected 'pack.name'"
            )));
        };

        Self::new(pack, name)
    }

    /// Returns the owning pack name.
    #[must_use]
    pub fn pack(&self) -> &str {
        self.pack.as_str()
    }

    /// Returns the resource name inside the pack.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the `pack.name` reference.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}.{}", self.pack(), self.name())
    }
}

/// Trigger definition, optionally parameterised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResource {
    content: ContentRef,
    parameters: serde_json::Value,
}

impl TriggerResource {
    /// Creates a trigger resource. `Null` parameters are treated as none.
    #[must_use]
    pub fn new(content: ContentRef, parameters: serde_json::Value) -> Self {
        Self {
            content,
            parameters,
        }
    }

    /// Returns the pack reference of this trigger.
    #[must_use]
    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    /// Returns trigger parameters.
    #[must_use]
    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }

    fn has_parameters(&self) -> bool {
        match &self.parameters {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }

    fn parameters_digest(&self) -> String {
        // serde_json sorts object keys, so equal parameters hash equally.
        let serialized = self.parameters.to_string();
        hex::encode(Sha256::digest(serialized.as_bytes()))
    }
}

/// Trigger reference embedded in a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTrigger {
    trigger_type: NonEmptyString,
    parameters: serde_json::Value,
}

impl RuleTrigger {
    /// Creates a rule trigger reference.
    pub fn new(trigger_type: impl Into<String>, parameters: serde_json::Value) -> AppResult<Self> {
        Ok(Self {
            trigger_type: NonEmptyString::new(trigger_type)?,
            parameters,
        })
    }

    /// Returns the trigger type reference, e.g. `core.st2.webhook`.
    #[must_use]
    pub fn trigger_type(&self) -> &str {
        self.trigger_type.as_str()
    }

    /// Returns the trigger parameters.
    #[must_use]
    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }

    /// Returns whether this trigger is backed by a webhook.
    #[must_use]
    pub fn is_webhook(&self) -> bool {
        self.trigger_type() == WEBHOOK_TRIGGER_TYPE
    }

    /// Returns the webhook URL parameter, empty when absent.
    #[must_use]
    pub fn webhook_url(&self) -> &str {
        self.parameters
            .get("url")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
    }
}

/// Rule linking a trigger to an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResource {
    content: ContentRef,
    trigger: RuleTrigger,
    action_ref: NonEmptyString,
}

impl RuleResource {
    /// Creates a rule resource.
    pub fn new(
        content: ContentRef,
        trigger: RuleTrigger,
        action_ref: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            content,
            trigger,
            action_ref: NonEmptyString::new(action_ref)?,
        })
    }

    /// Returns the pack reference of this rule.
    #[must_use]
    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    /// Returns the referenced trigger.
    #[must_use]
    pub fn trigger(&self) -> &RuleTrigger {
        &self.trigger
    }

    /// Returns the `pack.name` reference of the action the rule runs.
    #[must_use]
    pub fn action_ref(&self) -> &str {
        self.action_ref.as_str()
    }
}

/// Execution of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResource {
    id: NonEmptyString,
    action: ContentRef,
}

impl ExecutionResource {
    /// Creates an execution resource.
    pub fn new(id: impl Into<String>, action: ContentRef) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            action,
        })
    }

    /// Returns the execution id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the executed action.
    #[must_use]
    pub fn action(&self) -> &ContentRef {
        &self.action
    }
}

/// Stored key-value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValuePairResource {
    name: NonEmptyString,
    scope: KeyValueScope,
}

impl KeyValuePairResource {
    /// Creates a key in the shared scope.
    pub fn system(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            scope: KeyValueScope::System,
        })
    }

    /// Creates a key in the private scope of `owner`.
    pub fn user(owner: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        let owner = NonEmptyString::new(owner)?;
        Ok(Self {
            name: NonEmptyString::new(name)?,
            scope: KeyValueScope::User(owner.into()),
        })
    }

    /// Returns the key name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the key scope.
    #[must_use]
    pub fn scope(&self) -> &KeyValueScope {
        &self.scope
    }

    /// Returns the owner of a user-scoped key.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        match &self.scope {
            KeyValueScope::System => None,
            KeyValueScope::User(owner) => Some(owner.as_str()),
        }
    }
}

/// Securable resource instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum Resource {
    /// Runner type identified by name.
    RunnerType {
        /// Runner name.
        name: String,
    },
    /// Content pack identified by its ref.
    Pack {
        /// Pack ref.
        pack_ref: String,
    },
    /// Sensor shipped by a pack.
    SensorType(ContentRef),
    /// Action shipped by a pack.
    Action(ContentRef),
    /// Action alias shipped by a pack.
    ActionAlias(ContentRef),
    /// Rule shipped by a pack.
    Rule(RuleResource),
    /// Rule enforcement record.
    RuleEnforcement {
        /// Enforcement id.
        id: String,
    },
    /// Policy type scoped to the resource type it applies to.
    PolicyType {
        /// Resource type the policy type targets, e.g. `action`.
        target: String,
        /// Policy type name.
        name: String,
    },
    /// Policy shipped by a pack.
    Policy(ContentRef),
    /// Action execution.
    Execution(ExecutionResource),
    /// Datastore item.
    KeyValuePair(KeyValuePairResource),
    /// Webhook identified by its URL name.
    Webhook {
        /// Webhook name.
        name: String,
    },
    /// Timer identified by id.
    Timer {
        /// Timer id.
        id: String,
    },
    /// API key identified by id.
    ApiKey {
        /// API key id.
        id: String,
    },
    /// Trace identified by id.
    Trace {
        /// Trace id.
        id: String,
    },
    /// Trigger definition.
    Trigger(TriggerResource),
    /// Inquiry identified by id.
    Inquiry {
        /// Inquiry id.
        id: String,
    },
}

impl Resource {
    /// Builds an action resource from a pack and name.
    pub fn action(pack: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::Action(ContentRef::new(pack, name)?))
    }

    /// Builds a system-scoped key-value pair resource.
    pub fn system_key(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::KeyValuePair(KeyValuePairResource::system(name)?))
    }

    /// Builds a user-scoped key-value pair resource.
    pub fn user_key(owner: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::KeyValuePair(KeyValuePairResource::user(owner, name)?))
    }

    /// Returns the resource type of this instance.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::RunnerType { .. } => ResourceType::RunnerType,
            Self::Pack { .. } => ResourceType::Pack,
            Self::SensorType(_) => ResourceType::SensorType,
            Self::Action(_) => ResourceType::Action,
            Self::ActionAlias(_) => ResourceType::ActionAlias,
            Self::Rule(_) => ResourceType::Rule,
            Self::RuleEnforcement { .. } => ResourceType::RuleEnforcement,
            Self::PolicyType { .. } => ResourceType::PolicyType,
            Self::Policy(_) => ResourceType::Policy,
            Self::Execution(_) => ResourceType::Execution,
            Self::KeyValuePair(_) => ResourceType::KeyValuePair,
            Self::Webhook { .. } => ResourceType::Webhook,
            Self::Timer { .. } => ResourceType::Timer,
            Self::ApiKey { .. } => ResourceType::ApiKey,
            Self::Trace { .. } => ResourceType::Trace,
            Self::Trigger(_) => ResourceType::Trigger,
            Self::Inquiry { .. } => ResourceType::Inquiry,
        }
    }

    /// Returns the pack reference for content-pack resources.
    #[must_use]
    pub fn content(&self) -> Option<&ContentRef> {
        match self {
            Self::SensorType(content)
            | Self::Action(content)
            | Self::ActionAlias(content)
            | Self::Policy(content) => Some(content),
            Self::Rule(rule) => Some(rule.content()),
            Self::Trigger(trigger) => Some(trigger.content()),
            _ => None,
        }
    }

    /// Returns the UID of the pack owning this resource, if any.
    #[must_use]
    pub fn pack_uid(&self) -> Option<String> {
        self.content()
            .map(|content| format!("{}:{}", ResourceType::Pack.as_str(), content.pack()))
    }

    /// Returns the canonical UID used to match permission grants.
    #[must_use]
    pub fn uid(&self) -> String {
        let prefix = self.resource_type().as_str();
        match self {
            Self::RunnerType { name } | Self::Webhook { name } => format!("{prefix}:{name}"),
            Self::Pack { pack_ref } => format!("{prefix}:{pack_ref}"),
            Self::SensorType(content)
            | Self::Action(content)
            | Self::ActionAlias(content)
            | Self::Policy(content) => {
                format!("{prefix}:{}:{}", content.pack(), content.name())
            }
            Self::Rule(rule) => {
                format!("{prefix}:{}:{}", rule.content().pack(), rule.content().name())
            }
            Self::Trigger(trigger) => {
                let base = format!(
                    "{prefix}:{}:{}",
                    trigger.content().pack(),
                    trigger.content().name()
                );
                if trigger.has_parameters() {
                    format!("{base}:{}", trigger.parameters_digest())
                } else {
                    base
                }
            }
            Self::PolicyType { target, name } => format!("{prefix}:{target}:{name}"),
            Self::Execution(execution) => format!("{prefix}:{}", execution.id()),
            Self::KeyValuePair(pair) => match pair.scope() {
                KeyValueScope::System => format!("{prefix}:{SYSTEM_SCOPE}:{}", pair.name()),
                KeyValueScope::User(owner) => {
                    format!("{prefix}:{USER_SCOPE}:{owner}:{}", pair.name())
                }
            },
            Self::RuleEnforcement { id }
            | Self::Timer { id }
            | Self::ApiKey { id }
            | Self::Trace { id }
            | Self::Inquiry { id } => format!("{prefix}:{id}"),
        }
    }
}

/// Key-value pair payload received before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePairApi {
    name: String,
    scope: KeyValueScopeName,
    user: Option<String>,
}

impl KeyValuePairApi {
    /// Creates a key-value payload. `user` defaults to the requester for user scope.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: KeyValueScopeName, user: Option<String>) -> Self {
        Self {
            name: name.into(),
            scope,
            user,
        }
    }

    /// Returns the explicit `user` attribute, if provided.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// Resource representation received from a client before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceApi {
    /// Key-value pair whose owner may be implied by the requester.
    KeyValuePair(KeyValuePairApi),
    /// Any resource whose API shape equals its stored shape.
    Resource(Resource),
}

impl ResourceApi {
    /// Returns the resource type of the payload.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::KeyValuePair(_) => ResourceType::KeyValuePair,
            Self::Resource(resource) => resource.resource_type(),
        }
    }

    /// Resolves the payload into the resource a stored instance would be.
    pub fn resolve(&self, requester: &str) -> AppResult<Resource> {
        match self {
            Self::Resource(resource) => Ok(resource.clone()),
            Self::KeyValuePair(payload) => match payload.scope {
                KeyValueScopeName::System => Resource::system_key(payload.name.as_str()),
                KeyValueScopeName::User => Resource::user_key(
                    payload.user.as_deref().unwrap_or(requester),
                    payload.name.as_str(),
                ),
            },
        }
    }
}

impl From<Resource> for ResourceApi {
    fn from(value: Resource) -> Self {
        Self::Resource(value)
    }
}

/// Returns whether a grant's resource UID addresses `resource_uid`.
///
/// A grant UID matches exactly, or as a prefix when it ends with `:` (scope)
/// or `*` (wildcard).
#[must_use]
pub fn grant_uid_matches(grant_uid: &str, resource_uid: &str) -> bool {
    if grant_uid == resource_uid {
        return true;
    }

    if grant_uid.ends_with(':') {
        return resource_uid.starts_with(grant_uid);
    }

    match grant_uid.strip_suffix('*') {
        Some(prefix) => resource_uid.starts_with(prefix),
        None => false,
    }
}

/// Validates the shape of a grant resource UID against its resource type.
pub fn validate_grant_resource_uid(resource_type: ResourceType, grant_uid: &str) -> AppResult<()> {
    let expected_prefix = format!("{}:", resource_type.as_str());
    if grant_uid.starts_with(&expected_prefix) {
        return Ok(());
    }

    Err(AppError::Configuration(format!(
        "resource uid '{grant_uid}' does not address resource type '{}'",
        resource_type.as_str()
    )))
}
