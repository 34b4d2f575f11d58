/// Name of the backend that runs the resolution engine.
pub const DEFAULT_BACKEND: &str = "default";

/// Name of the always-allow backend.
pub const NOOP_BACKEND: &str = "noop";

/// RBAC settings threaded into the backend, policy façade and login hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RbacConfig {
    /// Enables enforcement. When false every check allows.
    pub enable: bool,
    /// Registered backend name.
    pub backend: String,
    /// Reconciles remote role assignments on login.
    pub sync_remote_groups: bool,
    /// Compares asserted groups case-sensitively.
    pub sync_remote_groups_case_sensitive: bool,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            enable: false,
            backend: DEFAULT_BACKEND.to_owned(),
            sync_remote_groups: false,
            sync_remote_groups_case_sensitive: true,
        }
    }
}

impl RbacConfig {
    /// Returns a configuration with enforcement on and the default backend.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enable: true,
            ..Self::default()
        }
    }

    /// Returns a copy with remote group sync switched on.
    #[must_use]
    pub fn with_remote_group_sync(mut self, case_sensitive: bool) -> Self {
        self.sync_remote_groups = true;
        self.sync_remote_groups_case_sensitive = case_sensitive;
        self
    }

    /// Returns a copy that selects another backend.
    #[must_use]
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }
}
