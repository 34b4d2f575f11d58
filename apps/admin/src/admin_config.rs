use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use warrant_application::{DEFAULT_BACKEND, RbacConfig};
use warrant_core::{AppError, AppResult};

/// Operator command selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Applies the schema and inserts the system roles.
    Migrate,
    /// Converges roles, assignments and group mappings to a JSON file.
    ApplyDefinitions(PathBuf),
    /// Prints the RBAC standing of a user.
    UserSummary(String),
}

impl AdminCommand {
    pub fn parse(mut args: impl Iterator<Item = String>) -> AppResult<Self> {
        let command = args.next();
        let argument = args.next();

        match (command.as_deref(), argument) {
            (Some("migrate"), None) => Ok(Self::Migrate),
            (Some("apply-definitions"), Some(path)) => Ok(Self::ApplyDefinitions(PathBuf::from(path))),
            (Some("user-summary"), Some(username)) => Ok(Self::UserSummary(username)),
            _ => Err(AppError::Validation(
                "usage: warrant-admin migrate | apply-definitions <file> | user-summary <username>"
                    .to_owned(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub database_url: String,
    pub rbac: RbacConfig,
}

impl AdminConfig {
    pub fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;

        let rbac = RbacConfig {
            enable: parse_env_bool("RBAC_ENABLE", false)?,
            backend: env::var("RBAC_BACKEND").unwrap_or_else(|_| DEFAULT_BACKEND.to_owned()),
            sync_remote_groups: parse_env_bool("RBAC_SYNC_REMOTE_GROUPS", false)?,
            sync_remote_groups_case_sensitive: parse_env_bool(
                "RBAC_SYNC_REMOTE_GROUPS_CASE_SENSITIVE",
                true,
            )?,
        };

        Ok(Self { database_url, rbac })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn parse_env_bool(name: &str, default: bool) -> AppResult<bool> {
    match env::var(name) {
        Ok(value) => parse_bool(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Configuration(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{AdminCommand, parse_bool};

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| (*value).to_owned())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn commands_parse_with_their_argument() {
        assert_eq!(AdminCommand::parse(args(&["migrate"])).ok(), Some(AdminCommand::Migrate));
        assert_eq!(
            AdminCommand::parse(args(&["apply-definitions", "rbac.json"])).ok(),
            Some(AdminCommand::ApplyDefinitions(PathBuf::from("rbac.json")))
        );
        assert!(AdminCommand::parse(args(&["apply-definitions"])).is_err());
        assert!(AdminCommand::parse(args(&[])).is_err());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert_eq!(parse_bool("RBAC_ENABLE", "True").ok(), Some(true));
        assert_eq!(parse_bool("RBAC_ENABLE", "0").ok(), Some(false));
        assert!(parse_bool("RBAC_ENABLE", "maybe").is_err());
    }
}
