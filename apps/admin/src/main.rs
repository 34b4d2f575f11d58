//! Warrant operator binary.

#![forbid(unsafe_code)]

mod admin_config;

use std::env;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use warrant_application::{
    AuthorizationService, BackendContext, BackendRegistry, DefinitionsSyncService, RbacService,
};
use warrant_core::AppError;
use warrant_domain::{RbacDefinitions, User};
use warrant_infrastructure::{InMemoryActionCatalog, PostgresRbacRepository};

use crate::admin_config::{AdminCommand, AdminConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = AdminCommand::parse(env::args().skip(1))?;
    let config = AdminConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let service = RbacService::new(Arc::new(PostgresRbacRepository::new(pool.clone())));

    match command {
        AdminCommand::Migrate => migrate(&pool, &service).await,
        AdminCommand::ApplyDefinitions(path) => apply_definitions(&service, &path).await,
        AdminCommand::UserSummary(username) => user_summary(&config, service, &username).await,
    }
}

async fn connect_pool(database_url: &str) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Store(format!("failed to connect to database: {error}")))
}

async fn migrate(pool: &PgPool, service: &RbacService) -> Result<(), AppError> {
    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(pool)
        .await
        .map_err(|error| AppError::Store(format!("failed to run migrations: {error}")))?;

    let created = service.insert_system_roles().await?;
    info!(created_system_roles = created.len(), "database migrated");
    Ok(())
}

async fn apply_definitions(service: &RbacService, path: &Path) -> Result<(), AppError> {
    let contents = std::fs::read_to_string(path).map_err(|error| {
        AppError::Configuration(format!("failed to read '{}': {error}", path.display()))
    })?;
    let definitions: RbacDefinitions = serde_json::from_str(&contents).map_err(|error| {
        AppError::Configuration(format!("invalid definitions in '{}': {error}", path.display()))
    })?;

    let summary = DefinitionsSyncService::new(service.clone())
        .sync(&definitions)
        .await?;
    info!(
        file = %path.display(),
        roles = summary.roles_created,
        assignments = summary.assignments_created,
        revoked = summary.assignments_revoked,
        "definitions applied"
    );
    Ok(())
}

async fn user_summary(
    config: &AdminConfig,
    service: RbacService,
    username: &str,
) -> Result<(), AppError> {
    // Summaries never look at rule references, so no action store is needed.
    let context = BackendContext {
        config: config.rbac.clone(),
        service,
        action_catalog: Arc::new(InMemoryActionCatalog::new()),
    };
    let authorization = AuthorizationService::from_registry(&BackendRegistry::default(), context)?;
    let summary = authorization.rbac_summary(&User::new(username)?).await?;

    println!(
        "{}",
        json!({
            "user": username,
            "enabled": summary.enabled,
            "is_admin": summary.is_admin,
            "roles": summary.roles,
        })
    );
    Ok(())
}
