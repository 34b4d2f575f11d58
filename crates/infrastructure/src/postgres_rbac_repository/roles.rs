use tracing::debug;

use super::*;

const ROLE_SELECT: &str = r#"
    SELECT
        roles.name,
        roles.description,
        roles.is_system,
        COALESCE(
            array_agg(links.grant_id::text ORDER BY links.position)
                FILTER (WHERE links.grant_id IS NOT NULL),
            '{}'
        ) AS grant_ids
    FROM rbac_roles AS roles
    LEFT JOIN rbac_role_permission_grants AS links
        ON links.role_name = roles.name
"#;

impl PostgresRbacRepository {
    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<Role>> {
        let query = format!("{ROLE_SELECT} GROUP BY roles.name ORDER BY roles.name");
        let rows = sqlx::query_as::<_, RoleRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error("list roles", error))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    pub(super) async fn find_role_impl(&self, name: &str) -> AppResult<Option<Role>> {
        let query = format!("{ROLE_SELECT} WHERE roles.name = $1 GROUP BY roles.name");
        let row = sqlx::query_as::<_, RoleRow>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| store_error("load role", error))?;

        row.map(RoleRow::into_role).transpose()
    }

    pub(super) async fn save_role_impl(&self, role: Role) -> AppResult<()> {
        let grant_ids = role
            .permission_grant_ids()
            .iter()
            .map(|id| {
                Uuid::parse_str(id).map_err(|error| {
                    AppError::Validation(format!("invalid permission grant id '{id}': {error}"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error("begin transaction", error))?;

        sqlx::query(
            r#"
            INSERT INTO rbac_roles (name, description, is_system)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description,
                is_system = EXCLUDED.is_system
            "#,
        )
        .bind(role.name())
        .bind(role.description())
        .bind(role.is_system())
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("save role", error))?;

        sqlx::query(
            r#"
            DELETE FROM rbac_role_permission_grants
            WHERE role_name = $1
            "#,
        )
        .bind(role.name())
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("reset role grants", error))?;

        for (position, grant_id) in grant_ids.iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| {
                AppError::Validation(format!("role '{}' has too many grants", role.name()))
            })?;
            sqlx::query(
                r#"
                INSERT INTO rbac_role_permission_grants (role_name, grant_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(role.name())
            .bind(grant_id)
            .bind(position)
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error("link role grant", error))?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| store_error("commit transaction", error))?;

        debug!(role = role.name(), grants = grant_ids.len(), "persisted role");
        Ok(())
    }

    pub(super) async fn delete_role_impl(&self, name: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("delete role", error))?;

        Ok(result.rows_affected() > 0)
    }
}
