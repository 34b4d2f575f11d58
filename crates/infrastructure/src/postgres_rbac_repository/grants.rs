use std::collections::HashMap;

use super::*;

impl PostgresRbacRepository {
    pub(super) async fn create_permission_grant_impl(
        &self,
        input: PermissionGrantInput,
    ) -> AppResult<PermissionGrant> {
        let id = Uuid::new_v4();
        let permission_types: Vec<&str> = input
            .permission_types()
            .iter()
            .map(|permission_type| permission_type.as_str())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO rbac_permission_grants (id, resource_uid, resource_type, permission_types)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(input.resource_uid())
        .bind(input.resource_type().as_str())
        .bind(&permission_types)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("create permission grant", error))?;

        Ok(input.into_grant(id.to_string()))
    }

    pub(super) async fn find_permission_grants_impl(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<PermissionGrant>> {
        // Ids that are not UUIDs can't exist in the table.
        let uuids: Vec<Uuid> = ids.iter().filter_map(|id| Uuid::parse_str(id).ok()).collect();
        if uuids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, resource_uid, resource_type, permission_types
            FROM rbac_permission_grants
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("load permission grants", error))?;

        let mut by_id = HashMap::with_capacity(rows.len());
        for row in rows {
            by_id.insert(row.id, row.into_grant()?);
        }

        Ok(uuids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    pub(super) async fn delete_permission_grants_impl(&self, ids: &[String]) -> AppResult<()> {
        let uuids: Vec<Uuid> = ids.iter().filter_map(|id| Uuid::parse_str(id).ok()).collect();
        if uuids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            DELETE FROM rbac_permission_grants
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("delete permission grants", error))?;

        Ok(())
    }
}
