use super::*;

impl PostgresRbacRepository {
    pub(super) async fn list_group_to_role_maps_impl(&self) -> AppResult<Vec<GroupToRoleMapping>> {
        let rows = sqlx::query_as::<_, GroupMapRow>(
            r#"
            SELECT group_name, roles, source, description, enabled
            FROM rbac_group_to_role_maps
            ORDER BY group_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list group mappings", error))?;

        rows.into_iter().map(GroupMapRow::into_mapping).collect()
    }

    pub(super) async fn find_group_to_role_maps_impl(
        &self,
        groups: &[String],
    ) -> AppResult<Vec<GroupToRoleMapping>> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, GroupMapRow>(
            r#"
            SELECT group_name, roles, source, description, enabled
            FROM rbac_group_to_role_maps
            WHERE group_name = ANY($1)
            ORDER BY group_name
            "#,
        )
        .bind(groups)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("load group mappings", error))?;

        rows.into_iter().map(GroupMapRow::into_mapping).collect()
    }

    pub(super) async fn save_group_to_role_map_impl(
        &self,
        mapping: GroupToRoleMapping,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_group_to_role_maps (group_name, roles, source, description, enabled)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_name) DO UPDATE
            SET roles = EXCLUDED.roles,
                source = EXCLUDED.source,
                description = EXCLUDED.description,
                enabled = EXCLUDED.enabled
            "#,
        )
        .bind(mapping.group())
        .bind(mapping.roles())
        .bind(mapping.source())
        .bind(mapping.description())
        .bind(mapping.enabled())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("save group mapping", error))?;

        Ok(())
    }

    pub(super) async fn delete_group_to_role_map_impl(&self, group: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM rbac_group_to_role_maps
            WHERE group_name = $1
            "#,
        )
        .bind(group)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("delete group mapping", error))?;

        Ok(result.rows_affected() > 0)
    }
}
