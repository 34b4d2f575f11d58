use super::*;

impl RbacService {
    /// Lists every group mapping.
    pub async fn get_all_group_to_role_maps(&self) -> AppResult<Vec<GroupToRoleMapping>> {
        self.repository.list_group_to_role_maps().await
    }

    /// Returns mappings for the asserted groups.
    ///
    /// With `case_sensitive` off both sides are compared lowercased.
    pub async fn get_group_to_role_maps_for_groups(
        &self,
        groups: &[String],
        case_sensitive: bool,
    ) -> AppResult<Vec<GroupToRoleMapping>> {
        if case_sensitive {
            return self.repository.find_group_to_role_maps(groups).await;
        }

        let wanted: Vec<String> = groups.iter().map(|group| group.to_lowercase()).collect();
        Ok(self
            .repository
            .list_group_to_role_maps()
            .await?
            .into_iter()
            .filter(|mapping| wanted.contains(&mapping.group().to_lowercase()))
            .collect())
    }

    /// Creates or replaces the mapping of a group.
    pub async fn create_group_to_role_map(
        &self,
        group: &str,
        roles: Vec<String>,
        source: &str,
        description: Option<String>,
        enabled: bool,
    ) -> AppResult<GroupToRoleMapping> {
        let mapping = GroupToRoleMapping::new(group, roles, source, description, enabled)?;
        self.repository
            .save_group_to_role_map(mapping.clone())
            .await?;

        info!(
            group = %group,
            role_count = mapping.roles().len(),
            enabled,
            "saved group to role mapping"
        );
        Ok(mapping)
    }

    /// Deletes the mapping of a group.
    pub async fn delete_group_to_role_map(&self, group: &str) -> AppResult<bool> {
        self.repository.delete_group_to_role_map(group).await
    }
}
