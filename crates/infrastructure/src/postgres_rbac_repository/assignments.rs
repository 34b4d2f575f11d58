use super::*;

impl PostgresRbacRepository {
    pub(super) async fn list_role_assignments_for_user_impl(
        &self,
        user: &str,
        include_remote: bool,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_name, role_name, source, description, is_remote
            FROM rbac_user_role_assignments
            WHERE user_name = $1
                AND ($2 OR NOT is_remote)
            ORDER BY id
            "#,
        )
        .bind(user)
        .bind(include_remote)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list role assignments for user", error))?;

        rows.into_iter().map(AssignmentRow::into_assignment).collect()
    }

    pub(super) async fn list_role_assignments_impl(&self) -> AppResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_name, role_name, source, description, is_remote
            FROM rbac_user_role_assignments
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list role assignments", error))?;

        rows.into_iter().map(AssignmentRow::into_assignment).collect()
    }

    pub(super) async fn upsert_role_assignment_impl(
        &self,
        assignment: UserRoleAssignment,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO rbac_user_role_assignments
                (user_name, role_name, source, description, is_remote)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_name, role_name, source) DO NOTHING
            "#,
        )
        .bind(assignment.user())
        .bind(assignment.role())
        .bind(assignment.source())
        .bind(assignment.description())
        .bind(assignment.is_remote())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("save role assignment", error))?;

        Ok(result.rows_affected() > 0)
    }

    pub(super) async fn delete_role_assignment_impl(
        &self,
        user: &str,
        role: &str,
        source: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM rbac_user_role_assignments
            WHERE user_name = $1
                AND role_name = $2
                AND source = $3
            "#,
        )
        .bind(user)
        .bind(role)
        .bind(source)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("delete role assignment", error))?;

        Ok(result.rows_affected() > 0)
    }
}
