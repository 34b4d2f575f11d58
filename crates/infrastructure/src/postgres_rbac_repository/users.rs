use super::*;

impl PostgresRbacRepository {
    pub(super) async fn find_user_impl(&self, name: &str) -> AppResult<Option<User>> {
        let stored = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM rbac_users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("load user", error))?;

        stored
            .map(|name| {
                User::new(name).map_err(|error| {
                    AppError::Internal(format!("persisted user is invalid: {error}"))
                })
            })
            .transpose()
    }

    pub(super) async fn save_user_impl(&self, user: User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_users (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(user.name())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("save user", error))?;

        Ok(())
    }
}
