use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{NewUser, User, UserFilter, UserId},
    repository::UserRepository,
};

pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn filter_condition(filter: &UserFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(role) = filter.role {
        cond = cond.add(entity::Column::Role.eq(role));
    }
    if let Some(verified) = filter.is_verified {
        cond = cond.add(entity::Column::IsVerified.eq(verified));
    }
    if let Some(after) = filter.created_after {
        cond = cond.add(entity::Column::CreatedAt.gte(after));
    }
    if let Some(before) = filter.created_before {
        cond = cond.add(entity::Column::CreatedAt.lte(before));
    }
    if let Some(after) = filter.last_login_after {
        cond = cond.add(entity::Column::LastLogin.gte(after));
    }
    cond
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let email = input.email.clone();
        let active: entity::ActiveModel = input.into();

        let model = active.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateEmail(email),
            _ => UserError::Internal(format!("Database error: {}", e)),
        })?;

        tracing::info!(user_id = model.id, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: UserId) -> UserResult<Option<User>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: &UserFilter) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .filter(filter_condition(filter))
            .order_by_asc(entity::Column::CreatedAt)
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> UserResult<()> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let mut active: entity::ActiveModel = model.into();
        active.last_login = Set(Some(at.into()));
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn row(id: i64, role: Role) -> entity::Model {
        let now = Utc::now();
        entity::Model {
            id,
            email: format!("user{id}@example.org"),
            name: None,
            password_hash: None,
            role,
            is_verified: true,
            google_id: None,
            created_at: now.into(),
            updated_at: now.into(),
            last_login: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_maps_model() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(42, Role::OrgAdmin)]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let user = repo.get_by_id(42).await.unwrap().unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.role, Role::OrgAdmin);
        assert_eq!(user.email, "user42@example.org");
    }

    #[tokio::test]
    async fn test_list_with_filter_returns_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(1, Role::Visitor), row(2, Role::Visitor)]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let users = repo.list(&UserFilter::by_role(Role::Visitor)).await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
