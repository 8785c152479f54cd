use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserFilter, UserId};

/// Data access for users.
///
/// Notification dispatch only reads users; `create` and `record_login`
/// exist for seeding and for the last-login audience filter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, input: NewUser) -> UserResult<User>;

    async fn get_by_id(&self, id: UserId) -> UserResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// All users matching `filter`, oldest first
    async fn list(&self, filter: &UserFilter) -> UserResult<Vec<User>>;

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> UserResult<()>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Store a fully-formed user as is, keeping its id and timestamps.
    pub async fn insert(&self, user: User) {
        self.next_id.fetch_max(user.id + 1, Ordering::SeqCst);
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email.eq_ignore_ascii_case(&input.email)) {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User::new(id, input);
        users.insert(id, user.clone());

        tracing::info!(user_id = id, role = %user.role, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> UserResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list(&self, filter: &UserFilter) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut matched: Vec<User> = users.values().filter(|u| filter.matches(u)).cloned().collect();
        matched.sort_by_key(|u| (u.created_at, u.id));
        Ok(matched)
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> UserResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(UserError::NotFound(id))?;
        user.last_login = Some(at);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();
        let a = repo.create(NewUser::new("a@example.org", Role::Visitor)).await.unwrap();
        let b = repo.create(NewUser::new("b@example.org", Role::OrgAdmin)).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.get_by_id(2).await.unwrap().unwrap().email, "b@example.org");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(NewUser::new("ana@example.org", Role::Visitor)).await.unwrap();
        let err = repo
            .create(NewUser::new("ANA@example.org", Role::Visitor))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_insert_keeps_explicit_id() {
        let repo = InMemoryUserRepository::new();
        repo.insert(User::new(42, NewUser::new("u42@example.org", Role::Visitor))).await;
        assert!(repo.get_by_id(42).await.unwrap().is_some());

        let next = repo.create(NewUser::new("next@example.org", Role::Visitor)).await.unwrap();
        assert_eq!(next.id, 43);
    }

    #[tokio::test]
    async fn test_list_applies_filter() {
        let repo = InMemoryUserRepository::new();
        for i in 0..3 {
            repo.create(NewUser::new(format!("v{i}@example.org"), Role::Visitor)).await.unwrap();
        }
        for i in 0..2 {
            repo.create(NewUser::new(format!("o{i}@example.org"), Role::OrgAdmin)).await.unwrap();
        }

        let visitors = repo.list(&UserFilter::by_role(Role::Visitor)).await.unwrap();
        assert_eq!(visitors.len(), 3);
        assert!(visitors.iter().all(|u| u.role == Role::Visitor));
        assert_eq!(repo.list(&UserFilter::default()).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_record_login() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(NewUser::new("a@example.org", Role::Visitor)).await.unwrap();
        let at = Utc::now();
        repo.record_login(user.id, at).await.unwrap();
        assert_eq!(repo.get_by_id(user.id).await.unwrap().unwrap().last_login, Some(at));

        let err = repo.record_login(999, at).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound(999)));
    }

    #[tokio::test]
    async fn test_mock_repository_contract() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .with(mockall::predicate::eq(7))
            .returning(|_| Ok(None));

        assert!(mock.get_by_id(7).await.unwrap().is_none());
    }
}
