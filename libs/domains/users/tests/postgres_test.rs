//! Integration tests for PgUserRepository against a real PostgreSQL.
//!
//! Run with `cargo test -p domain_users -- --ignored` (needs Docker).

use chrono::{Duration, Utc};
use domain_users::{NewUser, PgUserRepository, Role, UserError, UserFilter, UserRepository};
use test_utils::{TestDataBuilder, TestDatabase};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_and_fetch_user() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("test_create_and_fetch_user");
    let repo = PgUserRepository::new(db.connection());

    let created = repo
        .create(NewUser::new(data.email("visitor", 1), Role::Visitor).named("Ana"))
        .await
        .unwrap();

    let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.email, created.email);
    assert_eq!(fetched.name.as_deref(), Some("Ana"));
    assert_eq!(fetched.role, Role::Visitor);

    let by_email = repo.get_by_email(&created.email).await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(created.id));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_email_is_rejected() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("test_duplicate_email_is_rejected");
    let repo = PgUserRepository::new(db.connection());

    let email = data.email("dup", 1);
    repo.create(NewUser::new(email.clone(), Role::Visitor)).await.unwrap();
    let err = repo.create(NewUser::new(email, Role::Visitor)).await.unwrap_err();
    assert!(matches!(err, UserError::DuplicateEmail(_)));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_list_filters_by_role_verification_and_login() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("test_list_filters");
    let repo = PgUserRepository::new(db.connection());

    for i in 0..3 {
        repo.create(NewUser::new(data.email("visitor", i), Role::Visitor)).await.unwrap();
    }
    let admin = repo
        .create(NewUser::new(data.email("admin", 0), Role::OrgAdmin).verified())
        .await
        .unwrap();
    repo.create(NewUser::new(data.email("admin", 1), Role::OrgAdmin)).await.unwrap();

    assert_eq!(repo.list(&UserFilter::by_role(Role::Visitor)).await.unwrap().len(), 3);

    let verified_admins = UserFilter {
        role: Some(Role::OrgAdmin),
        is_verified: Some(true),
        ..Default::default()
    };
    let found = repo.list(&verified_admins).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, admin.id);

    repo.record_login(admin.id, Utc::now()).await.unwrap();
    let active = UserFilter {
        last_login_after: Some(Utc::now() - Duration::days(30)),
        ..Default::default()
    };
    assert_eq!(repo.list(&active).await.unwrap().len(), 1);
}
