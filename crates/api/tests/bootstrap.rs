//! First-run admin creation.

mod common;

use assert_matches::assert_matches;
use spmc_api::bootstrap::{ensure_admin, BootstrapAdmin, BootstrapError};
use spmc_core::roles::Role;
use spmc_db::repositories::UserRepo;
use sqlx::PgPool;

fn admin(password: &str) -> BootstrapAdmin {
    BootstrapAdmin {
        username: "root".to_string(),
        email: "root@example.com".to_string(),
        password: password.to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_creates_admin_once(pool: PgPool) {
    let id = ensure_admin(&pool, &admin("a-long-bootstrap-password"))
        .await
        .unwrap()
        .expect("first run creates the account");
    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(user.is_active);

    let again = ensure_admin(&pool, &admin("a-long-bootstrap-password")).await.unwrap();
    assert!(again.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_classifiers_alone_do_not_count_as_admin(pool: PgPool) {
    common::create_user(&pool, "mapper", Role::Classifier).await;
    let created = ensure_admin(&pool, &admin("a-long-bootstrap-password")).await.unwrap();
    assert!(created.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_weak_password_refused(pool: PgPool) {
    let result = ensure_admin(&pool, &admin("short")).await;
    assert_matches!(result, Err(BootstrapError::WeakPassword(_)));
    assert!(!UserRepo::admin_exists(&pool).await.unwrap());
}
