use spmc_core::roles::Role;
use spmc_db::models::user::CreateUser;
use spmc_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

fn account(username: &str, role: Role) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "$argon2id$placeholder".to_string(),
        role,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_migrations_apply_and_pool_is_healthy(pool: PgPool) {
    spmc_db::health_check(&pool).await.unwrap();
}

/// PostGIS must be installed and able to reproject.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_postgis_available(pool: PgPool) {
    let (x,): (f64,) = sqlx::query_as(
        "SELECT ST_X(ST_Transform(ST_SetSRID(ST_MakePoint(0, 0), 4326), 3857))",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(x.abs() < 1e-6);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_spatial_ref_lookup(pool: PgPool) {
    use spmc_db::repositories::SpatialRefRepo;

    assert!(SpatialRefRepo::exists(&pool, 4326).await.unwrap());
    assert!(SpatialRefRepo::exists(&pool, 3857).await.unwrap());
    assert!(!SpatialRefRepo::exists(&pool, 1).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_column_rejects_unknown_roles(pool: PgPool) {
    let err = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role)
         VALUES ('odd', 'odd@example.com', 'x', 'superuser')",
    )
    .execute(&pool)
    .await
    .unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("ck_users_role"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_round_trips_through_text_column(pool: PgPool) {
    assert!(!UserRepo::admin_exists(&pool).await.unwrap());

    let admin = UserRepo::create(&pool, &account("root", Role::Admin)).await.unwrap();
    let mapper = UserRepo::create(&pool, &account("mapper", Role::Classifier)).await.unwrap();

    assert_eq!(admin.role, Role::Admin);
    let loaded = UserRepo::find_by_id(&pool, mapper.id).await.unwrap().unwrap();
    assert_eq!(loaded.role, Role::Classifier);
    assert!(UserRepo::admin_exists(&pool).await.unwrap());

    UserRepo::deactivate(&pool, admin.id).await.unwrap();
    assert!(!UserRepo::admin_exists(&pool).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_logins_lock_on_threshold(pool: PgPool) {
    let user = UserRepo::create(&pool, &account("mapper", Role::Classifier)).await.unwrap();
    let lock_for = chrono::Duration::minutes(15);

    for _ in 0..2 {
        let locked = UserRepo::record_failed_login(&pool, user.id, 3, lock_for).await.unwrap();
        assert!(locked.is_none());
    }
    let locked = UserRepo::record_failed_login(&pool, user.id, 3, lock_for).await.unwrap();
    let until = locked.expect("third failure locks the account");
    assert!(until > chrono::Utc::now() + chrono::Duration::minutes(14));

    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_count, 0);
    assert!(stored.is_locked(chrono::Utc::now()));

    UserRepo::set_password(&pool, user.id, "$argon2id$other").await.unwrap();
    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(!stored.is_locked(chrono::Utc::now()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_session_is_single_use(pool: PgPool) {
    let user = UserRepo::create(&pool, &account("mapper", Role::Classifier)).await.unwrap();
    let expires = chrono::Utc::now() + chrono::Duration::days(1);
    SessionRepo::issue(&pool, user.id, "digest-a", expires).await.unwrap();

    let first = SessionRepo::consume(&pool, "digest-a").await.unwrap();
    assert_eq!(first.map(|s| s.user_id), Some(user.id));
    assert!(SessionRepo::consume(&pool, "digest-a").await.unwrap().is_none());
    assert!(SessionRepo::consume(&pool, "never-issued").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_and_revoked_sessions(pool: PgPool) {
    let user = UserRepo::create(&pool, &account("mapper", Role::Classifier)).await.unwrap();
    let past = chrono::Utc::now() - chrono::Duration::minutes(1);
    let future = chrono::Utc::now() + chrono::Duration::days(1);
    SessionRepo::issue(&pool, user.id, "stale", past).await.unwrap();
    SessionRepo::issue(&pool, user.id, "live-1", future).await.unwrap();
    SessionRepo::issue(&pool, user.id, "live-2", future).await.unwrap();

    assert!(SessionRepo::consume(&pool, "stale").await.unwrap().is_none());
    assert_eq!(SessionRepo::revoke_all_for_user(&pool, user.id).await.unwrap(), 3);
    assert!(SessionRepo::consume(&pool, "live-1").await.unwrap().is_none());
    assert_eq!(SessionRepo::prune_for_user(&pool, user.id).await.unwrap(), 3);
}
