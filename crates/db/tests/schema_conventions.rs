//! Guards on the migrated schema: key types, audit columns, geometry SRIDs
//! and constraint naming.

use sqlx::PgPool;

/// Base tables created by our migrations, excluding PostGIS and sqlx
/// bookkeeping.
async fn app_tables(pool: &PgPool) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT table_name::text
         FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_type = 'BASE TABLE'
           AND table_name NOT IN ('_sqlx_migrations', 'spatial_ref_sys')
         ORDER BY 1",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

async fn column_type(pool: &PgPool, table: &str, column: &str) -> Option<String> {
    sqlx::query_scalar(
        "SELECT data_type::text
         FROM information_schema.columns
         WHERE table_schema = 'public' AND table_name::text = $1 AND column_name::text = $2",
    )
    .bind(table)
    .bind(column)
    .fetch_optional(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_every_table_has_bigint_id_and_audit_timestamps(pool: PgPool) {
    let tables = app_tables(&pool).await;
    assert!(tables.contains(&"superpixels".to_string()));

    for table in &tables {
        assert_eq!(
            column_type(&pool, table, "id").await.as_deref(),
            Some("bigint"),
            "{table}.id"
        );
        for column in ["created_at", "updated_at"] {
            assert_eq!(
                column_type(&pool, table, column).await.as_deref(),
                Some("timestamp with time zone"),
                "{table}.{column}"
            );
        }
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_text_rather_than_varchar(pool: PgPool) {
    let varchar: Vec<String> = sqlx::query_scalar(
        "SELECT table_name || '.' || column_name
         FROM information_schema.columns
         WHERE table_schema = 'public'
           AND data_type = 'character varying'
           AND table_name <> 'spatial_ref_sys'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(varchar.is_empty(), "varchar columns: {varchar:?}");
}

/// Every stored geometry is a Polygon in WGS 84 with a GiST index.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_geometry_columns_are_wgs84_polygons(pool: PgPool) {
    let columns: Vec<(String, String, i32, String)> = sqlx::query_as(
        "SELECT f_table_name::text, f_geometry_column::text, srid, type::text
         FROM geometry_columns
         WHERE f_table_schema = 'public'
         ORDER BY 1",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let tables: Vec<&str> = columns.iter().map(|(t, ..)| t.as_str()).collect();
    assert_eq!(tables, vec!["misc_tiles", "scenes", "superpixels"]);

    for (table, column, srid, kind) in &columns {
        assert_eq!(*srid, 4326, "{table}.{column}");
        assert_eq!(kind, "POLYGON", "{table}.{column}");
    }

    for (table, column) in [("scenes", "bbox"), ("superpixels", "geom")] {
        let has_gist: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM pg_indexes
                 WHERE schemaname = 'public'
                   AND tablename = $1
                   AND indexdef LIKE '%USING gist (' || $2 || ')%'
             )",
        )
        .bind(table)
        .bind(column)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(has_gist, "{table}.{column} lacks a GiST index");
    }
}

/// A foreign key column must be the leading column of some index so
/// cascades do not scan.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_foreign_keys_are_indexed(pool: PgPool) {
    let unindexed: Vec<String> = sqlx::query_scalar(
        "SELECT c.conrelid::regclass::text || '.' || a.attname
         FROM pg_constraint c
         JOIN pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = c.conkey[1]
         WHERE c.contype = 'f'
           AND c.connamespace = 'public'::regnamespace
           AND NOT EXISTS (
               SELECT 1 FROM pg_index i
               WHERE i.indrelid = c.conrelid AND i.indkey[0] = c.conkey[1]
           )
         ORDER BY 1",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(unindexed.is_empty(), "unindexed foreign keys: {unindexed:?}");
}

/// Constraint names carry their kind as a prefix; error mapping relies on
/// the `uq_` and `fk_` prefixes. Foreign keys must state a delete rule.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_constraint_naming_and_delete_rules(pool: PgPool) {
    let constraints: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT conname::text, contype::text, confdeltype::text
         FROM pg_constraint
         WHERE connamespace = 'public'::regnamespace
           AND conrelid <> 'spatial_ref_sys'::regclass
           AND contype IN ('u', 'f', 'c')",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(!constraints.is_empty());

    for (name, kind, on_delete) in &constraints {
        let prefix = match kind.as_str() {
            "u" => "uq_",
            "f" => "fk_",
            _ => "ck_",
        };
        assert!(name.starts_with(prefix), "{name} should start with {prefix}");
        if kind == "f" {
            // 'a' is NO ACTION, the implicit default.
            assert_ne!(on_delete, "a", "{name} has no explicit ON DELETE");
        }
    }
}
