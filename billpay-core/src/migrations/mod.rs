//! Record database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary with include_str! and applied in
//! order by [`MigrationService`](crate::services::MigrationService).

/// All record database migrations, as (filename, sql_content).
///
/// New migrations get the next NNN_description.sql name and an entry here.
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
