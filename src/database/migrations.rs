//! Versioned schema migrations, applied in order at startup.
//!
//! The first migration uses `CREATE TABLE IF NOT EXISTS` and every column
//! addition checks for the column first, so databases written by earlier
//! releases of the bot (with or without the later columns) are adopted as-is.

use anyhow::Context as _;
use diesel::{connection::SimpleConnection, prelude::*, sql_query, sql_types::Text, SqliteConnection};

use crate::schema::schema_migrations;

struct Migration {
    version: i32,
    name: &'static str,
    up: fn(&SqliteConnection) -> QueryResult<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_suggestion_tables",
        up: create_suggestion_tables,
    },
    Migration {
        version: 2,
        name: "add_blocked_role",
        up: add_blocked_role,
    },
    Migration {
        version: 3,
        name: "add_threads_and_anonymous_decisions",
        up: add_threads_and_anonymous_decisions,
    },
];

const CREATE_MIGRATION_LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

#[derive(QueryableByName)]
struct ColumnName {
    #[sql_type = "Text"]
    name: String,
}

pub(crate) fn run(conn: &SqliteConnection) -> Result<usize, anyhow::Error> {
    conn.batch_execute(CREATE_MIGRATION_LEDGER)?;
    let applied = schema_migrations::table
        .select(schema_migrations::version)
        .load::<i32>(conn)?;

    let mut ran = 0;
    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }
        conn.transaction::<_, diesel::result::Error, _>(|| {
            (migration.up)(conn)?;
            diesel::insert_into(schema_migrations::table)
                .values((
                    schema_migrations::version.eq(migration.version),
                    schema_migrations::name.eq(migration.name),
                    schema_migrations::applied_at.eq(chrono::Utc::now().to_rfc3339()),
                ))
                .execute(conn)?;
            Ok(())
        })
        .with_context(|| {
            format!(
                "migration {} ({}) failed",
                migration.version, migration.name
            )
        })?;
        info!(
            "Applied migration {} ({})",
            migration.version, migration.name
        );
        ran += 1;
    }
    Ok(ran)
}

fn has_column(conn: &SqliteConnection, table: &str, column: &str) -> QueryResult<bool> {
    let columns = sql_query(format!("SELECT name FROM pragma_table_info('{}')", table))
        .load::<ColumnName>(conn)?;
    Ok(columns.iter().any(|c| c.name == column))
}

fn add_column_if_missing(
    conn: &SqliteConnection,
    table: &str,
    column: &str,
    definition: &str,
) -> QueryResult<()> {
    if has_column(conn, table, column)? {
        debug!("{}.{} already present, skipping", table, column);
        return Ok(());
    }
    conn.batch_execute(&format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table, column, definition
    ))
}

fn create_suggestion_tables(conn: &SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(
        "CREATE TABLE IF NOT EXISTS guild_settings (
            guild_id INTEGER PRIMARY KEY NOT NULL,
            suggestion_channel_id INTEGER,
            reviewer_role_id INTEGER
        );
        CREATE TABLE IF NOT EXISTS suggestions (
            suggestion_id TEXT PRIMARY KEY NOT NULL,
            guild_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            message_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            pros TEXT NOT NULL DEFAULT '',
            cons TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            decision_reason TEXT
        );
        CREATE TABLE IF NOT EXISTS votes (
            suggestion_id TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            vote_type TEXT NOT NULL,
            PRIMARY KEY (suggestion_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS suggestions_status_idx ON suggestions (status);",
    )
}

fn add_blocked_role(conn: &SqliteConnection) -> QueryResult<()> {
    add_column_if_missing(conn, "guild_settings", "blocked_role_id", "INTEGER")
}

fn add_threads_and_anonymous_decisions(conn: &SqliteConnection) -> QueryResult<()> {
    add_column_if_missing(conn, "suggestions", "thread_id", "INTEGER")?;
    add_column_if_missing(
        conn,
        "suggestions",
        "decided_anonymously",
        "INTEGER NOT NULL DEFAULT 0",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn raw_connection(dir: &tempfile::TempDir) -> (String, SqliteConnection) {
        let path = dir.path().join("legacy.db").to_str().unwrap().to_owned();
        let conn = SqliteConnection::establish(&path).unwrap();
        (path, conn)
    }

    #[test]
    fn fresh_database_gets_every_migration_once() {
        let dir = tempfile::tempdir().unwrap();
        let (path, conn) = raw_connection(&dir);

        assert_eq!(run(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run(&conn).unwrap(), 0);

        assert!(has_column(&conn, "guild_settings", "blocked_role_id").unwrap());
        assert!(has_column(&conn, "suggestions", "thread_id").unwrap());
        assert!(has_column(&conn, "suggestions", "decided_anonymously").unwrap());

        let db = Database::new(&path, 1).unwrap();
        assert_eq!(db.run_migrations().unwrap(), 0);
    }

    #[test]
    fn legacy_tables_without_newer_columns_keep_their_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (path, conn) = raw_connection(&dir);
        conn.batch_execute(
            "CREATE TABLE guild_settings (guild_id INTEGER PRIMARY KEY, suggestion_channel_id INTEGER, reviewer_role_id INTEGER);
             CREATE TABLE suggestions (suggestion_id TEXT PRIMARY KEY, guild_id INTEGER, user_id INTEGER, message_id INTEGER,
                 title TEXT, description TEXT, pros TEXT, cons TEXT, image_url TEXT, status TEXT DEFAULT 'pending',
                 created_at TEXT, decision_reason TEXT);
             CREATE TABLE votes (suggestion_id TEXT, user_id INTEGER, vote_type TEXT, PRIMARY KEY (suggestion_id, user_id));
             INSERT INTO guild_settings VALUES (1, 10, 20);
             INSERT INTO suggestions VALUES ('abcd1234', 1, 5, 99, 'Title', 'Desc', 'p', 'c', NULL, 'pending',
                 '2024-03-01T12:00:00.123456+00:00', NULL);
             INSERT INTO votes VALUES ('abcd1234', 7, 'upvote');",
        )
        .unwrap();
        drop(conn);

        let db = Database::new(&path, 1).unwrap();
        assert_eq!(db.run_migrations().unwrap(), MIGRATIONS.len());

        let config = db.get_guild_config(1).unwrap().unwrap();
        assert_eq!(config.suggestion_channel_id, Some(10));
        assert_eq!(config.reviewer_role_id, Some(20));
        assert_eq!(config.blocked_role_id, None);

        let suggestion = db.get_suggestion("abcd1234").unwrap().unwrap();
        assert_eq!(suggestion.thread_id, None);
        assert!(!suggestion.decided_anonymously);
        assert_eq!(db.tally_votes("abcd1234").unwrap().upvotes, 1);
    }

    #[test]
    fn legacy_tables_with_every_column_are_adopted() {
        let dir = tempfile::tempdir().unwrap();
        let (path, conn) = raw_connection(&dir);
        conn.batch_execute(
            "CREATE TABLE guild_settings (guild_id INTEGER PRIMARY KEY, suggestion_channel_id INTEGER,
                 reviewer_role_id INTEGER, blocked_role_id INTEGER);
             CREATE TABLE suggestions (suggestion_id TEXT PRIMARY KEY, guild_id INTEGER, user_id INTEGER, message_id INTEGER,
                 thread_id INTEGER, title TEXT, description TEXT, pros TEXT, cons TEXT, image_url TEXT,
                 status TEXT DEFAULT 'pending', created_at TEXT, decision_reason TEXT, decided_anonymously INTEGER DEFAULT 0);
             INSERT INTO guild_settings VALUES (1, 10, 20, 30);
             INSERT INTO suggestions VALUES ('zz99yy88', 1, 5, 99, 123, 'Title', 'Desc', '', '', NULL, 'rejected',
                 '2024-03-01T12:00:00+00:00', 'no', 1);",
        )
        .unwrap();
        drop(conn);

        let db = Database::new(&path, 1).unwrap();
        db.run_migrations().unwrap();

        assert_eq!(
            db.get_guild_config(1).unwrap().unwrap().blocked_role_id,
            Some(30)
        );
        let suggestion = db.get_suggestion("zz99yy88").unwrap().unwrap();
        assert_eq!(suggestion.thread_id, Some(123));
        assert!(suggestion.decided_anonymously);
        assert_eq!(suggestion.decision_reason.as_deref(), Some("no"));
    }
}
