/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for all database tables
 * and handles schema migrations for version upgrades.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Enable WAL mode for better concurrency and crash recovery;
    // foreign_keys is per-connection and must be set on every open
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    // Check current schema version
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        // Fresh database - create all tables
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        // Need to migrate
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    // Check if the schema_version table exists
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // Create schema version table
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Create videos table (seeded externally, queried by date)
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            author TEXT NOT NULL,
            permlink TEXT NOT NULL,
            content_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            video_type TEXT NOT NULL DEFAULT 'legacy',
            PRIMARY KEY (author, permlink)
        );

        CREATE INDEX IF NOT EXISTS idx_videos_created ON videos(created_at);
        "#,
    )?;

    // Create subtitle_records table; the UNIQUE constraint is the
    // concurrent-writer correctness mechanism
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS subtitle_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            permlink TEXT NOT NULL,
            video_cid TEXT NOT NULL,
            language TEXT NOT NULL,
            subtitle_path TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(author, permlink, language),
            FOREIGN KEY (author, permlink) REFERENCES videos(author, permlink) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_subtitles_video ON subtitle_records(author, permlink);
        CREATE INDEX IF NOT EXISTS idx_subtitles_language ON subtitle_records(language);
        "#,
    )?;

    // Create tag_records table
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tag_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            permlink TEXT NOT NULL,
            tags TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(author, permlink),
            FOREIGN KEY (author, permlink) REFERENCES videos(author, permlink) ON DELETE CASCADE
        );
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < SCHEMA_VERSION {
        match current {
            // Add migration steps here as schema evolves
            _ => {
                return Err(anyhow::anyhow!(
                    "Unknown schema version: {}. Cannot migrate.",
                    current
                ));
            }
        }
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}
