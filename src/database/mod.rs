/*!
 * Metadata store for videos, subtitle records, and tag records.
 *
 * This module provides SQLite-backed persistence with:
 * - Connection management with async-safe access patterns
 * - Versioned schema with WAL mode
 * - A typed repository API where SQL uniqueness constraints, not
 *   application locking, guarantee correctness under concurrent writers
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DatabaseConnection;
pub use models::{SubtitleRecord, TagRecord, VideoRef, VideoType};
pub use repository::Repository;
