/*!
 * Repository layer providing typed database operations.
 *
 * All write paths use `ON CONFLICT ... DO UPDATE` upserts so that two
 * workers racing on the same (video, language) converge on one row
 * instead of failing or duplicating.
 */

use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use super::connection::DatabaseConnection;
use super::models::{SubtitleRecord, TagRecord, VideoRef, VideoType};

/// Typed query and upsert API over the metadata store
#[derive(Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    /// Create a repository over an existing connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository over a fresh in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self {
            db: DatabaseConnection::new_in_memory()?,
        })
    }

    /// Access the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Insert or update a video reference
    pub async fn insert_video(&self, video: &VideoRef) -> Result<()> {
        let video = video.clone();
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO videos (author, permlink, content_id, created_at, video_type)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(author, permlink) DO UPDATE SET
                         content_id = excluded.content_id,
                         created_at = excluded.created_at,
                         video_type = excluded.video_type",
                    params![
                        video.author,
                        video.permlink,
                        video.content_id,
                        video.created_at,
                        video.video_type.as_str()
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Videos created at or after the given date, oldest first
    pub async fn videos_since(&self, date: &str) -> Result<Vec<VideoRef>> {
        let date = date.to_string();
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT author, permlink, content_id, created_at, video_type
                     FROM videos
                     WHERE created_at >= ?1
                     ORDER BY created_at ASC",
                )?;

                let videos = stmt
                    .query_map(params![date], |row| {
                        Ok(VideoRef {
                            author: row.get(0)?,
                            permlink: row.get(1)?,
                            content_id: row.get(2)?,
                            created_at: row.get(3)?,
                            video_type: VideoType::from_db(&row.get::<_, String>(4)?),
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(videos)
            })
            .await
    }

    /// Look up a single video by identity
    pub async fn video_by_author_permlink(
        &self,
        author: &str,
        permlink: &str,
    ) -> Result<Option<VideoRef>> {
        let author = author.to_string();
        let permlink = permlink.to_string();
        self.db
            .execute_async(move |conn| {
                let video = conn
                    .query_row(
                        "SELECT author, permlink, content_id, created_at, video_type
                         FROM videos
                         WHERE author = ?1 AND permlink = ?2",
                        params![author, permlink],
                        |row| {
                            Ok(VideoRef {
                                author: row.get(0)?,
                                permlink: row.get(1)?,
                                content_id: row.get(2)?,
                                created_at: row.get(3)?,
                                video_type: VideoType::from_db(&row.get::<_, String>(4)?),
                            })
                        },
                    )
                    .optional()?;

                Ok(video)
            })
            .await
    }

    /// Languages that already have a subtitle record for a video
    pub async fn existing_subtitle_languages(
        &self,
        author: &str,
        permlink: &str,
    ) -> Result<Vec<String>> {
        let author = author.to_string();
        let permlink = permlink.to_string();
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT language FROM subtitle_records
                     WHERE author = ?1 AND permlink = ?2
                     ORDER BY language",
                )?;

                let languages = stmt
                    .query_map(params![author, permlink], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;

                Ok(languages)
            })
            .await
    }

    /// Insert or update a subtitle record for one (video, language)
    pub async fn upsert_subtitle_record(&self, record: &SubtitleRecord) -> Result<()> {
        let record = record.clone();
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO subtitle_records
                         (author, permlink, video_cid, language, subtitle_path, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(author, permlink, language) DO UPDATE SET
                         video_cid = excluded.video_cid,
                         subtitle_path = excluded.subtitle_path,
                         created_at = excluded.created_at",
                    params![
                        record.author,
                        record.permlink,
                        record.video_cid,
                        record.language,
                        record.subtitle_path,
                        record.created_at
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// All subtitle records for a video, ordered by language
    pub async fn get_subtitle_records(
        &self,
        author: &str,
        permlink: &str,
    ) -> Result<Vec<SubtitleRecord>> {
        let author = author.to_string();
        let permlink = permlink.to_string();
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT author, permlink, video_cid, language, subtitle_path, created_at
                     FROM subtitle_records
                     WHERE author = ?1 AND permlink = ?2
                     ORDER BY language",
                )?;

                let records = stmt
                    .query_map(params![author, permlink], |row| {
                        Ok(SubtitleRecord {
                            author: row.get(0)?,
                            permlink: row.get(1)?,
                            video_cid: row.get(2)?,
                            language: row.get(3)?,
                            subtitle_path: row.get(4)?,
                            created_at: row.get(5)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(records)
            })
            .await
    }

    /// Insert or update the tag record for a video
    pub async fn upsert_tag_record(&self, record: &TagRecord) -> Result<()> {
        let record = record.clone();
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO tag_records (author, permlink, tags, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(author, permlink) DO UPDATE SET
                         tags = excluded.tags,
                         created_at = excluded.created_at",
                    params![record.author, record.permlink, record.tags, record.created_at],
                )?;
                Ok(())
            })
            .await
    }

    /// The tag record for a video, if any
    pub async fn get_tag_record(&self, author: &str, permlink: &str) -> Result<Option<TagRecord>> {
        let author = author.to_string();
        let permlink = permlink.to_string();
        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        "SELECT author, permlink, tags, created_at
                         FROM tag_records
                         WHERE author = ?1 AND permlink = ?2",
                        params![author, permlink],
                        |row| {
                            Ok(TagRecord {
                                author: row.get(0)?,
                                permlink: row.get(1)?,
                                tags: row.get(2)?,
                                created_at: row.get(3)?,
                            })
                        },
                    )
                    .optional()?;

                Ok(record)
            })
            .await
    }

    /// Creation date of the newest video that has any subtitle record.
    ///
    /// Used as the processing cursor: re-runs start from here instead of
    /// rescanning from the configured start date.
    pub async fn last_recorded_video_date(&self) -> Result<Option<String>> {
        self.db
            .execute_async(|conn| {
                let date: Option<String> = conn.query_row(
                    "SELECT MAX(v.created_at)
                     FROM videos v
                     WHERE EXISTS (
                         SELECT 1 FROM subtitle_records s
                         WHERE s.author = v.author AND s.permlink = v.permlink
                     )",
                    [],
                    |row| row.get(0),
                )?;

                Ok(date)
            })
            .await
    }
}
