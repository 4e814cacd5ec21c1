//! Sound queries

use crate::error::{Result, StorageError};
use chrono::DateTime;
use soundboard_core::types::{CategoryId, Sound, SoundId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::time::Duration;

/// Get all sounds, grouped by category position
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Sound>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.name, s.uri, s.duration_ms, s.volume, s.category_id,
               s.checksum, s.created_at, s.play_count, s.mime_type
        FROM sounds s
        JOIN categories c ON c.id = s.category_id
        ORDER BY c.position, s.created_at, s.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Get sound by ID
pub async fn get_by_id(pool: &SqlitePool, id: &SoundId) -> Result<Option<Sound>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, uri, duration_ms, volume, category_id,
               checksum, created_at, play_count, mime_type
        FROM sounds
        WHERE id = ?
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get the sounds of one category
pub async fn get_by_category(pool: &SqlitePool, category_id: &CategoryId) -> Result<Vec<Sound>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, uri, duration_ms, volume, category_id,
               checksum, created_at, play_count, mime_type
        FROM sounds
        WHERE category_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(category_id.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Checksums of all stored sounds
pub async fn get_checksums(pool: &SqlitePool) -> Result<Vec<String>> {
    let checksums = sqlx::query_scalar("SELECT checksum FROM sounds")
        .fetch_all(pool)
        .await?;

    Ok(checksums)
}

/// Insert a sound, replacing the row with the same id
pub async fn upsert(conn: &mut SqliteConnection, sound: &Sound) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sounds
            (id, name, uri, duration_ms, volume, category_id,
             checksum, created_at, play_count, mime_type)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            uri = excluded.uri,
            duration_ms = excluded.duration_ms,
            volume = excluded.volume,
            category_id = excluded.category_id,
            checksum = excluded.checksum,
            created_at = excluded.created_at,
            play_count = excluded.play_count,
            mime_type = excluded.mime_type
        "#,
    )
    .bind(sound.id.as_str())
    .bind(&sound.name)
    .bind(&sound.uri)
    .bind(sound.duration.map(duration_to_ms))
    .bind(f64::from(sound.volume))
    .bind(sound.category_id.as_str())
    .bind(&sound.checksum)
    .bind(sound.created_at.timestamp_millis())
    .bind(i64::from(sound.play_count))
    .bind(&sound.mime_type)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update a sound by id (no-op when it does not exist)
pub async fn update(conn: &mut SqliteConnection, sound: &Sound) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sounds
        SET name = ?, uri = ?, duration_ms = ?, volume = ?, category_id = ?,
            checksum = ?, created_at = ?, play_count = ?, mime_type = ?
        WHERE id = ?
        "#,
    )
    .bind(&sound.name)
    .bind(&sound.uri)
    .bind(sound.duration.map(duration_to_ms))
    .bind(f64::from(sound.volume))
    .bind(sound.category_id.as_str())
    .bind(&sound.checksum)
    .bind(sound.created_at.timestamp_millis())
    .bind(i64::from(sound.play_count))
    .bind(&sound.mime_type)
    .bind(sound.id.as_str())
    .execute(conn)
    .await?;

    Ok(())
}

/// Delete a sound
pub async fn delete(conn: &mut SqliteConnection, id: &SoundId) -> Result<()> {
    sqlx::query("DELETE FROM sounds WHERE id = ?")
        .bind(id.as_str())
        .execute(conn)
        .await?;

    Ok(())
}

/// Add one to the play count, returns whether a row was touched
pub async fn increase_play_count(pool: &SqlitePool, id: &SoundId) -> Result<bool> {
    let result = sqlx::query("UPDATE sounds SET play_count = play_count + 1 WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Store a measured duration, returns whether a row changed
pub async fn update_duration(pool: &SqlitePool, id: &SoundId, duration: Duration) -> Result<bool> {
    let ms = duration_to_ms(duration);
    let result = sqlx::query(
        "UPDATE sounds SET duration_ms = ? WHERE id = ? AND duration_ms IS NOT ?",
    )
    .bind(ms)
    .bind(id.as_str())
    .bind(ms)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Zero every play count
pub async fn reset_play_counts(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("UPDATE sounds SET play_count = 0 WHERE play_count != 0")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn duration_to_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn from_row(row: &SqliteRow) -> Result<Sound> {
    let created_ms: i64 = row.try_get("created_at")?;
    let duration_ms: Option<i64> = row.try_get("duration_ms")?;

    Ok(Sound {
        id: SoundId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        uri: row.try_get("uri")?,
        duration: duration_ms.map(|ms| Duration::from_millis(ms.max(0) as u64)),
        volume: row.try_get::<f64, _>("volume")? as f32,
        category_id: CategoryId::new(row.try_get::<String, _>("category_id")?),
        checksum: row.try_get("checksum")?,
        created_at: DateTime::from_timestamp_millis(created_ms).ok_or_else(|| {
            StorageError::SerializationError(format!("Invalid timestamp: {created_ms}"))
        })?,
        play_count: row.try_get::<i64, _>("play_count")?.max(0) as u32,
        mime_type: row.try_get("mime_type")?,
    })
}
