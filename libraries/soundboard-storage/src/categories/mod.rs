//! Category queries

use crate::error::{Result, StorageError};
use soundboard_core::types::{Category, CategoryId, SoundSortingKey};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Get all categories ordered by position
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Category>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, background_color, collapsed, position, sorting_key, sort_ascending
        FROM categories
        ORDER BY position, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Get category by ID
pub async fn get_by_id(pool: &SqlitePool, id: &CategoryId) -> Result<Option<Category>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, background_color, collapsed, position, sorting_key, sort_ascending
        FROM categories
        WHERE id = ?
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Highest position in use, `None` when the table is empty
pub async fn get_highest_position(pool: &SqlitePool) -> Result<Option<i32>> {
    let max: Option<i32> = sqlx::query_scalar("SELECT MAX(position) FROM categories")
        .fetch_one(pool)
        .await?;

    Ok(max)
}

/// Nearest category after `position`
pub async fn get_next(pool: &SqlitePool, position: i32) -> Result<Option<Category>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, background_color, collapsed, position, sorting_key, sort_ascending
        FROM categories
        WHERE position > ?
        ORDER BY position ASC
        LIMIT 1
        "#,
    )
    .bind(position)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Nearest category before `position`
pub async fn get_previous(pool: &SqlitePool, position: i32) -> Result<Option<Category>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, background_color, collapsed, position, sorting_key, sort_ascending
        FROM categories
        WHERE position < ?
        ORDER BY position DESC
        LIMIT 1
        "#,
    )
    .bind(position)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Insert a category, replacing the row with the same id
///
/// Upserts in place. `INSERT OR REPLACE` deletes the old row first and would
/// cascade to the category's sounds.
pub async fn upsert(conn: &mut SqliteConnection, category: &Category) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO categories
            (id, name, background_color, collapsed, position, sorting_key, sort_ascending)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            background_color = excluded.background_color,
            collapsed = excluded.collapsed,
            position = excluded.position,
            sorting_key = excluded.sorting_key,
            sort_ascending = excluded.sort_ascending
        "#,
    )
    .bind(category.id.as_str())
    .bind(&category.name)
    .bind(i64::from(category.background_color))
    .bind(category.collapsed)
    .bind(category.position)
    .bind(category.sorting_key.as_str())
    .bind(category.sort_ascending)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update a category by id (no-op when it does not exist)
pub async fn update(conn: &mut SqliteConnection, category: &Category) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE categories
        SET name = ?, background_color = ?, collapsed = ?, position = ?,
            sorting_key = ?, sort_ascending = ?
        WHERE id = ?
        "#,
    )
    .bind(&category.name)
    .bind(i64::from(category.background_color))
    .bind(category.collapsed)
    .bind(category.position)
    .bind(category.sorting_key.as_str())
    .bind(category.sort_ascending)
    .bind(category.id.as_str())
    .execute(conn)
    .await?;

    Ok(())
}

/// Delete a category; its sounds are removed by the foreign key cascade
pub async fn delete(conn: &mut SqliteConnection, id: &CategoryId) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id.as_str())
        .execute(conn)
        .await?;

    Ok(())
}

/// Collapse or expand a category, returns whether a row was touched
pub async fn set_collapsed(pool: &SqlitePool, id: &CategoryId, collapsed: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE categories SET collapsed = ? WHERE id = ?")
        .bind(collapsed)
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn from_row(row: &SqliteRow) -> Result<Category> {
    let sorting_key: String = row.try_get("sorting_key")?;

    Ok(Category {
        id: CategoryId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        background_color: row.try_get::<i64, _>("background_color")? as u32,
        collapsed: row.try_get("collapsed")?,
        position: row.try_get("position")?,
        sorting_key: SoundSortingKey::from_str(&sorting_key).ok_or_else(|| {
            StorageError::SerializationError(format!("Unknown sorting key: {sorting_key}"))
        })?,
        sort_ascending: row.try_get("sort_ascending")?,
    })
}
