//! Review item CRUD and due queries

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::{ItemRecord, ReviewItem};

use super::{parse_timestamp, to_timestamp};

const ITEM_COLUMNS: &str =
    "id, ease_factor, interval_days, review_count, last_review, next_review, created_at";

pub fn insert_item(conn: &Connection, record: &ItemRecord) -> Result<()> {
    tracing::debug!("Inserting review item {}", record.id);
    conn.execute(
        r#"
    INSERT INTO review_items (id, ease_factor, interval_days, review_count, last_review, next_review, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
        params![
            record.id,
            record.item.ease_factor,
            record.item.interval,
            record.item.review_count,
            record.item.last_review.as_ref().map(to_timestamp),
            to_timestamp(&record.next_review),
            to_timestamp(&record.created_at),
        ],
    )?;
    Ok(())
}

/// Overwrite the scheduling state of an existing item. Returns the number of rows touched.
pub fn update_item(conn: &Connection, record: &ItemRecord) -> Result<usize> {
    tracing::debug!("Updating review item {}", record.id);
    conn.execute(
        r#"
    UPDATE review_items
    SET ease_factor = ?2, interval_days = ?3, review_count = ?4, last_review = ?5, next_review = ?6
    WHERE id = ?1
    "#,
        params![
            record.id,
            record.item.ease_factor,
            record.item.interval,
            record.item.review_count,
            record.item.last_review.as_ref().map(to_timestamp),
            to_timestamp(&record.next_review),
        ],
    )
}

pub fn get_item_by_id(conn: &Connection, id: &str) -> Result<Option<ItemRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM review_items WHERE id = ?1",
        ITEM_COLUMNS
    ))?;

    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_item(row)?))
    } else {
        Ok(None)
    }
}

/// Delete an item and its review history. Returns false if the item did not exist.
pub fn delete_item(conn: &Connection, id: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM review_logs WHERE item_id = ?1", params![id])?;
    let deleted = tx.execute("DELETE FROM review_items WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

/// Items whose next review is at or before `now`, most overdue first
pub fn get_due_items(conn: &Connection, now: &DateTime<Utc>, limit: usize) -> Result<Vec<ItemRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
    SELECT {}
    FROM review_items
    WHERE next_review <= ?1
    ORDER BY next_review ASC, id ASC
    LIMIT ?2
    "#,
        ITEM_COLUMNS
    ))?;

    let items = stmt
        .query_map(params![to_timestamp(now), limit as i64], |row| row_to_item(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_all_items(conn: &Connection) -> Result<Vec<ItemRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM review_items ORDER BY id ASC",
        ITEM_COLUMNS
    ))?;

    let items = stmt
        .query_map([], |row| row_to_item(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub(crate) fn row_to_item(row: &rusqlite::Row) -> Result<ItemRecord> {
    let last_review: Option<String> = row.get(4)?;
    let next_review: String = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(ItemRecord {
        id: row.get(0)?,
        item: ReviewItem {
            ease_factor: row.get(1)?,
            interval: row.get(2)?,
            review_count: row.get(3)?,
            last_review: last_review
                .map(|s| parse_timestamp(4, &s))
                .transpose()?,
        },
        next_review: parse_timestamp(5, &next_review)?,
        created_at: parse_timestamp(6, &created_at)?,
    })
}
