//! Review logging

use rusqlite::types::Type;
use rusqlite::{params, Connection, Result};

use crate::domain::{ReviewLog, ReviewQuality};

use super::{parse_timestamp, to_timestamp};

pub fn insert_review_log(conn: &Connection, log: &ReviewLog) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO review_logs (item_id, quality, reviewed_at, ease_factor, interval_days, review_count)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
        params![
            log.item_id,
            log.quality.value(),
            to_timestamp(&log.reviewed_at),
            log.ease_factor,
            log.interval,
            log.review_count,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Review history for one item, oldest first
pub fn get_review_logs(conn: &Connection, item_id: &str) -> Result<Vec<ReviewLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, item_id, quality, reviewed_at, ease_factor, interval_days, review_count
    FROM review_logs
    WHERE item_id = ?1
    ORDER BY reviewed_at ASC, id ASC
    "#,
    )?;

    let logs = stmt
        .query_map(params![item_id], |row| {
            let quality: u8 = row.get(2)?;
            let reviewed_at: String = row.get(3)?;
            Ok(ReviewLog {
                id: row.get(0)?,
                item_id: row.get(1)?,
                quality: ReviewQuality::from_u8(quality).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        Type::Integer,
                        format!("quality {} out of range", quality).into(),
                    )
                })?,
                reviewed_at: parse_timestamp(3, &reviewed_at)?,
                ease_factor: row.get(4)?,
                interval: row.get(5)?,
                review_count: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(logs)
}

/// (total reviews, successful reviews) across all items
pub fn get_review_totals(conn: &Connection) -> Result<(i64, i64)> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN quality >= ?1 THEN 1 ELSE 0 END), 0) FROM review_logs",
        params![ReviewQuality::PASSING],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}
