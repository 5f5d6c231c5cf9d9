//! 投票记录数据访问层（DAO）
//!
//! 负责 `local_ratings` 表的读写，表结构由 sqlx migration 管理。

use crate::chat::types::{Direction, MessageId, Rating};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

/// 投票 DAO（基于 sqlx）
#[derive(Clone)]
pub struct RatingDao {
    db: Pool<Sqlite>,
}

impl RatingDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 读取本设备对某条留言的投票
    pub async fn get_rating(&self, message_id: &MessageId) -> Result<Rating> {
        let row = sqlx::query(
            r#"
            SELECT direction FROM local_ratings WHERE message_id = ?
            "#,
        )
        .bind(message_id.as_str())
        .fetch_optional(&self.db)
        .await
        .context("查询投票记录失败")?;

        let Some(row) = row else {
            return Ok(Rating::Unset);
        };
        let direction: String = row.get("direction");
        let direction: Direction = direction
            .parse()
            .map_err(|e| anyhow::anyhow!("投票记录已损坏 ({}): {}", message_id, e))?;
        Ok(direction.into())
    }

    /// 原子地写入一条投票
    ///
    /// 已存在记录时不做任何修改并返回 false。
    pub async fn insert_rating_if_absent(
        &self,
        message_id: &MessageId,
        direction: Direction,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO local_ratings (message_id, direction, create_time)
            VALUES (?, ?, ?)
            ON CONFLICT(message_id) DO NOTHING
            "#,
        )
        .bind(message_id.as_str())
        .bind(direction.as_str())
        .bind(Utc::now().timestamp_millis())
        .execute(&self.db)
        .await
        .context("写入投票记录失败")?;

        let inserted = result.rows_affected() == 1;
        debug!(
            "[RatingDAO] 写入投票 {} -> {}，生效: {}",
            message_id, direction, inserted
        );
        Ok(inserted)
    }

    /// 列出本设备的全部投票，按时间先后
    pub async fn get_all_ratings(&self) -> Result<Vec<(MessageId, Rating)>> {
        let rows = sqlx::query(
            r#"
            SELECT message_id, direction FROM local_ratings ORDER BY create_time, message_id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("查询投票列表失败")?;

        rows.into_iter()
            .map(|m| {
                let id: String = m.get("message_id");
                let direction: String = m.get("direction");
                let direction: Direction = direction
                    .parse()
                    .map_err(|e| anyhow::anyhow!("投票记录已损坏 ({}): {}", id, e))?;
                Ok::<_, anyhow::Error>((MessageId::new(id), direction.into()))
            })
            .collect()
    }
}
