//! 投票服务层
//!
//! 每台设备对每条留言最多投一次票，记录永久保存。服务器提交是尽力而为：
//! 在后台任务里发送，失败只记日志，不重试，也不回滚本地状态。

use crate::chat::error::ChatResult;
use crate::chat::feed::api::FeedClient;
use crate::chat::rating::dao::RatingDao;
use crate::chat::types::{Direction, MessageId, Rating};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct RatingStore {
    dao: RatingDao,
    api: Arc<dyn FeedClient>,
}

impl RatingStore {
    pub fn new(dao: RatingDao, api: Arc<dyn FeedClient>) -> Self {
        Self { dao, api }
    }

    /// 读取本设备的投票状态
    pub async fn get_rating(&self, message_id: &MessageId) -> ChatResult<Rating> {
        Ok(self.dao.get_rating(message_id).await?)
    }

    /// 投票
    ///
    /// 已投过票时返回 `Ok(false)` 且不做任何修改。返回 `Ok(true)` 表示本地记录已写入，
    /// 调用方据此把对应计数加一。本方法不等待服务器：提交交给后台任务，
    /// 服务器卡住或调用方放弃 future 都不会让本地记录与计数脱节。
    pub async fn apply_rating(
        &self,
        message_id: &MessageId,
        direction: Direction,
    ) -> ChatResult<bool> {
        if !self.dao.insert_rating_if_absent(message_id, direction).await? {
            info!("[Rating] 留言 {} 已投过票，忽略 {}", message_id, direction);
            return Ok(false);
        }
        info!("[Rating] ✅ 本地记录投票 {} -> {}", message_id, direction);

        self.submit_in_background(message_id.clone(), direction);
        Ok(true)
    }

    fn submit_in_background(&self, message_id: MessageId, direction: Direction) {
        let api = self.api.clone();
        tokio::spawn(async move {
            match api.submit_rating(&message_id, direction).await {
                Ok(ack) if ack.is_ok() => {
                    info!("[Rating] 服务器已接受投票 {} -> {}", message_id, direction)
                }
                Ok(ack) => warn!(
                    "[Rating] 服务器未接受投票 {} code={}, message={}",
                    message_id, ack.code, ack.message
                ),
                Err(e) => error!("[Rating] 投票提交失败 {}: {}", message_id, e),
            }
        });
    }

    /// 本设备的全部投票
    pub async fn all_ratings(&self) -> ChatResult<Vec<(MessageId, Rating)>> {
        Ok(self.dao.get_all_ratings().await?)
    }
}
