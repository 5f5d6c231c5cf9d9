//! 留言流渲染回调接口
//!
//! 由调用方实现（终端、GUI 等），FeedView 通过它输出所有可见变化。

use crate::chat::error::ChatError;
use crate::chat::feed::reconcile::PostOutcome;
use crate::chat::types::{Message, MessageId, Rating};
use async_trait::async_trait;
use serde::Serialize;

/// 已展示的一条留言
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedMessage {
    pub message: Message,
    /// 距离文本，未知时为空串
    pub distance: String,
    /// 本设备的投票状态
    pub rating: Rating,
}

#[async_trait]
pub trait FeedListener: Send + Sync {
    /// 列表被清空（refresh 开始）
    async fn on_feed_cleared(&self);

    /// 在列表末尾追加了一条
    async fn on_message_appended(&self, item: DisplayedMessage);

    /// 在列表顶部插入了一条（发帖确认后）
    async fn on_message_prepended(&self, item: DisplayedMessage);

    /// 某条留言的计数或投票状态变化
    async fn on_rating_changed(
        &self,
        message_id: MessageId,
        rating: Rating,
        likes: u64,
        dislikes: u64,
    );

    /// 输入框已清空
    async fn on_input_cleared(&self);

    /// 一次发帖的最终结果
    async fn on_post_finished(&self, outcome: PostOutcome);

    /// 集中上报的错误
    async fn on_error(&self, error: ChatError);
}

/// 默认空实现（无操作）
pub struct EmptyFeedListener;

#[async_trait]
impl FeedListener for EmptyFeedListener {
    async fn on_feed_cleared(&self) {}
    async fn on_message_appended(&self, _item: DisplayedMessage) {}
    async fn on_message_prepended(&self, _item: DisplayedMessage) {}
    async fn on_rating_changed(
        &self,
        _message_id: MessageId,
        _rating: Rating,
        _likes: u64,
        _dislikes: u64,
    ) {
    }
    async fn on_input_cleared(&self) {}
    async fn on_post_finished(&self, _outcome: PostOutcome) {}
    async fn on_error(&self, _error: ChatError) {}
}
