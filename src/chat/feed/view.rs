//! 留言流视图
//!
//! 持有当前已展示的留言列表（只会追加或在顶部插入），把刷新、加载更多、
//! 发帖、投票四种用户操作分派给各组件，并通过 [`FeedListener`] 输出变化。
//!
//! `refresh` 与 `load_more` 由一把异步锁串行化：连续两次“加载更多”时，
//! 第二次请求一定使用第一次追加之后的 skip。

use crate::chat::error::{ChatError, ChatResult};
use crate::chat::feed::api::FeedClient;
use crate::chat::feed::listener::{DisplayedMessage, FeedListener};
use crate::chat::feed::reconcile::{PostOutcome, Reconciler};
use crate::chat::geo::distance::DistanceAnnotator;
use crate::chat::geo::locator::GeoLocator;
use crate::chat::rating::store::RatingStore;
use crate::chat::types::{Direction, FeedPage, Message, MessageId, Rating};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct FeedState {
    items: Vec<DisplayedMessage>,
}

pub struct FeedView {
    api: Arc<dyn FeedClient>,
    ratings: Arc<RatingStore>,
    locator: Arc<GeoLocator>,
    annotator: DistanceAnnotator,
    reconciler: Reconciler,
    listener: Arc<dyn FeedListener>,
    page_size: usize,
    state: Mutex<FeedState>,
    // 串行化 refresh / load_more
    paging: Mutex<()>,
}

impl FeedView {
    pub fn new(
        api: Arc<dyn FeedClient>,
        ratings: Arc<RatingStore>,
        locator: Arc<GeoLocator>,
        reconciler: Reconciler,
        listener: Arc<dyn FeedListener>,
        page_size: usize,
    ) -> Self {
        Self {
            annotator: DistanceAnnotator::new(locator.clone()),
            api,
            ratings,
            locator,
            reconciler,
            listener,
            page_size,
            state: Mutex::new(FeedState::default()),
            paging: Mutex::new(()),
        }
    }

    /// 当前展示的条数
    pub async fn displayed_count(&self) -> usize {
        self.state.lock().await.items.len()
    }

    /// 当前展示的列表快照
    pub async fn displayed(&self) -> Vec<DisplayedMessage> {
        self.state.lock().await.items.clone()
    }

    /// 清空列表后重新加载第一页，返回追加的条数
    pub async fn refresh(&self) -> ChatResult<usize> {
        let _paging = self.paging.lock().await;
        self.state.lock().await.items.clear();
        self.listener.on_feed_cleared().await;
        info!("[FeedView] 🔄 刷新留言流");

        let page = self.fetch(0).await?;
        Ok(self.append_page(page).await)
    }

    /// 以当前展示条数为 skip 加载下一页，返回追加的条数
    pub async fn load_more(&self) -> ChatResult<usize> {
        let _paging = self.paging.lock().await;
        let skip = self.displayed_count().await;
        info!("[FeedView] ⏬ 加载更多 skip={}", skip);

        let page = self.fetch(skip).await?;
        Ok(self.append_page(page).await)
    }

    /// 发帖
    ///
    /// 输入框立即清空；正文不做校验（空串也会提交）。服务器确认后把权威记录
    /// 插入列表顶部，且每次成功发帖只插入一次。
    pub async fn post(&self, body: &str) -> PostOutcome {
        self.listener.on_input_cleared().await;

        let position = match self.locator.get_position().await {
            Ok(pos) => Some(pos),
            Err(e) => {
                warn!("[FeedView] 无法获取位置，留言将不带位置: {}", e);
                None
            }
        };

        let outcome = self
            .reconciler
            .submit_and_reconcile(body, position, self.listener.as_ref())
            .await;
        match &outcome {
            PostOutcome::Confirmed(message) => self.prepend(message.clone()).await,
            PostOutcome::Rejected { code, message } => {
                self.report(ChatError::Application {
                    code: *code,
                    message: message.clone(),
                })
                .await
            }
            PostOutcome::Unknown { attempts } => {
                warn!("[FeedView] 发帖结果未知（已拉取 {} 次）", attempts)
            }
        }
        self.listener.on_post_finished(outcome.clone()).await;
        outcome
    }

    /// 对一条留言投票，`direction` 只接受 "like" / "dislike"
    ///
    /// 非法方向直接报错且不修改任何状态；已投过票时返回 `Ok(false)`。
    pub async fn rate(&self, message_id: &MessageId, direction: &str) -> ChatResult<bool> {
        let direction: Direction = match direction.parse() {
            Ok(d) => d,
            Err(e) => {
                self.report(e.clone()).await;
                return Err(e);
            }
        };

        let applied = match self.ratings.apply_rating(message_id, direction).await {
            Ok(applied) => applied,
            Err(e) => {
                self.report(e.clone()).await;
                return Err(e);
            }
        };
        if !applied {
            return Ok(false);
        }

        let counts = {
            let mut state = self.state.lock().await;
            let mut counts = None;
            for item in state
                .items
                .iter_mut()
                .filter(|item| &item.message.id == message_id)
            {
                match direction {
                    Direction::Like => item.message.likes += 1,
                    Direction::Dislike => item.message.dislikes += 1,
                }
                item.rating = direction.into();
                counts = Some((item.message.likes, item.message.dislikes));
            }
            counts
        };

        match counts {
            Some((likes, dislikes)) => {
                self.listener
                    .on_rating_changed(message_id.clone(), direction.into(), likes, dislikes)
                    .await
            }
            None => debug!("[FeedView] 留言 {} 不在当前列表中，仅记录投票", message_id),
        }
        Ok(true)
    }

    async fn fetch(&self, skip: usize) -> ChatResult<FeedPage> {
        match self.api.fetch_page(skip, self.page_size).await {
            Ok(page) => Ok(page),
            Err(e) => {
                self.report(e.clone()).await;
                Err(e)
            }
        }
    }

    /// 按服务器顺序把整页追加到列表末尾
    async fn append_page(&self, page: FeedPage) -> usize {
        let items = join_all(page.messages.into_iter().map(|m| self.decorate(m))).await;
        let appended = items.len();

        self.state.lock().await.items.extend(items.iter().cloned());
        for item in items {
            self.listener.on_message_appended(item).await;
        }
        info!("[FeedView] ✅ 追加 {} 条留言", appended);
        appended
    }

    async fn prepend(&self, message: Message) {
        let item = self.decorate(message).await;
        {
            let mut state = self.state.lock().await;
            if state.items.iter().any(|i| i.message.id == item.message.id) {
                warn!("[FeedView] 留言 {} 已在列表中，跳过插入", item.message.id);
                return;
            }
            state.items.insert(0, item.clone());
        }
        self.listener.on_message_prepended(item).await;
    }

    /// 补上距离文本与本设备投票状态
    async fn decorate(&self, message: Message) -> DisplayedMessage {
        let distance = self.annotator.annotate(&message).await;
        let rating = self.ratings.get_rating(&message.id).await.unwrap_or_else(|e| {
            warn!("[FeedView] 读取投票状态失败 {}: {}", message.id, e);
            Rating::Unset
        });
        DisplayedMessage {
            message,
            distance,
            rating,
        }
    }

    /// 所有错误在这里统一记录并通知监听器
    async fn report(&self, e: ChatError) {
        error!("[FeedView] ❌ {}", e);
        self.listener.on_error(e).await;
    }
}
