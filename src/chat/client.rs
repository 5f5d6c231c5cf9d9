//! Chit Chat 客户端入口
//!
//! 按配置组装各组件：远端 API（或离线演示板）、本地投票库、定位器、发帖确认循环和留言流视图。

use crate::chat::db::create_sqlite_pool_with_migration;
use crate::chat::error::{ChatError, ChatResult};
use crate::chat::feed::api::{FeedApi, FeedClient, DEFAULT_PAGE_LIMIT};
use crate::chat::feed::demo::DemoFeed;
use crate::chat::feed::listener::FeedListener;
use crate::chat::feed::reconcile::{Reconciler, RetryPolicy};
use crate::chat::feed::view::FeedView;
use crate::chat::geo::locator::{GeoLocator, PositionProvider};
use crate::chat::rating::dao::RatingDao;
use crate::chat::rating::store::RatingStore;
use std::sync::Arc;
use tracing::info;

/// 演示模式生成的留言条数
const DEMO_SEED_COUNT: usize = 45;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API 基础地址
    pub api_base_url: String,
    /// API key
    pub api_key: String,
    /// 客户端标签，随每个请求发送并显示为留言作者
    pub client_id: String,
    /// 本地投票记录使用的 SQLite 数据库 URL
    ///
    /// 例如：`sqlite://chitchat.db?mode=rwc`
    pub rating_db_url: String,
    /// 每页条数
    pub page_size: usize,
    /// 发帖确认的重试策略
    pub retry: RetryPolicy,
    /// 使用离线演示板，不访问网络
    pub demo: bool,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(api_key: String, client_id: String) -> Self {
        Self {
            api_base_url: "https://www.stepoutnyc.com/chitchat".to_string(),
            api_key,
            client_id,
            rating_db_url: "sqlite://chitchat.db?mode=rwc".to_string(),
            page_size: DEFAULT_PAGE_LIMIT,
            retry: RetryPolicy::default(),
            demo: false,
        }
    }

    fn validate(&self) -> ChatResult<()> {
        if self.page_size == 0 {
            return Err(ChatError::Config("page_size 必须大于 0".into()));
        }
        if self.client_id.is_empty() {
            return Err(ChatError::Config("client_id 不能为空".into()));
        }
        if !self.demo && self.api_key.is_empty() {
            return Err(ChatError::Config(
                "缺少 api_key（或改用演示模式）".into(),
            ));
        }
        Ok(())
    }
}

/// Chit Chat 客户端
pub struct ChitChatClient {
    config: ClientConfig,
    locator: Arc<GeoLocator>,
    ratings: Arc<RatingStore>,
    view: FeedView,
}

impl ChitChatClient {
    /// 按配置创建客户端并打开本地投票库
    pub async fn connect(
        config: ClientConfig,
        position: Arc<dyn PositionProvider>,
        listener: Arc<dyn FeedListener>,
    ) -> ChatResult<Self> {
        config.validate()?;
        let locator = Arc::new(GeoLocator::new(position));

        let api: Arc<dyn FeedClient> = if config.demo {
            info!("[Client] 🎲 演示模式，不访问网络");
            let center = locator.get_position().await.ok();
            Arc::new(DemoFeed::seeded(
                config.client_id.clone(),
                DEMO_SEED_COUNT,
                center,
            ))
        } else {
            info!("[Client] 🔗 使用远端留言板: {}", config.api_base_url);
            let http_client = reqwest::ClientBuilder::new()
                .user_agent(concat!("chitchat-sdk-rust/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| ChatError::Config(format!("创建 HTTP 客户端失败: {}", e)))?;
            Arc::new(FeedApi::new(
                http_client,
                config.api_base_url.clone(),
                config.api_key.clone(),
                config.client_id.clone(),
            ))
        };

        let pool = create_sqlite_pool_with_migration(&config.rating_db_url).await?;
        let ratings = Arc::new(RatingStore::new(RatingDao::new(pool), api.clone()));
        let view = FeedView::new(
            api.clone(),
            ratings.clone(),
            locator.clone(),
            Reconciler::new(api, config.retry),
            listener,
            config.page_size,
        );

        info!(
            "[Client] ✅ 客户端就绪 (client={}, page_size={})",
            config.client_id, config.page_size
        );
        Ok(Self {
            config,
            locator,
            ratings,
            view,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 留言流视图，所有用户操作从这里进入
    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub fn ratings(&self) -> &RatingStore {
        &self.ratings
    }

    pub fn locator(&self) -> &GeoLocator {
        &self.locator
    }
}
