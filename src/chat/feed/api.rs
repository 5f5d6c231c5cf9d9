//! 留言板 HTTP API 客户端
//!
//! 只定义远端接口的类型化形状：拉取分页、发帖、投票。
//! 调用方可以直接丢弃返回的 future 来放弃请求，这里不内置超时。

use crate::chat::error::{ChatError, ChatResult};
use crate::chat::types::{ApiAck, Coordinate, Direction, FeedPage, MessageId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 每页默认条数
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// 留言板远端接口
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// 跳过 `skip` 条后拉取至多 `limit` 条，按新到旧排列
    async fn fetch_page(&self, skip: usize, limit: usize) -> ChatResult<FeedPage>;

    /// 发帖；返回的内容不作为消息记录的依据
    ///
    /// `position` 为 None 时不带 lat/lon 参数，服务器记为无位置。
    async fn submit_message(&self, body: &str, position: Option<Coordinate>)
        -> ChatResult<ApiAck>;

    /// 对某条留言投票；客户端去重由 RatingStore 负责
    async fn submit_rating(&self, message_id: &MessageId, direction: Direction)
        -> ChatResult<ApiAck>;
}

/// 基于 reqwest 的 FeedClient 实现
pub struct FeedApi {
    client: reqwest::Client,
    api_base_url: String,
    api_key: String,
    client_id: String,
}

impl FeedApi {
    pub fn new(
        client: reqwest::Client,
        api_base_url: String,
        api_key: String,
        client_id: String,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key,
            client_id,
        }
    }

    /// 投票接口地址：`<base>/like/<id>` 或 `<base>/dislike/<id>`
    fn rating_url(&self, message_id: &MessageId, direction: Direction) -> String {
        format!(
            "{}/{}/{}",
            self.api_base_url,
            direction.as_str(),
            message_id.as_str()
        )
    }

    /// 每个请求都带的鉴权参数
    fn auth_query(&self) -> [(&'static str, String); 2] {
        [
            ("key", self.api_key.clone()),
            ("client", self.client_id.clone()),
        ]
    }

    async fn send<T: DeserializeOwned>(
        &self,
        what: &str,
        request: reqwest::RequestBuilder,
    ) -> ChatResult<T> {
        let operation_id = Uuid::new_v4().to_string();
        debug!("[FeedAPI] 📡 {} 操作ID: {}", what, operation_id);

        let response = request.send().await.map_err(|e| {
            error!("[FeedAPI] {} 请求失败: {}", what, e);
            ChatError::from(e)
        })?;

        let status = response.status();
        let body_bytes = response.bytes().await.map_err(|e| {
            error!("[FeedAPI] {} 读取响应 body 失败: {}", what, e);
            ChatError::from(e)
        })?;
        let body_str = String::from_utf8_lossy(&body_bytes);
        debug!("[FeedAPI] {} 响应 Body: {}", what, body_str);

        if !status.is_success() {
            error!(
                "[FeedAPI] {} 请求失败，HTTP状态: {}, 响应: {}",
                what, status, body_str
            );
            return Err(ChatError::Network(format!(
                "HTTP 错误 {}: {}",
                status, body_str
            )));
        }

        decode_body(what, &body_bytes)
    }
}

/// 把响应 body 解析为目标结构，失败归为协议错误
pub(crate) fn decode_body<T: DeserializeOwned>(what: &str, body: &[u8]) -> ChatResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        error!(
            "[FeedAPI] {} 反序列化失败: {:?}\n原始响应: {}",
            what,
            e,
            String::from_utf8_lossy(body)
        );
        ChatError::Protocol(format!("反序列化响应失败: {}", e))
    })
}

#[async_trait]
impl FeedClient for FeedApi {
    async fn fetch_page(&self, skip: usize, limit: usize) -> ChatResult<FeedPage> {
        info!("[FeedAPI] 📡 拉取留言 skip={}, limit={}", skip, limit);
        let request = self
            .client
            .get(&self.api_base_url)
            .query(&self.auth_query())
            .query(&[("skip", skip), ("limit", limit)]);

        let page: FeedPage = self.send("拉取留言", request).await?;
        let page = page.validate()?;
        info!("[FeedAPI] ✅ 拉取到 {} 条留言", page.count);
        Ok(page)
    }

    async fn submit_message(
        &self,
        body: &str,
        position: Option<Coordinate>,
    ) -> ChatResult<ApiAck> {
        info!("[FeedAPI] 📤 发帖，长度: {}", body.chars().count());
        let mut request = self
            .client
            .post(&self.api_base_url)
            .query(&self.auth_query());
        if let Some(pos) = position {
            request = request.query(&[("lat", pos.lat), ("lon", pos.lon)]);
        }
        let request = request.query(&[("message", body)]);

        let ack: ApiAck = self.send("发帖", request).await?;
        info!("[FeedAPI] 发帖应答 code={}, message={}", ack.code, ack.message);
        Ok(ack)
    }

    async fn submit_rating(
        &self,
        message_id: &MessageId,
        direction: Direction,
    ) -> ChatResult<ApiAck> {
        info!("[FeedAPI] 👍 提交投票 {} -> {}", message_id, direction);
        let request = self
            .client
            .get(self.rating_url(message_id, direction))
            .query(&self.auth_query());

        let ack: ApiAck = self.send("投票", request).await?;
        debug!("[FeedAPI] 投票应答 code={}, message={}", ack.code, ack.message);
        Ok(ack)
    }
}
