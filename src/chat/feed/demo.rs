//! 离线演示留言板
//!
//! 没有 API key 时使用：完全在内存中模拟服务器，启动时随机生成一批留言。
//! 与真实服务器一样按新到旧返回、重复投票返回非零 code。

use crate::chat::error::{ChatError, ChatResult};
use crate::chat::feed::api::FeedClient;
use crate::chat::types::{ApiAck, Coordinate, Direction, FeedPage, Message, MessageId};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// 演示模式下重复投票返回的 code
pub const DUPLICATE_VOTE_CODE: i32 = 1;

const SAMPLE_BODIES: &[&str] = &[
    "Anyone know a good coffee place around here?",
    "Lost a blue umbrella near the library",
    "The sunset tonight is unreal",
    "Free pizza on the 3rd floor!",
    "Is the 6 train running?",
    "Who else is stuck in this line",
];

#[derive(Default)]
struct Board {
    // 新到旧
    messages: Vec<Message>,
    votes: HashSet<(String, MessageId)>,
}

pub struct DemoFeed {
    client_id: String,
    board: Mutex<Board>,
}

impl DemoFeed {
    /// 创建空的演示留言板
    pub fn empty(client_id: String) -> Self {
        Self {
            client_id,
            board: Mutex::new(Board::default()),
        }
    }

    /// 随机生成 `count` 条留言，分布在 `center` 附近
    pub fn seeded(client_id: String, count: usize, center: Option<Coordinate>) -> Self {
        let mut rng = rand::rng();
        let now = Utc::now();
        let messages = (0..count)
            .map(|i| {
                let loc = center.map(|c| {
                    [
                        Some(c.lon + rng.random_range(-0.05..0.05)),
                        Some(c.lat + rng.random_range(-0.05..0.05)),
                    ]
                });
                Message {
                    id: MessageId::new(Uuid::new_v4().simple().to_string()),
                    client: format!("demo{}", rng.random_range(1..100)),
                    date: (now - Duration::minutes(i as i64 * 7)).to_rfc3339(),
                    likes: rng.random_range(0..20),
                    dislikes: rng.random_range(0..5),
                    loc: loc.or(Some([None, None])),
                    message: SAMPLE_BODIES[rng.random_range(0..SAMPLE_BODIES.len())]
                        .to_string(),
                }
            })
            .collect();
        info!("[Demo] 🎲 生成 {} 条演示留言", count);
        Self {
            client_id,
            board: Mutex::new(Board {
                messages,
                votes: HashSet::new(),
            }),
        }
    }
}

#[async_trait]
impl FeedClient for DemoFeed {
    async fn fetch_page(&self, skip: usize, limit: usize) -> ChatResult<FeedPage> {
        let board = self.board.lock().await;
        let messages: Vec<Message> = board
            .messages
            .iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();
        debug!(
            "[Demo] 拉取 skip={}, limit={} -> {} 条",
            skip,
            limit,
            messages.len()
        );
        Ok(FeedPage {
            count: messages.len(),
            date: Utc::now().to_rfc3339(),
            messages,
        })
    }

    async fn submit_message(
        &self,
        body: &str,
        position: Option<Coordinate>,
    ) -> ChatResult<ApiAck> {
        let message = Message {
            id: MessageId::new(Uuid::new_v4().simple().to_string()),
            client: self.client_id.clone(),
            date: Utc::now().to_rfc3339(),
            likes: 0,
            dislikes: 0,
            loc: Some(match position {
                Some(p) => [Some(p.lon), Some(p.lat)],
                None => [None, None],
            }),
            message: body.to_string(),
        };
        info!("[Demo] 📝 新留言 {}", message.id);
        self.board.lock().await.messages.insert(0, message);
        Ok(ApiAck::ok("message posted"))
    }

    async fn submit_rating(
        &self,
        message_id: &MessageId,
        direction: Direction,
    ) -> ChatResult<ApiAck> {
        let mut guard = self.board.lock().await;
        let board = &mut *guard;
        let key = (self.client_id.clone(), message_id.clone());
        if board.votes.contains(&key) {
            return Ok(ApiAck {
                code: DUPLICATE_VOTE_CODE,
                message: "already voted".into(),
            });
        }
        let message = board
            .messages
            .iter_mut()
            .find(|m| &m.id == message_id)
            .ok_or_else(|| ChatError::Application {
                code: 404,
                message: format!("message {} not found", message_id),
            })?;
        match direction {
            Direction::Like => message.likes += 1,
            Direction::Dislike => message.dislikes += 1,
        }
        board.votes.insert(key);
        Ok(ApiAck::ok(format!("{} recorded", direction)))
    }
}
