//! 发帖确认循环
//!
//! 写接口的应答不携带服务器分配的 ID 和日期，所以发帖后反复拉取最新一条，
//! 直到看到与提交内容完全相同的正文，才把这条记录当作权威结果交给 FeedView。
//! 正文相等是唯一的判定依据。
//!
//! 轮询次数有上限并带指数退避，超限后以 [`PostOutcome::Unknown`] 结束。

use crate::chat::error::ChatError;
use crate::chat::feed::api::FeedClient;
use crate::chat::feed::listener::FeedListener;
use crate::chat::types::{Coordinate, Message};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 确认轮询的重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多拉取几次
    pub max_attempts: u32,
    /// 第一次失败后的等待时间，之后每次翻倍
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// 不等待，只限制次数
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// 第 `attempt` 次（从 1 开始）落空后的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// 一次发帖的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// 已在服务器上看到这条留言
    Confirmed(Message),
    /// 服务器返回非零 code，不会自动重试
    Rejected { code: i32, message: String },
    /// 轮询次数用尽，发帖是否成功未知
    Unknown { attempts: u32 },
}

pub struct Reconciler {
    api: Arc<dyn FeedClient>,
    policy: RetryPolicy,
}

impl Reconciler {
    pub fn new(api: Arc<dyn FeedClient>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    /// 提交留言并等待服务器上出现同样正文的最新一条
    ///
    /// 提交请求与轮询并发进行。提交遇到传输错误时交给 `listener.on_error`，
    /// 但不中止轮询，因为写入可能已经生效；是否成功由轮询预算决定。
    pub async fn submit_and_reconcile(
        &self,
        body: &str,
        position: Option<Coordinate>,
        listener: &dyn FeedListener,
    ) -> PostOutcome {
        let submit = self.api.submit_message(body, position);
        tokio::pin!(submit);
        let mut submitted = false;
        let mut attempts: u32 = 0;

        loop {
            if attempts >= self.policy.max_attempts {
                error!(
                    "[Reconcile] ❌ 拉取 {} 次仍未看到刚发的留言，结果未知",
                    attempts
                );
                return PostOutcome::Unknown { attempts };
            }

            tokio::select! {
                biased;

                ack = &mut submit, if !submitted => {
                    submitted = true;
                    match ack {
                        Ok(ack) if !ack.is_ok() => {
                            warn!(
                                "[Reconcile] 服务器拒绝发帖 code={}, message={}",
                                ack.code, ack.message
                            );
                            return PostOutcome::Rejected {
                                code: ack.code,
                                message: ack.message,
                            };
                        }
                        Err(ChatError::Application { code, message }) => {
                            warn!("[Reconcile] 服务器拒绝发帖 code={}, message={}", code, message);
                            return PostOutcome::Rejected { code, message };
                        }
                        Ok(_) => debug!("[Reconcile] 发帖请求已被接受，继续等待确认"),
                        Err(e) => {
                            warn!("[Reconcile] 发帖请求失败，继续轮询确认: {}", e);
                            listener.on_error(e).await;
                        }
                    }
                }

                newest = self.check_newest(body) => {
                    attempts += 1;
                    if let Some(message) = newest {
                        info!(
                            "[Reconcile] ✅ 第 {} 次拉取确认留言 {}",
                            attempts, message.id
                        );
                        return PostOutcome::Confirmed(message);
                    }
                    let delay = self.policy.delay_for(attempts);
                    debug!("[Reconcile] 第 {} 次拉取未命中，{:?} 后重试", attempts, delay);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// 拉取最新一条并与提交正文比较
    async fn check_newest(&self, body: &str) -> Option<Message> {
        match self.api.fetch_page(0, 1).await {
            Ok(page) => page.messages.into_iter().next().filter(|m| m.message == body),
            Err(e) => {
                warn!("[Reconcile] 拉取最新留言失败: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::feed::listener::EmptyFeedListener;
    use crate::chat::testing::{message, RecordingListener, ScriptedFeed};
    use crate::chat::types::ApiAck;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn confirms_once_body_is_observed() {
        let feed = Arc::new(ScriptedFeed::new());
        feed.push_newest(Ok(message("other", "goodbye")));
        feed.push_newest(Ok(message("mine", "hello")));
        let reconciler = Reconciler::new(feed.clone(), RetryPolicy::immediate(5));

        let outcome = reconciler.submit_and_reconcile("hello", None, &EmptyFeedListener).await;

        assert_eq!(outcome, PostOutcome::Confirmed(message("mine", "hello")));
        assert_eq!(feed.fetch_calls(), vec![(0, 1), (0, 1)]);
        assert_eq!(feed.submitted(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn fetch_errors_count_against_budget() {
        let feed = Arc::new(ScriptedFeed::new());
        feed.push_newest(Err(ChatError::Network("down".into())));
        feed.push_newest(Err(ChatError::Protocol("garbage".into())));
        feed.push_newest(Ok(message("x", "someone else")));
        let reconciler = Reconciler::new(feed.clone(), RetryPolicy::immediate(3));

        let outcome = reconciler.submit_and_reconcile("hello", None, &EmptyFeedListener).await;

        assert_eq!(outcome, PostOutcome::Unknown { attempts: 3 });
        assert_eq!(feed.fetch_calls().len(), 3);
    }

    #[tokio::test]
    async fn rejected_submission_stops_polling() {
        let feed = Arc::new(ScriptedFeed::new());
        feed.set_submit_ack(Ok(ApiAck {
            code: 3,
            message: "empty message".into(),
        }));
        let reconciler = Reconciler::new(feed.clone(), RetryPolicy::immediate(5));

        let outcome = reconciler.submit_and_reconcile("", None, &EmptyFeedListener).await;

        assert_eq!(
            outcome,
            PostOutcome::Rejected {
                code: 3,
                message: "empty message".into()
            }
        );
        assert!(feed.fetch_calls().is_empty());
    }

    #[tokio::test]
    async fn submit_transport_error_keeps_polling() {
        let feed = Arc::new(ScriptedFeed::new());
        feed.set_submit_ack(Err(ChatError::Network("reset".into())));
        feed.push_newest(Ok(message("mine", "landed anyway")));
        let reconciler = Reconciler::new(feed.clone(), RetryPolicy::immediate(5));
        let listener = RecordingListener::default();

        let outcome = reconciler
            .submit_and_reconcile("landed anyway", Some(Coordinate::new(1.0, 2.0)), &listener)
            .await;

        assert_eq!(
            outcome,
            PostOutcome::Confirmed(message("mine", "landed anyway"))
        );
        assert_eq!(feed.submitted_positions(), vec![Some(Coordinate::new(1.0, 2.0))]);
        assert_eq!(listener.errors(), vec![ChatError::Network("reset".into())]);
    }
}
