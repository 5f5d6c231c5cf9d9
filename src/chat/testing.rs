//! 单测用的替身实现

use crate::chat::error::{ChatError, ChatResult};
use crate::chat::feed::api::FeedClient;
use crate::chat::feed::listener::{DisplayedMessage, FeedListener};
use crate::chat::feed::reconcile::PostOutcome;
use crate::chat::geo::locator::PositionProvider;
use crate::chat::types::{ApiAck, Coordinate, Direction, FeedPage, Message, MessageId, Rating};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use std::sync::Mutex;

pub fn message(id: &str, body: &str) -> Message {
    Message {
        id: MessageId::new(id),
        client: "tester".into(),
        date: "2026-10-19T00:00:00.000Z".into(),
        likes: 0,
        dislikes: 0,
        loc: None,
        message: body.into(),
    }
}

pub fn page(ids: &[&str]) -> FeedPage {
    FeedPage {
        count: ids.len(),
        date: "2026-10-19T00:00:00.000Z".into(),
        messages: ids.iter().map(|id| message(id, &format!("body {}", id))).collect(),
    }
}

/// 按脚本应答的 FeedClient
///
/// `limit == 1` 的请求从 newest 队列取，其余从 pages 队列取；队列空时返回空页。
pub struct ScriptedFeed {
    pages: Mutex<VecDeque<ChatResult<FeedPage>>>,
    newest: Mutex<VecDeque<ChatResult<Message>>>,
    submit_ack: Mutex<ChatResult<ApiAck>>,
    rating_ack: Mutex<ChatResult<ApiAck>>,
    fetch_calls: Mutex<Vec<(usize, usize)>>,
    submitted: Mutex<Vec<(String, Option<Coordinate>)>>,
    ratings: Mutex<Vec<(MessageId, Direction)>>,
    stall_ratings: AtomicBool,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(VecDeque::new()),
            newest: Mutex::new(VecDeque::new()),
            submit_ack: Mutex::new(Ok(ApiAck::ok("ok"))),
            rating_ack: Mutex::new(Ok(ApiAck::ok("ok"))),
            fetch_calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            ratings: Mutex::new(Vec::new()),
            stall_ratings: AtomicBool::new(false),
        }
    }

    pub fn push_page(&self, page: ChatResult<FeedPage>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn push_newest(&self, message: ChatResult<Message>) {
        self.newest.lock().unwrap().push_back(message);
    }

    pub fn set_submit_ack(&self, ack: ChatResult<ApiAck>) {
        *self.submit_ack.lock().unwrap() = ack;
    }

    pub fn set_rating_ack(&self, ack: ChatResult<ApiAck>) {
        *self.rating_ack.lock().unwrap() = ack;
    }

    pub fn fetch_calls(&self) -> Vec<(usize, usize)> {
        self.fetch_calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|(body, _)| body.clone())
            .collect()
    }

    pub fn submitted_positions(&self) -> Vec<Option<Coordinate>> {
        self.submitted.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }

    pub fn ratings(&self) -> Vec<(MessageId, Direction)> {
        self.ratings.lock().unwrap().clone()
    }

    /// 之后的投票请求会被记录，但永远不返回
    pub fn stall_ratings(&self) {
        self.stall_ratings.store(true, Ordering::SeqCst);
    }

    /// 投票在后台任务里提交，等它们到达
    pub async fn wait_for_ratings(&self, n: usize) -> Vec<(MessageId, Direction)> {
        tokio::time::timeout(Duration::from_secs(1), async {
            while self.ratings.lock().unwrap().len() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("rating submissions never arrived");
        self.ratings()
    }
}

fn empty_page() -> FeedPage {
    FeedPage {
        count: 0,
        date: String::new(),
        messages: Vec::new(),
    }
}

#[async_trait]
impl FeedClient for ScriptedFeed {
    async fn fetch_page(&self, skip: usize, limit: usize) -> ChatResult<FeedPage> {
        self.fetch_calls.lock().unwrap().push((skip, limit));
        if limit == 1 {
            return match self.newest.lock().unwrap().pop_front() {
                Some(Ok(m)) => Ok(FeedPage {
                    count: 1,
                    date: String::new(),
                    messages: vec![m],
                }),
                Some(Err(e)) => Err(e),
                None => Ok(empty_page()),
            };
        }
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(empty_page()))
    }

    async fn submit_message(
        &self,
        body: &str,
        position: Option<Coordinate>,
    ) -> ChatResult<ApiAck> {
        self.submitted
            .lock()
            .unwrap()
            .push((body.to_string(), position));
        self.submit_ack.lock().unwrap().clone()
    }

    async fn submit_rating(
        &self,
        message_id: &MessageId,
        direction: Direction,
    ) -> ChatResult<ApiAck> {
        self.ratings
            .lock()
            .unwrap()
            .push((message_id.clone(), direction));
        if self.stall_ratings.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.rating_ack.lock().unwrap().clone()
    }
}

/// 记录调用次数的定位源
pub struct CountingPosition {
    result: ChatResult<Coordinate>,
    calls: AtomicUsize,
}

impl CountingPosition {
    pub fn new(result: ChatResult<Coordinate>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionProvider for CountingPosition {
    async fn current_position(&self) -> ChatResult<Coordinate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // 让并发的调用方有机会同时进入
        tokio::task::yield_now().await;
        self.result.clone()
    }
}

/// 记录所有回调的监听器
#[derive(Default)]
pub struct RecordingListener {
    cleared: AtomicUsize,
    inputs_cleared: AtomicUsize,
    appended: Mutex<Vec<DisplayedMessage>>,
    prepended: Mutex<Vec<DisplayedMessage>>,
    rating_changes: Mutex<Vec<(MessageId, Rating, u64, u64)>>,
    outcomes: Mutex<Vec<PostOutcome>>,
    errors: Mutex<Vec<ChatError>>,
}

impl RecordingListener {
    pub fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }

    pub fn inputs_cleared(&self) -> usize {
        self.inputs_cleared.load(Ordering::SeqCst)
    }

    pub fn appended(&self) -> Vec<DisplayedMessage> {
        self.appended.lock().unwrap().clone()
    }

    pub fn prepended(&self) -> Vec<DisplayedMessage> {
        self.prepended.lock().unwrap().clone()
    }

    pub fn rating_changes(&self) -> Vec<(MessageId, Rating, u64, u64)> {
        self.rating_changes.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<PostOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ChatError> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedListener for RecordingListener {
    async fn on_feed_cleared(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_message_appended(&self, item: DisplayedMessage) {
        self.appended.lock().unwrap().push(item);
    }

    async fn on_message_prepended(&self, item: DisplayedMessage) {
        self.prepended.lock().unwrap().push(item);
    }

    async fn on_rating_changed(
        &self,
        message_id: MessageId,
        rating: Rating,
        likes: u64,
        dislikes: u64,
    ) {
        self.rating_changes
            .lock()
            .unwrap()
            .push((message_id, rating, likes, dislikes));
    }

    async fn on_input_cleared(&self) {
        self.inputs_cleared.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_post_finished(&self, outcome: PostOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }

    async fn on_error(&self, error: ChatError) {
        self.errors.lock().unwrap().push(error);
    }
}
