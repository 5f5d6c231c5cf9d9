//! 留言流模块
//!
//! 远端接口、发帖确认循环、视图与渲染回调

pub mod api;
pub mod demo;
pub mod listener;
pub mod reconcile;
pub mod view;

// 重新导出主要类型
pub use api::{FeedApi, FeedClient, DEFAULT_PAGE_LIMIT};
pub use demo::DemoFeed;
pub use listener::{DisplayedMessage, EmptyFeedListener, FeedListener};
pub use reconcile::{PostOutcome, Reconciler, RetryPolicy};
pub use view::FeedView;
