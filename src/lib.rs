pub mod chat;

// 重新导出常用类型，方便外部使用
pub use chat::{
    client::{ChitChatClient, ClientConfig},
    feed::{DisplayedMessage, FeedListener, FeedView, PostOutcome, RetryPolicy},
    geo::{FixedPosition, NoPosition, PositionProvider},
    types::{Coordinate, Direction, Message, MessageId, Rating},
    ChatError, ChatResult,
};
