//! 留言板的线上数据结构与领域类型
//!
//! 字段命名与服务器 JSON 保持一致（`_id`、`loc` 等），Rust 侧统一使用 snake_case。

use crate::chat::error::ChatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 服务器分配的消息 ID
///
/// 只做字符串比较，不做任何数字转换。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 经纬度坐标（角度制）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// 坐标是否为有限数且落在合法范围内
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// 单条留言（对应服务器返回的 messages 数组元素）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,
    /// 发帖客户端标签
    pub client: String,
    /// 服务器给出的展示日期
    pub date: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    /// `[经度, 纬度]`，任一分量为 null 表示未附带位置
    #[serde(default)]
    pub loc: Option<[Option<f64>; 2]>,
    /// 正文，可多行
    pub message: String,
}

impl Message {
    /// 取出留言的有效坐标；缺任一分量或越界时返回 None
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self.loc {
            Some([Some(lon), Some(lat)]) => {
                let c = Coordinate::new(lat, lon);
                c.is_valid().then_some(c)
            }
            _ => None,
        }
    }
}

/// 一页留言
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub count: usize,
    pub date: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl FeedPage {
    /// 校验 `count == messages.len()`
    pub fn validate(self) -> Result<Self, ChatError> {
        if self.count != self.messages.len() {
            return Err(ChatError::Protocol(format!(
                "count 为 {} 但 messages 实际有 {} 条",
                self.count,
                self.messages.len()
            )));
        }
        Ok(self)
    }
}

/// 写接口统一的应答 `{code, message}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAck {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl ApiAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// 非零 code 转成 ApplicationError
    pub fn into_result(self) -> Result<Self, ChatError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ChatError::Application {
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// 投票方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Like,
    Dislike,
}

impl Direction {
    /// 同时用作 URL 路径段和本地存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Like => "like",
            Direction::Dislike => "dislike",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Direction::Like),
            "dislike" => Ok(Direction::Dislike),
            other => Err(ChatError::InvalidDirection(other.to_string())),
        }
    }
}

/// 本设备对某条留言的投票状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[default]
    Unset,
    Liked,
    Disliked,
}

impl From<Direction> for Rating {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Like => Rating::Liked,
            Direction::Dislike => Rating::Disliked,
        }
    }
}
