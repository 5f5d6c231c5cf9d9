//! 客户端错误分类

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    /// 传输层失败（连接失败、HTTP 非 2xx、读取 body 失败）
    #[error("网络错误: {0}")]
    Network(String),

    /// 响应无法解析成约定的结构
    #[error("协议错误: {0}")]
    Protocol(String),

    /// 服务器返回非零 code，需要展示给用户，不自动重试
    #[error("服务器拒绝 (code={code}): {message}")]
    Application { code: i32, message: String },

    #[error("定位权限被拒绝")]
    PermissionDenied,

    #[error("无法获取当前位置")]
    PositionUnavailable,

    #[error("无效的投票方向: {0:?}")]
    InvalidDirection(String),

    #[error("本地存储错误: {0}")]
    Storage(String),

    #[error("配置错误: {0}")]
    Config(String),
}

pub type ChatResult<T> = Result<T, ChatError>;

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::Network(e.to_string())
    }
}

impl From<anyhow::Error> for ChatError {
    fn from(e: anyhow::Error) -> Self {
        ChatError::Storage(format!("{:#}", e))
    }
}
