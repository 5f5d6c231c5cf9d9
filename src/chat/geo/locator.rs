//! 设备定位
//!
//! 每个会话只向平台请求一次位置，结果（包括失败）缓存到会话结束。

use crate::chat::error::{ChatError, ChatResult};
use crate::chat::types::Coordinate;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// 平台定位能力（浏览器 geolocation 的替身）
///
/// 实现可以无限期挂起（等待用户授权），这里不加超时。
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self) -> ChatResult<Coordinate>;
}

/// 固定坐标，来自命令行或配置
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self) -> ChatResult<Coordinate> {
        if self.0.is_valid() {
            Ok(self.0)
        } else {
            Err(ChatError::PositionUnavailable)
        }
    }
}

/// 没有任何定位来源
pub struct NoPosition;

#[async_trait]
impl PositionProvider for NoPosition {
    async fn current_position(&self) -> ChatResult<Coordinate> {
        Err(ChatError::PositionUnavailable)
    }
}

/// 带会话级缓存的定位器
pub struct GeoLocator {
    provider: Arc<dyn PositionProvider>,
    cached: OnceCell<ChatResult<Coordinate>>,
}

impl GeoLocator {
    pub fn new(provider: Arc<dyn PositionProvider>) -> Self {
        Self {
            provider,
            cached: OnceCell::new(),
        }
    }

    /// 获取当前位置
    ///
    /// 并发的首次调用只会触发一次平台请求。失败同样缓存：
    /// 用户拒绝授权后，本会话内不再重复请求。
    pub async fn get_position(&self) -> ChatResult<Coordinate> {
        self.cached
            .get_or_init(|| async {
                info!("[Geo] 📍 请求设备位置");
                match self.provider.current_position().await {
                    Ok(pos) => {
                        info!("[Geo] ✅ 设备位置: ({}, {})", pos.lat, pos.lon);
                        Ok(pos)
                    }
                    Err(e) => {
                        warn!("[Geo] 定位失败，本会话内距离未知: {}", e);
                        Err(e)
                    }
                }
            })
            .await
            .clone()
    }

    /// 已缓存的位置（不会触发定位）
    pub fn cached_position(&self) -> Option<Coordinate> {
        self.cached.get().and_then(|r| r.as_ref().ok().copied())
    }
}
