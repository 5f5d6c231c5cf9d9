//! 留言距离标注

use crate::chat::geo::locator::GeoLocator;
use crate::chat::types::{Coordinate, Message};
use std::sync::Arc;
use tracing::debug;

/// 地球半径（英里）
pub const EARTH_RADIUS_MILES: f64 = 3958.761;

const FEET_PER_MILE: f64 = 5280.0;

/// 球面大圆距离（英里，haversine）
pub fn haversine_miles(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin() * (dlat / 2.0).sin()
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin() * (dlon / 2.0).sin();
    // 接近对跖点时舍入误差会让 h 略大于 1
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

/// 截断（非四舍五入）到两位小数
fn truncate_2(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

/// 不足 1 英里按英尺显示，否则按英里显示
pub fn format_distance(miles: f64) -> String {
    if miles < 1.0 {
        format!("{} feet away", truncate_2(miles * FEET_PER_MILE))
    } else {
        format!("{} miles away", truncate_2(miles))
    }
}

/// 根据设备位置给留言标注距离
pub struct DistanceAnnotator {
    locator: Arc<GeoLocator>,
}

impl DistanceAnnotator {
    pub fn new(locator: Arc<GeoLocator>) -> Self {
        Self { locator }
    }

    /// 返回展示用的距离文本
    ///
    /// 留言没有位置时直接返回空串，不触发定位；定位失败同样返回空串。
    pub async fn annotate(&self, message: &Message) -> String {
        let Some(target) = message.coordinate() else {
            return String::new();
        };
        match self.locator.get_position().await {
            Ok(here) => {
                let text = format_distance(haversine_miles(&here, &target));
                debug!("[Geo] 留言 {} 距离: {}", message.id, text);
                text
            }
            Err(e) => {
                debug!("[Geo] 距离未知（留言 {}）: {}", message.id, e);
                String::new()
            }
        }
    }
}
