//! 定位与距离标注

pub mod distance;
pub mod locator;

pub use distance::{format_distance, haversine_miles, DistanceAnnotator};
pub use locator::{FixedPosition, GeoLocator, NoPosition, PositionProvider};
