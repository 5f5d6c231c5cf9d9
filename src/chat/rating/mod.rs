//! 投票模块：本设备每条留言最多一票

pub mod dao;
pub mod store;

pub use dao::RatingDao;
pub use store::RatingStore;
