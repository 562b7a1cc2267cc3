//! 访问规划模块
//!
//! 给定帧布局、帧区间与通道子集，生成精确划分字节流的读/跳/外推事件序列。
//!
//! 不负责：
//! - 实际 IO（由字节源执行器完成）
//! - 字的解码
//! - 逻辑记录重组

pub mod core;
pub mod event;
pub mod range;

pub use self::core::{AccessPlan, AccessPlanner};
pub use event::AccessEvent;
pub use range::FrameRange;
