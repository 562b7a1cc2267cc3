//! 帧存储模块
//!
//! 预分配的二维值数组（帧 × 值位置）以及可选的显式索引向量：
//! - 按规划事件顺序写入解码值
//! - 偏移树/切片树寻址
//! - 索引轴重建、值与点生成器
//! - 单遍统计

pub mod core;
pub mod generators;
pub mod index_axis;
pub mod offsets;
pub mod stats;

pub use self::core::FrameStore;
pub use generators::BatchPoint;
pub use offsets::{SubChannelSpan, SubChannelView};
