//! 帧布局模块
//!
//! 描述每个通道的二进制形状以及整帧的字节结构：
//! - 通道字长、子通道形状、字节长度
//! - 寻址方式（连续或快/慢交织）
//! - 帧字节大小与各通道的帧内偏移

pub mod channel;
pub mod frame;

pub use channel::{Addressing, ChannelLayout, InterleavedTable, MAX_FAST_SUB_CHANNELS};
pub use frame::FrameLayout;
