//! Well-Log Core Library
//!
//! This crate provides the shared configuration model, error types and
//! numeric codec contract for the well-log frame access engine.

pub mod codec;
pub mod config;
pub mod error;
pub mod utils;

// 导出错误类型
pub use error::{CodecError, LayoutError, StoreError};

// 导出格式配置与编解码接口，便于其他模块使用
pub use codec::{Decoded, RepCodeCodec, WordCodec};
pub use config::*;
