//! 错误定义
//!
//! 分两层：
//! - `LayoutError`：布局/规划契约错误，调用方传入了非法参数，必须立即暴露
//! - `StoreError`：数据错误，由具体的访问或统计调用抛出，不破坏已解码数据
//!
//! 编解码错误 `CodecError` 原样穿透两层。

use thiserror::Error;

use crate::config::SubChannelShape;

/// 数值编解码错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// 未知的表示码
    #[error("Unknown representation code: {0}")]
    UnknownRepCode(u8),

    /// 字节长度与字长不符
    #[error("Representation code {code}: expected {expected} bytes, got {actual}")]
    WordLength {
        code: u8,
        expected: usize,
        actual: usize,
    },

    /// 数值无法用该表示码编码
    #[error("Representation code {code} cannot encode value {value}")]
    Unrepresentable { code: u8, value: f64 },

    /// 字节内容无法解析
    #[error("Malformed word for representation code {code}: {reason}")]
    Malformed { code: u8, reason: String },
}

/// 布局与访问规划的契约错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// 负索引
    #[error("Negative index: {what} = {value}")]
    NegativeIndex { what: &'static str, value: i64 },

    /// 负长度或非法区间
    #[error("Negative length: {what} = {value}")]
    NegativeLength { what: &'static str, value: i64 },

    /// 索引越界
    #[error("Index out of range: {what} = {index}, limit {limit}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        limit: usize,
    },

    /// 字节长度不是帧步长的整数倍
    #[error("Byte length {byte_len} is not a whole number of {stride}-byte frames")]
    MisalignedLength { byte_len: usize, stride: usize },

    /// 通道定义不合法
    #[error("Malformed channel {channel}: {reason}")]
    MalformedChannel { channel: usize, reason: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// 帧存储的数据错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// 没有帧或没有通道
    #[error("Frame store is empty: {frames} frames, {channels} channels")]
    Empty { frames: usize, channels: usize },

    /// 无法推算采样索引
    #[error("Indeterminate frame spacing: {0}")]
    IndeterminateSpacing(String),

    /// 批量生成的子通道形状（采样数 × burst 数）不一致
    #[error("Mixed sub-channel shapes: {first} vs {other}")]
    MixedShapes {
        first: SubChannelShape,
        other: SubChannelShape,
    },

    /// 写入的字节数或解码出的值数与预期不符
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// 直接记录模式下没有显式索引向量
    #[error("Frame store has no explicit index vector (direct recording mode)")]
    NoExplicitIndex,

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
