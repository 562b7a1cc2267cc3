//! 数值编解码接口
//!
//! 帧访问引擎不关心字的二进制表示，只通过 `WordCodec` 获得字长并解码/编码。
//! `RepCodeCodec` 是按 LIS 表示码实现的参考编解码器。

pub mod rep_code;

pub use rep_code::{
    is_interleaved_code, RepCodeCodec, REP_CODE_FIXED_32, REP_CODE_FLOAT_32, REP_CODE_INT_16, REP_CODE_INT_32,
    REP_CODE_INT_8, REP_CODE_INTERLEAVED_I8, REP_CODE_INTERLEAVED_U8, REP_CODE_UINT_8,
};

use crate::error::CodecError;

/// 一次解码的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// 普通表示码：一个字解码为一个值
    Scalar(f64),
    /// 交织表示码：整个通道的字节解码为按流顺序排列的值序列
    Block(Vec<f64>),
}

/// 数值编解码器
pub trait WordCodec {
    /// 单个字的字节长度
    fn word_length(&self, code: u8) -> Result<usize, CodecError>;

    /// 解码字节
    fn decode(&self, code: u8, bytes: &[u8]) -> Result<Decoded, CodecError>;

    /// 编码单个值
    fn encode(&self, code: u8, value: f64) -> Result<Vec<u8>, CodecError>;
}
