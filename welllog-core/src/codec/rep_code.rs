//! LIS 表示码参考编解码器
//!
//! 所有字均为大端序。

use nom::number::complete::{be_i16, be_i32, be_i8, be_u32, be_u8};
use nom::IResult;

use super::{Decoded, WordCodec};
use crate::error::CodecError;
use crate::utils::{bytes_to_hex, frexp};

/// 8 位有符号整数
pub const REP_CODE_INT_8: u8 = 56;
/// 8 位无符号整数
pub const REP_CODE_UINT_8: u8 = 66;
/// 32 位 LIS 浮点数
pub const REP_CODE_FLOAT_32: u8 = 68;
/// 32 位定点数（i32 / 2^16）
pub const REP_CODE_FIXED_32: u8 = 70;
/// 32 位有符号整数
pub const REP_CODE_INT_32: u8 = 73;
/// 16 位有符号整数
pub const REP_CODE_INT_16: u8 = 79;
/// 快/慢交织块，有符号字节
pub const REP_CODE_INTERLEAVED_I8: u8 = 233;
/// 快/慢交织块，无符号字节
pub const REP_CODE_INTERLEAVED_U8: u8 = 234;

/// 使用快/慢交织布局的表示码
pub fn is_interleaved_code(code: u8) -> bool {
    matches!(code, REP_CODE_INTERLEAVED_I8 | REP_CODE_INTERLEAVED_U8)
}

type WordResult<'a, T> = IResult<&'a [u8], T, nom::error::Error<&'a [u8]>>;

/// LIS 表示码编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct RepCodeCodec;

impl RepCodeCodec {
    pub fn new() -> Self {
        Self
    }

    fn check_length(&self, code: u8, bytes: &[u8]) -> Result<(), CodecError> {
        let expected = self.word_length(code)?;
        if bytes.len() != expected {
            return Err(CodecError::WordLength {
                code,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(())
    }
}

/// 取出解析结果，要求字节被完整消费
fn finish<T>(code: u8, bytes: &[u8], parsed: WordResult<'_, T>) -> Result<T, CodecError> {
    match parsed {
        Ok((rest, value)) if rest.is_empty() => Ok(value),
        _ => Err(CodecError::Malformed {
            code,
            reason: format!("cannot parse [{}]", bytes_to_hex(bytes)),
        }),
    }
}

/// 32 位 LIS 浮点：8 位超 128 指数，23 位补码小数
fn decode_lis_float(word: u32) -> f64 {
    let raw_exp = (word >> 23) & 0xFF;
    let fraction = f64::from(word & 0x007F_FFFF) / f64::from(1u32 << 23);
    if word & 0x8000_0000 == 0 {
        fraction * 2f64.powi(raw_exp as i32 - 128)
    } else {
        // 负数的指数按位取反，尾数连同符号位构成补码
        let exp = !raw_exp & 0xFF;
        (fraction - 1.0) * 2f64.powi(exp as i32 - 128)
    }
}

fn encode_lis_float(value: f64) -> Result<u32, CodecError> {
    let unrepresentable = CodecError::Unrepresentable {
        code: REP_CODE_FLOAT_32,
        value,
    };
    if !value.is_finite() {
        return Err(unrepresentable);
    }
    if value == 0.0 {
        return Ok(0);
    }
    let (m, mut e) = frexp(value.abs());
    let mut bits = if value > 0.0 {
        (m * f64::from(1u32 << 23)).round() as u32
    } else {
        ((1.0 - m) * f64::from(1u32 << 23)).round() as u32
    };
    if value > 0.0 && bits == 1 << 23 {
        bits >>= 1;
        e += 1;
    }
    let biased = e + 128;
    if !(0..=255).contains(&biased) {
        return Err(unrepresentable);
    }
    let biased = biased as u32;
    if value > 0.0 {
        Ok((biased << 23) | bits)
    } else {
        Ok(0x8000_0000 | ((!biased & 0xFF) << 23) | (bits & 0x007F_FFFF))
    }
}

fn integral(code: u8, value: f64, min: f64, max: f64) -> Result<i64, CodecError> {
    let rounded = value.round();
    if !value.is_finite() || rounded < min || rounded > max {
        return Err(CodecError::Unrepresentable { code, value });
    }
    Ok(rounded as i64)
}

impl WordCodec for RepCodeCodec {
    fn word_length(&self, code: u8) -> Result<usize, CodecError> {
        match code {
            REP_CODE_INT_8 | REP_CODE_UINT_8 => Ok(1),
            REP_CODE_INT_16 => Ok(2),
            REP_CODE_FLOAT_32 | REP_CODE_FIXED_32 | REP_CODE_INT_32 => Ok(4),
            REP_CODE_INTERLEAVED_I8 | REP_CODE_INTERLEAVED_U8 => Ok(1),
            _ => Err(CodecError::UnknownRepCode(code)),
        }
    }

    fn decode(&self, code: u8, bytes: &[u8]) -> Result<Decoded, CodecError> {
        match code {
            REP_CODE_INTERLEAVED_U8 => {
                return Ok(Decoded::Block(bytes.iter().map(|&b| f64::from(b)).collect()))
            }
            REP_CODE_INTERLEAVED_I8 => {
                return Ok(Decoded::Block(
                    bytes.iter().map(|&b| f64::from(b as i8)).collect(),
                ))
            }
            _ => {}
        }

        self.check_length(code, bytes)?;
        let value = match code {
            REP_CODE_INT_8 => f64::from(finish(code, bytes, be_i8(bytes))?),
            REP_CODE_UINT_8 => f64::from(finish(code, bytes, be_u8(bytes))?),
            REP_CODE_INT_16 => f64::from(finish(code, bytes, be_i16(bytes))?),
            REP_CODE_INT_32 => f64::from(finish(code, bytes, be_i32(bytes))?),
            REP_CODE_FIXED_32 => f64::from(finish(code, bytes, be_i32(bytes))?) / 65536.0,
            REP_CODE_FLOAT_32 => decode_lis_float(finish(code, bytes, be_u32(bytes))?),
            _ => return Err(CodecError::UnknownRepCode(code)),
        };
        Ok(Decoded::Scalar(value))
    }

    fn encode(&self, code: u8, value: f64) -> Result<Vec<u8>, CodecError> {
        let bytes = match code {
            REP_CODE_INT_8 | REP_CODE_INTERLEAVED_I8 => {
                vec![integral(code, value, f64::from(i8::MIN), f64::from(i8::MAX))? as i8 as u8]
            }
            REP_CODE_UINT_8 | REP_CODE_INTERLEAVED_U8 => {
                vec![integral(code, value, 0.0, f64::from(u8::MAX))? as u8]
            }
            REP_CODE_INT_16 => {
                let v = integral(code, value, f64::from(i16::MIN), f64::from(i16::MAX))?;
                (v as i16).to_be_bytes().to_vec()
            }
            REP_CODE_INT_32 => {
                let v = integral(code, value, f64::from(i32::MIN), f64::from(i32::MAX))?;
                (v as i32).to_be_bytes().to_vec()
            }
            REP_CODE_FIXED_32 => {
                let v = integral(
                    code,
                    value * 65536.0,
                    f64::from(i32::MIN),
                    f64::from(i32::MAX),
                )
                .map_err(|_| CodecError::Unrepresentable { code, value })?;
                (v as i32).to_be_bytes().to_vec()
            }
            REP_CODE_FLOAT_32 => encode_lis_float(value)?.to_be_bytes().to_vec(),
            _ => return Err(CodecError::UnknownRepCode(code)),
        };
        Ok(bytes)
    }
}
