//! 格式配置模块
//!
//! 定义由格式配置块（LIS 数据格式说明记录等）提供的帧结构描述

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// LIS 格式的缺省缺失值
pub const DEFAULT_ABSENT_VALUE: f64 = -999.25;

/// 索引记录模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// 索引由某个通道逐帧记录
    Direct,
    /// 索引值在逻辑记录头部显式记录一次，其余帧按帧间距推算
    Indirect,
}

/// 测井方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neither,
}

impl Direction {
    /// 由 LIS 方向标志转换：1 = up，255 = down，其余 = neither
    pub fn from_flag(flag: u8) -> Self {
        match flag {
            1 => Direction::Up,
            255 => Direction::Down,
            _ => Direction::Neither,
        }
    }

    /// 将声明的帧间距转换为带符号的逐帧增量
    pub fn signed_spacing(self, spacing: f64) -> f64 {
        match self {
            Direction::Up => -spacing.abs(),
            Direction::Down => spacing.abs(),
            Direction::Neither => spacing,
        }
    }
}

fn one() -> usize {
    1
}

fn default_absent_value() -> f64 {
    DEFAULT_ABSENT_VALUE
}

/// 子通道形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubChannelShape {
    #[serde(default = "one")]
    pub samples: usize, // 超采样数
    #[serde(default = "one")]
    pub bursts: usize, // 每个采样的重复次数
}

impl SubChannelShape {
    pub fn new(samples: usize, bursts: usize) -> Self {
        Self { samples, bursts }
    }

    /// 每帧的值个数
    pub fn value_count(&self) -> usize {
        self.samples * self.bursts
    }
}

impl fmt::Display for SubChannelShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.samples, self.bursts)
    }
}

impl Default for SubChannelShape {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// 单个通道的声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    pub rep_code: u8,
    #[serde(default)]
    pub sub_channels: Vec<SubChannelShape>,
}

impl ChannelSpec {
    /// 单子通道、单采样的普通通道
    pub fn scalar(name: &str, rep_code: u8) -> Self {
        Self::with_shapes(name, rep_code, vec![SubChannelShape::default()])
    }

    pub fn with_shapes(name: &str, rep_code: u8, sub_channels: Vec<SubChannelShape>) -> Self {
        Self {
            name: name.to_string(),
            rep_code,
            sub_channels,
        }
    }

    /// 未声明子通道时视为一个 1x1 子通道
    pub fn shapes(&self) -> Vec<SubChannelShape> {
        if self.sub_channels.is_empty() {
            vec![SubChannelShape::default()]
        } else {
            self.sub_channels.clone()
        }
    }
}

/// 格式配置块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatConfig {
    pub recording_mode: RecordingMode,
    pub direction: Direction,
    #[serde(default)]
    pub frame_spacing: Option<f64>, // 声明的帧间距（正值）
    #[serde(default)]
    pub spacing_units: String,
    #[serde(default)]
    pub index_units: String,
    pub index_rep_code: u8,
    #[serde(default = "default_absent_value")]
    pub absent_value: f64,
    pub channels: Vec<ChannelSpec>,
}

impl FormatConfig {
    /// 从 JSON 文本加载配置
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(text)?;
        debug!(
            channels = config.channels.len(),
            recording_mode = ?config.recording_mode,
            "format config loaded"
        );
        Ok(config)
    }

    /// 序列化为 JSON 文本
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 带符号的声明帧间距
    pub fn signed_spacing(&self) -> Option<f64> {
        self.frame_spacing.map(|s| self.direction.signed_spacing(s))
    }
}
