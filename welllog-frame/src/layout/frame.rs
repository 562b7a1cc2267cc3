//! 帧布局

use std::collections::HashMap;

use tracing::{debug, warn};
use welllog_core::{Direction, FormatConfig, LayoutError, RecordingMode, WordCodec};

use super::channel::ChannelLayout;

/// 整帧的字节结构
///
/// 每个测井道次构造一次，之后不可变，可自由共享。
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    channels: Vec<ChannelLayout>,
    /// 各通道在帧内的起始字节偏移
    channel_offsets: Vec<usize>,
    frame_byte_size: usize,
    recording_mode: RecordingMode,
    direction: Direction,
    frame_spacing: Option<f64>,
    spacing_units: String,
    index_units: String,
    index_rep_code: u8,
    index_word_length: usize,
    absent_value: f64,
}

impl FrameLayout {
    /// 由格式配置构造帧布局
    ///
    /// 对合法配置不会失败；格式中可容忍的异常（如通道重名）只记录告警。
    pub fn new<C: WordCodec + ?Sized>(config: &FormatConfig, codec: &C) -> Result<Self, LayoutError> {
        if config.channels.is_empty() {
            return Err(LayoutError::MalformedChannel {
                channel: 0,
                reason: "no channels declared".to_string(),
            });
        }

        let mut channels = Vec::with_capacity(config.channels.len());
        let mut channel_offsets = Vec::with_capacity(config.channels.len());
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut frame_byte_size = 0;

        for (position, spec) in config.channels.iter().enumerate() {
            if let Some(first) = seen.insert(spec.name.as_str(), position) {
                warn!(
                    name = %spec.name,
                    first,
                    duplicate = position,
                    "duplicate channel name"
                );
            }
            let channel = ChannelLayout::new(position, spec, codec)?;
            channel_offsets.push(frame_byte_size);
            frame_byte_size += channel.byte_length;
            channels.push(channel);
        }

        let index_word_length = codec.word_length(config.index_rep_code)?;

        debug!(
            channels = channels.len(),
            frame_byte_size,
            recording_mode = ?config.recording_mode,
            index_word_length,
            "frame layout built"
        );

        Ok(Self {
            channels,
            channel_offsets,
            frame_byte_size,
            recording_mode: config.recording_mode,
            direction: config.direction,
            frame_spacing: config.frame_spacing,
            spacing_units: config.spacing_units.clone(),
            index_units: config.index_units.clone(),
            index_rep_code: config.index_rep_code,
            index_word_length,
            absent_value: config.absent_value,
        })
    }

    pub fn channels(&self) -> &[ChannelLayout] {
        &self.channels
    }

    pub fn channel(&self, ch: usize) -> Result<&ChannelLayout, LayoutError> {
        self.channels.get(ch).ok_or(LayoutError::IndexOutOfRange {
            what: "channel",
            index: ch,
            limit: self.channels.len(),
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 按名称查找第一个同名通道
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    pub fn frame_byte_size(&self) -> usize {
        self.frame_byte_size
    }

    pub fn recording_mode(&self) -> RecordingMode {
        self.recording_mode
    }

    pub fn is_indirect(&self) -> bool {
        self.recording_mode == RecordingMode::Indirect
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// 声明的帧间距（未带方向符号）
    pub fn frame_spacing(&self) -> Option<f64> {
        self.frame_spacing
    }

    /// 带方向符号的逐帧索引增量
    pub fn signed_spacing(&self) -> Option<f64> {
        self.frame_spacing.map(|s| self.direction.signed_spacing(s))
    }

    pub fn spacing_units(&self) -> &str {
        &self.spacing_units
    }

    pub fn index_units(&self) -> &str {
        &self.index_units
    }

    pub fn index_rep_code(&self) -> u8 {
        self.index_rep_code
    }

    pub fn index_word_length(&self) -> usize {
        self.index_word_length
    }

    pub fn absent_value(&self) -> f64 {
        self.absent_value
    }

    /// 逻辑记录头部显式索引字的长度，直接记录模式下为 0
    pub fn record_header_length(&self) -> usize {
        if self.is_indirect() {
            self.index_word_length
        } else {
            0
        }
    }

    /// 通道在帧内的起始字节偏移
    pub fn channel_offset(&self, ch: usize) -> Result<usize, LayoutError> {
        self.channel(ch)?;
        Ok(self.channel_offsets[ch])
    }

    /// 通道 `ch` 在第 `frame` 帧中相对逻辑记录起点的字节偏移
    pub fn channel_byte_offset(&self, ch: i64, frame: i64) -> Result<usize, LayoutError> {
        if ch < 0 {
            return Err(LayoutError::NegativeIndex {
                what: "channel",
                value: ch,
            });
        }
        if frame < 0 {
            return Err(LayoutError::NegativeIndex {
                what: "frame",
                value: frame,
            });
        }
        let offset = self.record_header_length() + self.channel_offset(ch as usize)?;
        let frame = usize::try_from(frame).unwrap_or(usize::MAX);
        self.frames_byte_len(frame)?
            .checked_add(offset)
            .ok_or(LayoutError::IndexOutOfRange {
                what: "frame",
                index: frame,
                limit: (usize::MAX - offset) / self.frame_byte_size.max(1),
            })
    }

    /// `frames` 个整帧的字节数，超出可寻址范围时报越界
    pub fn frames_byte_len(&self, frames: usize) -> Result<usize, LayoutError> {
        frames
            .checked_mul(self.frame_byte_size)
            .ok_or(LayoutError::IndexOutOfRange {
                what: "frame",
                index: frames,
                limit: usize::MAX / self.frame_byte_size.max(1),
            })
    }

    /// 由逻辑记录的字节长度计算帧数，不容忍残帧
    pub fn frame_count_for(&self, byte_len: i64) -> Result<usize, LayoutError> {
        if byte_len < 0 {
            return Err(LayoutError::NegativeLength {
                what: "byte_len",
                value: byte_len,
            });
        }
        let byte_len = byte_len as usize;
        let misaligned = LayoutError::MisalignedLength {
            byte_len,
            stride: self.frame_byte_size,
        };
        let header = self.record_header_length();
        if byte_len < header {
            return Err(misaligned);
        }
        let body = byte_len - header;
        if body % self.frame_byte_size != 0 {
            return Err(misaligned);
        }
        Ok(body / self.frame_byte_size)
    }

    /// 从通道 `ch` 末尾到帧边界的剩余字节数
    pub fn skip_to_frame_end(&self, ch: usize) -> Result<usize, LayoutError> {
        let channel = self.channel(ch)?;
        Ok(self.frame_byte_size - self.channel_offsets[ch] - channel.byte_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use welllog_core::codec::{REP_CODE_FLOAT_32, REP_CODE_INT_16, REP_CODE_INT_8};
    use welllog_core::{ChannelSpec, RepCodeCodec, SubChannelShape};

    fn config(mode: RecordingMode) -> FormatConfig {
        FormatConfig {
            recording_mode: mode,
            direction: Direction::Down,
            frame_spacing: Some(0.5),
            spacing_units: "FT".to_string(),
            index_units: "FT".to_string(),
            index_rep_code: REP_CODE_FLOAT_32,
            absent_value: welllog_core::DEFAULT_ABSENT_VALUE,
            channels: vec![
                ChannelSpec::scalar("DEPT", REP_CODE_FLOAT_32),
                ChannelSpec::with_shapes(
                    "RHOB",
                    REP_CODE_FLOAT_32,
                    vec![SubChannelShape::new(2, 1)],
                ),
                ChannelSpec::scalar("FLAG", REP_CODE_INT_16),
                ChannelSpec::with_shapes(
                    "WAVE",
                    REP_CODE_INT_8,
                    vec![SubChannelShape::new(4, 4)],
                ),
                ChannelSpec::scalar("NEXT", REP_CODE_INT_16),
            ],
        }
    }

    #[test]
    fn test_offsets_and_size() {
        let layout = FrameLayout::new(&config(RecordingMode::Direct), &RepCodeCodec::new()).unwrap();

        assert_eq!(layout.frame_byte_size(), 32);
        assert_eq!(layout.channel_offset(3).unwrap(), 14);
        assert_eq!(layout.channel_byte_offset(3, 2).unwrap(), 78);
        assert_eq!(layout.skip_to_frame_end(0).unwrap(), 28);
        assert_eq!(layout.skip_to_frame_end(4).unwrap(), 0);
        assert_eq!(layout.channel_index("WAVE"), Some(3));
    }

    #[test]
    fn test_indirect_header() {
        let layout =
            FrameLayout::new(&config(RecordingMode::Indirect), &RepCodeCodec::new()).unwrap();

        assert_eq!(layout.record_header_length(), 4);
        assert_eq!(layout.channel_byte_offset(0, 0).unwrap(), 4);
        assert_eq!(layout.channel_byte_offset(1, 1).unwrap(), 40);
        assert_eq!(layout.frame_count_for(4 + 32 * 3).unwrap(), 3);
        assert!(matches!(
            layout.frame_count_for(32 * 3),
            Err(LayoutError::MisalignedLength { .. })
        ));
        assert!(matches!(
            layout.frame_count_for(2),
            Err(LayoutError::MisalignedLength { .. })
        ));
    }

    #[test]
    fn test_contract_errors() {
        let layout = FrameLayout::new(&config(RecordingMode::Direct), &RepCodeCodec::new()).unwrap();

        assert_eq!(
            layout.channel_byte_offset(-1, 0),
            Err(LayoutError::NegativeIndex {
                what: "channel",
                value: -1
            })
        );
        assert!(matches!(
            layout.channel_byte_offset(0, -3),
            Err(LayoutError::NegativeIndex { what: "frame", .. })
        ));
        assert!(matches!(
            layout.channel_byte_offset(5, 0),
            Err(LayoutError::IndexOutOfRange { index: 5, limit: 5, .. })
        ));
        assert!(matches!(
            layout.frame_count_for(-32),
            Err(LayoutError::NegativeLength { .. })
        ));
        assert!(matches!(
            layout.frame_count_for(33),
            Err(LayoutError::MisalignedLength { byte_len: 33, stride: 32 })
        ));
        assert_eq!(layout.frame_count_for(0).unwrap(), 0);
    }

    #[test]
    fn test_unaddressable_frame() {
        let layout =
            FrameLayout::new(&config(RecordingMode::Indirect), &RepCodeCodec::new()).unwrap();

        assert!(matches!(
            layout.channel_byte_offset(0, i64::MAX),
            Err(LayoutError::IndexOutOfRange { what: "frame", .. })
        ));
        assert!(matches!(
            layout.frames_byte_len(usize::MAX),
            Err(LayoutError::IndexOutOfRange { what: "frame", .. })
        ));
        assert_eq!(layout.frames_byte_len(3).unwrap(), 96);
    }

    #[test]
    fn test_duplicate_names_are_tolerated() {
        let mut config = config(RecordingMode::Direct);
        config.channels[4].name = "FLAG".to_string();
        let layout = FrameLayout::new(&config, &RepCodeCodec::new()).unwrap();

        assert_eq!(layout.channel_count(), 5);
        assert_eq!(layout.channel_index("FLAG"), Some(2));
    }
}
