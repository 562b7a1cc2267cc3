//! FrameStore核心实现
//!
//! 构造时按帧区间与通道子集一次性预分配，之后只按规划事件顺序写入，写完即只读。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use welllog_core::{Decoded, Direction, LayoutError, StoreError, SubChannelShape, WordCodec};

use super::offsets::{build_channel_address, SubChannelSpan, SubChannelView};
use crate::layout::{Addressing, ChannelLayout, FrameLayout};
use crate::planner::FrameRange;

pub(crate) fn out_of_range(what: &'static str, index: usize, limit: usize) -> StoreError {
    StoreError::Layout(LayoutError::IndexOutOfRange { what, index, limit })
}

/// 帧存储
#[derive(Debug, Clone)]
pub struct FrameStore {
    pub(crate) layout: Arc<FrameLayout>,
    pub(crate) range: FrameRange,
    pub(crate) frame_count: usize,
    /// 已加载的外部通道号，升序
    pub(crate) channels: Vec<usize>,
    /// 外部通道号到内部通道号的映射；None 表示恒等映射（未指定子集）
    pub(crate) external_to_internal: Option<HashMap<usize, usize>>,
    pub(crate) channel_value_offsets: Vec<usize>,
    /// `[通道][子通道][采样][burst] -> 值位置`
    pub(crate) offset_tree: Vec<Vec<Vec<Vec<usize>>>>,
    /// `[通道][子通道] -> 跨步区间`
    pub(crate) slice_tree: Vec<Vec<SubChannelSpan>>,
    /// 字节流中第 k 个值写入的位置
    pub(crate) stream_slots: Vec<Vec<usize>>,
    pub(crate) slots_per_frame: usize,
    /// 行主序的 `帧 × 值位置` 数组
    pub(crate) values: Vec<f64>,
    pub(crate) explicit_index: Option<Vec<f64>>,
    /// 直接记录模式下索引通道的内部通道号
    pub(crate) index_channel: Option<usize>,
    /// 最近一个已知索引值，用于外推
    pub(crate) last_index: Option<f64>,
}

impl FrameStore {
    /// 创建帧存储
    ///
    /// # 参数
    /// - `layout`: 帧布局
    /// - `range`: 帧区间
    /// - `channel_subset`: 通道子集；None 表示全部通道
    /// - `index_channel`: 直接记录模式下的索引通道，总会被加载；间接模式下忽略
    pub fn new(
        layout: Arc<FrameLayout>,
        range: FrameRange,
        channel_subset: Option<&[usize]>,
        index_channel: usize,
    ) -> Result<Self, StoreError> {
        let channel_count = layout.channel_count();
        let indirect = layout.is_indirect();
        if !indirect {
            layout.channel(index_channel)?;
        }

        let (channels, external_to_internal) = match channel_subset {
            None => ((0..channel_count).collect::<Vec<_>>(), None),
            Some(subset) => {
                let mut channels = subset.to_vec();
                if !indirect {
                    channels.push(index_channel);
                }
                channels.sort_unstable();
                channels.dedup();
                if let Some(&bad) = channels.iter().find(|&&ch| ch >= channel_count) {
                    return Err(out_of_range("channel", bad, channel_count));
                }
                let mapping = channels
                    .iter()
                    .enumerate()
                    .map(|(internal, &external)| (external, internal))
                    .collect();
                (channels, Some(mapping))
            }
        };

        let mut channel_value_offsets = Vec::with_capacity(channels.len());
        let mut offset_tree = Vec::with_capacity(channels.len());
        let mut slice_tree = Vec::with_capacity(channels.len());
        let mut stream_slots = Vec::with_capacity(channels.len());
        let mut slots_per_frame = 0;
        for &ch in &channels {
            let channel = layout.channel(ch)?;
            let address = build_channel_address(channel, slots_per_frame);
            channel_value_offsets.push(slots_per_frame);
            offset_tree.push(address.offsets);
            slice_tree.push(address.spans);
            stream_slots.push(address.stream_slots);
            slots_per_frame += channel.value_count();
        }

        let frame_count = range.frame_count();
        let absent = layout.absent_value();
        let value_count = frame_count.checked_mul(slots_per_frame).ok_or_else(|| {
            out_of_range("frame", frame_count, usize::MAX / slots_per_frame.max(1))
        })?;
        let values = vec![absent; value_count];
        let explicit_index = indirect.then(|| vec![absent; frame_count]);
        let index_channel = if indirect {
            None
        } else {
            channels.binary_search(&index_channel).ok()
        };

        debug!(
            frames = frame_count,
            channels = channels.len(),
            slots_per_frame,
            indirect,
            "frame store allocated"
        );

        Ok(Self {
            layout,
            range,
            frame_count,
            channels,
            external_to_internal,
            channel_value_offsets,
            offset_tree,
            slice_tree,
            stream_slots,
            slots_per_frame,
            values,
            explicit_index,
            index_channel,
            last_index: None,
        })
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn range(&self) -> FrameRange {
        self.range
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// 已加载的通道数
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 已加载的外部通道号（升序），可直接交给规划器
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    pub fn slots_per_frame(&self) -> usize {
        self.slots_per_frame
    }

    /// 各已加载通道的起始值位置
    pub fn channel_value_offsets(&self) -> &[usize] {
        &self.channel_value_offsets
    }

    pub fn explicit_index(&self) -> Option<&[f64]> {
        self.explicit_index.as_deref()
    }

    /// 一帧的全部值
    pub fn row(&self, frame: usize) -> Option<&[f64]> {
        (frame < self.frame_count)
            .then(|| &self.values[frame * self.slots_per_frame..(frame + 1) * self.slots_per_frame])
    }

    /// 精确比较缺失值
    #[allow(clippy::float_cmp)]
    pub fn is_absent(&self, value: f64) -> bool {
        value == self.layout.absent_value()
    }

    /// 外部通道号转换为内部通道号
    pub fn internal_channel_index(&self, external: usize) -> Result<usize, StoreError> {
        match &self.external_to_internal {
            None if external < self.channels.len() => Ok(external),
            None => Err(out_of_range("channel", external, self.channels.len())),
            Some(mapping) => mapping
                .get(&external)
                .copied()
                .ok_or_else(|| out_of_range("channel", external, self.layout.channel_count())),
        }
    }

    pub fn sub_channel_shape(
        &self,
        channel: usize,
        sub_channel: usize,
    ) -> Result<SubChannelShape, StoreError> {
        let span = self.span(channel, sub_channel)?;
        Ok(SubChannelShape::new(span.samples, span.bursts))
    }

    pub(crate) fn check_frame(&self, frame: usize) -> Result<(), StoreError> {
        if frame >= self.frame_count {
            return Err(out_of_range("frame", frame, self.frame_count));
        }
        Ok(())
    }

    pub(crate) fn span(
        &self,
        channel: usize,
        sub_channel: usize,
    ) -> Result<SubChannelSpan, StoreError> {
        let internal = self.internal_channel_index(channel)?;
        let spans = &self.slice_tree[internal];
        spans
            .get(sub_channel)
            .copied()
            .ok_or_else(|| out_of_range("sub_channel", sub_channel, spans.len()))
    }

    pub(crate) fn row_unchecked(&self, frame: usize) -> &[f64] {
        &self.values[frame * self.slots_per_frame..(frame + 1) * self.slots_per_frame]
    }

    /// 带边界检查的随机访问（经偏移树）
    pub fn value(
        &self,
        frame: usize,
        channel: usize,
        sub_channel: usize,
        sample: usize,
        burst: usize,
    ) -> Result<f64, StoreError> {
        self.check_frame(frame)?;
        let internal = self.internal_channel_index(channel)?;
        let sub_channels = &self.offset_tree[internal];
        let samples = sub_channels
            .get(sub_channel)
            .ok_or_else(|| out_of_range("sub_channel", sub_channel, sub_channels.len()))?;
        let bursts = samples
            .get(sample)
            .ok_or_else(|| out_of_range("sample", sample, samples.len()))?;
        let slot = bursts
            .get(burst)
            .ok_or_else(|| out_of_range("burst", burst, bursts.len()))?;
        Ok(self.values[frame * self.slots_per_frame + slot])
    }

    /// 跳过边界检查的快速路径，`internal_channel` 为内部通道号
    ///
    /// 调用方保证所有索引合法，越界会 panic。
    #[inline]
    pub fn value_unchecked(
        &self,
        frame: usize,
        internal_channel: usize,
        sub_channel: usize,
        sample: usize,
        burst: usize,
    ) -> f64 {
        let slot = self.offset_tree[internal_channel][sub_channel][sample][burst];
        self.values[frame * self.slots_per_frame + slot]
    }

    /// 单帧内一个子通道的视图（经切片树）
    pub fn sub_channel_view(
        &self,
        frame: usize,
        channel: usize,
        sub_channel: usize,
    ) -> Result<SubChannelView<'_>, StoreError> {
        self.check_frame(frame)?;
        let span = self.span(channel, sub_channel)?;
        Ok(SubChannelView::new(self.row_unchecked(frame), span))
    }

    /// 连续子通道在单帧内的切片；交织快通道返回 `Ok(None)`
    pub fn sub_channel_slice(
        &self,
        frame: usize,
        channel: usize,
        sub_channel: usize,
    ) -> Result<Option<&[f64]>, StoreError> {
        Ok(self.sub_channel_view(frame, channel, sub_channel)?.as_slice())
    }

    /// 写入一次读取事件的字节
    ///
    /// # 参数
    /// - `codec`: 数值编解码器
    /// - `bytes`: 事件读出的字节
    /// - `frame`: 内部帧序号
    /// - `channel_from`: None 表示字节以显式索引字开头
    /// - `channel_to`: 半开通道上界；与 `channel_from == None` 同时为 None 时只写索引
    ///
    /// # 返回
    /// - `Err(StoreError::LengthMismatch)`: 字节长度与通道区间不符，本帧不做任何修改
    pub fn populate<C: WordCodec + ?Sized>(
        &mut self,
        codec: &C,
        bytes: &[u8],
        frame: usize,
        channel_from: Option<usize>,
        channel_to: Option<usize>,
    ) -> Result<(), StoreError> {
        self.check_frame(frame)?;
        trace!(
            frame,
            ?channel_from,
            ?channel_to,
            len = bytes.len(),
            "populate"
        );

        let Some(from) = channel_from else {
            let header = self.layout.index_word_length();
            let to = channel_to.unwrap_or(0);
            let expected = header + self.channel_bytes(0, to)?;
            if bytes.len() != expected {
                return Err(StoreError::LengthMismatch {
                    expected,
                    actual: bytes.len(),
                });
            }
            let (head, rest) = bytes.split_at(header);
            let index = self.decode_index(codec, head)?;
            let decoded = self.decode_channels(codec, rest, 0, to)?;
            self.write_index(frame, index)?;
            self.write_channels(frame, decoded);
            return Ok(());
        };

        let to = channel_to.unwrap_or(self.layout.channel_count());
        let expected = self.channel_bytes(from, to)?;
        if bytes.len() != expected {
            return Err(StoreError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let decoded = self.decode_channels(codec, bytes, from, to)?;
        self.write_channels(frame, decoded);
        Ok(())
    }

    /// 记录逻辑记录头部的显式索引（其所在帧未物化时使用）
    pub fn seed_index<C: WordCodec + ?Sized>(
        &mut self,
        codec: &C,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        if self.explicit_index.is_none() {
            return Err(StoreError::NoExplicitIndex);
        }
        let value = self.decode_index(codec, bytes)?;
        self.last_index = Some(value);
        Ok(())
    }

    /// 由最近已知索引外推第 `frame` 帧的索引
    pub fn extrapolate(&mut self, frame: usize, frame_count: usize) -> Result<(), StoreError> {
        self.check_frame(frame)?;
        if self.explicit_index.is_none() {
            return Err(StoreError::NoExplicitIndex);
        }
        let spacing = self.layout.signed_spacing().ok_or_else(|| {
            StoreError::IndeterminateSpacing(format!(
                "no declared frame spacing to extrapolate frame {frame}"
            ))
        })?;
        let base = self.last_index.ok_or_else(|| {
            StoreError::IndeterminateSpacing(format!("no index value precedes frame {frame}"))
        })?;
        let value = base + frame_count as f64 * spacing;
        if let Some(index) = self.explicit_index.as_mut() {
            index[frame] = value;
        }
        self.last_index = Some(value);
        Ok(())
    }

    /// 通道区间 `from..to` 的字节总数，区间内通道必须都已加载
    fn channel_bytes(&self, from: usize, to: usize) -> Result<usize, StoreError> {
        let channel_count = self.layout.channel_count();
        if from > to {
            return Err(out_of_range("channel_from", from, to));
        }
        if to > channel_count {
            return Err(out_of_range("channel_to", to, channel_count));
        }
        let mut total = 0;
        for ch in from..to {
            self.internal_channel_index(ch)?;
            total += self.layout.channel(ch)?.byte_length;
        }
        Ok(total)
    }

    fn decode_index<C: WordCodec + ?Sized>(
        &self,
        codec: &C,
        bytes: &[u8],
    ) -> Result<f64, StoreError> {
        match codec.decode(self.layout.index_rep_code(), bytes)? {
            Decoded::Scalar(value) => Ok(value),
            Decoded::Block(values) if values.len() == 1 => Ok(values[0]),
            Decoded::Block(values) => Err(StoreError::LengthMismatch {
                expected: 1,
                actual: values.len(),
            }),
        }
    }

    /// 解码区间内全部通道；先完整解码再写入，失败时不修改存储
    fn decode_channels<C: WordCodec + ?Sized>(
        &self,
        codec: &C,
        bytes: &[u8],
        from: usize,
        to: usize,
    ) -> Result<Vec<(usize, Vec<f64>)>, StoreError> {
        let mut decoded = Vec::with_capacity(to - from);
        let mut offset = 0;
        for ch in from..to {
            let internal = self.internal_channel_index(ch)?;
            let channel = self.layout.channel(ch)?;
            let chunk = &bytes[offset..offset + channel.byte_length];
            decoded.push((internal, decode_channel(codec, channel, chunk)?));
            offset += channel.byte_length;
        }
        Ok(decoded)
    }

    /// 写入已解码的 `(内部通道号, 值)` 列表
    fn write_channels(&mut self, frame: usize, decoded: Vec<(usize, Vec<f64>)>) {
        let base = frame * self.slots_per_frame;
        for (internal, values) in decoded {
            for (&slot, value) in self.stream_slots[internal].iter().zip(values) {
                self.values[base + slot] = value;
            }
        }
    }

    fn write_index(&mut self, frame: usize, value: f64) -> Result<(), StoreError> {
        let direction = self.layout.direction();
        let index = self
            .explicit_index
            .as_mut()
            .ok_or(StoreError::NoExplicitIndex)?;
        if let Some(previous) = self.last_index {
            let reversed = match direction {
                Direction::Down => value < previous,
                Direction::Up => value > previous,
                Direction::Neither => false,
            };
            if reversed {
                warn!(frame, previous, value, ?direction, "explicit index runs against direction");
            }
        }
        index[frame] = value;
        self.last_index = Some(value);
        Ok(())
    }
}

/// 按通道的表示码与寻址方式解码为字节流顺序的值
fn decode_channel<C: WordCodec + ?Sized>(
    codec: &C,
    channel: &ChannelLayout,
    bytes: &[u8],
) -> Result<Vec<f64>, StoreError> {
    let expected = channel.value_count();
    let values = match channel.addressing {
        Addressing::InterleavedFastSlow(_) => match codec.decode(channel.rep_code, bytes)? {
            Decoded::Block(values) => values,
            Decoded::Scalar(value) => vec![value],
        },
        Addressing::Generic => {
            let mut values = Vec::with_capacity(expected);
            for word in bytes.chunks_exact(channel.word_length) {
                match codec.decode(channel.rep_code, word)? {
                    Decoded::Scalar(value) => values.push(value),
                    Decoded::Block(block) => values.extend(block),
                }
            }
            values
        }
    };
    if values.len() != expected {
        return Err(StoreError::LengthMismatch {
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}
