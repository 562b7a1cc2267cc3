//! 偏移树与切片树
//!
//! 偏移树：`[通道][子通道][采样][burst] -> 值位置`，覆盖 `0..slots_per_frame` 且无重叠。
//! 切片树：`[通道][子通道] -> SubChannelSpan`，描述子通道在帧行中的跨步区间。

use welllog_core::SubChannelShape;

use crate::layout::{Addressing, ChannelLayout};

/// 子通道在帧行中的跨步区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubChannelSpan {
    pub start: usize,
    pub stride: usize,
    pub len: usize,
    pub samples: usize,
    pub bursts: usize,
}

impl SubChannelSpan {
    /// 第 k 个值（按 `sample * bursts + burst` 计）所在的值位置
    pub fn slot(&self, k: usize) -> usize {
        self.start + k * self.stride
    }

    pub fn shape(&self) -> SubChannelShape {
        SubChannelShape::new(self.samples, self.bursts)
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == 1
    }
}

/// 单帧内一个子通道的只读视图
#[derive(Debug, Clone, Copy)]
pub struct SubChannelView<'a> {
    row: &'a [f64],
    span: SubChannelSpan,
}

impl<'a> SubChannelView<'a> {
    pub(crate) fn new(row: &'a [f64], span: SubChannelSpan) -> Self {
        Self { row, span }
    }

    pub fn span(&self) -> SubChannelSpan {
        self.span
    }

    pub fn get(&self, sample: usize, burst: usize) -> Option<f64> {
        if sample >= self.span.samples || burst >= self.span.bursts {
            return None;
        }
        self.row
            .get(self.span.slot(sample * self.span.bursts + burst))
            .copied()
    }

    /// 连续子通道的切片；交织快通道返回 None
    pub fn as_slice(&self) -> Option<&'a [f64]> {
        let row = self.row;
        let span = self.span;
        span.is_contiguous()
            .then(|| &row[span.start..span.start + span.len])
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + 'a {
        let row = self.row;
        let span = self.span;
        (0..span.len).map(move |k| row[span.slot(k)])
    }
}

/// 一个已加载通道的寻址信息
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChannelAddress {
    pub offsets: Vec<Vec<Vec<usize>>>,
    pub spans: Vec<SubChannelSpan>,
    pub stream_slots: Vec<usize>,
}

/// 为从 `base` 开始存放的通道生成寻址信息
pub(crate) fn build_channel_address(channel: &ChannelLayout, base: usize) -> ChannelAddress {
    let mut offsets = Vec::with_capacity(channel.sub_channel_count());
    let mut spans = Vec::with_capacity(channel.sub_channel_count());

    for (sc, shape) in channel.sub_channels.iter().enumerate() {
        let tree: Vec<Vec<usize>> = (0..shape.samples)
            .map(|sa| {
                (0..shape.bursts)
                    .filter_map(|bu| channel.slot_of(sc, sa, bu).map(|slot| base + slot))
                    .collect()
            })
            .collect();

        let start = tree.first().and_then(|s| s.first()).copied().unwrap_or(base);
        let stride = match channel.addressing {
            Addressing::Generic => 1,
            Addressing::InterleavedFastSlow(table) if sc < table.num_fast => table.num_fast,
            Addressing::InterleavedFastSlow(_) => 1,
        };
        spans.push(SubChannelSpan {
            start,
            stride,
            len: shape.value_count(),
            samples: shape.samples,
            bursts: shape.bursts,
        });
        offsets.push(tree);
    }

    let stream_slots = channel
        .stream_order()
        .into_iter()
        .map(|slot| base + slot)
        .collect();

    ChannelAddress {
        offsets,
        spans,
        stream_slots,
    }
}
