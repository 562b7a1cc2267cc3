//! 通道布局

use welllog_core::codec::is_interleaved_code;
use welllog_core::{ChannelSpec, LayoutError, SubChannelShape, WordCodec};

/// 交织块中快通道的最大个数
pub const MAX_FAST_SUB_CHANNELS: usize = 5;

/// 快/慢交织寻址表
///
/// 快子通道 `sc` 的第 `sa` 个采样位于 `sa * num_fast + sc`；
/// 慢子通道 `sc`（单采样）位于 `fast_block_size + (sc - num_fast)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedTable {
    pub num_fast: usize,
    pub fast_samples: usize,
    pub num_slow: usize,
}

impl InterleavedTable {
    /// 快通道块的值个数
    pub fn fast_block_size(&self) -> usize {
        self.num_fast * self.fast_samples
    }

    /// 通道内的值位置，越界返回 None
    pub fn slot(&self, sub_channel: usize, sample: usize) -> Option<usize> {
        if sub_channel < self.num_fast {
            (sample < self.fast_samples).then(|| sample * self.num_fast + sub_channel)
        } else if sub_channel < self.num_fast + self.num_slow {
            (sample == 0).then(|| self.fast_block_size() + (sub_channel - self.num_fast))
        } else {
            None
        }
    }
}

/// 通道寻址方式，构造时按表示码确定一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// 子通道按声明顺序连续排列，每个子通道内部 `samples * bursts` 连续，burst 变化最快
    Generic,
    /// 固定的快/慢交织布局
    InterleavedFastSlow(InterleavedTable),
}

/// 单个通道的二进制形状
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLayout {
    pub name: String,
    pub rep_code: u8,
    pub word_length: usize,
    pub sub_channels: Vec<SubChannelShape>,
    pub byte_length: usize,
    pub addressing: Addressing,
    /// Generic 寻址下各子通道在通道内的起始值位置
    sub_channel_offsets: Vec<usize>,
}

impl ChannelLayout {
    /// 由通道声明构造
    ///
    /// # 参数
    /// - `position`: 通道在帧中的序号（用于错误信息）
    /// - `spec`: 通道声明
    /// - `codec`: 提供字长的编解码器
    pub fn new<C: WordCodec + ?Sized>(
        position: usize,
        spec: &ChannelSpec,
        codec: &C,
    ) -> Result<Self, LayoutError> {
        let sub_channels = spec.shapes();
        let malformed = |reason: String| LayoutError::MalformedChannel {
            channel: position,
            reason,
        };

        if let Some(shape) = sub_channels
            .iter()
            .find(|s| s.samples == 0 || s.bursts == 0)
        {
            return Err(malformed(format!(
                "sub-channel shape {}x{} has no values",
                shape.samples, shape.bursts
            )));
        }

        let word_length = codec.word_length(spec.rep_code)?;
        let value_count: usize = sub_channels.iter().map(SubChannelShape::value_count).sum();
        let byte_length = word_length * value_count;
        if byte_length == 0 {
            return Err(malformed("channel occupies no bytes".to_string()));
        }

        let addressing = if is_interleaved_code(spec.rep_code) {
            Addressing::InterleavedFastSlow(interleaved_table(&sub_channels).map_err(malformed)?)
        } else {
            Addressing::Generic
        };

        let mut sub_channel_offsets = Vec::with_capacity(sub_channels.len());
        let mut offset = 0;
        for shape in &sub_channels {
            sub_channel_offsets.push(offset);
            offset += shape.value_count();
        }

        Ok(Self {
            name: spec.name.clone(),
            rep_code: spec.rep_code,
            word_length,
            sub_channels,
            byte_length,
            addressing,
            sub_channel_offsets,
        })
    }

    /// 每帧的值个数
    pub fn value_count(&self) -> usize {
        self.sub_channels.iter().map(SubChannelShape::value_count).sum()
    }

    pub fn sub_channel_count(&self) -> usize {
        self.sub_channels.len()
    }

    pub fn is_interleaved(&self) -> bool {
        matches!(self.addressing, Addressing::InterleavedFastSlow(_))
    }

    /// 通道内的值位置
    ///
    /// 越界返回 None。交织通道只按寻址表查找，从不套用连续公式。
    pub fn slot_of(&self, sub_channel: usize, sample: usize, burst: usize) -> Option<usize> {
        let shape = self.sub_channels.get(sub_channel)?;
        if sample >= shape.samples || burst >= shape.bursts {
            return None;
        }
        match self.addressing {
            Addressing::Generic => {
                Some(self.sub_channel_offsets[sub_channel] + sample * shape.bursts + burst)
            }
            Addressing::InterleavedFastSlow(table) => table.slot(sub_channel, sample),
        }
    }

    /// 按字节流顺序排列的通道内值位置
    pub fn stream_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.value_count());
        match self.addressing {
            Addressing::Generic => {
                for (sc, shape) in self.sub_channels.iter().enumerate() {
                    for sa in 0..shape.samples {
                        for bu in 0..shape.bursts {
                            order.extend(self.slot_of(sc, sa, bu));
                        }
                    }
                }
            }
            Addressing::InterleavedFastSlow(table) => {
                // 快通道逐字节交织，随后追加慢通道
                for sa in 0..table.fast_samples {
                    for sc in 0..table.num_fast {
                        order.extend(table.slot(sc, sa));
                    }
                }
                for sc in table.num_fast..table.num_fast + table.num_slow {
                    order.extend(table.slot(sc, 0));
                }
            }
        }
        order
    }
}

/// 由子通道形状生成交织寻址表
///
/// 前导的多采样子通道为快通道（形状必须一致，最多 5 个），其余必须是单采样慢通道。
fn interleaved_table(shapes: &[SubChannelShape]) -> Result<InterleavedTable, String> {
    let num_fast = shapes.iter().take_while(|s| s.samples > 1).count();
    if num_fast == 0 {
        return Err("interleaved channel declares no fast sub-channel".to_string());
    }
    if num_fast > MAX_FAST_SUB_CHANNELS {
        return Err(format!(
            "{num_fast} fast sub-channels exceed the maximum of {MAX_FAST_SUB_CHANNELS}"
        ));
    }
    let fast_samples = shapes[0].samples;
    if shapes[..num_fast]
        .iter()
        .any(|s| s.samples != fast_samples || s.bursts != 1)
    {
        return Err("fast sub-channels must share one shape with a single burst".to_string());
    }
    if shapes[num_fast..]
        .iter()
        .any(|s| s.samples != 1 || s.bursts != 1)
    {
        return Err("slow sub-channels must be single-sampled".to_string());
    }
    Ok(InterleavedTable {
        num_fast,
        fast_samples,
        num_slow: shapes.len() - num_fast,
    })
}
