//! 逐值生成器：按帧顺序遍历子通道的值与 `(索引, 值)` 点

use welllog_core::StoreError;

use super::core::FrameStore;
use super::index_axis::sample_index;
use super::offsets::SubChannelSpan;

/// 批量生成的一个点：共享索引与各子通道在该位置的值
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPoint {
    pub index: f64,
    pub values: Vec<f64>,
}

impl FrameStore {
    /// 子通道的全部值，按帧、采样、burst 顺序
    pub fn values(
        &self,
        channel: usize,
        sub_channel: usize,
    ) -> Result<impl Iterator<Item = f64> + '_, StoreError> {
        let span = self.span(channel, sub_channel)?;
        Ok((0..self.frame_count).flat_map(move |frame| {
            let row = self.row_unchecked(frame);
            (0..span.len).map(move |k| row[span.slot(k)])
        }))
    }

    /// 子通道的 `(索引, 值)` 点；多采样子通道的采样索引在帧间插值，burst 共用采样索引
    ///
    /// # 返回
    /// - `Err(StoreError::IndeterminateSpacing)`: 多采样子通道、仅一帧且未声明帧间距
    pub fn points(
        &self,
        channel: usize,
        sub_channel: usize,
    ) -> Result<impl Iterator<Item = (f64, f64)> + '_, StoreError> {
        let span = self.span(channel, sub_channel)?;
        let spacing = self.interpolation_spacing(span.samples)?;
        Ok((0..self.frame_count).flat_map(move |frame| {
            let row = self.row_unchecked(frame);
            let indices = self.frame_sample_indices(frame, span, spacing);
            (0..span.len).map(move |k| (indices.at(k / span.bursts), row[span.slot(k)]))
        }))
    }

    /// 多个形状相同的子通道按点对齐输出
    ///
    /// # 返回
    /// - `Err(StoreError::MixedShapes)`: 各子通道的采样数或 burst 数不一致
    pub fn batch_points(
        &self,
        selections: &[(usize, usize)],
    ) -> Result<impl Iterator<Item = BatchPoint> + '_, StoreError> {
        let spans = selections
            .iter()
            .map(|&(channel, sub_channel)| self.span(channel, sub_channel))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(&first) = spans.first() else {
            return Err(StoreError::Empty {
                frames: self.frame_count,
                channels: 0,
            });
        };
        // 批量点共享一个采样索引，采样数与 burst 数都必须一致
        if let Some(other) = spans
            .iter()
            .find(|span| (span.samples, span.bursts) != (first.samples, first.bursts))
        {
            return Err(StoreError::MixedShapes {
                first: first.shape(),
                other: other.shape(),
            });
        }

        let spacing = self.interpolation_spacing(first.samples)?;
        Ok((0..self.frame_count).flat_map(move |frame| {
            let row = self.row_unchecked(frame);
            let indices = self.frame_sample_indices(frame, first, spacing);
            let spans = spans.clone();
            (0..first.len).map(move |k| BatchPoint {
                index: indices.at(k / first.bursts),
                values: spans.iter().map(|span| row[span.slot(k)]).collect(),
            })
        }))
    }

    fn frame_sample_indices(
        &self,
        frame: usize,
        span: SubChannelSpan,
        spacing: f64,
    ) -> SampleIndices {
        let current = self.index_at(frame);
        if span.samples <= 1 {
            return SampleIndices {
                previous: current,
                current,
                samples: 1,
            };
        }
        SampleIndices {
            previous: self.previous_index(frame, spacing),
            current,
            samples: span.samples,
        }
    }
}

/// 一帧内各采样的索引
#[derive(Debug, Clone, Copy)]
struct SampleIndices {
    previous: f64,
    current: f64,
    samples: usize,
}

impl SampleIndices {
    fn at(&self, sample: usize) -> f64 {
        if self.samples == 1 {
            return self.current;
        }
        sample_index(self.previous, self.current, sample, self.samples)
    }
}
