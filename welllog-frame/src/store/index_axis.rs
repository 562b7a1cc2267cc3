//! 索引轴：逐帧索引值、帧间距与采样点索引插值

use welllog_core::StoreError;

use super::core::{out_of_range, FrameStore};

/// 帧内第 `sample` 个采样的索引：在前一帧索引与本帧索引之间线性插值，
/// 最后一个采样落在本帧索引上
pub(crate) fn sample_index(previous: f64, current: f64, sample: usize, samples: usize) -> f64 {
    previous + (current - previous) * (sample + 1) as f64 / samples as f64
}

impl FrameStore {
    /// 内部帧的索引值，调用方保证 `frame < frame_count`
    pub(crate) fn index_at(&self, frame: usize) -> f64 {
        match (&self.explicit_index, self.index_channel) {
            (Some(index), _) => index[frame],
            (None, Some(internal)) => self.value_unchecked(frame, internal, 0, 0, 0),
            (None, None) => self.layout.absent_value(),
        }
    }

    /// 内部帧的索引值
    pub fn index_value(&self, frame: usize) -> Result<f64, StoreError> {
        self.check_frame(frame)?;
        Ok(self.index_at(frame))
    }

    /// 首帧与末帧的索引，未加载任何帧时返回 None
    pub fn index_range(&self) -> Option<(f64, f64)> {
        let last = self.frame_count.checked_sub(1)?;
        Some((self.index_at(0), self.index_at(last)))
    }

    pub fn index_units(&self) -> &str {
        self.layout.index_units()
    }

    /// 相邻原始帧之间的带符号间距
    ///
    /// 优先使用声明的帧间距（按方向取符号），否则由首末帧索引估算。
    ///
    /// # 返回
    /// - `Err(StoreError::IndeterminateSpacing)`: 未声明间距且已加载帧少于两帧
    pub fn frame_spacing(&self) -> Result<f64, StoreError> {
        if let Some(spacing) = self.layout.signed_spacing() {
            return Ok(spacing);
        }
        if self.frame_count < 2 {
            return Err(StoreError::IndeterminateSpacing(format!(
                "{} frame(s) loaded and no declared frame spacing",
                self.frame_count
            )));
        }
        let first = self.index_at(0);
        let last = self.index_at(self.frame_count - 1);
        let span = ((self.frame_count - 1) * self.range.step) as f64;
        Ok((last - first) / span)
    }

    /// 多采样子通道插值所需的首帧间距；单采样或无帧时不需要
    pub(crate) fn interpolation_spacing(&self, samples: usize) -> Result<f64, StoreError> {
        if samples <= 1 || self.frame_count == 0 {
            return Ok(0.0);
        }
        self.frame_spacing()
    }

    /// 帧 `frame` 之前一个原始帧的索引
    ///
    /// 首帧按 `first_spacing` 回推；其余帧按相邻已加载帧的索引差除以步长回推。
    pub(crate) fn previous_index(&self, frame: usize, first_spacing: f64) -> f64 {
        let current = self.index_at(frame);
        if frame == 0 {
            return current - first_spacing;
        }
        let before = self.index_at(frame - 1);
        current - (current - before) / self.range.step as f64
    }

    /// 内部帧、子通道内第 `sample` 个采样对应的索引
    pub fn sample_index_value(
        &self,
        frame: usize,
        channel: usize,
        sub_channel: usize,
        sample: usize,
    ) -> Result<f64, StoreError> {
        self.check_frame(frame)?;
        let span = self.span(channel, sub_channel)?;
        if sample >= span.samples {
            return Err(out_of_range("sample", sample, span.samples));
        }
        if span.samples == 1 {
            return Ok(self.index_at(frame));
        }
        let spacing = if frame == 0 { self.frame_spacing()? } else { 0.0 };
        let previous = self.previous_index(frame, spacing);
        Ok(sample_index(previous, self.index_at(frame), sample, span.samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_index() {
        assert_eq!(sample_index(99.0, 100.0, 0, 4), 99.25);
        assert_eq!(sample_index(99.0, 100.0, 3, 4), 100.0);
        assert_eq!(sample_index(100.0, 99.0, 1, 4), 99.5);
        assert_eq!(sample_index(10.0, 10.0, 2, 4), 10.0);
    }
}
