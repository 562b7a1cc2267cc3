//! 统计引擎：对每个子通道的全部非缺失值单遍运行一组累加器

use tracing::debug;
use welllog_core::StoreError;

use super::core::FrameStore;
use crate::accumulator::{Accumulator, AccumulatorKind};

/// `[子通道][累加器] -> 结果`
pub type ChannelStatistics = Vec<Vec<Option<f64>>>;

impl FrameStore {
    /// 用内置累加器统计一个通道
    pub fn accumulate(
        &self,
        channel: usize,
        kinds: &[AccumulatorKind],
    ) -> Result<ChannelStatistics, StoreError> {
        self.accumulate_with::<dyn Accumulator<Output = f64>, _>(channel, || {
            kinds.iter().map(|kind| kind.build()).collect()
        })
    }

    /// 用任意累加器统计一个通道，`factory` 为每个子通道创建一组新状态的累加器
    ///
    /// 缺失值按与缺失哨兵值精确相等判定并跳过。
    ///
    /// # 返回
    /// - `Err(StoreError::Empty)`: 未加载任何帧或通道
    pub fn accumulate_with<A, F>(
        &self,
        channel: usize,
        factory: F,
    ) -> Result<ChannelStatistics, StoreError>
    where
        A: Accumulator<Output = f64> + ?Sized,
        F: Fn() -> Vec<Box<A>>,
    {
        if self.frame_count == 0 || self.channels.is_empty() {
            return Err(StoreError::Empty {
                frames: self.frame_count,
                channels: self.channels.len(),
            });
        }
        let internal = self.internal_channel_index(channel)?;

        let mut statistics = Vec::with_capacity(self.slice_tree[internal].len());
        for span in &self.slice_tree[internal] {
            let mut reducers = factory();
            for frame in 0..self.frame_count {
                let row = self.row_unchecked(frame);
                for k in 0..span.len {
                    let value = row[span.slot(k)];
                    if self.is_absent(value) {
                        continue;
                    }
                    for reducer in reducers.iter_mut() {
                        reducer.add(value);
                    }
                }
            }
            statistics.push(reducers.iter().map(|reducer| reducer.value()).collect());
        }
        debug!(channel, sub_channels = statistics.len(), "channel statistics computed");
        Ok(statistics)
    }

    /// 统计全部已加载通道，按外部通道号返回
    pub fn accumulate_all(
        &self,
        kinds: &[AccumulatorKind],
    ) -> Result<Vec<(usize, ChannelStatistics)>, StoreError> {
        self.channels
            .iter()
            .map(|&channel| Ok((channel, self.accumulate(channel, kinds)?)))
            .collect()
    }
}
