//! 字节源执行器
//!
//! 在可定位的逻辑记录字节流上按顺序执行访问事件，把解码值写入帧存储。

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use welllog_core::{LayoutError, StoreError, WordCodec};

use crate::layout::FrameLayout;
use crate::planner::{AccessEvent, AccessPlan, AccessPlanner, FrameRange};
use crate::store::FrameStore;

/// 执行器错误
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 一次执行的计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub events: usize,
    pub bytes_read: usize,
    pub bytes_skipped: usize,
    pub frames_extrapolated: usize,
}

/// 帧读取器
#[derive(Debug)]
pub struct FrameReader<R, C> {
    source: R,
    codec: C,
    buffer: Vec<u8>,
}

impl<R: Read + Seek, C: WordCodec> FrameReader<R, C> {
    /// `source` 须定位在逻辑记录的起点
    pub fn new(source: R, codec: C) -> Self {
        Self {
            source,
            codec,
            buffer: Vec::new(),
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// 按顺序执行 `plan`，写入 `store`
    ///
    /// `plan` 须由与 `store` 相同的布局、帧区间和已加载通道规划得到。
    pub fn execute(
        &mut self,
        plan: AccessPlan,
        store: &mut FrameStore,
    ) -> Result<ExecutionSummary, ReadError> {
        let range = plan.range();
        let mut summary = ExecutionSummary::default();

        for event in plan {
            summary.events += 1;
            match event {
                AccessEvent::Read {
                    byte_len,
                    frame_index,
                    channel_from,
                    channel_to,
                } => {
                    self.buffer.resize(byte_len, 0);
                    self.source.read_exact(&mut self.buffer)?;
                    summary.bytes_read += byte_len;
                    match range.internal_frame(frame_index) {
                        Some(frame) => store.populate(
                            &self.codec,
                            &self.buffer,
                            frame,
                            channel_from,
                            channel_to,
                        )?,
                        // 首帧未物化时记录头部的显式索引
                        None => store.seed_index(&self.codec, &self.buffer)?,
                    }
                }
                AccessEvent::Skip { byte_len, .. } => {
                    let offset = i64::try_from(byte_len).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidInput, "skip length overflows i64")
                    })?;
                    self.source.seek(SeekFrom::Current(offset))?;
                    summary.bytes_skipped += byte_len;
                }
                AccessEvent::Extrapolate {
                    frame_count,
                    frame_index,
                } => {
                    let frame = range.internal_frame(frame_index).ok_or(
                        LayoutError::IndexOutOfRange {
                            what: "frame",
                            index: frame_index,
                            limit: range.stop,
                        },
                    )?;
                    store.extrapolate(frame, frame_count)?;
                    summary.frames_extrapolated += frame_count;
                }
            }
        }

        debug!(?summary, "access plan executed");
        Ok(summary)
    }

    /// 建立帧存储，规划其已加载通道并执行，返回填充完成的存储
    pub fn load(
        &mut self,
        layout: Arc<FrameLayout>,
        range: FrameRange,
        channel_subset: Option<&[usize]>,
        index_channel: usize,
    ) -> Result<FrameStore, ReadError> {
        let mut store = FrameStore::new(Arc::clone(&layout), range, channel_subset, index_channel)?;
        let plan = AccessPlanner::new(&layout).plan(range, store.channels())?;
        let summary = self.execute(plan, &mut store)?;
        info!(
            frames = store.frame_count(),
            channels = store.channel_count(),
            bytes_read = summary.bytes_read,
            bytes_skipped = summary.bytes_skipped,
            "frames loaded"
        );
        Ok(store)
    }
}

/// 从 `source` 读取帧区间内的通道子集
///
/// # 参数
/// - `source`: 定位在逻辑记录起点的字节源
/// - `codec`: 数值编解码器
/// - `layout`: 帧布局
/// - `range`: 帧区间
/// - `channel_subset`: 通道子集；None 表示全部通道
/// - `index_channel`: 直接记录模式下的索引通道
pub fn load_frames<R: Read + Seek, C: WordCodec>(
    source: R,
    codec: C,
    layout: Arc<FrameLayout>,
    range: FrameRange,
    channel_subset: Option<&[usize]>,
    index_channel: usize,
) -> Result<FrameStore, ReadError> {
    FrameReader::new(source, codec).load(layout, range, channel_subset, index_channel)
}
