//! 访问规划器核心实现

use std::collections::VecDeque;

use tracing::debug;
use welllog_core::LayoutError;

use super::event::AccessEvent;
use super::range::FrameRange;
use crate::layout::FrameLayout;

/// 帧内一段选中或未选中的连续通道
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelRun {
    selected: bool,
    byte_len: usize,
    channel_from: usize,
    channel_to: usize,
}

/// 访问规划器
///
/// 纯函数式：每次 `plan` 返回一个独立、可重启的有限惰性序列。
#[derive(Debug, Clone, Copy)]
pub struct AccessPlanner<'a> {
    layout: &'a FrameLayout,
}

impl<'a> AccessPlanner<'a> {
    pub fn new(layout: &'a FrameLayout) -> Self {
        Self { layout }
    }

    /// 规划读取区间 `range` 内通道子集 `channels` 所需的事件序列
    ///
    /// # 参数
    /// - `range`: 帧区间
    /// - `channels`: 通道子集，任意顺序，可重复；内部去重并升序排列
    ///
    /// # 返回
    /// - `Ok(AccessPlan)`: 事件序列
    /// - `Err(LayoutError::IndexOutOfRange)`: 通道索引越界，或跳过的字节数超出可寻址范围
    pub fn plan(&self, range: FrameRange, channels: &[usize]) -> Result<AccessPlan, LayoutError> {
        let channel_count = self.layout.channel_count();
        let mut selected = vec![false; channel_count];
        for &ch in channels {
            if ch >= channel_count {
                return Err(LayoutError::IndexOutOfRange {
                    what: "channel",
                    index: ch,
                    limit: channel_count,
                });
            }
            selected[ch] = true;
        }

        // 整帧跳过的字节数必须可寻址
        if !range.is_empty() {
            self.layout.frames_byte_len(range.start)?;
        }
        if range.frame_count() > 1 {
            self.layout.frames_byte_len(range.step - 1)?;
        }

        // 按声明顺序对选择掩码做游程合并
        let mut runs: Vec<ChannelRun> = Vec::new();
        for (ch, (channel, &is_selected)) in self.layout.channels().iter().zip(&selected).enumerate()
        {
            match runs.last_mut() {
                Some(run) if run.selected == is_selected => {
                    run.byte_len += channel.byte_length;
                    run.channel_to = ch + 1;
                }
                _ => runs.push(ChannelRun {
                    selected: is_selected,
                    byte_len: channel.byte_length,
                    channel_from: ch,
                    channel_to: ch + 1,
                }),
            }
        }

        debug!(
            start = range.start,
            stop = range.stop,
            step = range.step,
            frames = range.frame_count(),
            runs = runs.len(),
            "access plan created"
        );

        Ok(AccessPlan {
            runs,
            range,
            frame_count: range.frame_count(),
            frame_byte_size: self.layout.frame_byte_size(),
            channel_count,
            indirect: self.layout.is_indirect(),
            index_word_length: self.layout.index_word_length(),
            next_frame: 0,
            pending: VecDeque::new(),
        })
    }
}

/// 惰性事件序列
///
/// 克隆即得到一个从当前位置继续的独立序列；`restart` 回到起点。
#[derive(Debug, Clone)]
pub struct AccessPlan {
    runs: Vec<ChannelRun>,
    range: FrameRange,
    frame_count: usize,
    frame_byte_size: usize,
    channel_count: usize,
    indirect: bool,
    index_word_length: usize,
    next_frame: usize,
    pending: VecDeque<AccessEvent>,
}

impl AccessPlan {
    pub fn range(&self) -> FrameRange {
        self.range
    }

    /// 回到序列起点
    pub fn restart(&mut self) {
        self.next_frame = 0;
        self.pending.clear();
    }

    fn whole_frames_skip(&self, frames: usize, frame_index: usize) -> AccessEvent {
        AccessEvent::Skip {
            byte_len: frames * self.frame_byte_size,
            frame_index,
            channel_from: Some(0),
            channel_to: Some(self.channel_count),
        }
    }

    /// 生成第 `internal` 个物化帧的事件
    fn fill_frame(&mut self, internal: usize) {
        let frame = self.range.external_frame(internal);
        let step = self.range.step;

        if internal == 0 {
            if self.range.start > 0 {
                if self.indirect {
                    // 记录头部的显式索引只出现一次，先读出再外推
                    self.pending.push_back(AccessEvent::Read {
                        byte_len: self.index_word_length,
                        frame_index: 0,
                        channel_from: None,
                        channel_to: None,
                    });
                }
                let leading = self.whole_frames_skip(self.range.start, 0);
                self.pending.push_back(leading);
                if self.indirect {
                    self.pending.push_back(AccessEvent::Extrapolate {
                        frame_count: self.range.start,
                        frame_index: frame,
                    });
                }
                self.push_runs(frame, false);
            } else {
                self.push_runs(frame, self.indirect);
            }
            return;
        }

        if step > 1 {
            let skipped = self.whole_frames_skip(step - 1, frame - (step - 1));
            self.pending.push_back(skipped);
        }
        if self.indirect {
            self.pending.push_back(AccessEvent::Extrapolate {
                frame_count: step,
                frame_index: frame,
            });
        }
        self.push_runs(frame, false);
    }

    /// 按游程生成一帧内的读/跳事件；`with_index` 时在帧首读取显式索引
    fn push_runs(&mut self, frame: usize, with_index: bool) {
        for (k, run) in self.runs.iter().enumerate() {
            let channel_from = Some(run.channel_from);
            let channel_to = Some(run.channel_to);
            if k == 0 && with_index {
                if run.selected {
                    self.pending.push_back(AccessEvent::Read {
                        byte_len: self.index_word_length + run.byte_len,
                        frame_index: frame,
                        channel_from: None,
                        channel_to,
                    });
                    continue;
                }
                self.pending.push_back(AccessEvent::Read {
                    byte_len: self.index_word_length,
                    frame_index: frame,
                    channel_from: None,
                    channel_to: None,
                });
            }
            let event = if run.selected {
                AccessEvent::Read {
                    byte_len: run.byte_len,
                    frame_index: frame,
                    channel_from,
                    channel_to,
                }
            } else {
                AccessEvent::Skip {
                    byte_len: run.byte_len,
                    frame_index: frame,
                    channel_from,
                    channel_to,
                }
            };
            self.pending.push_back(event);
        }
    }
}

impl Iterator for AccessPlan {
    type Item = AccessEvent;

    fn next(&mut self) -> Option<AccessEvent> {
        if self.pending.is_empty() && self.next_frame < self.frame_count {
            let internal = self.next_frame;
            self.next_frame += 1;
            self.fill_frame(internal);
        }
        self.pending.pop_front()
    }
}
