//! 访问事件

/// 规划器产生的单个事件
///
/// 通道边界为半开区间 `channel_from..channel_to`；`channel_from` 为 None
/// 表示事件以显式索引字开头。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessEvent {
    /// 读取字节
    Read {
        byte_len: usize,
        frame_index: usize,
        channel_from: Option<usize>,
        channel_to: Option<usize>,
    },
    /// 跳过字节
    Skip {
        byte_len: usize,
        frame_index: usize,
        channel_from: Option<usize>,
        channel_to: Option<usize>,
    },
    /// 索引值需推算而非读取
    Extrapolate {
        frame_count: usize,
        frame_index: usize,
    },
}

impl AccessEvent {
    /// 事件消耗的字节数，外推事件为 0
    pub fn byte_len(&self) -> usize {
        match *self {
            AccessEvent::Read { byte_len, .. } | AccessEvent::Skip { byte_len, .. } => byte_len,
            AccessEvent::Extrapolate { .. } => 0,
        }
    }

    pub fn frame_index(&self) -> usize {
        match *self {
            AccessEvent::Read { frame_index, .. }
            | AccessEvent::Skip { frame_index, .. }
            | AccessEvent::Extrapolate { frame_index, .. } => frame_index,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, AccessEvent::Read { .. })
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, AccessEvent::Skip { .. })
    }
}
