//! 帧区间

use welllog_core::LayoutError;

/// 半开帧区间：`start, start + step, ... < stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl FrameRange {
    /// 严格构造：负边界、`stop < start` 或 `step < 1` 均为契约错误
    pub fn new(start: i64, stop: i64, step: i64) -> Result<Self, LayoutError> {
        let negative = |what, value| Err(LayoutError::NegativeLength { what, value });
        if start < 0 {
            return negative("start", start);
        }
        if stop < 0 {
            return negative("stop", stop);
        }
        if step < 1 {
            return negative("step", step);
        }
        if stop < start {
            return negative("stop - start", stop - start);
        }
        Ok(Self {
            start: start as usize,
            stop: stop as usize,
            step: step as usize,
        })
    }

    /// 覆盖全部帧
    pub fn all(frame_count: usize) -> Self {
        Self {
            start: 0,
            stop: frame_count,
            step: 1,
        }
    }

    /// 切片式构造：负值表示从末尾倒数，越界截断到 `0..=frame_count`
    ///
    /// 只在 API 边界做这种归一化，内部一律使用非负区间。
    pub fn from_slice(
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
        frame_count: usize,
    ) -> Result<Self, LayoutError> {
        let step = step.unwrap_or(1);
        if step < 1 {
            return Err(LayoutError::NegativeLength {
                what: "step",
                value: step,
            });
        }
        let total = frame_count as i64;
        let normalize = |bound: i64| {
            let bound = if bound < 0 { bound + total } else { bound };
            bound.clamp(0, total)
        };
        let start = start.map_or(0, normalize);
        let stop = stop.map_or(total, normalize).max(start);
        Self::new(start, stop, step)
    }

    /// 区间内实际物化的帧数
    pub fn frame_count(&self) -> usize {
        if self.stop <= self.start {
            0
        } else {
            (self.stop - self.start).div_ceil(self.step)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// 内部帧序号对应的外部帧号
    pub fn external_frame(&self, internal: usize) -> usize {
        self.start + internal * self.step
    }

    /// 外部帧号对应的内部帧序号，未物化返回 None
    pub fn internal_frame(&self, external: usize) -> Option<usize> {
        if external < self.start || external >= self.stop {
            return None;
        }
        let offset = external - self.start;
        (offset % self.step == 0).then(|| offset / self.step)
    }

    /// 最后一个物化帧的外部帧号
    pub fn last_frame(&self) -> Option<usize> {
        self.frame_count()
            .checked_sub(1)
            .map(|last| self.external_frame(last))
    }

    /// 依次产生物化帧的外部帧号
    pub fn frames(&self) -> impl Iterator<Item = usize> {
        (self.start..self.stop).step_by(self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        assert_eq!(FrameRange::new(0, 4, 1).unwrap().frame_count(), 4);
        assert_eq!(FrameRange::new(1, 8, 3).unwrap().frame_count(), 3);
        assert_eq!(FrameRange::new(5, 5, 2).unwrap().frame_count(), 0);
        let range = FrameRange::new(2, 11, 4).unwrap();
        assert_eq!(range.frames().collect::<Vec<_>>(), vec![2, 6, 10]);
        assert_eq!(range.last_frame(), Some(10));
    }

    #[test]
    fn test_internal_external_mapping() {
        let range = FrameRange::new(3, 12, 3).unwrap();
        assert_eq!(range.external_frame(2), 9);
        assert_eq!(range.internal_frame(9), Some(2));
        assert_eq!(range.internal_frame(10), None);
        assert_eq!(range.internal_frame(0), None);
        assert_eq!(range.internal_frame(12), None);
    }

    #[test]
    fn test_contract_violations() {
        assert!(matches!(
            FrameRange::new(-1, 4, 1),
            Err(LayoutError::NegativeLength { what: "start", .. })
        ));
        assert!(matches!(
            FrameRange::new(0, -4, 1),
            Err(LayoutError::NegativeLength { what: "stop", .. })
        ));
        assert!(matches!(
            FrameRange::new(0, 4, 0),
            Err(LayoutError::NegativeLength { what: "step", .. })
        ));
        assert!(matches!(
            FrameRange::new(4, 2, 1),
            Err(LayoutError::NegativeLength { .. })
        ));
    }

    #[test]
    fn test_from_slice_normalizes_negative_bounds() {
        let range = FrameRange::from_slice(Some(-3), None, None, 10).unwrap();
        assert_eq!((range.start, range.stop, range.step), (7, 10, 1));

        let range = FrameRange::from_slice(None, Some(-1), Some(2), 10).unwrap();
        assert_eq!(range.frames().collect::<Vec<_>>(), vec![0, 2, 4, 6, 8]);

        let range = FrameRange::from_slice(Some(-20), Some(50), None, 10).unwrap();
        assert_eq!((range.start, range.stop), (0, 10));

        let range = FrameRange::from_slice(Some(8), Some(2), None, 10).unwrap();
        assert!(range.is_empty());

        assert!(FrameRange::from_slice(None, None, Some(-1), 10).is_err());
    }
}
