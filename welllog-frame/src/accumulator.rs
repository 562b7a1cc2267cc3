//! 单遍统计累加器
//!
//! 每个累加器逐个接收非缺失值，结束后给出一个结果；数据不足时结果为 None。

use welllog_core::utils::frexp;

/// 单遍累加器
pub trait Accumulator {
    type Output;

    fn add(&mut self, value: f64);

    fn value(&self) -> Option<Self::Output>;
}

/// 内置累加器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulatorKind {
    Min,
    Max,
    Mean,
    StdDev,
    Count,
    CountIncrease,
    CountEqual,
    CountDecrease,
    Bias,
    Drift,
    Activity,
}

impl AccumulatorKind {
    pub const ALL: [AccumulatorKind; 11] = [
        AccumulatorKind::Min,
        AccumulatorKind::Max,
        AccumulatorKind::Mean,
        AccumulatorKind::StdDev,
        AccumulatorKind::Count,
        AccumulatorKind::CountIncrease,
        AccumulatorKind::CountEqual,
        AccumulatorKind::CountDecrease,
        AccumulatorKind::Bias,
        AccumulatorKind::Drift,
        AccumulatorKind::Activity,
    ];

    /// 创建一个全新状态的累加器
    pub fn build(self) -> Box<dyn Accumulator<Output = f64>> {
        match self {
            AccumulatorKind::Min => Box::<Min>::default(),
            AccumulatorKind::Max => Box::<Max>::default(),
            AccumulatorKind::Mean => Box::<Mean>::default(),
            AccumulatorKind::StdDev => Box::<StdDev>::default(),
            AccumulatorKind::Count => Box::<Count>::default(),
            AccumulatorKind::CountIncrease => Box::new(Trend::new(TrendMeasure::Increase)),
            AccumulatorKind::CountEqual => Box::new(Trend::new(TrendMeasure::Equal)),
            AccumulatorKind::CountDecrease => Box::new(Trend::new(TrendMeasure::Decrease)),
            AccumulatorKind::Bias => Box::new(Trend::new(TrendMeasure::Bias)),
            AccumulatorKind::Drift => Box::<Drift>::default(),
            AccumulatorKind::Activity => Box::<Activity>::default(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccumulatorKind::Min => "min",
            AccumulatorKind::Max => "max",
            AccumulatorKind::Mean => "mean",
            AccumulatorKind::StdDev => "stddev",
            AccumulatorKind::Count => "count",
            AccumulatorKind::CountIncrease => "count_increase",
            AccumulatorKind::CountEqual => "count_equal",
            AccumulatorKind::CountDecrease => "count_decrease",
            AccumulatorKind::Bias => "bias",
            AccumulatorKind::Drift => "drift",
            AccumulatorKind::Activity => "activity",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Min {
    min: Option<f64>,
}

impl Accumulator for Min {
    type Output = f64;

    fn add(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
    }

    fn value(&self) -> Option<f64> {
        self.min
    }
}

#[derive(Debug, Default, Clone)]
pub struct Max {
    max: Option<f64>,
}

impl Accumulator for Max {
    type Output = f64;

    fn add(&mut self, value: f64) {
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn value(&self) -> Option<f64> {
        self.max
    }
}

#[derive(Debug, Default, Clone)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Accumulator for Mean {
    type Output = f64;

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// 总体标准差（Welford 递推），至少需要两个值
#[derive(Debug, Default, Clone)]
pub struct StdDev {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator for StdDev {
    type Output = f64;

    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn value(&self) -> Option<f64> {
        (self.count >= 2).then(|| (self.m2 / self.count as f64).sqrt())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Count {
    count: usize,
}

impl Accumulator for Count {
    type Output = f64;

    fn add(&mut self, _value: f64) {
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        Some(self.count as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMeasure {
    Increase,
    Equal,
    Decrease,
    /// `(增 - 减) / 比较次数`
    Bias,
}

/// 与前一个值比较的趋势计数
#[derive(Debug, Clone)]
pub struct Trend {
    measure: TrendMeasure,
    previous: Option<f64>,
    increase: usize,
    equal: usize,
    decrease: usize,
}

impl Trend {
    pub fn new(measure: TrendMeasure) -> Self {
        Self {
            measure,
            previous: None,
            increase: 0,
            equal: 0,
            decrease: 0,
        }
    }

    fn compared(&self) -> usize {
        self.increase + self.equal + self.decrease
    }
}

impl Accumulator for Trend {
    type Output = f64;

    fn add(&mut self, value: f64) {
        if let Some(previous) = self.previous {
            if value > previous {
                self.increase += 1;
            } else if value < previous {
                self.decrease += 1;
            } else {
                self.equal += 1;
            }
        }
        self.previous = Some(value);
    }

    fn value(&self) -> Option<f64> {
        let compared = self.compared();
        if compared == 0 {
            return None;
        }
        let result = match self.measure {
            TrendMeasure::Increase => self.increase as f64,
            TrendMeasure::Equal => self.equal as f64,
            TrendMeasure::Decrease => self.decrease as f64,
            TrendMeasure::Bias => {
                (self.increase as f64 - self.decrease as f64) / compared as f64
            }
        };
        Some(result)
    }
}

/// `(末值 - 首值) / 个数`
#[derive(Debug, Default, Clone)]
pub struct Drift {
    first: Option<f64>,
    last: f64,
    count: usize,
}

impl Accumulator for Drift {
    type Output = f64;

    fn add(&mut self, value: f64) {
        self.first.get_or_insert(value);
        self.last = value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        self.first
            .map(|first| (self.last - first) / self.count as f64)
    }
}

/// 对数尺度粗糙度：`|v|` 的 `指数 + 尾数` 逐项差分的均方根
#[derive(Debug, Default, Clone)]
pub struct Activity {
    previous: Option<f64>,
    sum_squares: f64,
    differences: usize,
}

impl Activity {
    fn log_term(value: f64) -> f64 {
        let (mantissa, exponent) = frexp(value.abs());
        f64::from(exponent) + mantissa
    }
}

impl Accumulator for Activity {
    type Output = f64;

    fn add(&mut self, value: f64) {
        let term = Self::log_term(value);
        if let Some(previous) = self.previous {
            let diff = term - previous;
            self.sum_squares += diff * diff;
            self.differences += 1;
        }
        self.previous = Some(term);
    }

    fn value(&self) -> Option<f64> {
        (self.differences > 0).then(|| (self.sum_squares / self.differences as f64).sqrt())
    }
}
