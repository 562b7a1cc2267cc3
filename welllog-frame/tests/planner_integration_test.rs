//! 访问规划器集成测试：字节精确性与游程合并

use proptest::prelude::*;
use welllog_core::codec::{
    REP_CODE_FLOAT_32, REP_CODE_INTERLEAVED_I8, REP_CODE_INTERLEAVED_U8, REP_CODE_INT_16,
    REP_CODE_INT_32, REP_CODE_INT_8, REP_CODE_UINT_8,
};
use welllog_core::{
    ChannelSpec, Direction, FormatConfig, RecordingMode, RepCodeCodec, SubChannelShape,
    DEFAULT_ABSENT_VALUE,
};
use welllog_frame::{AccessEvent, AccessPlanner, FrameLayout, FrameRange};

fn build_layout(mode: RecordingMode, channels: Vec<(u8, Vec<(usize, usize)>)>) -> FrameLayout {
    let channels = channels
        .into_iter()
        .enumerate()
        .map(|(position, (code, shapes))| {
            let shapes = shapes
                .into_iter()
                .map(|(samples, bursts)| SubChannelShape::new(samples, bursts))
                .collect();
            ChannelSpec::with_shapes(&format!("CH{position}"), code, shapes)
        })
        .collect();
    let config = FormatConfig {
        recording_mode: mode,
        direction: Direction::Down,
        frame_spacing: Some(0.1),
        spacing_units: "M".to_string(),
        index_units: "M".to_string(),
        index_rep_code: REP_CODE_FLOAT_32,
        absent_value: DEFAULT_ABSENT_VALUE,
        channels,
    };
    FrameLayout::new(&config, &RepCodeCodec::new()).unwrap()
}

fn generic_channel_strategy() -> impl Strategy<Value = (u8, Vec<(usize, usize)>)> {
    (
        prop::sample::select(vec![
            REP_CODE_INT_8,
            REP_CODE_UINT_8,
            REP_CODE_INT_16,
            REP_CODE_INT_32,
            REP_CODE_FLOAT_32,
        ]),
        prop::collection::vec((1usize..4, 1usize..3), 1..3),
    )
}

/// 交织通道：1..=5 个同形状快通道，后随若干 1×1 慢通道
fn interleaved_channel_strategy() -> impl Strategy<Value = (u8, Vec<(usize, usize)>)> {
    (
        prop::sample::select(vec![REP_CODE_INTERLEAVED_I8, REP_CODE_INTERLEAVED_U8]),
        1usize..=5,
        2usize..17,
        0usize..4,
    )
        .prop_map(|(code, num_fast, fast_samples, num_slow)| {
            let mut shapes = vec![(fast_samples, 1); num_fast];
            shapes.extend(std::iter::repeat((1, 1)).take(num_slow));
            (code, shapes)
        })
}

fn channel_strategy() -> impl Strategy<Value = (u8, Vec<(usize, usize)>)> {
    prop_oneof![
        3 => generic_channel_strategy(),
        1 => interleaved_channel_strategy(),
    ]
}

fn mode_strategy() -> impl Strategy<Value = RecordingMode> {
    prop_oneof![Just(RecordingMode::Direct), Just(RecordingMode::Indirect)]
}

/// 单帧内选择掩码的连续选中段数
fn selected_runs(mask: &[bool]) -> usize {
    mask.iter()
        .enumerate()
        .filter(|&(ch, &selected)| selected && (ch == 0 || !mask[ch - 1]))
        .count()
}

proptest! {
    #[test]
    fn prop_read_bytes_are_exact(
        mode in mode_strategy(),
        mut channels in prop::collection::vec(channel_strategy(), 1..6),
        interleaved in interleaved_channel_strategy(),
        position in 0usize..6,
        start in 0usize..5,
        frames in 0usize..8,
        step in 1usize..=3,
    ) {
        // 至少包含一个交织通道
        channels.insert(position.min(channels.len()), interleaved);
        let layout = build_layout(mode, channels);
        let stop = start + frames * step;
        let range = FrameRange::new(start as i64, stop as i64, step as i64).unwrap();
        let all: Vec<usize> = (0..layout.channel_count()).collect();
        let events: Vec<AccessEvent> = AccessPlanner::new(&layout).plan(range, &all).unwrap().collect();

        let read: usize = events.iter().filter(|e| e.is_read()).map(|e| e.byte_len()).sum();
        let count = range.frame_count();
        let header = if count > 0 { layout.record_header_length() } else { 0 };
        prop_assert_eq!(read, count * layout.frame_byte_size() + header);

        // 读与跳合计恰好覆盖到最后一个请求帧的末尾
        let covered: usize = events.iter().map(|e| e.byte_len()).sum();
        let expected = match range.last_frame() {
            Some(last) => layout.channel_byte_offset(0, last as i64 + 1).unwrap(),
            None => 0,
        };
        prop_assert_eq!(covered, expected);
    }

    #[test]
    fn prop_selected_runs_are_coalesced(
        mut channels in prop::collection::vec(channel_strategy(), 1..7),
        interleaved in interleaved_channel_strategy(),
        position in 0usize..7,
        seed in prop::collection::vec(any::<bool>(), 8),
    ) {
        channels.insert(position.min(channels.len()), interleaved);
        let layout = build_layout(RecordingMode::Direct, channels);
        let mask = &seed[..layout.channel_count()];
        let selected: Vec<usize> = (0..mask.len()).filter(|&ch| mask[ch]).collect();
        let events: Vec<AccessEvent> = AccessPlanner::new(&layout)
            .plan(FrameRange::all(1), &selected)
            .unwrap()
            .collect();

        let reads: Vec<&AccessEvent> = events.iter().filter(|e| e.is_read()).collect();
        prop_assert_eq!(reads.len(), selected_runs(mask));

        for pair in events.windows(2) {
            prop_assert_ne!(pair[0].is_read(), pair[1].is_read());
        }
        for event in &events {
            if let AccessEvent::Read { byte_len, channel_from: Some(from), channel_to: Some(to), .. }
            | AccessEvent::Skip { byte_len, channel_from: Some(from), channel_to: Some(to), .. } = event
            {
                let expected: usize = layout.channels()[*from..*to].iter().map(|c| c.byte_length).sum();
                prop_assert_eq!(*byte_len, expected);
            }
        }
    }

    #[test]
    fn prop_plan_is_restartable(
        mode in mode_strategy(),
        channels in prop::collection::vec(channel_strategy(), 1..5),
        frames in 0usize..6,
        step in 1usize..=3,
    ) {
        let layout = build_layout(mode, channels);
        let range = FrameRange::new(1, (1 + frames * step) as i64, step as i64).unwrap();
        let planner = AccessPlanner::new(&layout);
        let mut plan = planner.plan(range, &[0]).unwrap();
        let first: Vec<AccessEvent> = plan.by_ref().collect();
        plan.restart();
        let second: Vec<AccessEvent> = plan.collect();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, planner.plan(range, &[0]).unwrap().collect::<Vec<_>>());
    }
}

#[test]
fn test_scenario_a_direct_first_channel() {
    println!("\n=== 直接记录模式：只读第 0 通道 ===\n");
    let layout = build_layout(
        RecordingMode::Direct,
        vec![
            (REP_CODE_FLOAT_32, vec![(1, 1)]),
            (REP_CODE_FLOAT_32, vec![(2, 1)]),
            (REP_CODE_INT_16, vec![(1, 1)]),
            (REP_CODE_INT_8, vec![(4, 4)]),
            (REP_CODE_INT_16, vec![(1, 1)]),
        ],
    );
    assert_eq!(layout.frame_byte_size(), 32);

    let events: Vec<AccessEvent> = AccessPlanner::new(&layout)
        .plan(FrameRange::new(0, 4, 1).unwrap(), &[0])
        .unwrap()
        .collect();
    for event in &events {
        println!("  {event:?}");
    }

    assert_eq!(events.len(), 8);
    for (frame, pair) in events.chunks(2).enumerate() {
        assert_eq!(
            pair[0],
            AccessEvent::Read {
                byte_len: 4,
                frame_index: frame,
                channel_from: Some(0),
                channel_to: Some(1),
            }
        );
        assert_eq!(
            pair[1],
            AccessEvent::Skip {
                byte_len: 28,
                frame_index: frame,
                channel_from: Some(1),
                channel_to: Some(5),
            }
        );
    }
}

#[test]
fn test_scenario_b_indirect_first_channel() {
    println!("\n=== 间接记录模式：只读第 0 通道 ===\n");
    let layout = build_layout(
        RecordingMode::Indirect,
        vec![
            (REP_CODE_FLOAT_32, vec![(1, 1)]),
            (REP_CODE_FLOAT_32, vec![(2, 1)]),
            (REP_CODE_INT_16, vec![(1, 1)]),
            (REP_CODE_INT_8, vec![(4, 4)]),
            (REP_CODE_INT_16, vec![(1, 1)]),
        ],
    );
    let events: Vec<AccessEvent> = AccessPlanner::new(&layout)
        .plan(FrameRange::new(0, 4, 1).unwrap(), &[0])
        .unwrap()
        .collect();
    for event in &events {
        println!("  {event:?}");
    }

    assert_eq!(
        events[0],
        AccessEvent::Read {
            byte_len: 8,
            frame_index: 0,
            channel_from: None,
            channel_to: Some(1),
        }
    );
    let shape: Vec<(char, usize)> = events[1..]
        .iter()
        .map(|e| match *e {
            AccessEvent::Read { byte_len, .. } => ('R', byte_len),
            AccessEvent::Skip { byte_len, .. } => ('S', byte_len),
            AccessEvent::Extrapolate { frame_count, .. } => ('E', frame_count),
        })
        .collect();
    let per_frame = [('S', 28), ('E', 1), ('R', 4)];
    let expected: Vec<_> = per_frame
        .iter()
        .copied()
        .cycle()
        .take(9)
        .chain([('S', 28)])
        .collect();
    assert_eq!(shape, expected);
}
