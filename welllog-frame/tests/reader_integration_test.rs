//! 端到端集成测试：配置 → 布局 → 规划 → 字节源执行 → 帧存储

use std::io::{Cursor, ErrorKind};
use std::sync::Arc;

use welllog_core::{FormatConfig, RepCodeCodec, WordCodec};
use welllog_frame::{
    load_frames, AccessPlanner, AccumulatorKind, FrameLayout, FrameRange, FrameReader, ReadError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config(mode: &str) -> FormatConfig {
    let value = serde_json::json!({
        "recording_mode": mode,
        "direction": "down",
        "frame_spacing": 0.5,
        "spacing_units": "M",
        "index_units": "M",
        "index_rep_code": 68,
        "channels": [
            { "name": "DEPT", "rep_code": 68 },
            { "name": "WAVE", "rep_code": 79, "sub_channels": [{ "samples": 4 }] },
            { "name": "CALI", "rep_code": 79 },
        ]
    });
    FormatConfig::from_json(&value.to_string()).unwrap()
}

/// 生成 `frames` 帧的逻辑记录；间接模式在记录头写入显式索引
fn record(layout: &FrameLayout, frames: usize, head_index: Option<f64>) -> Vec<u8> {
    let codec = RepCodeCodec::new();
    let mut bytes = Vec::new();
    if let Some(index) = head_index {
        bytes.extend(codec.encode(layout.index_rep_code(), index).unwrap());
    }
    for frame in 0..frames {
        let depth = 1000.0 + frame as f64 * 0.5;
        bytes.extend(codec.encode(68, depth).unwrap());
        for sample in 0..4 {
            bytes.extend(codec.encode(79, (frame * 10 + sample) as f64).unwrap());
        }
        bytes.extend(codec.encode(79, -(frame as f64)).unwrap());
    }
    bytes
}

#[test]
fn test_direct_end_to_end() {
    init_tracing();
    println!("\n=== 直接记录模式端到端读取 ===\n");
    let layout = Arc::new(FrameLayout::new(&config("direct"), &RepCodeCodec::new()).unwrap());
    let bytes = record(&layout, 6, None);
    assert_eq!(layout.frame_count_for(bytes.len() as i64).unwrap(), 6);

    let range = FrameRange::from_slice(Some(1), None, Some(2), 6).unwrap();
    let store = load_frames(
        Cursor::new(bytes),
        RepCodeCodec::new(),
        Arc::clone(&layout),
        range,
        Some(&[2][..]),
        0,
    )
    .unwrap();

    assert_eq!(store.frame_count(), 3);
    assert_eq!(store.channels(), &[0, 2]);
    let depths: Vec<f64> = (0..3).map(|f| store.index_value(f).unwrap()).collect();
    assert_eq!(depths, vec![1000.5, 1001.5, 1002.5]);
    let cali: Vec<f64> = store.values(2, 0).unwrap().collect();
    assert_eq!(cali, vec![-1.0, -3.0, -5.0]);

    let stats = store.accumulate(2, &[AccumulatorKind::Drift, AccumulatorKind::CountDecrease]).unwrap();
    assert_eq!(stats, vec![vec![Some(-4.0 / 3.0), Some(2.0)]]);
}

#[test]
fn test_indirect_end_to_end_with_stride() {
    init_tracing();
    println!("\n=== 间接记录模式端到端读取（起点 1，步长 2）===\n");
    let layout = Arc::new(FrameLayout::new(&config("indirect"), &RepCodeCodec::new()).unwrap());
    let bytes = record(&layout, 6, Some(2000.0));
    assert_eq!(layout.frame_count_for(bytes.len() as i64).unwrap(), 6);

    let range = FrameRange::new(1, 6, 2).unwrap();
    let mut reader = FrameReader::new(Cursor::new(bytes), RepCodeCodec::new());
    let store = reader.load(Arc::clone(&layout), range, Some(&[1][..]), 0).unwrap();

    // 索引来自记录头并按声明间距外推，不读取 DEPT 通道
    assert_eq!(store.explicit_index(), Some(&[2000.5, 2001.5, 2002.5][..]));
    assert_eq!(store.channels(), &[1]);

    let wave: Vec<f64> = store.values(1, 0).unwrap().collect();
    assert_eq!(&wave[..4], &[10.0, 11.0, 12.0, 13.0]);
    assert_eq!(&wave[8..], &[50.0, 51.0, 52.0, 53.0]);

    let points: Vec<(f64, f64)> = store.points(1, 0).unwrap().collect();
    assert_eq!(points[0], (2000.125, 10.0));
    assert_eq!(points[7], (2001.5, 33.0));
}

#[test]
fn test_execute_reports_summary() {
    init_tracing();
    let layout = Arc::new(FrameLayout::new(&config("indirect"), &RepCodeCodec::new()).unwrap());
    let bytes = record(&layout, 4, Some(0.0));
    let range = FrameRange::all(4);
    let mut store = welllog_frame::FrameStore::new(Arc::clone(&layout), range, None, 0).unwrap();
    let plan = AccessPlanner::new(&layout).plan(range, store.channels()).unwrap();

    let mut reader = FrameReader::new(Cursor::new(bytes), RepCodeCodec::new());
    let summary = reader.execute(plan, &mut store).unwrap();

    assert_eq!(summary.bytes_read, 4 + 4 * layout.frame_byte_size());
    assert_eq!(summary.bytes_skipped, 0);
    assert_eq!(summary.frames_extrapolated, 3);
    assert_eq!(store.index_value(3).unwrap(), 1.5);
    assert_eq!(reader.into_inner().position() as usize, 4 + 4 * layout.frame_byte_size());
}

#[test]
fn test_truncated_source_is_io_error() {
    init_tracing();
    let layout = Arc::new(FrameLayout::new(&config("direct"), &RepCodeCodec::new()).unwrap());
    let mut bytes = record(&layout, 3, None);
    bytes.truncate(bytes.len() - 1);

    let result = load_frames(
        Cursor::new(bytes),
        RepCodeCodec::new(),
        layout,
        FrameRange::all(3),
        None,
        0,
    );
    match result {
        Err(ReadError::Io(err)) => assert_eq!(err.kind(), ErrorKind::UnexpectedEof),
        other => panic!("expected I/O error, got {other:?}"),
    }
}

#[test]
fn test_word_length_matches_layout() {
    let codec = RepCodeCodec::new();
    let layout = FrameLayout::new(&config("indirect"), &codec).unwrap();
    assert_eq!(layout.index_word_length(), codec.word_length(68).unwrap());
    assert_eq!(layout.frame_byte_size(), 4 + 8 + 2);
}
