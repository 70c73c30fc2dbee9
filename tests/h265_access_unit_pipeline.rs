//! H.265 访问单元提取集成测试

use nalu::codec::parsers::h265::HevcNalUnitType;
use nalu::codec::{
    ExtractStatus, H265Boundary, MediaSample, MediaType, StreamingExtractor, TimestampMode,
    VideoCodec,
};
use nalu::format::{
    AnnexBStreamReader, IndexedMediaSource, IoContext, LoopConfig, MediaSource, SourceConfig,
};

const VPS: [u8; 4] = [0x40, 0x01, 0x0C, 0x01];
const SPS: [u8; 4] = [0x42, 0x01, 0x01, 0x60];
const PPS: [u8; 4] = [0x44, 0x01, 0xC1, 0x72];
const AUD: [u8; 3] = [0x46, 0x01, 0x50];

/// 切片: first_slice_segment_in_pic_flag 位于第三个字节最高位
fn slice(nal_type: u8, layer_id: u8, first: bool) -> Vec<u8> {
    vec![
        (nal_type << 1) | (layer_id >> 5),
        ((layer_id & 0x1F) << 3) | 1,
        if first { 0xAF } else { 0x2F },
        0x5A,
    ]
}

fn push_nal(data: &mut Vec<u8>, nal: &[u8], long: bool) {
    if long {
        data.push(0x00);
    }
    data.extend_from_slice(&[0x00, 0x00, 0x01]);
    data.extend_from_slice(nal);
}

/// 参数集 + IDR (两个切片段) + 两幅 TRAIL 图像 + AUD 与 PPS 开头的图像
fn build_stream() -> Vec<u8> {
    let mut data = Vec::new();
    push_nal(&mut data, &VPS, true);
    push_nal(&mut data, &SPS, true);
    push_nal(&mut data, &PPS, true);
    push_nal(&mut data, &slice(19, 0, true), true);
    push_nal(&mut data, &slice(19, 0, false), false);
    push_nal(&mut data, &slice(1, 0, true), true);
    push_nal(&mut data, &slice(1, 0, false), false);
    push_nal(&mut data, &slice(1, 0, true), true);
    push_nal(&mut data, &AUD, true);
    push_nal(&mut data, &PPS, true);
    push_nal(&mut data, &slice(1, 0, true), false);
    data
}

fn types(samples: &[MediaSample]) -> Vec<HevcNalUnitType> {
    samples
        .iter()
        .map(|s| s.nal_header(VideoCodec::H265).h265_type())
        .collect()
}

#[test]
fn test_h265_grouping_rules() {
    let extractor = StreamingExtractor::new(MediaType::H265, TimestampMode::None);
    let groups = extractor.extract_all(&build_stream(), 0.0).unwrap();
    assert_eq!(groups.len(), 4);

    // 参数集之后的第一个切片不开启新访问单元
    assert_eq!(
        types(&groups[0]),
        vec![
            HevcNalUnitType::Vps,
            HevcNalUnitType::Sps,
            HevcNalUnitType::Pps,
            HevcNalUnitType::IdrWRadl,
            HevcNalUnitType::IdrWRadl,
        ]
    );
    assert_eq!(groups[1].len(), 2);
    assert_eq!(groups[2].len(), 1);
    assert_eq!(
        types(&groups[3]),
        vec![
            HevcNalUnitType::Aud,
            HevcNalUnitType::Pps,
            HevcNalUnitType::TrailR,
        ]
    );

    let dons: Vec<Option<u16>> = groups
        .iter()
        .flatten()
        .map(|s| s.decoding_order_number)
        .collect();
    let expected: Vec<Option<u16>> = (0..11).map(Some).collect();
    assert_eq!(dons, expected);
}

#[test]
fn test_enhancement_layer_slice_does_not_start_access_unit() {
    let mut data = Vec::new();
    push_nal(&mut data, &slice(19, 0, true), true);
    push_nal(&mut data, &slice(19, 1, true), true);
    push_nal(&mut data, &slice(1, 0, true), true);
    push_nal(&mut data, &slice(1, 1, true), true);
    let extractor = StreamingExtractor::new(MediaType::H265, TimestampMode::None);
    let groups = extractor.extract_all(&data, 0.0).unwrap();
    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2]);
}

#[test]
fn test_streaming_don_wraps() {
    let data = build_stream();
    let mut extractor = StreamingExtractor::with_boundary(
        MediaType::H265,
        Box::new(H265Boundary::with_initial_don(u16::MAX - 2)),
        TimestampMode::None,
    );
    let mut samples = Vec::new();
    let mut offset = 0;
    loop {
        let result = extractor.extract(&data[offset..], false).unwrap();
        samples.extend(result.sample);
        match result.status {
            ExtractStatus::Consumed(n) => offset += n,
            _ => break,
        }
    }
    let dons: Vec<u16> = samples
        .iter()
        .map(|s| s.decoding_order_number.unwrap())
        .collect();
    assert_eq!(&dons[..5], &[65533, 65534, 65535, 0, 1]);
    assert_eq!(dons.len(), 11);
    let markers: Vec<bool> = samples.iter().map(|s| s.marker).collect();
    assert_eq!(
        markers,
        vec![false, false, false, false, true, false, true, true, false, false, true]
    );
}

#[test]
fn test_stream_reader_matches_batch() {
    let data = build_stream();
    let extractor = StreamingExtractor::new(MediaType::H265, TimestampMode::None);
    let batch = extractor.extract_all(&data, 0.0).unwrap();

    let mut reader =
        AnnexBStreamReader::new(IoContext::from_memory(data), MediaType::H265, TimestampMode::None)
            .with_chunk_size(5);
    let mut streamed = Vec::new();
    while let Some(au) = reader.read_access_unit().unwrap() {
        streamed.push(au);
    }
    assert_eq!(streamed.len(), batch.len());
    for (s, b) in streamed.iter().zip(&batch) {
        let s_data: Vec<_> = s.iter().map(|x| x.data.clone()).collect();
        let b_data: Vec<_> = b.iter().map(|x| x.data.clone()).collect();
        assert_eq!(s_data, b_data);
    }
}

#[test]
fn test_indexed_h265_loop_keeps_don_increasing() {
    let config = SourceConfig::new(MediaType::H265)
        .with_loop(LoopConfig::repeat(2))
        .with_timestamp_mode(TimestampMode::FrameRate { fps: 0 });
    let mut source = IndexedMediaSource::from_bytes(build_stream(), config);
    assert_eq!(source.access_units_per_pass(), 4);

    let mut access_units = Vec::new();
    while source.is_good() {
        access_units.push(source.next_access_unit());
    }
    assert_eq!(access_units.len(), 12);

    let dons: Vec<u16> = access_units
        .iter()
        .flatten()
        .map(|s| s.decoding_order_number.unwrap())
        .collect();
    assert!(dons.windows(2).all(|w| w[1] == w[0] + 1));

    // 帧率 0 按默认 25fps 处理, 时间戳跨循环继续增长
    let last = &access_units[11][0];
    assert!((last.start_time - 11.0 / 25.0).abs() < 1e-9);
}
