//! nalu-info - Annex B 访问单元信息统计工具
//!
//! 读取 H.264/H.265 Annex B 码流, 按访问单元输出样本数与字节数统计.

mod logging;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use serde::Serialize;

use nalu_codec::parsers::h264::split_layers;
use nalu_codec::{AccessUnit, MediaType, TimestampMode, VideoCodec};
use nalu_format::{
    AnnexBStreamReader, AnnexBWriter, IndexedMediaSource, LoopConfig, MediaSource, SourceConfig,
};

/// NALU 访问单元信息统计工具
#[derive(Parser, Debug)]
#[command(name = "nalu-info", version, about = "H.264/H.265 Annex B 访问单元统计工具")]
struct Cli {
    /// 输入文件路径
    input: PathBuf,

    /// 媒体类型 (H264, H264-SVC, H265), 省略时按扩展名推断
    #[arg(short, long)]
    format: Option<MediaType>,

    /// JSON 格式的媒体源配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 固定帧率时间戳
    #[arg(long)]
    fps: Option<u32>,

    /// 使用挂钟时间戳
    #[arg(long, conflicts_with = "fps")]
    live: bool,

    /// 首轮之后的重复次数 (0 为无限, 需配合 --limit)
    #[arg(long)]
    loop_count: Option<u32>,

    /// 最多读取的访问单元数
    #[arg(long)]
    limit: Option<u64>,

    /// 使用分块流读取代替预扫描索引
    #[arg(long)]
    streaming: bool,

    /// 把 SVC 基本层写出为 Annex B 文件
    #[arg(long, value_name = "OUT")]
    base_layer: Option<PathBuf>,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 日志级别 (-v info, -vv debug, -vvv trace), 同时输出每个访问单元的统计 (`*` 标记随机访问点)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 统计结果
#[derive(Serialize, Default)]
struct Summary {
    filename: String,
    media_type: String,
    access_units: u64,
    samples: u64,
    bytes: u64,
    max_access_unit_bytes: u64,
    /// 携带切片数据的 NAL 单元数
    vcl_units: u64,
    /// 含随机访问点 (IDR/IRAP) 的访问单元数
    random_access_units: u64,
    /// 最后一个访问单元的时间 (秒)
    last_start_time: f64,
    nal_types: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_layer_access_units: Option<u64>,
}

fn main() {
    let cli = Cli::parse();
    logging::init("nalu-info", cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;
    if config.looping.enabled && config.looping.count == 0 && cli.limit.is_none() {
        bail!("无限循环需要指定 --limit");
    }
    info!("输入: {}, 媒体类型: {}", cli.input.display(), config.media_type);

    let mut source: Box<dyn MediaSource> = if cli.streaming {
        Box::new(
            AnnexBStreamReader::open(&cli.input, config.media_type, config.timestamp_mode)
                .with_context(|| format!("无法打开输入文件: {}", cli.input.display()))?,
        )
    } else {
        Box::new(IndexedMediaSource::open(&cli.input, config))
    };
    if !source.is_good() {
        bail!("无法读取输入: {}", cli.input.display());
    }

    let codec = config.media_type.codec();
    let mut base_writer = match &cli.base_layer {
        Some(path) => {
            if codec != VideoCodec::H264 {
                bail!("--base-layer 只支持 H.264/SVC 码流");
            }
            Some(
                AnnexBWriter::create(path, codec)
                    .with_context(|| format!("无法创建输出文件: {}", path.display()))?,
            )
        }
        None => None,
    };

    let mut summary = Summary {
        filename: cli.input.display().to_string(),
        media_type: source.name().to_string(),
        ..Summary::default()
    };

    while source.is_good() {
        if cli.limit.is_some_and(|limit| summary.access_units >= limit) {
            break;
        }
        let au = source.next_access_unit();
        if au.is_empty() {
            break;
        }
        record(&mut summary, &au, codec, cli.verbose > 0 && !cli.json);

        if let Some(writer) = base_writer.as_mut() {
            let (base, _enhancement) = split_layers(au);
            writer.write_access_unit(&base)?;
        }
    }

    if let Some(writer) = base_writer {
        summary.base_layer_access_units = Some(writer.access_units_written());
        writer.finish();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// 合并配置文件与命令行参数 (命令行优先)
fn build_config(cli: &Cli) -> Result<SourceConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
            serde_json::from_str::<SourceConfig>(&text)
                .with_context(|| format!("配置文件格式错误: {}", path.display()))?
        }
        None => SourceConfig::new(infer_media_type(cli.format, &cli.input)?),
    };
    if let Some(media_type) = cli.format {
        config.media_type = media_type;
    }
    if let Some(count) = cli.loop_count {
        config.looping = LoopConfig::repeat(count);
    }
    if cli.live {
        config.timestamp_mode = TimestampMode::Live;
    } else if let Some(fps) = cli.fps {
        config.timestamp_mode = TimestampMode::FrameRate { fps };
    }
    Ok(config)
}

fn infer_media_type(format: Option<MediaType>, input: &Path) -> Result<MediaType> {
    if let Some(media_type) = format {
        return Ok(media_type);
    }
    input
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(MediaType::from_extension)
        .with_context(|| format!("无法从扩展名推断媒体类型, 请使用 --format: {}", input.display()))
}

fn record(summary: &mut Summary, au: &AccessUnit, codec: VideoCodec, verbose: bool) {
    let bytes: u64 = au.iter().map(|s| s.payload_size() as u64).sum();
    let headers: Vec<_> = au.iter().map(|s| s.nal_header(codec)).collect();
    for header in &headers {
        *summary.nal_types.entry(header.type_name()).or_default() += 1;
    }
    let random_access = headers.iter().any(|h| h.is_random_access());
    if verbose {
        let types: Vec<String> = headers.iter().map(|h| h.type_name()).collect();
        println!(
            "AU #{:<6} t={:>9.3}s  样本 {:>3}  字节 {:>8} {} [{}]",
            summary.access_units,
            au[0].start_time,
            au.len(),
            bytes,
            if random_access { "*" } else { " " },
            types.join(", ")
        );
    }
    summary.access_units += 1;
    summary.samples += au.len() as u64;
    summary.bytes += bytes;
    summary.max_access_unit_bytes = summary.max_access_unit_bytes.max(bytes);
    summary.vcl_units += headers.iter().filter(|h| h.is_vcl()).count() as u64;
    if random_access {
        summary.random_access_units += 1;
    }
    summary.last_start_time = au[0].start_time;
}

fn print_summary(summary: &Summary) {
    println!("文件:         {}", summary.filename);
    println!("媒体类型:     {}", summary.media_type);
    println!("访问单元:     {}", summary.access_units);
    println!("NAL 单元:     {}", summary.samples);
    println!("负载字节:     {}", summary.bytes);
    println!("最大访问单元: {} 字节", summary.max_access_unit_bytes);
    println!("VCL 单元:     {}", summary.vcl_units);
    println!("随机访问点:   {} 个访问单元", summary.random_access_units);
    println!("最后时间戳:   {:.3}s", summary.last_start_time);
    for (name, count) in &summary.nal_types {
        println!("  {name:<24} {count}");
    }
    if let Some(n) = summary.base_layer_access_units {
        println!("基本层写出:   {n} 个访问单元");
    }
}
