//! Annex B 码流写出.
//!
//! 把访问单元按码流顺序写回带起始码的字节流.

use std::path::Path;

use log::{debug, trace};
use nalu_codec::{MediaSample, StartCode, VideoCodec};
use nalu_core::{BitWriter, ByteBuffer, NaluResult};

use crate::io::IoContext;

/// Annex B 写出器
pub struct AnnexBWriter {
    io: IoContext,
    codec: VideoCodec,
    /// 访问单元不以 AUD 开头时补一个
    insert_aud: bool,
    /// 首个访问单元之前写出的参数集
    parameter_sets: Vec<ByteBuffer>,
    access_units_written: u64,
    bytes_written: u64,
}

impl AnnexBWriter {
    /// 创建输出文件
    pub fn create(path: impl AsRef<Path>, codec: VideoCodec) -> NaluResult<Self> {
        Ok(Self::new(IoContext::open_write(path)?, codec))
    }

    pub fn new(io: IoContext, codec: VideoCodec) -> Self {
        Self {
            io,
            codec,
            insert_aud: false,
            parameter_sets: Vec::new(),
            access_units_written: 0,
            bytes_written: 0,
        }
    }

    /// 为不以 AUD 开头的访问单元插入 AUD
    pub fn with_aud_insertion(mut self, enabled: bool) -> Self {
        self.insert_aud = enabled;
        self
    }

    /// 在首个访问单元之前写出参数集 (不含起始码)
    pub fn with_parameter_sets(mut self, parameter_sets: Vec<ByteBuffer>) -> Self {
        self.parameter_sets = parameter_sets;
        self
    }

    /// 写出一个访问单元
    pub fn write_access_unit(&mut self, samples: &[MediaSample]) -> NaluResult<()> {
        if samples.is_empty() {
            return Ok(());
        }

        if self.access_units_written == 0 {
            let parameter_sets = std::mem::take(&mut self.parameter_sets);
            for ps in &parameter_sets {
                self.write_nal(StartCode::Long, ps.as_slice())?;
            }
        }

        let starts_with_aud = samples[0].nal_header(self.codec).is_aud();
        let aud_inserted = self.insert_aud && !starts_with_aud;
        if aud_inserted {
            let aud = build_aud(self.codec);
            self.write_nal(StartCode::Long, aud.as_slice())?;
        }

        for (i, sample) in samples.iter().enumerate() {
            let header = sample.nal_header(self.codec);
            let opens_unit = i == 0 && !aud_inserted;
            let start_code = sample.start_code.unwrap_or(
                if opens_unit || header.is_aud() || header.is_parameter_set() {
                    StartCode::Long
                } else {
                    StartCode::Short
                },
            );
            self.write_nal(start_code, sample.payload())?;
        }

        self.access_units_written += 1;
        trace!(
            "写出访问单元 #{}: {} 个样本",
            self.access_units_written - 1,
            samples.len()
        );
        Ok(())
    }

    fn write_nal(&mut self, start_code: StartCode, payload: &[u8]) -> NaluResult<()> {
        self.io.write_all(start_code.bytes())?;
        self.io.write_all(payload)?;
        self.bytes_written += (start_code.size() + payload.len()) as u64;
        Ok(())
    }

    /// 已写出的访问单元数
    pub fn access_units_written(&self) -> u64 {
        self.access_units_written
    }

    /// 已写出的字节数
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// 结束写出, 返回 I/O 上下文
    pub fn finish(self) -> IoContext {
        debug!(
            "Annex B 写出完成: {} 个访问单元, {} 字节",
            self.access_units_written, self.bytes_written
        );
        self.io
    }
}

/// 构造访问单元分隔符 (不含起始码)
///
/// primary_pic_type / pic_type 取允许任意切片类型的值.
pub fn build_aud(codec: VideoCodec) -> ByteBuffer {
    let mut bw = BitWriter::with_capacity(4);
    match codec {
        VideoCodec::H264 => {
            bw.write_bit(0); // forbidden_zero_bit
            bw.write_bits(0, 2); // nal_ref_idc
            bw.write_bits(9, 5); // nal_unit_type
            bw.write_bits(7, 3); // primary_pic_type
        }
        VideoCodec::H265 => {
            bw.write_bit(0);
            bw.write_bits(35, 6);
            bw.write_bits(0, 6); // nuh_layer_id
            bw.write_bits(1, 3); // nuh_temporal_id_plus1
            bw.write_bits(2, 3); // pic_type
        }
    }
    // rbsp_trailing_bits
    bw.write_bit(1);
    bw.align_to_byte();
    bw.into_buffer()
}
