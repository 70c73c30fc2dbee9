//! 媒体源.
//!
//! 媒体源按访问单元交出样本, 并按循环配置决定到达末尾后是否重放.

mod indexed;
mod yuv;

pub use indexed::IndexedMediaSource;
pub use yuv::{YuvConfig, YuvMediaSource};

use nalu_codec::{AccessUnit, MediaType, TimestampMode};
use serde::{Deserialize, Serialize};

/// 媒体源 trait
pub trait MediaSource {
    /// 源格式名称
    fn name(&self) -> &'static str;

    /// 是否还能读出访问单元
    fn is_good(&self) -> bool;

    /// 读取下一个访问单元, 源已耗尽或出错时返回空序列
    fn next_access_unit(&mut self) -> AccessUnit;
}

/// 循环配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// 是否循环
    #[serde(default)]
    pub enabled: bool,
    /// 首轮之后的重复次数, 0 表示无限循环
    #[serde(default)]
    pub count: u32,
}

impl LoopConfig {
    /// 不循环
    pub fn disabled() -> Self {
        Self::default()
    }

    /// 首轮之后再重复 `count` 次 (0 为无限)
    pub fn repeat(count: u32) -> Self {
        Self {
            enabled: true,
            count,
        }
    }
}

/// 媒体源配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub media_type: MediaType,
    #[serde(default, rename = "loop")]
    pub looping: LoopConfig,
    #[serde(default)]
    pub timestamp_mode: TimestampMode,
}

impl SourceConfig {
    /// 不循环, 默认帧率时间戳
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            looping: LoopConfig::default(),
            timestamp_mode: TimestampMode::default(),
        }
    }

    pub fn with_loop(mut self, looping: LoopConfig) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_timestamp_mode(mut self, mode: TimestampMode) -> Self {
        self.timestamp_mode = mode;
        self
    }
}

/// 访问单元游标, 负责循环语义
#[derive(Debug, Clone)]
struct LoopCursor {
    looping: LoopConfig,
    /// 每轮的访问单元数
    len: usize,
    /// 轮内位置
    position: usize,
    /// 已完成的重复次数
    completed_loops: u32,
    /// 累计交出的访问单元数 (用于时间戳)
    served: u64,
    eos: bool,
}

impl LoopCursor {
    fn new(looping: LoopConfig, len: usize) -> Self {
        Self {
            looping,
            len,
            position: 0,
            completed_loops: 0,
            served: 0,
            eos: len == 0,
        }
    }

    fn is_eos(&self) -> bool {
        self.eos
    }

    /// 当前位置
    fn position(&self) -> usize {
        self.position
    }

    /// 累计交出的访问单元数
    fn served(&self) -> u64 {
        self.served
    }

    /// 读完一个访问单元后前进
    fn advance(&mut self) {
        self.served += 1;
        self.position += 1;
        if self.position < self.len {
            return;
        }
        if !self.looping.enabled {
            self.eos = true;
            return;
        }
        if self.looping.count == 0 || self.completed_loops < self.looping.count {
            self.completed_loops += 1;
            self.position = 0;
            log::debug!("媒体源回到起点, 第 {} 次重复", self.completed_loops);
        } else {
            self.eos = true;
        }
    }
}
