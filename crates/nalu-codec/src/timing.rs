//! 访问单元时间戳.
//!
//! 每个访问单元只打一次时间戳, 同一访问单元内的样本共享同一时间.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 默认帧率
pub const DEFAULT_FRAME_RATE: u32 = 25;

/// 时间戳模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum TimestampMode {
    /// 不打时间戳 (恒为 0)
    None,
    /// 检测到访问单元时的挂钟时间
    Live,
    /// 访问单元序号 × 固定帧间隔
    FrameRate { fps: u32 },
}

impl Default for TimestampMode {
    fn default() -> Self {
        Self::FrameRate {
            fps: DEFAULT_FRAME_RATE,
        }
    }
}

/// 一个访问单元的时间戳
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timestamp {
    /// 相对时间 (秒)
    pub seconds: f64,
    /// 挂钟时间 (仅直播模式)
    pub wall_clock: Option<DateTime<Utc>>,
}

/// 访问单元时钟
#[derive(Debug, Clone)]
pub struct AccessUnitClock {
    mode: TimestampMode,
    /// 直播模式下第一个访问单元的时刻
    origin: Option<Instant>,
}

impl AccessUnitClock {
    pub fn new(mode: TimestampMode) -> Self {
        Self { mode, origin: None }
    }

    pub fn mode(&self) -> TimestampMode {
        self.mode
    }

    /// 帧间隔 (秒), 仅固定帧率模式有效
    ///
    /// 帧率为 0 时按默认帧率处理.
    pub fn frame_duration(&self) -> Option<f64> {
        match self.mode {
            TimestampMode::FrameRate { fps } => {
                let fps = if fps == 0 { DEFAULT_FRAME_RATE } else { fps };
                Some(1.0 / f64::from(fps))
            }
            _ => None,
        }
    }

    /// 为第 `index` 个访问单元 (从 0 开始) 生成时间戳
    pub fn stamp(&mut self, index: u64) -> Timestamp {
        match self.mode {
            TimestampMode::None => Timestamp::default(),
            TimestampMode::Live => {
                let origin = *self.origin.get_or_insert_with(Instant::now);
                Timestamp {
                    seconds: origin.elapsed().as_secs_f64(),
                    wall_clock: Some(Utc::now()),
                }
            }
            TimestampMode::FrameRate { .. } => Timestamp {
                seconds: index as f64 * self.frame_duration().unwrap_or_default(),
                wall_clock: None,
            },
        }
    }

    /// 重新开始计时
    pub fn reset(&mut self) {
        self.origin = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_stamps() {
        let mut clock = AccessUnitClock::new(TimestampMode::FrameRate { fps: 50 });
        assert_eq!(clock.stamp(0).seconds, 0.0);
        assert!((clock.stamp(3).seconds - 0.06).abs() < 1e-9);
        assert_eq!(clock.stamp(3).wall_clock, None);
    }

    #[test]
    fn test_zero_fps_falls_back_to_default() {
        let clock = AccessUnitClock::new(TimestampMode::FrameRate { fps: 0 });
        assert_eq!(clock.frame_duration(), Some(0.04));
        assert_eq!(TimestampMode::default(), TimestampMode::FrameRate { fps: 25 });
    }

    #[test]
    fn test_live_and_none() {
        let mut live = AccessUnitClock::new(TimestampMode::Live);
        let first = live.stamp(0);
        assert!(first.seconds >= 0.0);
        assert!(first.wall_clock.is_some());
        assert!(live.stamp(1).seconds >= first.seconds);

        let mut none = AccessUnitClock::new(TimestampMode::None);
        assert_eq!(none.stamp(7), Timestamp::default());
    }

    #[test]
    fn test_mode_serde() {
        let mode: TimestampMode =
            serde_json::from_str(r#"{"mode":"frame_rate","fps":30}"#).unwrap();
        assert_eq!(mode, TimestampMode::FrameRate { fps: 30 });
        let live: TimestampMode = serde_json::from_str(r#"{"mode":"live"}"#).unwrap();
        assert_eq!(live, TimestampMode::Live);
    }
}
