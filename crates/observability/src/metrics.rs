//! 采集管道指标收集模块
//!
//! Prometheus-facing `record_*` helpers plus an in-memory aggregator for the
//! end-of-run summary.

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// 记录样本发布
pub fn record_sample_published(stream: &'static str) {
    counter!("rgbd_capture_samples_published_total", "stream" => stream).increment(1);
}

/// 记录被拒绝的样本 (NaN/负时间戳、空载荷)
pub fn record_sample_rejected(stream: &'static str) {
    counter!("rgbd_capture_samples_rejected_total", "stream" => stream).increment(1);
}

/// 记录事件通道丢弃
pub fn record_event_dropped(stream: &'static str) {
    counter!("rgbd_capture_events_dropped_total", "stream" => stream).increment(1);
}

/// 记录缓存有效槽位数
pub fn record_cache_occupancy(stream: &'static str, occupied: usize) {
    gauge!("rgbd_capture_cache_occupied_slots", "stream" => stream).set(occupied as f64);
}

/// 记录融合周期结果
///
/// `outcome` is `"produced"` or the skip reason label.
pub fn record_fusion_cycle(outcome: &'static str, duration_ms: f64) {
    counter!("rgbd_capture_fusion_cycles_total", "outcome" => outcome).increment(1);
    histogram!("rgbd_capture_fusion_cycle_ms").record(duration_ms);
}

/// 记录写入的录制记录
pub fn record_record_written(stream: &'static str, bytes: usize) {
    counter!("rgbd_capture_records_written_total", "stream" => stream).increment(1);
    counter!("rgbd_capture_record_bytes_total", "stream" => stream).increment(bytes as u64);
}

/// 记录存储故障
pub fn record_storage_fault(stream: &'static str) {
    counter!("rgbd_capture_storage_faults_total", "stream" => stream).increment(1);
}

/// 融合指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct CaptureMetricsAggregator {
    /// 总周期数
    pub total_cycles: u64,

    /// 产出帧数
    pub produced_frames: u64,

    /// 录制帧数
    pub recorded_frames: u64,

    /// 各原因跳过次数
    pub skip_counts: HashMap<&'static str, u64>,

    /// 周期耗时统计 (仅产出帧)
    pub cycle_time: CycleTimeStats,

    /// 存储故障数
    pub storage_faults: u64,
}

impl CaptureMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录产出帧
    pub fn on_produced(&mut self, recorded: bool, duration_ms: f64) {
        self.total_cycles += 1;
        self.produced_frames += 1;
        if recorded {
            self.recorded_frames += 1;
        }
        self.cycle_time.record(duration_ms);
    }

    /// 记录跳过周期
    pub fn on_skipped(&mut self, reason: &'static str) {
        self.total_cycles += 1;
        *self.skip_counts.entry(reason).or_insert(0) += 1;
    }

    pub fn on_storage_faults(&mut self, count: usize) {
        self.storage_faults += count as u64;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_cycles: self.total_cycles,
            produced_frames: self.produced_frames,
            recorded_frames: self.recorded_frames,
            produce_rate: if self.total_cycles > 0 {
                self.produced_frames as f64 / self.total_cycles as f64 * 100.0
            } else {
                0.0
            },
            cycle_ms: self.cycle_time,
            skip_counts: self.skip_counts.clone(),
            storage_faults: self.storage_faults,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_cycles: u64,
    pub produced_frames: u64,
    pub recorded_frames: u64,
    pub produce_rate: f64,
    pub cycle_ms: CycleTimeStats,
    pub skip_counts: HashMap<&'static str, u64>,
    pub storage_faults: u64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Metrics Summary ===")?;
        writeln!(f, "Fusion cycles: {}", self.total_cycles)?;
        writeln!(
            f,
            "Produced frames: {} ({:.2}%)",
            self.produced_frames, self.produce_rate
        )?;
        writeln!(f, "Recorded frames: {}", self.recorded_frames)?;
        writeln!(f, "Cycle time (ms): {}", self.cycle_ms)?;
        writeln!(f, "Storage faults: {}", self.storage_faults)?;

        if !self.skip_counts.is_empty() {
            let mut reasons: Vec<_> = self.skip_counts.iter().collect();
            reasons.sort();
            writeln!(f, "Skipped cycles:")?;
            for (reason, count) in reasons {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }

        Ok(())
    }
}

/// Produced-cycle timings in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleTimeStats {
    pub count: u64,
    pub total_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
}

impl CycleTimeStats {
    pub fn record(&mut self, ms: f64) {
        if self.count == 0 {
            self.min_ms = ms;
            self.max_ms = ms;
        } else {
            self.min_ms = self.min_ms.min(ms);
            self.max_ms = self.max_ms.max(ms);
        }
        self.count += 1;
        self.total_ms += ms;
        self.last_ms = ms;
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

impl std::fmt::Display for CycleTimeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "mean={:.3} min={:.3} max={:.3} last={:.3} (n={})",
            self.mean_ms(),
            self.min_ms,
            self.max_ms,
            self.last_ms,
            self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_time_stats() {
        let mut stats = CycleTimeStats::default();
        assert_eq!(stats.to_string(), "N/A");
        for ms in [4.0, 1.0, 7.0] {
            stats.record(ms);
        }

        assert_eq!(stats.count, 3);
        assert!((stats.mean_ms() - 4.0).abs() < 1e-10);
        assert_eq!((stats.min_ms, stats.max_ms, stats.last_ms), (1.0, 7.0, 7.0));
        assert!(stats.to_string().contains("(n=3)"));
    }

    #[test]
    fn test_aggregator_counts() {
        let mut aggregator = CaptureMetricsAggregator::new();
        aggregator.on_skipped("no_point_cloud");
        aggregator.on_skipped("no_point_cloud");
        aggregator.on_skipped("pose_not_valid");
        aggregator.on_produced(true, 4.0);
        aggregator.on_produced(false, 6.0);

        let summary = aggregator.summary();
        assert_eq!(summary.total_cycles, 5);
        assert_eq!(summary.produced_frames, 2);
        assert_eq!(summary.recorded_frames, 1);
        assert_eq!(summary.skip_counts.get("no_point_cloud"), Some(&2));
        assert!((summary.produce_rate - 40.0).abs() < 1e-10);
        assert!((summary.cycle_ms.mean_ms() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = CaptureMetricsAggregator::new();
        aggregator.on_produced(false, 3.0);
        aggregator.on_skipped("no_color_frame");

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Fusion cycles: 2"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("no_color_frame: 1"));
    }
}
