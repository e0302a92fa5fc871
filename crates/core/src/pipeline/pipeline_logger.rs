use std::collections::BTreeMap;
use std::time::Instant;

/// Sink for per-frame pipeline telemetry.
///
/// The frame pipeline reports stage timings and counters through this
/// port without caring whether anything aggregates them.
pub trait PipelineLogger: Send {
    /// One more frame made it through the pipeline.
    fn frame(&mut self, sequence: u64);

    /// Duration of a named stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time reading, e.g. `dropped_frames` or `object_count`.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-session report. No-op unless overridden.
    fn summary(&self) {}
}

/// Drops everything. For tests and embedders with their own telemetry.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame(&mut self, _sequence: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Constant-size aggregate of a stream of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStat {
    pub count: u64,
    pub total: f64,
    pub max: f64,
    pub last: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.total += value;
        self.last = value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Aggregates a live session's telemetry and logs a summary at the end.
///
/// A session may run for hours, so samples are folded into running
/// aggregates instead of being kept. Progress is logged every
/// `throttle_frames` frames.
pub struct SessionStatsLogger {
    throttle_frames: u64,
    stages: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    started: Instant,
    frames: u64,
    last_sequence: Option<u64>,
}

impl SessionStatsLogger {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames: 0,
            last_sequence: None,
        }
    }

    pub fn stage(&self, stage: &str) -> Option<&RunningStat> {
        self.stages.get(stage)
    }

    pub fn metric_stat(&self, name: &str) -> Option<&RunningStat> {
        self.metrics.get(name)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// `None` until something has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let live_secs = self.started.elapsed().as_secs_f64();
        let mut out = format!("Session summary ({} frames, {live_secs:.1}s live):", self.frames);
        if let Some(sequence) = self.last_sequence {
            out.push_str(&format!("\n  last frame: #{sequence}"));
        }
        for (stage, stat) in &self.stages {
            out.push_str(&format!(
                "\n  {stage:12}: avg {:6.2}ms  max {:7.2}ms  ({} samples)",
                stat.mean(),
                stat.max,
                stat.count
            ));
        }
        for (name, stat) in &self.metrics {
            out.push_str(&format!("\n  {name}: avg {:.1}, last {:.0}", stat.mean(), stat.last));
        }
        if self.frames > 0 && live_secs > 0.0 {
            out.push_str(&format!(
                "\n  Throughput: {:.1} fps",
                self.frames as f64 / live_secs
            ));
        }
        Some(out)
    }
}

impl Default for SessionStatsLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for SessionStatsLogger {
    fn frame(&mut self, sequence: u64) {
        self.frames += 1;
        self.last_sequence = Some(sequence);
        if self.frames % self.throttle_frames == 0 {
            log::info!("Processed {} frames (latest #{sequence})", self.frames);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages.entry(stage.to_string()).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_ignores_everything() {
        let mut logger = NullPipelineLogger;
        logger.frame(1);
        logger.timing("detect", 5.0);
        logger.metric("dropped_frames", 3.0);
        logger.info("face appeared");
        logger.summary();
    }

    #[test]
    fn test_running_stat() {
        let mut stat = RunningStat::default();
        for v in [4.0, 10.0, 1.0] {
            stat.record(v);
        }
        assert_eq!(stat.count, 3);
        assert_relative_eq!(stat.mean(), 5.0);
        assert_relative_eq!(stat.max, 10.0);
        assert_relative_eq!(stat.last, 1.0);
        assert_relative_eq!(RunningStat::default().mean(), 0.0);
    }

    #[test]
    fn test_stage_timings_are_aggregated() {
        let mut logger = SessionStatsLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("convert", 5.0);

        let detect = logger.stage("detect").unwrap();
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.max, 30.0);
        assert_eq!(logger.stage("convert").unwrap().count, 1);
        assert!(logger.stage("mode").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = SessionStatsLogger::new(10);
        logger.frame(0);
        logger.frame(3);
        logger.timing("preprocess", 2.0);
        logger.timing("detect", 20.0);
        logger.metric("dropped_frames", 2.0);
        logger.metric("dropped_frames", 5.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Session summary (2 frames"));
        assert!(summary.contains("last frame: #3"));
        assert!(summary.contains("preprocess"));
        assert!(summary.contains("dropped_frames: avg 3.5, last 5"));
        // Stages print in name order
        assert!(summary.find("detect").unwrap() < summary.find("preprocess").unwrap());
    }

    #[test]
    fn test_nothing_recorded_means_no_summary() {
        let mut logger = SessionStatsLogger::new(10);
        logger.frame(0);
        assert!(logger.summary_string().is_none());
        assert_eq!(logger.frames(), 1);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let logger = SessionStatsLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
    }
}
