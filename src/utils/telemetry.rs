// file: src/utils/telemetry.rs
// description: stage timing and throughput metrics for pipeline runs
// reference: tracing-based operation timing

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Times one run and the stages inside it. Each checkpoint records the time
/// since the previous one.
pub struct OperationTimer {
    operation: String,
    start: Instant,
    last_lap: Instant,
    laps: Vec<(String, Duration)>,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        info!("Starting operation: {}", operation);
        let now = Instant::now();
        Self {
            operation: operation.to_string(),
            start: now,
            last_lap: now,
            laps: Vec::new(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn laps(&self) -> &[(String, Duration)] {
        &self.laps
    }

    pub fn checkpoint(&mut self, stage: &str) {
        let now = Instant::now();
        let lap = now - self.last_lap;
        self.last_lap = now;
        debug!(
            "[{}] {} after {:.3}s",
            self.operation,
            stage,
            lap.as_secs_f64()
        );
        self.laps.push((stage.to_string(), lap));
    }

    pub fn warn_if_slow(&self, threshold: Duration, stage: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "[{}] {} is slow: {:.2}s so far (threshold {:.2}s)",
                self.operation,
                stage,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed operation: {} in {:.2}s",
            self.operation,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        let metrics = PerformanceMetrics::new(&self.operation, count, elapsed);
        info!("Completed operation: {}", metrics.format());
        elapsed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub operation: String,
    pub count: usize,
    pub duration_ms: u64,
    /// Items per second.
    pub throughput: f64,
    pub avg_item_time_ms: f64,
}

impl PerformanceMetrics {
    pub fn new(operation: &str, count: usize, duration: Duration) -> Self {
        let duration_ms = duration.as_millis() as u64;
        let secs = duration.as_secs_f64();

        Self {
            operation: operation.to_string(),
            count,
            duration_ms,
            throughput: if secs > 0.0 { count as f64 / secs } else { 0.0 },
            avg_item_time_ms: if count > 0 {
                duration_ms as f64 / count as f64
            } else {
                0.0
            },
        }
    }

    pub fn format(&self) -> String {
        format!(
            "{}: {} items in {}ms ({:.2} items/sec, {:.2}ms per item)",
            self.operation, self.count, self.duration_ms, self.throughput, self.avg_item_time_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_metrics() {
        let metrics = PerformanceMetrics::new("parse", 100, Duration::from_secs(10));
        assert_eq!(metrics.count, 100);
        assert_eq!(metrics.throughput, 10.0);
        assert_eq!(metrics.avg_item_time_ms, 100.0);
    }

    #[test]
    fn test_performance_metrics_empty_run() {
        let metrics = PerformanceMetrics::new("parse", 0, Duration::ZERO);
        assert_eq!(metrics.throughput, 0.0);
        assert_eq!(metrics.avg_item_time_ms, 0.0);
        assert!(metrics.format().starts_with("parse: 0 items"));
    }

    #[test]
    fn test_checkpoints_record_laps() {
        let mut timer = OperationTimer::new("summarize");
        std::thread::sleep(Duration::from_millis(5));
        timer.checkpoint("acquire");
        timer.checkpoint("discover");

        let stages: Vec<&str> = timer.laps().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(stages, vec!["acquire", "discover"]);
        assert!(timer.laps()[0].1 >= Duration::from_millis(5));

        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(5));
    }
}
