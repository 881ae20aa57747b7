//! Performance metrics and statistics tracking for the maternal risk pipeline.

use crate::decision::{ConfidenceBucket, OverrideTier};
use crate::models::Evaluation;
use crate::types::RiskLabel;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Total readings assessed
    pub readings_processed: AtomicU64,
    /// Readings rejected before prediction (bad payload or implausible values)
    pub readings_rejected: AtomicU64,
    /// Readings whose final label differs from the classifier's
    pub escalations: AtomicU64,
    /// Assessments by final risk level
    assessments_by_level: RwLock<HashMap<RiskLabel, u64>>,
    /// Matched override tiers
    overrides_by_tier: RwLock<HashMap<OverrideTier, u64>>,
    /// Confidence bucket distribution
    confidence_buckets: RwLock<HashMap<ConfidenceBucket, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            readings_processed: AtomicU64::new(0),
            readings_rejected: AtomicU64::new(0),
            escalations: AtomicU64::new(0),
            assessments_by_level: RwLock::new(HashMap::new()),
            overrides_by_tier: RwLock::new(HashMap::new()),
            confidence_buckets: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record an assessed reading
    pub fn record_assessment(&self, processing_time: Duration, evaluation: &Evaluation) {
        self.readings_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut by_level) = self.assessments_by_level.write() {
            *by_level.entry(evaluation.result.risk_level).or_insert(0) += 1;
        }

        if let Some(tier) = evaluation.overrides.tier {
            if let Ok(mut by_tier) = self.overrides_by_tier.write() {
                *by_tier.entry(tier).or_insert(0) += 1;
            }
        }

        if evaluation.escalated() {
            self.escalations.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut buckets) = self.confidence_buckets.write() {
            *buckets.entry(evaluation.result.confidence).or_insert(0) += 1;
        }
    }

    /// Record a reading that never reached the engine
    pub fn record_rejection(&self) {
        self.readings_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (readings per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.readings_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get assessments by risk level
    pub fn get_assessments_by_level(&self) -> HashMap<RiskLabel, u64> {
        self.assessments_by_level
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Get matched override tiers
    pub fn get_overrides_by_tier(&self) -> HashMap<OverrideTier, u64> {
        self.overrides_by_tier
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Get confidence bucket distribution
    pub fn get_confidence_distribution(&self) -> HashMap<ConfidenceBucket, u64> {
        self.confidence_buckets
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let processed = self.readings_processed.load(Ordering::Relaxed);
        let rejected = self.readings_rejected.load(Ordering::Relaxed);
        let escalations = self.escalations.load(Ordering::Relaxed);
        let escalation_rate = if processed > 0 {
            (escalations as f64 / processed as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let by_level = self.get_assessments_by_level();
        let by_tier = self.get_overrides_by_tier();
        let confidence = self.get_confidence_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            MATERNAL RISK PIPELINE - METRICS SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Readings Assessed: {:>8}  │  Throughput: {:>6.1} r/s      ║",
            processed, throughput
        );
        info!(
            "║ Readings Rejected: {:>8}  │  Escalated:  {:>6.1}%         ║",
            rejected, escalation_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Assessments by Risk Level:                                   ║");
        for level in RiskLabel::ALL {
            let count = by_level.get(&level).copied().unwrap_or(0);
            let pct = if processed > 0 {
                (count as f64 / processed as f64) * 100.0
            } else {
                0.0
            };
            let line = format!("   {:10}: {:>6} ({:>5.1}%)", level.as_str(), count, pct);
            info!("{}", box_line(&line));
        }
        let overrides = format!(
            " Overrides: hard={} soft={}",
            by_tier.get(&OverrideTier::Hard).copied().unwrap_or(0),
            by_tier.get(&OverrideTier::Soft).copied().unwrap_or(0)
        );
        info!("{}", box_line(&overrides));
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Confidence Distribution:                                     ║");
        let total: u64 = confidence.values().sum();
        for bucket in ConfidenceBucket::ALL.iter().rev() {
            let count = confidence.get(bucket).copied().unwrap_or(0);
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            let line = format!("   {:>7}: {:>6} ({:>5.1}%) {}", bucket.as_str(), count, pct, bar);
            info!("{}", box_line(&line));
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

/// Pad a summary row to the width of the box border
fn box_line(content: &str) -> String {
    format!("║{:<62}║", content)
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::OverrideOutcome;
    use crate::types::PredictionResult;
    use std::collections::BTreeMap;

    fn evaluation(model: RiskLabel, tier: Option<OverrideTier>, final_level: RiskLabel) -> Evaluation {
        Evaluation {
            result: PredictionResult {
                risk_level: final_level,
                confidence: ConfidenceBucket::From80To90,
                probabilities: BTreeMap::new(),
            },
            model_label: model,
            model_probability: 0.85,
            overrides: OverrideOutcome {
                risk_level: final_level,
                tier,
                triggered: Vec::new(),
            },
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_assessment(
            Duration::from_micros(100),
            &evaluation(RiskLabel::Low, None, RiskLabel::Low),
        );
        metrics.record_assessment(
            Duration::from_micros(200),
            &evaluation(RiskLabel::Low, Some(OverrideTier::Hard), RiskLabel::High),
        );
        metrics.record_assessment(
            Duration::from_micros(300),
            &evaluation(RiskLabel::Mid, Some(OverrideTier::Soft), RiskLabel::Mid),
        );
        metrics.record_rejection();

        assert_eq!(metrics.readings_processed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.readings_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.escalations.load(Ordering::Relaxed), 1);

        let by_level = metrics.get_assessments_by_level();
        assert_eq!(by_level.get(&RiskLabel::High), Some(&1));
        assert_eq!(by_level.get(&RiskLabel::Mid), Some(&1));

        let by_tier = metrics.get_overrides_by_tier();
        assert_eq!(by_tier.get(&OverrideTier::Hard), Some(&1));
        assert_eq!(by_tier.get(&OverrideTier::Soft), Some(&1));

        assert_eq!(
            metrics.get_confidence_distribution().get(&ConfidenceBucket::From80To90),
            Some(&3)
        );
    }

    #[test]
    fn test_box_line_matches_border_width() {
        let border = "╔══════════════════════════════════════════════════════════════╗";
        for row in [" Overrides: hard=3 soft=12", "   95-98%:      4 ( 40.0%) ████████████████████"] {
            let line = box_line(row);
            assert_eq!(line.chars().count(), border.chars().count());
            assert!(line.ends_with('║'));
        }
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_assessment(
                Duration::from_micros(us),
                &evaluation(RiskLabel::Low, None, RiskLabel::Low),
            );
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}
