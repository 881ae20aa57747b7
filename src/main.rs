//! Maternal Risk Pipeline - Main Entry Point
//!
//! Consumes vital readings from NATS, scores them with the risk engine and
//! publishes risk assessments. Readings are processed in parallel.

use anyhow::{Context, Result};
use futures::StreamExt;
use maternal_risk_pipeline::{
    config::{AppConfig, LoggingConfig},
    consumer::ReadingConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    models::engine::RiskEngine,
    producer::AssessmentProducer,
    types::ReadingMessage,
    validation::PlausibilityLimits,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "{},maternal_risk_pipeline={}",
            logging.level, logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Maternal Risk Pipeline");
    info!(
        models_dir = %config.models.models_dir,
        workers = config.pipeline.workers,
        "Configuration loaded successfully"
    );

    // Artifacts are loaded once; any failure stops the process
    let engine = Arc::new(
        RiskEngine::from_config(&config.models).context("Failed to load model artifacts")?,
    );
    info!(
        classifier = %engine.classifier_name(),
        classes = ?engine.labels().class_names(),
        "Risk engine ready"
    );

    let limits = Arc::new(PlausibilityLimits::default());
    let metrics = Arc::new(PipelineMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = ReadingConsumer::new(client.clone(), &config.nats.reading_subject);
    let producer = Arc::new(AssessmentProducer::new(
        client.clone(),
        &config.nats.assessment_subject,
    ));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        "Starting reading processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", consumer.subject());
    info!("Publishing assessments to: {}", producer.subject());

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));
    let include_health_summary = config.pipeline.include_health_summary;

    let metrics_clone = metrics.clone();
    let interval = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, interval);
        reporter.start().await;
    });

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let engine = engine.clone();
        let limits = limits.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let parsed = match serde_json::from_slice::<ReadingMessage>(&message.payload) {
                Ok(parsed) => parsed,
                Err(e) => {
                    metrics.record_rejection();
                    warn!(error = %e, "Failed to deserialize reading");
                    return;
                }
            };
            let reading = parsed.canonical_reading();
            let reading_id = parsed.reading_id;

            let violations = limits.check(&reading);
            if !violations.is_empty() {
                metrics.record_rejection();
                let reasons: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                warn!(
                    reading_id = %reading_id,
                    violations = ?reasons,
                    "Reading rejected by plausibility checks"
                );
                return;
            }

            match engine.evaluate(&reading) {
                Ok(evaluation) => {
                    let processing_time = start_time.elapsed();
                    metrics.record_assessment(processing_time, &evaluation);

                    let mut assessment = evaluation.to_assessment(&reading_id, &reading);
                    if !include_health_summary {
                        assessment.health_summary = None;
                    }

                    if evaluation.escalated() {
                        info!(
                            reading_id = %reading_id,
                            model_label = %evaluation.model_label,
                            risk_level = %evaluation.result.risk_level,
                            override_tier = ?evaluation.overrides.tier,
                            triggered = ?assessment.triggered_rules,
                            "Clinical override escalated risk level"
                        );
                    }

                    if let Err(e) = producer.publish(&assessment).await {
                        error!(
                            reading_id = %reading_id,
                            error = %e,
                            "Failed to publish risk assessment"
                        );
                    } else {
                        debug!(
                            reading_id = %reading_id,
                            risk_level = %assessment.result.risk_level,
                            priority = %assessment.priority,
                            confidence = %assessment.result.confidence,
                            processing_time_us = processing_time.as_micros(),
                            "Risk assessment published"
                        );
                    }

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                    // Log progress every 100 readings
                    if count % 100 == 0 {
                        let throughput = metrics.get_throughput();
                        let processing_stats = metrics.get_processing_stats();
                        info!(
                            processed = count,
                            throughput = format!("{:.1} r/s", throughput),
                            avg_latency_us = processing_stats.mean_us,
                            "Processing milestone"
                        );
                    }
                }
                Err(e) => {
                    metrics.record_rejection();
                    error!(
                        reading_id = %reading_id,
                        error = %e,
                        "Risk evaluation failed"
                    );
                }
            }

            drop(permit);
        });
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
