//! Test Reading Producer
//!
//! Generates and publishes sample vital readings to NATS for pipeline testing.
//!
//! Usage: reading-producer [nats_url] [subject] [count] [at_risk_rate] [delay_ms]

use maternal_risk_pipeline::types::{ReadingMessage, VitalReading};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Reading generator for testing
struct ReadingGenerator {
    rng: rand::rngs::ThreadRng,
    reading_counter: u64,
}

impl ReadingGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            reading_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.reading_counter += 1;
        format!("reading_{:08}", self.reading_counter)
    }

    fn sample(&mut self, low: f64, high: f64) -> f64 {
        (self.rng.gen_range(low..high) * 10.0).round() / 10.0
    }

    /// Generate a reading within the usual pregnancy ranges
    fn generate_nominal(&mut self) -> ReadingMessage {
        let reading = VitalReading::new(
            self.rng.gen_range(19..34) as f64,
            self.rng.gen_range(95..118) as f64,
            self.rng.gen_range(60..78) as f64,
            self.sample(6.0, 6.9),
            self.sample(97.5, 98.8),
            self.rng.gen_range(65..88) as f64,
        );

        ReadingMessage::new(self.next_id(), reading)
    }

    /// Generate a reading with one vital pushed past its hard threshold
    fn generate_at_risk(&mut self) -> ReadingMessage {
        let mut reading = VitalReading::new(
            self.rng.gen_range(18..36) as f64,
            self.rng.gen_range(115..140) as f64,
            self.rng.gen_range(75..90) as f64,
            self.sample(6.5, 11.0),
            self.sample(98.0, 100.3),
            self.rng.gen_range(80..110) as f64,
        );

        match self.rng.gen_range(0..5) {
            0 => reading.systolic_bp = self.rng.gen_range(140..170) as f64,
            1 => reading.diastolic_bp = self.rng.gen_range(90..105) as f64,
            2 => reading.blood_sugar = self.sample(11.1, 15.0),
            3 => reading.body_temp = self.sample(100.4, 101.5),
            _ => reading.heart_rate = self.rng.gen_range(110..118) as f64,
        }

        ReadingMessage::new(self.next_id(), reading)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reading_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Reading Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("maternal.readings");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let at_risk_rate: f64 = args
        .get(4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.3_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        at_risk_rate = at_risk_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, at_risk_rate, delay_ms).await;
        }
    };

    let mut generator = ReadingGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} readings...", count);

    let mut nominal_count = 0;
    let mut at_risk_count = 0;

    for i in 0..count {
        let message = if rng.gen_bool(at_risk_rate) {
            at_risk_count += 1;
            generator.generate_at_risk()
        } else {
            nominal_count += 1;
            generator.generate_nominal()
        };

        let payload = serde_json::to_vec(&message)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} readings ({} nominal, {} at risk)",
                i + 1,
                count,
                nominal_count,
                at_risk_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;

    info!(
        "Completed! Published {} readings ({} nominal, {} at risk)",
        count, nominal_count, at_risk_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, at_risk_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = ReadingGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let message = if rng.gen_bool(at_risk_rate) {
            generator.generate_at_risk()
        } else {
            generator.generate_nominal()
        };

        let json = serde_json::to_string_pretty(&message)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample reading {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
