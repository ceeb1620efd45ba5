use crate::infra::InMemoryStore;
use crate::server::load_tariffs;
use chrono::{DateTime, Utc};
use clap::Args;
use delivery_fee::config::AppConfig;
use delivery_fee::error::AppError;
use delivery_fee::fees::router::parse_observation_time;
use delivery_fee::fees::{DeliveryFeeCalculator, FeeQuote};
use delivery_fee::ingestion::{FeedClient, IngestionReport, WeatherIngestor};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// City name as listed in the tariff tables
    #[arg(long)]
    pub(crate) city: String,
    /// Vehicle type: car, scooter or bike
    #[arg(long)]
    pub(crate) vehicle_type: String,
    /// Reference time (RFC 3339 or YYYY-MM-DDTHH:MM:SS in UTC). Defaults to the latest snapshot.
    #[arg(long, value_parser = parse_observation_time)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Read observations from a saved XML document instead of the live feed
    #[arg(long)]
    pub(crate) feed_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct IngestArgs {
    /// Observations XML document to import
    #[arg(long)]
    pub(crate) file: PathBuf,
}

pub(crate) async fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = Arc::new(InMemoryStore::new(load_tariffs(&config.tariffs)?));

    let xml = match &args.feed_file {
        Some(path) => std::fs::read_to_string(path)?,
        None => FeedClient::new(config.ingestion.feed_url.clone()).fetch().await?,
    };
    WeatherIngestor::new(store.clone(), store.clone()).ingest_xml(&xml)?;

    let calculator = DeliveryFeeCalculator::new(store.clone(), store);
    let quote = calculator.quote(&args.city, &args.vehicle_type, args.at)?;
    print_quote(&quote);
    Ok(())
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = Arc::new(InMemoryStore::new(load_tariffs(&config.tariffs)?));

    let xml = std::fs::read_to_string(&args.file)?;
    let report = WeatherIngestor::new(store.clone(), store).ingest_xml(&xml)?;
    print_report(&report);
    Ok(())
}

fn print_quote(quote: &FeeQuote) {
    println!(
        "Delivery fee for {} in {}",
        quote.vehicle_type.label(),
        quote.city
    );
    println!("  Weather snapshot: {}", quote.observed_at.to_rfc3339());
    println!("  Base fee:         {:.2}", quote.base_fee);
    for component in &quote.surcharges {
        println!(
            "  + {:<15} {:.2} (rule {})",
            component.category.label(),
            component.amount,
            component.rule_id
        );
    }
    println!("  Total:            {:.2}", quote.total_fee);
}

fn print_report(report: &IngestionReport) {
    println!(
        "Feed timestamp {}: {} observation(s) recorded, {} station(s) skipped",
        report.observed_at.to_rfc3339(),
        report.recorded.len(),
        report.skipped
    );
    for observation in &report.recorded {
        println!(
            "  {:<10} temperature={} wind={} phenomenon={}",
            observation.city_name,
            display_metric(observation.air_temperature),
            display_metric(observation.wind_speed),
            observation.phenomenon.as_deref().unwrap_or("-")
        );
    }
}

fn display_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.1}"))
}
