use delta_pulse::{AnalysisConfig, HealthAnalyzer, StorageConfig};
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

const USAGE: &str = "usage: delta-pulse <base_path> <table_path> [option=value ...]";

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (base_path, table_path) = match (args.first(), args.get(1)) {
        (Some(base_path), Some(table_path)) => (base_path.as_str(), table_path.as_str()),
        _ => return Err(USAGE.into()),
    };
    let options: HashMap<String, String> = args[2..]
        .iter()
        .filter_map(|arg| arg.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let analysis_config = AnalysisConfig::from_options(&options)?;

    info!("Starting Delta Pulse, base_path={}, table_path={}", base_path, table_path);
    let general_start_time = SystemTime::now();

    let storage_config = StorageConfig::local().with_option("path", base_path);
    let analyzer = HealthAnalyzer::builder(storage_config)
        .with_parallelism(8)
        .build()
        .await?;

    let mut report = analyzer.analyze(table_path, &analysis_config).await?;
    report.timed_metrics.duration_collection.push_back((
        "total_dur".to_string(),
        general_start_time.duration_since(UNIX_EPOCH)?.as_millis(),
        general_start_time.elapsed()?.as_millis(),
    ));

    let out_file_name = format!("{}.json", table_path.trim_matches('/').replace('/', "_"));
    let mut f = File::create(&out_file_name)?;
    f.write_all(report.to_json(false)?.as_bytes())?;
    info!("Wrote report, file={}", out_file_name);

    println!("{}", report);
    Ok(())
}
