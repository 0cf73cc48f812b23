// Print the last hour of data for one datasource instance.
//
//   cargo run -p logicmon-config --example instance_data -- \
//       logicmon.toml prod web-01 CPU CPU-0
//
// Set RUST_LOG=logicmon_api=debug to see every request.

use std::path::Path;

use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

use logicmon_api::InstanceDataQuery;
use logicmon_config::{build_client, load_config};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [config_path, profile, device, datasource, instance] = args.as_slice() else {
        eprintln!("usage: instance_data <config.toml> <profile> <device> <datasource> <instance>");
        std::process::exit(2);
    };

    let config = load_config(Some(Path::new(config_path)))?;
    let client = build_client(&config, Some(profile.as_str()))?;

    let end = Utc::now();
    let query = InstanceDataQuery {
        device_name: Some(device.clone()),
        datasource_name: Some(datasource.clone()),
        instance_name: Some(instance.clone()),
        ..InstanceDataQuery::default()
    }
    .time_range(end - Duration::hours(1), end);

    let data = client.get_datasource_instance_data(&query).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
