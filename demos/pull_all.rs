//! Pulls every dataset for an optional date range and prints the aggregate as JSON.
//!
//! Usage: `cargo run --example pull_all -- [START] [END]` with ISO 8601 timestamps.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use whoop_broker::{api::DateRange, config::BrokerConfig, flows::Broker};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut args = env::args().skip(1);
	let range = DateRange::new(args.next(), args.next());
	let broker = Broker::from_config(&BrokerConfig::from_env()?)?;
	let status = broker.status().await;

	println!("{}", serde_json::to_string(&status)?);

	if !status.authenticated {
		return Err(eyre!("Not connected; run the `authorize` example first."));
	}

	match broker.fetch_all_resources(&range).await {
		Ok(payload) => println!("{}", serde_json::to_string_pretty(&payload)?),
		Err(e) => {
			eprintln!("{}", serde_json::to_string_pretty(&e.to_body())?);

			return Err(e.into());
		},
	}

	Ok(())
}
