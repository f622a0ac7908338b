//! Connects the configured WHOOP account: prints the authorize URL, then completes the
//! authorization from the redirect URL pasted back on stdin.

// std
use std::io::{self, BufRead, Write};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use whoop_broker::{auth::CallbackParams, config::BrokerConfig, flows::Broker};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = BrokerConfig::from_env()?;
	let broker = Broker::from_config(&config)?;

	if broker.is_authenticated().await {
		println!("Already connected; credentials live in {}.", config.credentials_path.display());

		return Ok(());
	}

	let session = broker.start_authorization();

	println!("Open this URL and approve access:\n\n{}\n", session.authorize_url);
	print!("Paste the URL you were redirected to: ");
	io::stdout().flush()?;

	let mut line = String::new();

	io::stdin().lock().read_line(&mut line)?;

	let redirected = Url::parse(line.trim())?;
	let mut params = CallbackParams::default();

	for (key, value) in redirected.query_pairs() {
		match key.as_ref() {
			"code" => params.code = Some(value.into_owned()),
			"state" => params.state = Some(value.into_owned()),
			"error" => params.error = Some(value.into_owned()),
			_ => {},
		}
	}

	broker
		.complete_authorization(params)
		.await
		.map_err(|e| eyre!("Authorization failed ({}): {e}", e.as_str()))?;

	println!("Connected. Tokens were written to {}.", config.credentials_path.display());

	Ok(())
}
