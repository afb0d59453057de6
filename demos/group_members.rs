//! Lists the members of a directory group.
//!
//! ```sh
//! # Credentials from AZURE_TENANT_ID, AZURE_CLIENT_ID, ... (see `graph_roster::config::vars`).
//! cargo run --example group_members -- GitHub-Demo
//! # Credentials from a JSON file.
//! cargo run --example group_members -- parameters.json GitHub-Demo
//! ```

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use tracing_subscriber::EnvFilter;
// self
use graph_roster::{config::Credentials, roster::GroupRoster};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graph_roster=info")),
		)
		.with_writer(std::io::stderr)
		.init();

	let args: Vec<String> = env::args().skip(1).collect();
	let (credentials, prefix) = match args.as_slice() {
		[prefix] => (Credentials::from_env()?, prefix),
		[config, prefix] => (Credentials::from_json_file(config)?, prefix),
		_ => return Err(eyre!("usage: group_members [config.json] <group-prefix>")),
	};
	let roster = GroupRoster::from_credentials(&credentials)?;

	for value in roster.group_members(prefix).await? {
		println!("{value}");
	}

	Ok(())
}
