// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod config;
mod env;
mod host;
mod standard;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use keyfill_common_secret::SecretString;
use keyfill_credentials::{CredentialManager, FileOptionsStore, GroupedAccounts, OptionsStore};
use keyfill_menu::{
	AccountMenu, ContextMenu, CredentialResolver, HostInterface, MemoryMenuBuilder, MenuBuilder,
	Mode, TabId, ROOT_TITLE,
};
use keyfill_vault::codec;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{CliConfig, CliOverrides, LogFormat, LoggingConfig};
use crate::env::EnvOverlayStore;
use crate::host::TerminalHost;

#[derive(Parser, Debug)]
#[command(name = "keyfill", version, about = "Test data and vault credentials for web forms", long_about = None)]
struct Args {
	/// Path to the CLI configuration file
	#[arg(long, global = true, env = "KEYFILL_CONFIG")]
	config: Option<PathBuf>,

	/// Path to the persisted options document
	#[arg(long, global = true)]
	options: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, global = true)]
	log_level: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// List the vault, warm the cache and store the grouped accounts
	Sync,

	/// Print the password stored for an account
	Get { account: String },

	/// Store a new password for an account (read from stdin without --value)
	Set {
		account: String,
		#[arg(long)]
		value: Option<String>,
	},

	/// Print the accounts stored by the last sync
	Accounts,

	/// Print the vault secret name for an account identifier
	Encode { identifier: String },

	/// Print the account identifier for a vault secret name
	Decode { name: String },

	/// Print the compiled menus
	Menu,

	/// Click a menu item, given the titles leading to it
	Click {
		#[arg(required = true)]
		path: Vec<String>,

		/// Operational mode to switch to before clicking
		#[arg(long)]
		mode: Option<Mode>,

		#[arg(long, default_value_t = 1)]
		tab: i64,

		/// Refuse clipboard permissions, as a browser user might
		#[arg(long)]
		deny_clipboard: bool,
	},
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_env("KEYFILL_LOG")
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| {
			EnvFilter::new(format!("{},hyper=warn,reqwest=warn", logging.level.as_str()))
		});

	let registry = tracing_subscriber::registry().with(filter);
	match logging.format {
		LogFormat::Json => registry.with(fmt::layer().json().with_writer(std::io::stderr)).init(),
		LogFormat::Compact => registry
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.init(),
		LogFormat::Pretty => registry.with(fmt::layer().pretty().with_writer(std::io::stderr)).init(),
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config = config::load_config(CliOverrides {
		config_file: args.config.clone(),
		options_path: args.options.clone(),
		log_level: args.log_level.clone(),
	})
	.context("failed to load configuration")?;

	init_tracing(&config.logging);

	run(args.command, &config).await
}

async fn run(command: Command, config: &CliConfig) -> Result<()> {
	match command {
		Command::Encode { identifier } => {
			let (name, ambiguity) = codec::encode_checked(&identifier);
			if let Some(ambiguity) = ambiguity {
				eprintln!("warning: {ambiguity}");
			}
			println!("{name}");
			Ok(())
		}
		Command::Decode { name } => {
			println!("{}", codec::decode(&name));
			Ok(())
		}
		Command::Accounts => {
			let options = open_store(config)?.load().await?;
			match options.accounts {
				Some(groups) if !groups.is_empty() => print_groups(&groups),
				_ => println!("No accounts stored; run `keyfill sync` first."),
			}
			Ok(())
		}
		Command::Sync => {
			let manager = open_manager(config)?;
			let groups = manager.sync_accounts().await.context("sync failed")?;
			info!(accounts = groups.accounts().len(), "accounts synchronized");
			print_groups(&groups);
			Ok(())
		}
		Command::Get { account } => {
			let manager = open_manager(config)?;
			let secret = manager
				.get_secret(&account)
				.await
				.with_context(|| format!("failed to fetch secret for {account}"))?;
			println!("{}", secret.expose());
			Ok(())
		}
		Command::Set { account, value } => {
			let value = match value {
				Some(value) => value,
				None => read_stdin_value()?,
			};
			if value.is_empty() {
				bail!("refusing to store an empty password");
			}
			let manager = open_manager(config)?;
			manager
				.update_password(&account, &SecretString::new(value))
				.await
				.with_context(|| format!("failed to update password for {account}"))?;
			println!("Updated {account}");
			Ok(())
		}
		Command::Menu => {
			let menus = Menus::build(config, true).await?;
			print!("{}", menus.builder.render().await);
			Ok(())
		}
		Command::Click {
			path,
			mode,
			tab,
			deny_clipboard,
		} => {
			let menus = Menus::build(config, !deny_clipboard).await?;
			if let Some(mode) = mode {
				let active = menus.context.dispatcher().select(mode).await?;
				if active != mode {
					warn!(requested = %mode, active = %active, "mode not available");
				}
			}

			let titles: Vec<&str> = path.iter().map(String::as_str).collect();
			let id = match menus.builder.find_by_path(&titles).await {
				Some(id) => id,
				None => {
					let mut rooted = vec![ROOT_TITLE];
					rooted.extend(titles.iter().copied());
					menus
						.builder
						.find_by_path(&rooted)
						.await
						.ok_or_else(|| anyhow!("no menu item at {}", path.join(" > ")))?
				}
			};
			menus.builder.click(&id, TabId(tab)).await?;
			Ok(())
		}
	}
}

fn open_store(config: &CliConfig) -> Result<Arc<dyn OptionsStore>> {
	let file: Arc<dyn OptionsStore> = Arc::new(FileOptionsStore::new(config.options_path.clone()));
	let overlay =
		EnvOverlayStore::from_env(file).context("failed to read secrets from the environment")?;
	Ok(Arc::new(overlay))
}

fn open_manager(config: &CliConfig) -> Result<Arc<CredentialManager>> {
	let http_client = keyfill_vault::http::new_client_with_timeout(config.http_timeout)
		.context("failed to build HTTP client")?;
	Ok(Arc::new(
		CredentialManager::new(open_store(config)?).with_http_client(http_client),
	))
}

fn read_stdin_value() -> Result<String> {
	let mut value = String::new();
	std::io::stdin()
		.read_to_string(&mut value)
		.context("failed to read password from stdin")?;
	if value.ends_with('\n') {
		value.pop();
		if value.ends_with('\r') {
			value.pop();
		}
	}
	Ok(value)
}

fn print_groups(groups: &GroupedAccounts) {
	for (group, accounts) in groups.iter() {
		if accounts.is_empty() {
			continue;
		}
		println!("{group}:");
		for account in accounts {
			println!("  {account}");
		}
	}
}

/// Both menus mounted on one in-memory builder.
struct Menus {
	builder: Arc<MemoryMenuBuilder>,
	context: Arc<ContextMenu>,
}

impl Menus {
	async fn build(config: &CliConfig, grant_clipboard: bool) -> Result<Self> {
		let standard = standard::load(config.standard_config.as_deref())?;
		let options = open_store(config)?;
		let manager = open_manager(config)?;
		let resolver: Arc<dyn CredentialResolver> = manager;
		let host: Arc<dyn HostInterface> = Arc::new(TerminalHost::new(
			grant_clipboard,
			config.options_path.clone(),
		));
		let builder = Arc::new(MemoryMenuBuilder::new());
		let menu_builder: Arc<dyn MenuBuilder> = builder.clone();

		let context = Arc::new(ContextMenu::new(
			standard,
			Arc::clone(&options),
			Arc::clone(&menu_builder),
			Arc::clone(&host),
			Arc::clone(&resolver),
			config.paste_supported,
		));
		context.init().await.context("failed to build context menu")?;

		let accounts = AccountMenu::new(options, menu_builder, host, resolver);
		accounts.init().await.context("failed to build account menu")?;

		Ok(Self { builder, context })
	}
}
