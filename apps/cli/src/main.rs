use std::{
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nuorder::{
    catalog::{CatalogSource, TomlCatalog},
    config::{self, ConnectorSettings, SettingsOverrides},
    sync::{run_full_sync, SyncContext},
    synclog::SyncLog,
    NuOrderClient,
};
use shared::domain::OrderStatus;

#[derive(Parser, Debug)]
#[command(
    name = "nuorder",
    about = "Command-line access to the NuOrder wholesale API"
)]
struct Cli {
    /// Config section to read settings from.
    #[arg(short = 'c', long, default_value = config::DEFAULT_SECTION)]
    config_section: String,
    /// Config file path (default: ~/.config/nuorder.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    hostname: Option<String>,
    #[arg(long)]
    consumer_key: Option<String>,
    #[arg(long)]
    consumer_secret: Option<String>,
    #[arg(long)]
    oauth_token: Option<String>,
    #[arg(long)]
    oauth_token_secret: Option<String>,
    /// Log filter, e.g. `info` or `nuorder=debug`.
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Make a GET request.
    Get {
        endpoint: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Make a DELETE request.
    Delete {
        endpoint: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Make a POST request.
    Post {
        endpoint: String,
        /// Request body; `-` reads from stdin.
        #[arg(short = 'd', long)]
        data: Option<String>,
        #[arg(long)]
        gzip_data: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Make a PUT request.
    Put {
        endpoint: String,
        /// Request body; `-` reads from stdin.
        #[arg(short = 'd', long)]
        data: Option<String>,
        #[arg(long)]
        gzip_data: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate a new oauth token and secret (interactive two-step approval).
    Initiate {
        #[arg(long)]
        app_name: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Probe the connection with the configured credentials.
    Check,
    /// Read orders.
    Orders {
        #[arg(long, default_value = "pending")]
        status: OrderStatus,
    },
    /// Push catalog companies as customers.
    PushCustomers {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Push catalog items as products.
    PushItems {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Run a full sync (check, orders, customers, items) to completion.
    Sync {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Show recent sync log entries.
    Log {
        #[arg(long, default_value_t = 20)]
        tail: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let overrides = SettingsOverrides {
        hostname: cli.hostname.clone(),
        consumer_key: cli.consumer_key.clone(),
        consumer_secret: cli.consumer_secret.clone(),
        oauth_token: cli.oauth_token.clone(),
        oauth_token_secret: cli.oauth_token_secret.clone(),
        app_name: None,
    };
    let path = cli.config.as_deref();
    let section = cli.config_section.as_str();

    match cli.command {
        Command::Get { endpoint, dry_run } => {
            let client = build_client(path, section, &overrides, dry_run)?;
            print_json(&client.get(&endpoint).await?)
        }
        Command::Delete { endpoint, dry_run } => {
            let client = build_client(path, section, &overrides, dry_run)?;
            print_json(&client.delete(&endpoint).await?)
        }
        Command::Post {
            endpoint,
            data,
            gzip_data,
            dry_run,
        } => {
            let data = read_data(data)?;
            let client = build_client(path, section, &overrides, dry_run)?;
            print_json(&client.post(&endpoint, data, gzip_data).await?)
        }
        Command::Put {
            endpoint,
            data,
            gzip_data,
            dry_run,
        } => {
            let data = read_data(data)?;
            let client = build_client(path, section, &overrides, dry_run)?;
            print_json(&client.put(&endpoint, data, gzip_data).await?)
        }
        Command::Initiate { app_name, dry_run } => {
            initiate(path, section, &overrides, app_name, dry_run).await
        }
        Command::Check => {
            let client = build_client(path, section, &overrides, false)?;
            if client.check_connection().await {
                println!("Connection valid");
                Ok(())
            } else {
                bail!("connection check failed; see the log for details");
            }
        }
        Command::Orders { status } => {
            let client = build_client(path, section, &overrides, false)?;
            let orders = client.get_orders(status).await?;
            print_json(&serde_json::to_value(orders)?)
        }
        Command::PushCustomers { catalog } => {
            let settings = load_settings(path, section, &overrides)?;
            let catalog = catalog_source(catalog, &settings)?;
            let companies = nuorder::catalog::company_payloads(&catalog.companies()?);
            let client = NuOrderClient::from_settings(&settings)?;
            let written = client.push_companies(&companies).await?;
            println!("Customers written: {written}");
            Ok(())
        }
        Command::PushItems { catalog } => {
            let settings = load_settings(path, section, &overrides)?;
            let catalog = catalog_source(catalog, &settings)?;
            let products: Vec<_> = catalog
                .items()?
                .iter()
                .map(|item| item.to_product())
                .collect();
            let client = NuOrderClient::from_settings(&settings)?;
            let written = client.push_products(&products).await?;
            println!("Items written: {written}");
            Ok(())
        }
        Command::Sync { catalog } => {
            let settings = load_settings(path, section, &overrides)?;
            let catalog = catalog_source(catalog, &settings)?;
            let log = match &settings.sync_log_path {
                Some(path) => SyncLog::to_file(path),
                None => SyncLog::in_memory(),
            };
            let context = SyncContext {
                settings,
                catalog,
                log: Arc::new(log),
            };
            let report = run_full_sync(&context).await?;
            println!(
                "Sync finished: {} orders read, {} customers and {} items written",
                report.orders_read, report.customers_written, report.items_written
            );
            Ok(())
        }
        Command::Log { tail } => {
            let settings = load_settings(path, section, &overrides)?;
            let Some(log_path) = &settings.sync_log_path else {
                bail!("no `sync_log_path` configured in section '{section}'");
            };
            let log = SyncLog::to_file(log_path);
            for entry in log.recent(tail) {
                println!(
                    "{} {:?} {:?} {}",
                    entry.at.to_rfc3339(),
                    entry.operation,
                    entry.outcome,
                    entry.detail
                );
            }
            Ok(())
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };
    // Diagnostics go to stderr so JSON output on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(
    path: Option<&Path>,
    section: &str,
    overrides: &SettingsOverrides,
) -> Result<ConnectorSettings> {
    config::load_settings(path, section, overrides)
        .with_context(|| format!("failed to load settings from section '{section}'"))
}

fn build_client(
    path: Option<&Path>,
    section: &str,
    overrides: &SettingsOverrides,
    dry_run: bool,
) -> Result<NuOrderClient> {
    let settings = load_settings(path, section, overrides)?;
    Ok(NuOrderClient::from_settings(&settings)?.with_dry_run(dry_run))
}

fn catalog_source(
    flag: Option<PathBuf>,
    settings: &ConnectorSettings,
) -> Result<Arc<dyn CatalogSource>> {
    let path = flag
        .or_else(|| settings.catalog_path.clone())
        .context("no catalog configured; pass --catalog or set `catalog_path`")?;
    Ok(Arc::new(TomlCatalog::new(path)))
}

fn read_data(data: Option<String>) -> Result<Option<String>> {
    match data.as_deref() {
        Some("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read request body from stdin")?;
            Ok(Some(buffer))
        }
        _ => Ok(data),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn initiate(
    path: Option<&Path>,
    section: &str,
    overrides: &SettingsOverrides,
    app_name_flag: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let settings = config::load_bootstrap_settings(path, section, overrides)
        .with_context(|| format!("failed to load settings from section '{section}'"))?;
    let app_name = app_name_flag
        .or_else(|| settings.app_name.clone())
        .context("`app_name` missing, and no default provided")?;

    let mut bootstrap = settings.clone();
    bootstrap.oauth_token = String::new();
    bootstrap.oauth_token_secret = String::new();
    let client = NuOrderClient::from_settings(&bootstrap)?.with_dry_run(dry_run);
    let response = client.oauth_initiate(&app_name).await?;
    eprintln!("Got response: {}", serde_json::to_string_pretty(&response)?);
    if dry_run {
        return Ok(());
    }

    let temp_token = response["oauth_token"]
        .as_str()
        .context("initiate response missing `oauth_token`")?
        .to_string();
    let temp_secret = response["oauth_token_secret"]
        .as_str()
        .context("initiate response missing `oauth_token_secret`")?
        .to_string();

    eprintln!(
        "Now go to the API management section of NuOrder's admin page and \
         approve the pending application that matches the details above. \
         Copy the verification code shown after the approval and paste it here."
    );
    eprint!("Verification code [paste and press Enter]: ");
    std::io::stderr().flush()?;
    let mut verifier = String::new();
    std::io::stdin()
        .read_line(&mut verifier)
        .context("failed to read verification code")?;

    let mut authorized = settings;
    authorized.oauth_token = temp_token;
    authorized.oauth_token_secret = temp_secret;
    let client = NuOrderClient::from_settings(&authorized)?;
    let token_pair = client.oauth_token_request(verifier.trim()).await?;

    eprintln!(
        "Success! Final OAuth token and secret below. Remember to save them in the config file."
    );
    print_json(&token_pair)
}
