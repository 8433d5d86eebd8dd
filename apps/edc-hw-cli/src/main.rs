//! edc-hw - Huawei Cloud dataspace extensions from the command line.
//!
//! Wires the OBS client cache, IAM credential broker, secret store,
//! provisioner and transfer factories together and exposes them as
//! subcommands.
//!
//! # Usage
//!
//! ```text
//! edc-hw provision my-bucket --output resource.json
//! edc-hw upload my-bucket --key-name <secret> data.csv
//! edc-hw list my-bucket --key-prefix in/
//! edc-hw download my-bucket --output ./out
//! edc-hw deprovision resource.json
//! edc-hw sql contract-definitions '{"filter":[...]}'
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HUAWEICLOUD_ACCESS_KEY_ID` | *(empty)* | Connector access key |
//! | `HUAWEICLOUD_SECRET_ACCESS_KEY` | *(empty)* | Connector secret key |
//! | `HUAWEICLOUD_OBS_ENDPOINT` | `https://obs.cn-north-4.myhuaweicloud.com` | Default OBS endpoint |
//! | `HUAWEICLOUD_IAM_ENDPOINT` | `https://iam.myhuaweicloud.com` | IAM endpoint |
//! | `EDC_HW_SECRETS_FILE` | `.edc-hw/secrets.json` | Credential store |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod app;
mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use edc_hw_core::{HuaweiCloudConfig, ProvisionedBucket};
use edc_hw_obs_client::MemoryObsClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::{Args, Command, StoreArg};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_sql(store: StoreArg, query: &str) -> Result<()> {
    let statement = app::sql(store.into(), query)?;
    println!("{}", statement.sql());
    print_json(&statement.parameters())
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Provision {
            bucket,
            endpoint,
            key_prefix,
            transfer_process_id,
            output,
        } => {
            let provisioned = app
                .provision(
                    &bucket,
                    endpoint.as_deref(),
                    key_prefix.as_deref(),
                    &transfer_process_id,
                )
                .await?;
            match output {
                Some(path) => {
                    let json = serde_json::to_vec_pretty(&provisioned)?;
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                }
                None => print_json(&provisioned)?,
            }
        }
        Command::Deprovision { resource: path } => {
            let json = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let resource: ProvisionedBucket = serde_json::from_slice(&json)
                .with_context(|| format!("{} is not a provisioned resource", path.display()))?;
            print_json(&app.deprovision(&resource).await?)?;
        }
        Command::Upload { target, files } => {
            let summary = app.upload(&target, &files).await?;
            for object in &summary.objects {
                println!("{}\t{}\t{}", object.key, object.part_count, object.bytes);
            }
        }
        Command::List { target } => {
            for (name, size) in app.list(&target).await? {
                println!("{name}\t{size}");
            }
        }
        Command::Download {
            target,
            object_name,
            output,
        } => {
            for path in app
                .download(&target, object_name.as_deref(), &output)
                .await?
            {
                println!("{}", path.display());
            }
        }
        Command::Sql { store, query } => print_sql(store, &query)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = HuaweiCloudConfig::from_env();

    init_tracing(&config.log_level)?;

    // Translation needs no remote components.
    if let Command::Sql { store, query } = &args.command {
        return print_sql(*store, query);
    }

    info!(
        obs_endpoint = %config.obs_endpoint,
        iam_endpoint = %config.iam_endpoint,
        memory = args.memory,
        version = VERSION,
        "starting edc-hw",
    );

    let app = if args.memory {
        App::in_memory(config, Arc::new(MemoryObsClient::default()))
    } else {
        App::connect(config, &args.secrets_file).await?
    };

    let result = run(&app, args.command).await;
    app.shutdown().await;
    result
}
