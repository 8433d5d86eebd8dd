//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use edc_hw_gaussdb::Store;

/// Provision OBS buckets and move data through them.
#[derive(Parser, Debug)]
#[command(name = "edc-hw", author, version, about, long_about = None)]
pub struct Args {
    /// JSON file holding issued temporary credentials.
    #[arg(
        long,
        global = true,
        env = "EDC_HW_SECRETS_FILE",
        default_value = ".edc-hw/secrets.json"
    )]
    pub secrets_file: PathBuf,

    /// Run against in-process fakes instead of Huawei Cloud.
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a bucket and issue a temporary PutObject credential for it.
    Provision {
        /// Bucket to create.
        bucket: String,
        /// OBS endpoint; defaults to `HUAWEICLOUD_OBS_ENDPOINT`.
        #[arg(long)]
        endpoint: Option<String>,
        /// Key prefix recorded in the resulting data address.
        #[arg(long)]
        key_prefix: Option<String>,
        /// Transfer process the bucket belongs to.
        #[arg(long, default_value = "cli")]
        transfer_process_id: String,
        /// Write the provisioned resource here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Empty and delete a bucket created by `provision`.
    Deprovision {
        /// Provisioned resource JSON written by `provision`.
        resource: PathBuf,
    },

    /// Upload local files with multipart uploads.
    Upload {
        #[command(flatten)]
        target: Target,
        /// Files to upload; each becomes one object named after the file.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List objects under a prefix.
    List {
        #[command(flatten)]
        target: Target,
    },

    /// Download objects under a prefix into a directory.
    Download {
        #[command(flatten)]
        target: Target,
        /// Single object to fetch.
        #[arg(long)]
        object_name: Option<String>,
        /// Destination directory.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
    },

    /// Print the GaussDB statement for a store query.
    Sql {
        /// Store to query.
        #[arg(value_enum)]
        store: StoreArg,
        /// Query as JSON: `{"filter":[...],"sortField":..,"limit":..}`.
        #[arg(default_value = "{}")]
        query: String,
    },
}

/// Where objects live.
#[derive(ClapArgs, Debug, Clone)]
pub struct Target {
    /// Bucket name.
    pub bucket: String,
    /// OBS endpoint; defaults to `HUAWEICLOUD_OBS_ENDPOINT`.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Key prefix.
    #[arg(long, default_value = "")]
    pub key_prefix: String,
    /// Secret holding a temporary credential to sign with.
    #[arg(long)]
    pub key_name: Option<String>,
}

/// Store names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreArg {
    /// Assets.
    Assets,
    /// Contract definitions.
    ContractDefinitions,
    /// Contract negotiations.
    ContractNegotiations,
    /// Transfer processes.
    TransferProcesses,
    /// Policy definitions.
    PolicyDefinitions,
    /// Policy-monitor entries.
    PolicyMonitor,
    /// Data-plane instances.
    DataPlaneInstances,
}

impl From<StoreArg> for Store {
    fn from(value: StoreArg) -> Self {
        match value {
            StoreArg::Assets => Self::Assets,
            StoreArg::ContractDefinitions => Self::ContractDefinitions,
            StoreArg::ContractNegotiations => Self::ContractNegotiations,
            StoreArg::TransferProcesses => Self::TransferProcesses,
            StoreArg::PolicyDefinitions => Self::PolicyDefinitions,
            StoreArg::PolicyMonitor => Self::PolicyMonitor,
            StoreArg::DataPlaneInstances => Self::DataPlaneInstances,
        }
    }
}
