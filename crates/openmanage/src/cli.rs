//! Clap derive structures for the `openmanage` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this module
//! must only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// openmanage -- idempotent operations against Dell iDRAC, OME and OMEVV
#[derive(Debug, Parser)]
#[command(
    name = "openmanage",
    version,
    about = "Manage Dell iDRAC, OpenManage Enterprise and OMEVV from the command line",
    long_about = "Runs one idempotent operation per invocation and prints a single\n\
        result document: {changed, failed, msg, ...}.\n\n\
        The `module` subcommand speaks the Ansible binary-module contract.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "OPENMANAGE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device hostname or IP address (overrides profile)
    #[arg(long, env = "OPENMANAGE_HOSTNAME", global = true)]
    pub hostname: Option<String>,

    /// HTTPS port
    #[arg(long, env = "OPENMANAGE_PORT", global = true)]
    pub port: Option<u16>,

    /// Username for session authentication
    #[arg(long, short = 'u', env = "OPENMANAGE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for session authentication
    #[arg(long, env = "OPENMANAGE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Pre-issued X-Auth-Token (mutually exclusive with username/password)
    #[arg(long, env = "OPENMANAGE_AUTH_TOKEN", global = true, hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub no_validate_certs: bool,

    /// CA bundle used to validate the device certificate
    #[arg(long, env = "OPENMANAGE_CA_PATH", global = true)]
    pub ca_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "OPENMANAGE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Report what would change without changing anything
    #[arg(long, global = true)]
    pub check: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "OPENMANAGE_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lifecycle Controller jobs
    #[command(name = "lc-job")]
    LcJob(LcJobArgs),

    /// Lifecycle Controller job queue
    #[command(name = "lc-job-queue")]
    LcJobQueue(LcJobQueueArgs),

    /// Apply a Redfish reset type to a system
    Power(PowerArgs),

    /// Collect System Inventory On Restart
    Csior(CsiorArgs),

    /// OpenManage Enterprise job information
    #[command(name = "ome-job-info")]
    OmeJobInfo(OmeJobInfoArgs),

    /// vCenters registered with OMEVV
    #[command(name = "omevv-vcenter-info")]
    OmevvVcenterInfo(OmevvVcenterInfoArgs),

    /// Run as an Ansible binary module: `openmanage module <name> <args-file>`
    Module(ModuleArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct LcJobArgs {
    #[command(subcommand)]
    pub command: LcJobCommand,
}

#[derive(Debug, Subcommand)]
pub enum LcJobCommand {
    /// Delete one job
    Delete {
        #[arg(long)]
        job_id: String,
    },
    /// Show the status of one job
    Status {
        #[arg(long)]
        job_id: String,
    },
}

#[derive(Debug, Args)]
pub struct LcJobQueueArgs {
    #[command(subcommand)]
    pub command: LcJobQueueCommand,
}

#[derive(Debug, Subcommand)]
pub enum LcJobQueueCommand {
    /// Delete every job in the queue
    Delete,
}

#[derive(Debug, Args)]
pub struct PowerArgs {
    #[arg(long, value_enum)]
    pub reset_type: ResetTypeArg,

    /// System id when the service exposes more than one
    #[arg(long)]
    pub resource_id: Option<String>,
}

/// Mirrors the Redfish `ResetType` names.
#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "verbatim")]
pub enum ResetTypeArg {
    ForceOff,
    ForceOn,
    ForceRestart,
    GracefulRestart,
    GracefulShutdown,
    Nmi,
    On,
    PowerCycle,
    PushPowerButton,
}

#[derive(Debug, Args)]
pub struct CsiorArgs {
    #[arg(long, value_enum)]
    pub state: CsiorStateArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CsiorStateArg {
    Enabled,
    Disabled,
}

#[derive(Debug, Args)]
pub struct OmeJobInfoArgs {
    /// A single job id; all jobs when omitted
    #[arg(long)]
    pub job_id: Option<u64>,

    /// OData `$top`
    #[arg(long, conflicts_with = "job_id")]
    pub top: Option<u64>,

    /// OData `$skip`
    #[arg(long, conflicts_with = "job_id")]
    pub skip: Option<u64>,

    /// OData `$filter`, e.g. "JobType/Id eq 8"
    #[arg(long, conflicts_with = "job_id")]
    pub filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct OmevvVcenterInfoArgs {
    /// Only report the vCenter with this console address
    #[arg(long)]
    pub vcenter_hostname: Option<String>,

    /// vCenter identifier sent with every OMEVV request
    #[arg(long, env = "OPENMANAGE_VCENTER_UUID")]
    pub vcenter_uuid: Option<String>,
}

#[derive(Debug, Args)]
pub struct ModuleArgs {
    /// Module name, e.g. `idrac_lifecycle_controller_jobs`
    pub name: String,

    /// JSON file containing `{"ANSIBLE_MODULE_ARGS": {...}}`
    pub args_file: PathBuf,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
