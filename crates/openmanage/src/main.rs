mod cli;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser, ValueEnum};
use serde::de::DeserializeOwned;
use tracing::info_span;
use tracing_subscriber::EnvFilter;

use openmanage_config::{
    ConfigError, ModuleArgs, apply_ca_fallback, process_env, read_module_args,
};
use openmanage_core::ops::{
    Csior, CsiorState, LcJobDelete, LcJobQueueDelete, LcJobStatus, OmeJobInfo, OmevvVcenterInfo,
    PowerState, ResetType, SystemQueryOptions,
};
use openmanage_core::{
    CoreError, ModuleParams, Operation, OperationContext, OperationResult, run_operation,
};

use crate::cli::{
    Cli, Command, CsiorStateArg, LcJobCommand, LcJobQueueCommand, OutputFormat, ResetTypeArg,
};
use crate::error::{CliError, exit_code};

/// Module names accepted by `openmanage module`.
const MODULES: &[&str] = &[
    "idrac_lifecycle_controller_jobs",
    "dellemc_delete_lc_job",
    "dellemc_delete_lc_job_queue",
    "idrac_lifecycle_controller_job_status_info",
    "dellemc_get_lc_job_status",
    "redfish_powerstate",
    "dellemc_idrac_lc_attributes",
    "ome_job_info",
    "omevv_vcenter_info",
];

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}

/// Logs go to stderr so stdout carries nothing but the result document.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("OPENMANAGE_LOG").unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let format = cli.global.output;
    match cli.command {
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "openmanage", &mut std::io::stdout());
            Ok(exit_code::SUCCESS)
        }

        Command::Module(args) => {
            let result = match read_module_args(&args.args_file) {
                Ok(module_args) => run_module(&args.name, &module_args).await?,
                Err(ConfigError::ModuleArgs { reason }) => {
                    OperationResult::failed(format!("invalid module args: {reason}"))
                }
                Err(err) => return Err(err.into()),
            };
            finish(format, &result)
        }

        cmd => {
            let mut params = config::resolve_params(&cli.global)?;
            let result = dispatch(cmd, &mut params).await?;
            finish(format, &result)
        }
    }
}

/// Run one device subcommand against the resolved connection options.
async fn dispatch(cmd: Command, params: &mut ModuleParams) -> Result<OperationResult, CliError> {
    tracing::debug!(host = %params.hostname, check_mode = params.check_mode, "dispatching command");
    let result = match cmd {
        Command::LcJob(args) => match args.command {
            LcJobCommand::Delete { job_id } => perform(&LcJobDelete { job_id }, params).await?,
            LcJobCommand::Status { job_id } => perform(&LcJobStatus { job_id }, params).await?,
        },
        Command::LcJobQueue(args) => match args.command {
            LcJobQueueCommand::Delete => perform(&LcJobQueueDelete::default(), params).await?,
        },
        Command::Power(args) => {
            let op = PowerState {
                reset_type: reset_type(args.reset_type)?,
                resource_id: args.resource_id,
            };
            perform(&op, params).await?
        }
        Command::Csior(args) => {
            let state = match args.state {
                CsiorStateArg::Enabled => CsiorState::Enabled,
                CsiorStateArg::Disabled => CsiorState::Disabled,
            };
            perform(&Csior { state }, params).await?
        }
        Command::OmeJobInfo(args) => {
            let op = OmeJobInfo {
                job_id: args.job_id,
                system_query_options: Some(SystemQueryOptions {
                    top: args.top,
                    skip: args.skip,
                    filter: args.filter,
                }),
            };
            perform(&op, params).await?
        }
        Command::OmevvVcenterInfo(args) => {
            if args.vcenter_uuid.is_some() {
                params.vcenter_uuid = args.vcenter_uuid;
            }
            let op = OmevvVcenterInfo {
                vcenter_hostname: args.vcenter_hostname,
            };
            perform(&op, params).await?
        }
        Command::Completions(_) | Command::Module(_) => {
            return Err(CliError::Validation {
                message: "this command does not target a device".into(),
            });
        }
    };
    Ok(result)
}

fn reset_type(arg: ResetTypeArg) -> Result<ResetType, CoreError> {
    arg.to_possible_value()
        .map(|v| v.get_name().to_owned())
        .unwrap_or_default()
        .parse()
}

/// Build the session config, then run `op` under its own span.
///
/// Errors here are input errors: nothing has been sent to the device.
async fn perform<O: Operation>(
    op: &O,
    params: &ModuleParams,
) -> Result<OperationResult, CoreError> {
    let config = params.session_config(op.family())?;
    let span = info_span!("operation", name = O::NAME, host = %params.hostname);
    let ctx = OperationContext::new(params.check_mode, span);
    Ok(run_operation(op, config, &ctx).await)
}

fn finish(format: OutputFormat, result: &OperationResult) -> Result<i32, CliError> {
    output::print_result(format, result)?;
    Ok(if result.is_failed() {
        exit_code::FAILED
    } else {
        exit_code::SUCCESS
    })
}

// ── Ansible binary module ───────────────────────────────────────────

/// Dispatch a module by name. Argument problems are reported as a failed
/// result document, the way Ansible expects them.
async fn run_module(name: &str, args: &ModuleArgs) -> Result<OperationResult, CliError> {
    let mut params = args.params.clone();
    apply_ca_fallback(&mut params, process_env);

    let result = match name {
        "idrac_lifecycle_controller_jobs" if args.get("job_id").is_some() => {
            module_op::<LcJobDelete>(args, &params).await
        }
        "idrac_lifecycle_controller_jobs" | "dellemc_delete_lc_job_queue" => {
            module_op::<LcJobQueueDelete>(args, &params).await
        }
        "dellemc_delete_lc_job" => module_op::<LcJobDelete>(args, &params).await,
        "idrac_lifecycle_controller_job_status_info" | "dellemc_get_lc_job_status" => {
            module_op::<LcJobStatus>(args, &params).await
        }
        "redfish_powerstate" => module_op::<PowerState>(args, &params).await,
        "dellemc_idrac_lc_attributes" => module_op::<Csior>(args, &params).await,
        "ome_job_info" => module_op::<OmeJobInfo>(args, &params).await,
        "omevv_vcenter_info" => module_op::<OmevvVcenterInfo>(args, &params).await,
        other => {
            return Err(CliError::UnknownModule {
                name: other.into(),
                available: MODULES.join(", "),
            });
        }
    };
    Ok(result)
}

async fn module_op<O: Operation + DeserializeOwned>(
    args: &ModuleArgs,
    params: &ModuleParams,
) -> OperationResult {
    match args.operation::<O>() {
        Ok(op) => perform(&op, params)
            .await
            .unwrap_or_else(OperationResult::from_error),
        Err(err) => OperationResult::failed(err.to_string()),
    }
}
