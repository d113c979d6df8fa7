//! CLI Adapter.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::adapters::{
    AwsIntegrationManager, AwsSession, HttpPlatformClient, IamPermissionGate, TerminalPrompt,
};
use crate::app::commands::{install, uninstall, update};
use crate::domain::{
    AccountId, AppError, DEFAULT_MEMORY_SIZE, DEFAULT_TIMEOUT, IngestionSettings, IngestionUpdate,
    PlatformApiConfig, PlatformRegion, SessionConfig,
};
use crate::ports::PlatformApi;

#[derive(Parser)]
#[command(name = "newrelic-lambda")]
#[command(version)]
#[command(
    about = "Install and manage the New Relic AWS Lambda integration",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the AWS account / New Relic account integration
    #[clap(visible_alias = "int")]
    Integrations {
        #[command(subcommand)]
        command: IntegrationsCommands,
    },
}

#[derive(Subcommand)]
enum IntegrationsCommands {
    /// Link this AWS account to New Relic and install log ingestion
    Install(InstallArgs),
    /// Remove the integration role, log ingestion, and license key secret
    Uninstall(UninstallArgs),
    /// Update the log ingestion function in place
    Update(UpdateArgs),
}

/// AWS session selection, shared by all subcommands.
#[derive(Args)]
struct AwsArgs {
    /// AWS profile to use
    #[arg(long, value_name = "PROFILE")]
    aws_profile: Option<String>,
    /// AWS region (falls back to AWS_DEFAULT_REGION)
    #[arg(long, value_name = "REGION")]
    aws_region: Option<String>,
}

impl AwsArgs {
    fn open_session(self) -> Result<Arc<AwsSession>, AppError> {
        let selection = SessionConfig::resolve(self.aws_profile, self.aws_region);
        Ok(Arc::new(AwsSession::open(&selection)?))
    }
}

#[derive(Args)]
struct InstallArgs {
    /// New Relic account id
    #[arg(long, value_name = "ID")]
    nr_account_id: AccountId,
    /// New Relic user API key
    #[arg(long, value_name = "KEY")]
    nr_api_key: String,
    /// Name for the linked AWS account on the New Relic side
    #[arg(long, value_name = "NAME")]
    linked_account_name: String,
    /// New Relic region hosting the account
    #[arg(long, value_name = "REGION", default_value = "us")]
    nr_region: PlatformRegion,
    /// Forward function logs in addition to platform logs
    #[arg(long)]
    enable_logs: bool,
    /// Memory size for the log ingestion function, in MB
    #[arg(long, value_name = "MB", default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: i64,
    /// Timeout for the log ingestion function, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT)]
    timeout: i64,
    /// Customer-managed policy to attach to the integration role instead of
    /// ReadOnlyAccess
    #[arg(long, value_name = "POLICY")]
    aws_role_policy: Option<String>,
    /// Skip the AWS permissions preflight
    #[arg(long)]
    no_aws_permissions_check: bool,
    #[command(flatten)]
    aws: AwsArgs,
}

#[derive(Args)]
struct UninstallArgs {
    /// New Relic account id
    #[arg(long, value_name = "ID")]
    nr_account_id: AccountId,
    /// Skip confirmation prompts
    #[arg(long, short = 'f')]
    force: bool,
    /// Skip the AWS permissions preflight
    #[arg(long)]
    no_aws_permissions_check: bool,
    #[command(flatten)]
    aws: AwsArgs,
}

#[derive(Args)]
struct UpdateArgs {
    /// New Relic account id (with --nr-api-key, refreshes the license key)
    #[arg(long, value_name = "ID", requires = "nr_api_key")]
    nr_account_id: Option<AccountId>,
    /// New Relic user API key
    #[arg(long, value_name = "KEY", requires = "nr_account_id")]
    nr_api_key: Option<String>,
    /// New Relic region hosting the account
    #[arg(long, value_name = "REGION", default_value = "us")]
    nr_region: PlatformRegion,
    /// Enable forwarding of function logs
    #[arg(long, conflicts_with = "disable_logs")]
    enable_logs: bool,
    /// Disable forwarding of function logs
    #[arg(long, conflicts_with = "enable_logs")]
    disable_logs: bool,
    /// Memory size for the log ingestion function, in MB
    #[arg(long, value_name = "MB")]
    memory_size: Option<i64>,
    /// Timeout for the log ingestion function, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<i64>,
    /// Skip the AWS permissions preflight
    #[arg(long)]
    no_aws_permissions_check: bool,
    #[command(flatten)]
    aws: AwsArgs,
}

/// Entry point for the CLI.
pub fn run() {
    let cli = Cli::parse();

    let result: Result<(), AppError> = match cli.command {
        Commands::Integrations { command } => match command {
            IntegrationsCommands::Install(args) => run_install(args),
            IntegrationsCommands::Uninstall(args) => run_uninstall(args),
            IntegrationsCommands::Update(args) => run_update(args),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_install(args: InstallArgs) -> Result<(), AppError> {
    let ingestion = IngestionSettings {
        enable_logs: args.enable_logs,
        memory_size: args.memory_size,
        timeout: args.timeout,
        role_name: None,
    };
    ingestion.validate()?;

    let session = args.aws.open_session()?;
    let manager = AwsIntegrationManager::new(Arc::clone(&session));
    let gate = IamPermissionGate::new(Arc::clone(&session));
    let platform = HttpPlatformClient::new(
        args.nr_account_id,
        args.nr_api_key,
        &PlatformApiConfig::for_region(args.nr_region),
    )?;

    let options = install::InstallOptions {
        account_id: args.nr_account_id,
        linked_account_name: args.linked_account_name,
        role_policy: args.aws_role_policy,
        ingestion,
        skip_permissions_check: args.no_aws_permissions_check,
    };
    let output = install::execute(&platform, &manager, &gate, options)?;

    if output.linked_account_created {
        println!("✅ Linked AWS account to New Relic as role '{}'", output.role.name);
    }
    println!("✅ Installed the New Relic AWS Lambda integration");
    Ok(())
}

fn run_uninstall(args: UninstallArgs) -> Result<(), AppError> {
    let session = args.aws.open_session()?;
    let manager = AwsIntegrationManager::new(Arc::clone(&session));
    let gate = IamPermissionGate::new(Arc::clone(&session));
    let prompt = TerminalPrompt;

    let options = uninstall::UninstallOptions {
        account_id: args.nr_account_id,
        force: args.force,
        skip_permissions_check: args.no_aws_permissions_check,
    };
    let output = uninstall::execute(&manager, &gate, &prompt, options)?;

    if output.role_removed || output.ingestion_removed || output.license_key_removed {
        println!("✅ Uninstalled the New Relic AWS Lambda integration");
    } else {
        println!("Nothing removed");
    }
    Ok(())
}

fn run_update(args: UpdateArgs) -> Result<(), AppError> {
    let ingestion = IngestionUpdate {
        enable_logs: match (args.enable_logs, args.disable_logs) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        memory_size: args.memory_size,
        timeout: args.timeout,
        role_name: None,
    };
    ingestion.validate()?;

    // Both flags are required together; clap enforces the pairing.
    let platform = match (args.nr_account_id, args.nr_api_key) {
        (Some(account_id), Some(api_key)) => Some(HttpPlatformClient::new(
            account_id,
            api_key,
            &PlatformApiConfig::for_region(args.nr_region),
        )?),
        _ => None,
    };

    let session = args.aws.open_session()?;
    let manager = AwsIntegrationManager::new(Arc::clone(&session));
    let gate = IamPermissionGate::new(Arc::clone(&session));

    let options = update::UpdateOptions {
        ingestion,
        skip_permissions_check: args.no_aws_permissions_check,
    };
    let output = update::execute(
        &manager,
        &gate,
        platform.as_ref().map(|client| client as &dyn PlatformApi),
        options,
    )?;

    if output.license_key_refreshed {
        println!("✅ Updated the log ingestion function and license key");
    } else {
        println!("✅ Updated the log ingestion function");
    }
    Ok(())
}
