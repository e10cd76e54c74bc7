pub mod commands;
pub mod console;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use crate::application::services::ProgressReporter;
use crate::application::use_cases::{LoginConfig, LoginUseCase, PreflightCheckUseCase};
use crate::common::error::ProvisionError;
use crate::common::logging::init_tracing;
use crate::common::result::ProvisionResult;
use crate::domain::entities::provision_config::{ConfigOverrides, ProvisionConfig};
use crate::domain::value_objects::secret::Secret;
use crate::infrastructure::{
    AzureCli, CommandRunner, ConfigStore, DryRunRunner, GitHubCli, ProcessRunner, SystemIdentity,
    ToolLocator,
};

use commands::{CleanupCommand, SetupCommand};
use console::ConsoleProgress;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

/// azprov - provision a per-developer Azure environment and wire its CI secrets
#[derive(Parser, Debug)]
#[command(name = "azprov")]
#[command(about = "Provision or tear down a per-developer Azure environment")]
#[command(version, long_version = LONG_VERSION)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Skip the interactive az/gh login
    #[arg(short = 's', long, global = true)]
    pub skip_login: bool,

    /// Print every command instead of running it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// YAML or JSON configuration file
    #[arg(short, long, global = true, env = "AZPROV_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// cleanup: also delete the service principal and the GitHub secrets
    #[arg(long, global = true)]
    pub purge_credentials: bool,

    #[arg(long, global = true, hide = true, env = "AZPROV_USER")]
    pub user: Option<String>,

    #[arg(long, global = true, hide = true, env = "AZPROV_LOCATION")]
    pub location: Option<String>,

    #[arg(long, global = true, hide = true, env = "AZPROV_SUBSCRIPTION")]
    pub subscription: Option<String>,

    #[arg(
        long,
        global = true,
        hide = true,
        hide_env_values = true,
        env = "AZPROV_DB_PASSWORD"
    )]
    pub db_password: Option<String>,

    #[arg(long, global = true, hide = true, env = "AZPROV_GITHUB_REPOSITORY")]
    pub github_repository: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the Azure resources and store the CI secrets in GitHub
    Setup,

    /// Delete the resource group
    Cleanup,
}

impl Cli {
    /// Environment and command-line values that override the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            user: self.user.clone(),
            location: self.location.clone(),
            subscription: self.subscription.clone(),
            db_password: self.db_password.clone().map(Secret::new),
            github_repository: self.github_repository.clone(),
        }
    }

    /// Flag combinations clap cannot express on its own
    pub fn check_usage(&self) -> ProvisionResult<()> {
        if self.purge_credentials && self.command != Commands::Cleanup {
            return Err(ProvisionError::usage(
                "--purge-credentials only applies to cleanup",
            ));
        }
        Ok(())
    }
}

/// Result of reading the command line
#[derive(Debug)]
pub enum ParseOutcome {
    Run(Box<Cli>),
    /// `-h`/`--help` was given somewhere
    Help,
    /// clap handled it (version, usage error); print it and exit with `code`
    Exit { error: clap::Error, code: i32 },
}

/// True when `-h` or `--help` appears anywhere before a `--` separator
pub fn help_requested(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|arg| arg.as_os_str() != "--")
        .any(|arg| arg == "-h" || arg == "--help")
}

pub fn parse_arguments<I, T>(args: I) -> ParseOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if help_requested(&args) {
        return ParseOutcome::Help;
    }

    match Cli::try_parse_from(&args) {
        Ok(cli) => ParseOutcome::Run(Box::new(cli)),
        Err(error) => {
            let code = match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            ParseOutcome::Exit { error, code }
        }
    }
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    /// Parse the process arguments, exiting on help, version or usage errors
    pub fn new() -> Self {
        match parse_arguments(std::env::args_os()) {
            ParseOutcome::Run(cli) => Self::from_cli(*cli),
            ParseOutcome::Help => {
                print!("{}", Cli::command().render_help());
                exit(0);
            }
            ParseOutcome::Exit { error, code } => {
                let _ = error.print();
                exit(code);
            }
        }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        // Set up colored output
        if self.cli.no_color {
            colored::control::set_override(false);
        }
        init_tracing(self.cli.verbose);

        match self.handle_command().await {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    async fn handle_command(&self) -> ProvisionResult<()> {
        self.cli.check_usage()?;
        PreflightCheckUseCase::new(ToolLocator::from_env()).execute()?;

        let config = self.load_config().await?;

        // whoami always runs for real so dry runs show the real names
        let identity = SystemIdentity::new(Arc::new(ProcessRunner::new()));
        let user = identity.resolve(config.user.as_deref()).await?;
        let names = config.resolve_names(&user)?;
        tracing::debug!(resource_group = %names.resource_group, "resolved resource names");

        let runner = self.runner(&config);
        let progress: Arc<dyn ProgressReporter> = Arc::new(ConsoleProgress::new());
        let az = AzureCli::new(runner.clone());
        let gh = GitHubCli::new(runner, config.github.repository.clone());

        if self.cli.dry_run {
            println!("{} Dry run: commands are printed, not executed", "::".blue().bold());
        }

        if !self.cli.skip_login {
            let login = LoginUseCase::new(
                az.clone(),
                gh.clone(),
                LoginConfig {
                    subscription: config.subscription.clone(),
                },
                progress.clone(),
            );
            login.execute().await?;
        }

        match &self.cli.command {
            Commands::Setup => {
                SetupCommand::new(az, gh, config, self.cli.config.clone(), names, progress)
                    .execute()
                    .await
            }
            Commands::Cleanup => {
                let secrets = config.github.secrets.clone();
                CleanupCommand::new(az, gh, &names, secrets, self.cli.purge_credentials, progress)
                    .execute()
                    .await
            }
        }
    }

    /// Defaults, then the config file, then environment/CLI overrides
    async fn load_config(&self) -> ProvisionResult<ProvisionConfig> {
        let mut config = ConfigStore::new().load(self.cli.config.as_deref()).await?;
        config.apply_overrides(self.cli.overrides());
        config.check()?;

        if self.cli.command == Commands::Setup {
            config.require_database_password()?;
        }
        Ok(config)
    }

    fn runner(&self, config: &ProvisionConfig) -> Arc<dyn CommandRunner> {
        if self.cli.dry_run {
            return Arc::new(DryRunRunner::new());
        }
        match config.command_timeout_secs {
            Some(secs) => Arc::new(ProcessRunner::new().with_timeout(secs)),
            None => Arc::new(ProcessRunner::new()),
        }
    }
}
