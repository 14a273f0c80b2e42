use anyhow::{Context, Result};
use provisioner::cli::commands::{RunCommand, ValidateCommand};
use provisioner::cli::output::*;
use provisioner::cli::terminal_output::TerminalReporter;
use provisioner::cli::{Cli, Command};
use provisioner::core::config::ProvisionConfig;
use provisioner::core::{ExecutionStatus, Pipeline, PipelineContext};
use provisioner::execution::{create_summary, ExecutionEngine};
use provisioner::identity::{AzCliIdentityClient, DryRunProvisioner, IdentityProvisioner};
use provisioner::steps::CreateManagedIdentityStep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_config(cmd)?,
    }

    Ok(())
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let mut config =
        ProvisionConfig::from_file(&cmd.file).context("Failed to load provisioning config")?;
    cmd.apply_overrides(&mut config);
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;

    if !cmd.json {
        println!("{} Loaded pipeline: {}", INFO, style(&config.name).bold());
    }

    let provisioner: Box<dyn IdentityProvisioner> = if cmd.dry_run {
        Box::new(DryRunProvisioner::new(cmd.subscription.clone()))
    } else {
        Box::new(AzCliIdentityClient::new(cmd.client_config()))
    };

    let mut pipeline =
        Pipeline::new(config.name.clone()).with_step(CreateManagedIdentityStep::new(provisioner));
    let mut ctx = PipelineContext::new();
    config.seed_context(&mut ctx);

    // Ctrl-C cancels the in-flight step instead of killing the process
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling pipeline");
            on_interrupt.cancel();
        }
    });

    let mut engine = ExecutionEngine::new();
    if !cmd.json {
        let reporter = TerminalReporter::new();
        engine.add_event_handler(move |event| reporter.handle(&event));
    }

    let status = engine.execute(&mut pipeline, &mut ctx, &cancel).await?;
    let summary =
        create_summary(&pipeline, &ctx).context("Failed to summarize pipeline run")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n{}", format_summary(&summary));
        match status {
            ExecutionStatus::Completed => println!(
                "\n{} {} completed {}",
                CHECK,
                style(&pipeline.name).bold(),
                style("successfully").green()
            ),
            _ => println!(
                "\n{} {} {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("halted").red()
            ),
        }
    }

    if status != ExecutionStatus::Completed {
        if let Some(error) = ctx.take_error() {
            debug!("Halting error: {:?}", error);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    match ProvisionConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Resource group: {}", style(&config.resource_group.name).cyan());
            println!("  Managed identity: {}", style(&config.managed_identity.name).cyan());
            println!("  Roles: {}", style(config.managed_identity.roles.len()).cyan());
            println!("  Tags: {}", style(config.tags.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}
