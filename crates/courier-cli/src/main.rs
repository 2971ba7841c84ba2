//! courier — run envelope-routing nodes from a JSON config

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod generators;

use config::{CourierConfig, GeneratorKind};
use courier_core::{ContentGenerator, NodeRuntime, Transport};
use courier_nlu::IntentClient;
use courier_transport::LocalTransport;
use generators::{EchoGenerator, IntentGenerator};

#[derive(Parser)]
#[command(name = "courier")]
#[command(version)]
#[command(about = "Envelope routing nodes for distributed agents")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "courier.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a configured module with a stdin/stdout envelope bridge
    Run {
        /// Module name from the config's `modules` map
        #[arg(short, long)]
        module: String,
    },
    /// Show the parsed configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Run { module } => cmd_run(&cli.config, &module).await,
        Commands::Config => cmd_config(&cli.config),
    }
}

fn cmd_config(path: &Path) -> Result<()> {
    let config = CourierConfig::load(path)?;
    println!("{:#?}", config);
    Ok(())
}

async fn cmd_run(path: &Path, module_name: &str) -> Result<()> {
    let config = CourierConfig::load(path)?;
    let module = config.module(module_name)?;

    let generator: Arc<dyn ContentGenerator> = match module.generator {
        GeneratorKind::Echo => Arc::new(EchoGenerator),
        GeneratorKind::Intent => {
            let nlu = module.nlu.as_ref().with_context(|| {
                format!(
                    "module '{}' uses the intent generator but has no nlu section",
                    module_name
                )
            })?;
            let client = IntentClient::new(nlu.client_config())?;
            info!("Intent client ready: {:?}", client);
            Arc::new(IntentGenerator::new(client, nlu.text_field.clone()))
        }
    };

    let transport = Arc::new(LocalTransport::new());
    let node = Arc::new(NodeRuntime::new(
        &module.identity,
        module.node_config(),
        transport.clone(),
        generator,
    ));
    let shutdown = node.shutdown_token();

    // Outbound envelopes go to stdout.
    let mut outbound = transport
        .subscribe(&module.outbound, module.queue_depth)
        .await?;
    tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            println!("{}", payload);
        }
    });

    let running = tokio::spawn({
        let node = node.clone();
        async move { node.run().await }
    });
    // Let the runtime bind its subscription before stdin is bridged in.
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Each stdin line is published as one raw envelope.
    let stdin_transport = transport.clone();
    let inbound = module.inbound.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if let Err(e) = stdin_transport.publish(&inbound, &line).await {
                error!("Failed to publish stdin envelope: {}", e);
            }
        }
    });

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    running.await??;
    Ok(())
}
