mod cli;
mod commands;
mod output;
mod progress;

use adbwire::{Client, ClientConfig, Result};
use clap::Parser;
use cli::{Cli, Commands};
use log::LevelFilter;
use commands::{
    devices::DevicesCommand, forward::ForwardCommand, logcat::LogcatCommand, ls::LsCommand,
    pull::PullCommand, push::PushCommand, shell::ShellCommand, tcpip::TcpipCommand,
    version::VersionCommand, CommandContext, SubCommand,
};
use output::OutputFormatter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .filter_module("adbwire", library_log_level(&cli))
        .init();

    if let Err(e) = run(cli).await {
        OutputFormatter::new().error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}

/// `--debug` raises this crate's own logging to at least debug so the
/// request and status trace actually reaches stderr.
fn library_log_level(cli: &Cli) -> LevelFilter {
    let level = cli.verbose.log_level_filter();
    if cli.debug {
        level.max(LevelFilter::Debug)
    } else {
        level
    }
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load()?;
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    let debug = cli.debug || config.debug;
    Ok(config.with_debug(debug))
}

async fn run(cli: Cli) -> Result<()> {
    let client = Client::new(build_config(&cli)?);
    let ctx = CommandContext::new(client)
        .with_serial(cli.serial.clone())
        .with_output(cli.output)
        .with_quiet(cli.verbose.is_silent());

    match cli.command() {
        Commands::Devices(args) => DevicesCommand::new().run(&ctx, args).await,
        Commands::Version => VersionCommand::new().run(&ctx, ()).await,
        Commands::Shell(args) => ShellCommand::new().run(&ctx, args).await,
        Commands::Ls(args) => LsCommand::new().run(&ctx, args).await,
        Commands::Push(args) => PushCommand::new().run(&ctx, args).await,
        Commands::Pull(args) => PullCommand::new().run(&ctx, args).await,
        Commands::Logcat(args) => LogcatCommand::new().run(&ctx, args).await,
        Commands::Forward(args) => ForwardCommand::new().run(&ctx, args).await,
        Commands::Tcpip(args) => TcpipCommand::new().run(&ctx, args).await,
        Commands::KillServer => ctx.client.kill_server().await,
    }
}
