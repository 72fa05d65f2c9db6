use crate::commands::{
    devices::DevicesArgs, forward::ForwardArgs, logcat::LogcatArgs, ls::LsArgs, pull::PullArgs,
    push::PushArgs, shell::ShellArgs, tcpip::TcpipArgs,
};
use clap::{Parser, Subcommand};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputType {
    Table,
    Json,
    Plain,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level; `-q` also hides progress and status lines
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,

    /// ADB server hostname (defaults to ~/.adbwire.toml, then localhost)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// ADB server port (defaults to ANDROID_ADB_SERVER_PORT, then 5037)
    #[arg(long, short = 'p', global = true)]
    pub port: Option<u16>,

    /// Device serial (required if multiple devices are connected)
    #[arg(long, short = 's', global = true)]
    pub serial: Option<String>,

    /// Log every request and status token
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "table")]
    pub output: OutputType,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Lists connected devices
    Devices(DevicesArgs),

    /// Gets the server version
    Version,

    /// Runs a command on a device, streaming stdout and stderr
    Shell(ShellArgs),

    /// Lists a directory on a device
    Ls(LsArgs),

    /// Copies a local file to a device
    Push(PushArgs),

    /// Copies a file from a device
    Pull(PullArgs),

    /// Streams the device log until Ctrl-C
    Logcat(LogcatArgs),

    /// Manages port forwards
    Forward(ForwardArgs),

    /// Restarts adbd listening on TCP
    Tcpip(TcpipArgs),

    /// Stops the ADB server
    KillServer,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Devices(DevicesArgs::default()))
    }
}
