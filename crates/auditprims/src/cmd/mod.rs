use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use auditprims_client::{AuditSession, LogSplit, SessionConfig, WaitMode};
use auditprims_transport::AuditSocket;

use crate::exit::{transport_error, CliResult};
use crate::output::OutputFormat;

pub mod doctor;
pub mod listen;
pub mod logsplit;
pub mod send;
pub mod set_pid;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a process as the kernel's audit event consumer.
    SetPid(SetPidArgs),
    /// Turn kernel log splitting on or off.
    Logsplit(LogsplitArgs),
    /// Print the kernel audit status.
    Status(StatusArgs),
    /// Receive and print audit messages.
    Listen(ListenArgs),
    /// Send a single audit control message.
    Send(SendArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, config: SessionConfig) -> CliResult<i32> {
    match command {
        Command::SetPid(args) => set_pid::run(args, format, config),
        Command::Logsplit(args) => logsplit::run(args, format, config),
        Command::Status(args) => status::run(args, format, config),
        Command::Listen(args) => listen::run(args, format, config),
        Command::Send(args) => send::run(args, format, config),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Open a fresh audit socket for one command.
pub fn open_session(config: SessionConfig) -> CliResult<AuditSession<AuditSocket>> {
    let socket = AuditSocket::open().map_err(|err| transport_error("open failed", err))?;
    Ok(AuditSession::with_config(socket, config))
}

fn wait_mode(wait: bool) -> WaitMode {
    if wait {
        WaitMode::Wait
    } else {
        WaitMode::NoWait
    }
}

#[derive(Args, Debug)]
pub struct SetPidArgs {
    /// Process id to register. Default: this process.
    #[arg(long)]
    pub pid: Option<u32>,
    /// Drain the kernel's confirmation after the acknowledgement.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogsplitMode {
    On,
    Off,
}

impl From<LogsplitMode> for LogSplit {
    fn from(mode: LogsplitMode) -> Self {
        match mode {
            LogsplitMode::On => LogSplit::On,
            LogsplitMode::Off => LogSplit::Off,
        }
    }
}

#[derive(Args, Debug)]
pub struct LogsplitArgs {
    /// Desired log-split state.
    #[arg(value_enum)]
    pub mode: LogsplitMode,
    /// Drain the kernel's confirmation after the acknowledgement.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Register this process as the audit event consumer before listening.
    #[arg(long)]
    pub register: bool,
    /// Only print these message types (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<u16>>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Poll without blocking instead of waiting in the kernel.
    #[arg(long)]
    pub nonblocking: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message type tag (e.g. 1000 for AUDIT_GET).
    #[arg(long = "type", value_name = "TYPE")]
    pub msg_type: u16,
    /// Raw string payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Print one queued reply after the acknowledgement, if any.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
