#[cfg(target_os = "linux")]
mod cmd;
#[cfg(target_os = "linux")]
mod exit;
#[cfg(target_os = "linux")]
mod logging;
#[cfg(target_os = "linux")]
mod output;

#[cfg(target_os = "linux")]
use auditprims_client::{SessionConfig, SkewPolicy};
#[cfg(target_os = "linux")]
use clap::Parser;

#[cfg(target_os = "linux")]
use crate::cmd::Command;
#[cfg(target_os = "linux")]
use crate::logging::{init_logging, LogFormat, LogLevel};
#[cfg(target_os = "linux")]
use crate::output::OutputFormat;

#[cfg(target_os = "linux")]
#[derive(Parser, Debug)]
#[command(name = "auditprims", version, about = "Kernel audit netlink control CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "AUDITPRIMS_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "AUDITPRIMS_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    /// Fail requests whose acknowledgement carries another sequence number.
    #[arg(long, global = true)]
    strict_sequence: bool,

    #[command(subcommand)]
    command: Command,
}

#[cfg(target_os = "linux")]
impl Cli {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            skew_policy: if self.strict_sequence {
                SkewPolicy::Reject
            } else {
                SkewPolicy::Warn
            },
        }
    }
}

#[cfg(target_os = "linux")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let config = cli.session_config();
    let result = cmd::run(cli.command, format, config);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("error: auditprims requires the Linux netlink audit interface");
    std::process::exit(3);
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn parses_set_pid_subcommand() {
        let cli = Cli::try_parse_from(["auditprims", "set-pid", "--pid", "4242", "--wait"])
            .expect("set-pid args should parse");

        match cli.command {
            Command::SetPid(args) => {
                assert_eq!(args.pid, Some(4242));
                assert!(args.wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_logsplit_mode() {
        let err = Cli::try_parse_from(["auditprims", "logsplit", "maybe"])
            .expect_err("unknown mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "auditprims",
            "send",
            "--type",
            "1000",
            "--data",
            "x",
            "--file",
            "/tmp/payload",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn strict_sequence_selects_reject_policy() {
        let cli = Cli::try_parse_from(["auditprims", "--strict-sequence", "status"])
            .expect("status args should parse");
        assert_eq!(cli.session_config().skew_policy, SkewPolicy::Reject);

        let cli = Cli::try_parse_from(["auditprims", "status"]).expect("status args should parse");
        assert_eq!(cli.session_config().skew_policy, SkewPolicy::Warn);
    }

    #[test]
    fn parses_listen_type_filter() {
        let cli = Cli::try_parse_from(["auditprims", "listen", "--types", "1300,1107", "--count", "2"])
            .expect("listen args should parse");
        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.types, Some(vec![1300, 1107]));
                assert_eq!(args.count, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
