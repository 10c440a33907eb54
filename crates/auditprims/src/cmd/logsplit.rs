use auditprims_client::SessionConfig;
use auditprims_frame::AUDIT_LOGSPLIT_SET;

use crate::cmd::{open_session, wait_mode, LogsplitArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_ack, OutputFormat};

pub fn run(args: LogsplitArgs, format: OutputFormat, config: SessionConfig) -> CliResult<i32> {
    let mut session = open_session(config)?;

    session
        .set_log_split_mode(args.mode.into(), wait_mode(args.wait))
        .map_err(|err| client_error("logsplit failed", err))?;

    print_ack(
        "logsplit",
        AUDIT_LOGSPLIT_SET,
        session.sequence().current(),
        format,
    );
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use auditprims_client::LogSplit;

    use crate::cmd::LogsplitMode;

    #[test]
    fn cli_modes_map_to_sentinels() {
        assert_eq!(LogSplit::from(LogsplitMode::On), LogSplit::On);
        assert_eq!(LogSplit::from(LogsplitMode::Off), LogSplit::Off);
    }
}
