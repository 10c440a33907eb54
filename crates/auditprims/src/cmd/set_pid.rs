use auditprims_client::SessionConfig;
use auditprims_frame::AUDIT_SET;

use crate::cmd::{open_session, wait_mode, SetPidArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_ack, OutputFormat};

pub fn run(args: SetPidArgs, format: OutputFormat, config: SessionConfig) -> CliResult<i32> {
    let pid = args.pid.unwrap_or_else(std::process::id);
    let mut session = open_session(config)?;

    session
        .set_registrant_pid(pid, wait_mode(args.wait))
        .map_err(|err| client_error("set-pid failed", err))?;

    print_ack("set-pid", AUDIT_SET, session.sequence().current(), format);
    Ok(SUCCESS)
}
