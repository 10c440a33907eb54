use auditprims_client::SessionConfig;

use crate::cmd::{open_session, StatusArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub fn run(_args: StatusArgs, format: OutputFormat, config: SessionConfig) -> CliResult<i32> {
    let mut session = open_session(config)?;
    let status = session
        .get_status()
        .map_err(|err| client_error("status failed", err))?;
    print_status(&status, format);
    Ok(SUCCESS)
}
