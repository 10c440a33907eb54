use std::fs;

use auditprims_client::{RecvMode, SessionConfig};
use tracing::info;

use crate::cmd::{open_session, SendArgs};
use crate::exit::{client_error, io_error, CliResult, SUCCESS};
use crate::output::{print_ack, print_reply, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat, config: SessionConfig) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let mut session = open_session(config)?;

    let seq = session
        .send(args.msg_type, &payload)
        .map_err(|err| client_error("send failed", err))?;
    print_ack("send", args.msg_type, seq, format);

    if args.wait {
        // Replies to a request are queued ahead of its acknowledgement.
        match session
            .receive(RecvMode::NonBlocking, false)
            .map_err(|err| client_error("receive failed", err))?
        {
            Some(reply) => print_reply(&reply, format),
            None => info!(seq, "no reply queued after acknowledgement"),
        }
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
