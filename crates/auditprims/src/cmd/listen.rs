use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use auditprims_client::{RecvMode, SessionConfig, WaitMode};
use tracing::{debug, info};

use crate::cmd::{open_session, ListenArgs};
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_reply, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: ListenArgs, format: OutputFormat, config: SessionConfig) -> CliResult<i32> {
    let mut session = open_session(config)?;

    if args.register {
        session
            .set_registrant_pid(std::process::id(), WaitMode::NoWait)
            .map_err(|err| client_error("register failed", err))?;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mode = if args.nonblocking {
        RecvMode::NonBlocking
    } else {
        RecvMode::Blocking
    };
    info!(?mode, register = args.register, "listening for audit messages");

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let reply = match session.receive(mode, false) {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                std::thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(err) => return Err(client_error("receive failed", err)),
        };

        if !type_selected(args.types.as_deref(), reply.msg_type()) {
            debug!(msg_type = reply.msg_type(), "skipping filtered message");
            continue;
        }

        print_reply(&reply, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn type_selected(types: Option<&[u16]>, msg_type: u16) -> bool {
    types.is_none_or(|types| types.contains(&msg_type))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filter_selects_everything() {
        assert!(type_selected(None, 1300));
    }

    #[test]
    fn filter_selects_listed_types() {
        let types = [1300, 1107];
        assert!(type_selected(Some(&types), 1107));
        assert!(!type_selected(Some(&types), 2));
    }
}
