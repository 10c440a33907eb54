use auditprims_frame::{
    AuditStatus, LogSplit, LogSplitStatus, ReplyBody, AUDIT_GET, AUDIT_LOGSPLIT_SET, AUDIT_SET,
};
use auditprims_transport::{NetlinkIo, RecvMode};
use tracing::{error, info};

use crate::error::{ClientError, Result};
use crate::session::AuditSession;

/// Whether a control verb absorbs the kernel's confirmation datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Return as soon as the request is acknowledged.
    #[default]
    NoWait,
    /// Also drain one queued confirmation, without blocking.
    Wait,
}

impl<S: NetlinkIo> AuditSession<S> {
    /// Register `pid` as the audit event consumer.
    ///
    /// With [`WaitMode::Wait`], one confirmation datagram is drained
    /// non-blockingly afterwards. The drain is advisory: its outcome never
    /// changes the result.
    pub fn set_registrant_pid(&mut self, pid: u32, wait: WaitMode) -> Result<()> {
        let status = AuditStatus::for_pid(pid);

        self.send(AUDIT_SET, &status.to_bytes())
            .inspect_err(|err| error!(%err, pid, "could not set pid for audit events"))?;
        info!(pid, "registered audit event consumer");

        if wait != WaitMode::NoWait {
            self.drain_one();
        }
        Ok(())
    }

    /// Toggle kernel log splitting.
    ///
    /// `enabled` must be exactly 0 (off) or 1 (on); anything else fails with
    /// [`ClientError::InvalidArgument`] before any socket I/O.
    pub fn set_log_split(&mut self, enabled: i32, wait: WaitMode) -> Result<()> {
        let mode = LogSplit::try_from(enabled).map_err(|value| {
            error!(value, "invalid logsplit option");
            ClientError::InvalidArgument(format!("invalid logsplit option {value:#x}"))
        })?;
        self.set_log_split_mode(mode, wait)
    }

    /// Typed form of [`AuditSession::set_log_split`].
    pub fn set_log_split_mode(&mut self, mode: LogSplit, wait: WaitMode) -> Result<()> {
        let status = LogSplitStatus { enabled: mode };

        self.send(AUDIT_LOGSPLIT_SET, &status.to_bytes())
            .inspect_err(|err| error!(%err, ?mode, "could not set splitlog for audit events"))?;
        info!(?mode, "updated audit log splitting");

        if wait != WaitMode::NoWait {
            self.drain_one();
        }
        Ok(())
    }

    /// Read the kernel's audit status.
    ///
    /// The status reply arrives ahead of the acknowledgement, so it is still
    /// queued after the send; the trailing acknowledgement is drained.
    pub fn get_status(&mut self) -> Result<AuditStatus> {
        self.send(AUDIT_GET, &[])?;

        let status = {
            let reply = self
                .receive(RecvMode::Blocking, false)?
                .ok_or(ClientError::UnexpectedReply { msg_type: 0 })?;
            match reply.body() {
                ReplyBody::Status(view) => view.to_status(),
                ReplyBody::Error(view) if !view.is_ack() => {
                    return Err(ClientError::KernelRejected { code: view.code() })
                }
                _ => {
                    return Err(ClientError::UnexpectedReply {
                        msg_type: reply.msg_type(),
                    })
                }
            }
        };

        self.drain_one();
        Ok(status)
    }
}
