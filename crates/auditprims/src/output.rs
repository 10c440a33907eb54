use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use auditprims_frame::{type_name, AuditStatus, Reply, ReplyBody};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    schema_id: &'a str,
    msg_type: u16,
    type_name: &'a str,
    seq: i16,
    len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<i32>,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    schema_id: &'a str,
    enabled: u32,
    failure: u32,
    pid: u32,
    rate_limit: u32,
    backlog_limit: u32,
    lost: u32,
    backlog: u32,
}

#[derive(Serialize)]
struct AckOutput<'a> {
    schema_id: &'a str,
    action: &'a str,
    msg_type: u16,
    seq: i16,
    acknowledged: bool,
}

pub fn print_reply(reply: &Reply<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                schema_id: "https://schemas.3leaps.dev/auditprims/cli/v1/reply-received.schema.json",
                msg_type: reply.msg_type(),
                type_name: type_name(reply.msg_type()),
                seq: reply.sequence(),
                len: reply.len(),
                error: reply.error_code(),
                payload_size: reply.body_bytes().len(),
                payload: body_summary(reply),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "SEQ", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    format!("{} ({})", type_name(reply.msg_type()), reply.msg_type()),
                    reply.sequence().to_string(),
                    reply.body_bytes().len().to_string(),
                    body_summary(reply),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} ({}) seq={} size={} payload={}",
                reply.msg_type(),
                type_name(reply.msg_type()),
                reply.sequence(),
                reply.body_bytes().len(),
                body_summary(reply)
            );
        }
        OutputFormat::Raw => {
            print_raw(reply.body_bytes());
        }
    }
}

pub fn print_status(status: &AuditStatus, format: OutputFormat) {
    let rows = [
        ("enabled", status.enabled),
        ("failure", status.failure),
        ("pid", status.pid),
        ("rate_limit", status.rate_limit),
        ("backlog_limit", status.backlog_limit),
        ("lost", status.lost),
        ("backlog", status.backlog),
    ];

    match format {
        OutputFormat::Json => {
            let out = StatusOutput {
                schema_id: "https://schemas.3leaps.dev/auditprims/cli/v1/audit-status.schema.json",
                enabled: status.enabled,
                failure: status.failure,
                pid: status.pid,
                rate_limit: status.rate_limit,
                backlog_limit: status.backlog_limit,
                lost: status.lost,
                backlog: status.backlog,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in rows {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (name, value) in rows {
                println!("{name:<14} {value}");
            }
        }
        OutputFormat::Raw => {
            print_raw(&status.to_bytes());
        }
    }
}

/// Print the outcome of an acknowledged control request.
pub fn print_ack(action: &str, msg_type: u16, seq: i16, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = AckOutput {
                schema_id: "https://schemas.3leaps.dev/auditprims/cli/v1/request-ack.schema.json",
                action,
                msg_type,
                seq,
                acknowledged: true,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{action}: acknowledged (type={msg_type} seq={seq})");
        }
        OutputFormat::Raw => {
            println!("{seq}");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn body_summary(reply: &Reply<'_>) -> String {
    match reply.body() {
        ReplyBody::Error(err) if err.is_ack() => "ack".to_string(),
        ReplyBody::Error(err) => format!("error {}", err.code()),
        ReplyBody::Status(status) => format!(
            "enabled={} failure={} pid={} lost={} backlog={}",
            status.enabled(),
            status.failure(),
            status.pid(),
            status.lost(),
            status.backlog()
        ),
        ReplyBody::SignalInfo(info) => format!(
            "uid={} pid={} context={}",
            info.uid(),
            info.pid(),
            payload_preview(info.context())
        ),
        ReplyBody::RuleData(data) => format!("<rule data {} bytes>", data.len()),
        ReplyBody::Generic(data) => payload_preview(data),
    }
}

fn payload_preview(payload: &[u8]) -> String {
    let trimmed = match payload.iter().rposition(|b| *b != 0) {
        Some(end) => &payload[..=end],
        None => &payload[..0],
    };
    match std::str::from_utf8(trimmed) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
