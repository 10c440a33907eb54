use serde::Serialize;

use auditprims_transport::AuditSocket;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    schema_id: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        platform_check(),
        netlink_socket_check(),
        privilege_check(),
        compiled_features_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput {
        schema_id: "https://schemas.3leaps.dev/auditprims/cli/v1/doctor-report.schema.json",
        checks,
        overall,
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("auditprims doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
    }
}

fn platform_check() -> CheckResult {
    CheckResult {
        name: "platform".to_string(),
        status: CheckStatus::Pass,
        detail: format!(
            "{}/{} with netlink audit support",
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
    }
}

fn netlink_socket_check() -> CheckResult {
    match AuditSocket::open() {
        Ok(socket) => {
            let closed = socket.close();
            CheckResult {
                name: "netlink_socket".to_string(),
                status: CheckStatus::Pass,
                detail: match closed {
                    Ok(()) => "NETLINK_AUDIT socket opened and closed".to_string(),
                    Err(err) => format!("NETLINK_AUDIT socket opened; close reported {err}"),
                },
            }
        }
        Err(err) => CheckResult {
            name: "netlink_socket".to_string(),
            status: CheckStatus::Fail,
            detail: err.to_string(),
        },
    }
}

fn privilege_check() -> CheckResult {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    if euid == 0 {
        CheckResult {
            name: "privileges".to_string(),
            status: CheckStatus::Pass,
            detail: "running as root; control requests are permitted".to_string(),
        }
    } else {
        CheckResult {
            name: "privileges".to_string(),
            status: CheckStatus::Warn,
            detail: format!(
                "euid {euid}; set-pid and logsplit need CAP_AUDIT_CONTROL and will be rejected"
            ),
        }
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "client") {
        features.push("client");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_output_has_overall_status() {
        let checks = vec![CheckResult {
            name: "x".to_string(),
            status: CheckStatus::Warn,
            detail: "ok".to_string(),
        }];
        let output = DoctorOutput {
            schema_id: "x",
            checks,
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"warn\""));
    }

    #[test]
    fn compiled_features_lists_cli() {
        assert!(compiled_features_check().detail.contains("cli"));
    }
}
