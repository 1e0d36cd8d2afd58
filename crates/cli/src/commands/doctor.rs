use std::sync::Arc;

use folio_agent::{ChatRuntime, ChatSession, LogOnlySink, Transcript, UnavailableAnswerSource};
use folio_core::audit::InMemoryAuditSink;
use folio_core::config::{AppConfig, LoadOptions, PacingConfig};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exit code 0 when nothing failed; skipped integrations are optional.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()).map_err(|error| error.to_string()));
    let exit_code = if report.overall_status == CheckStatus::Fail { 5 } else { 0 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(loaded: Result<AppConfig, String>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(optional_integration(
                "remote_answers",
                config.remote.is_configured(),
                "remote answer endpoint configured",
                "no endpoint; every message uses canned replies",
            ));
            checks.push(optional_integration(
                "email_delivery",
                config.email.enabled,
                "lead e-mail delivery enabled",
                "disabled; completed leads are only logged",
            ));
            checks.push(optional_integration(
                "sheets_logging",
                config.sheets.is_configured(),
                "sheets webhook configured",
                "no webhook; leads are not written to a sheet",
            ));
            checks.push(check_canned_turn(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error,
            });
            for name in ["remote_answers", "email_delivery", "sheets_logging", "canned_turn"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: chat is ready".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn optional_integration(
    name: &'static str,
    configured: bool,
    pass_details: &str,
    skipped_details: &str,
) -> DoctorCheck {
    if configured {
        DoctorCheck { name, status: CheckStatus::Pass, details: pass_details.to_string() }
    } else {
        DoctorCheck { name, status: CheckStatus::Skipped, details: skipped_details.to_string() }
    }
}

/// Sends one greeting through the offline runtime: no network, no delays.
fn check_canned_turn(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "canned_turn",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let mut offline = config.clone();
    offline.pacing = PacingConfig::instant();
    let chat_runtime = ChatRuntime::new(
        &offline,
        UnavailableAnswerSource,
        LogOnlySink,
        Arc::new(InMemoryAuditSink::default()),
    );

    let replies = runtime.block_on(async {
        let mut chat = ChatSession::start(chrono::Utc::now());
        let mut transcript = Transcript::default();
        chat_runtime.handle_message(&mut chat, "hello", &mut transcript).await;
        transcript.assistant_texts().len()
    });

    if replies > 0 {
        DoctorCheck {
            name: "canned_turn",
            status: CheckStatus::Pass,
            details: format!("greeting answered with {replies} assistant message(s)"),
        }
    } else {
        DoctorCheck {
            name: "canned_turn",
            status: CheckStatus::Fail,
            details: "greeting produced no assistant reply".to_string(),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
