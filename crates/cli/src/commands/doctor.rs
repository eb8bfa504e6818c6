use kbseek_core::config::AppConfig;
use kbseek_core::retrieval::bedrock::DEFAULT_REGION;
use kbseek_core::retrieval::CredentialChain;
use serde::Serialize;

use crate::commands::{CommandResult, LoadedConfig};

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

pub fn run(config: LoadedConfig<'_>, json_output: bool) -> CommandResult {
    let report = build_report(config);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                super::escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(config: LoadedConfig<'_>) -> DoctorReport {
    let mut checks = Vec::new();

    match config {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_knowledge_base_id(config));
            checks.push(check_credentials(config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["knowledge_base_id", "aws_credentials"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_knowledge_base_id(config: &AppConfig) -> DoctorCheck {
    match config.knowledge_base.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => DoctorCheck {
            name: "knowledge_base_id",
            status: CheckStatus::Pass,
            details: format!("knowledge base `{id}` configured"),
        },
        None => DoctorCheck {
            name: "knowledge_base_id",
            status: CheckStatus::Fail,
            details: "KNOWLEDGE_BASE_ID is not set; every retrieval will return an error envelope"
                .to_string(),
        },
    }
}

fn check_credentials(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "aws_credentials",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let region = config.knowledge_base.region.as_deref().unwrap_or(DEFAULT_REGION);
    let chain = CredentialChain::from_config(&config.aws);
    match runtime.block_on(chain.resolve(region)) {
        Ok(resolved) => {
            let kind =
                if resolved.credentials.session_token.is_some() { "temporary" } else { "long-term" };
            DoctorCheck {
                name: "aws_credentials",
                status: CheckStatus::Pass,
                details: format!("{kind} credentials resolved from {}", resolved.source),
            }
        }
        Err(error) => DoctorCheck {
            name: "aws_credentials",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
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
