use ratebook_core::config::AppConfig;
use ratebook_core::CompiledRatingModel;
use serde::Serialize;

use crate::commands::{compile_model, load_config};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
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

pub fn run(json_output: bool) -> (bool, String) {
    let report = build_report();
    let healthy = report.overall_status != CheckStatus::Fail;

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return (healthy, output);
    }

    (healthy, render_human(&report))
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match load_config() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_rates(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["rate_compilation", "age_table", "carrier_roster"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let overall_status = if checks.iter().any(|check| check.status == CheckStatus::Fail) {
        CheckStatus::Fail
    } else if checks.iter().any(|check| check.status == CheckStatus::Warn) {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    let summary = match overall_status {
        CheckStatus::Pass => "doctor: all readiness checks passed",
        CheckStatus::Warn => "doctor: checks passed with warnings",
        _ => "doctor: one or more readiness checks failed",
    }
    .to_string();

    DoctorReport { overall_status, summary, checks }
}

fn check_rates(config: &AppConfig) -> Vec<DoctorCheck> {
    match compile_model(config) {
        Ok(model) => {
            let summary = model.summary();
            vec![
                DoctorCheck {
                    name: "rate_compilation",
                    status: CheckStatus::Pass,
                    details: format!(
                        "compiled `{}`: {} carriers, {} indexed rates, ~{} bytes",
                        config.rates.directory.display(),
                        summary.carriers,
                        summary.indexed_rates,
                        summary.estimated_bytes
                    ),
                },
                check_age_table(&model),
                check_carrier_roster(&model),
            ]
        }
        Err(error) => vec![
            DoctorCheck {
                name: "rate_compilation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            },
            DoctorCheck {
                name: "age_table",
                status: CheckStatus::Skipped,
                details: "skipped because rates did not compile".to_string(),
            },
            DoctorCheck {
                name: "carrier_roster",
                status: CheckStatus::Skipped,
                details: "skipped because rates did not compile".to_string(),
            },
        ],
    }
}

fn check_age_table(model: &CompiledRatingModel) -> DoctorCheck {
    let diagnostics = model.age_table_diagnostics();
    if diagnostics.is_clean() {
        return DoctorCheck {
            name: "age_table",
            status: CheckStatus::Pass,
            details: "age brackets cover 16..=120 without overlaps".to_string(),
        };
    }

    let mut problems = Vec::new();
    if !diagnostics.overlapping_brackets.is_empty() {
        problems.push(format!("overlapping brackets {:?}", diagnostics.overlapping_brackets));
    }
    if let (Some(first), Some(last)) =
        (diagnostics.uncovered_ages.first(), diagnostics.uncovered_ages.last())
    {
        problems.push(format!(
            "{} uncovered ages between {first} and {last}",
            diagnostics.uncovered_ages.len()
        ));
    }
    if !diagnostics.out_of_range_brackets.is_empty() {
        problems.push(format!("out-of-range brackets {:?}", diagnostics.out_of_range_brackets));
    }

    DoctorCheck { name: "age_table", status: CheckStatus::Warn, details: problems.join("; ") }
}

fn check_carrier_roster(model: &CompiledRatingModel) -> DoctorCheck {
    let carriers = model.carriers();
    if carriers.is_empty() {
        return DoctorCheck {
            name: "carrier_roster",
            status: CheckStatus::Fail,
            details: "no enabled carriers; every quote request would return an empty list"
                .to_string(),
        };
    }

    let open = carriers
        .iter()
        .filter(|carrier| {
            let definition = &carrier.definition;
            !definition.is_military_only()
                && definition.eligibility.as_ref().map_or(true, |rules| rules.states.is_none())
        })
        .count();
    if open == 0 {
        return DoctorCheck {
            name: "carrier_roster",
            status: CheckStatus::Warn,
            details: format!(
                "{} enabled carriers, all restricted by eligibility rules",
                carriers.len()
            ),
        };
    }

    DoctorCheck {
        name: "carrier_roster",
        status: CheckStatus::Pass,
        details: format!("{} enabled carriers, {open} open to every request", carriers.len()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
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
