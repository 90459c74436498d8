//! Rig validation command

use super::select;
use anyhow::Result;
use rigcheck_codec::{load_validators, save_validators};
use rigcheck_reconcile::{ReconcileOptions, ValidationReport, ValidityEvaluator};
use rigcheck_scene::load_scene;

pub struct ValidateArgs {
    pub document: String,
    pub scene: String,
    pub validator: Option<String>,
    pub format: String,
    pub write: bool,
}

pub fn run(args: ValidateArgs, options: ReconcileOptions) -> Result<()> {
    let reports = validate(&args, options)?;

    if args.format == "json" {
        print_reports_json(&reports)?;
    } else {
        print_reports_text(&reports);
    }

    if !reports.iter().all(ValidationReport::is_valid) {
        std::process::exit(1);
    }
    Ok(())
}

/// Validate the selected validators, saving statuses back when asked
pub fn validate(args: &ValidateArgs, options: ReconcileOptions) -> Result<Vec<ValidationReport>> {
    let mut validators = load_validators(&args.document)?;
    let (scene, _scene_file) = load_scene(&args.scene)?;

    let evaluator = ValidityEvaluator::new(&scene).with_options(options);
    let reports = select(&mut validators, args.validator.as_deref())?
        .into_iter()
        .map(|validator| evaluator.validate(validator))
        .collect();

    if args.write {
        save_validators(&args.document, validators.values())?;
        tracing::info!(document = %args.document, "saved validation statuses");
    }
    Ok(reports)
}

fn print_reports_text(reports: &[ValidationReport]) {
    if reports.is_empty() {
        println!("No validators in document.");
        return;
    }

    for report in reports {
        println!("{}", report.summary());
        for finding in report.failures() {
            let status = finding.status.label().to_uppercase();
            match &finding.detail {
                Some(detail) => println!(
                    "  [{}] {} {}: {}",
                    status, finding.kind, finding.node, detail
                ),
                None => println!("  [{}] {} {}", status, finding.kind, finding.node),
            }
        }
    }
}

fn print_reports_json(reports: &[ValidationReport]) -> Result<()> {
    let validators: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| {
            let findings: Vec<serde_json::Value> = report
                .findings
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "source": f.source,
                        "node": f.node,
                        "kind": f.kind.label(),
                        "status": f.status,
                        "detail": f.detail,
                    })
                })
                .collect();

            serde_json::json!({
                "validator": report.validator,
                "status": report.status,
                "valid": report.is_valid(),
                "cancelled": report.cancelled,
                "summary": report.summary(),
                "findings": findings,
            })
        })
        .collect();

    let output = serde_json::json!({
        "valid": reports.iter().all(ValidationReport::is_valid),
        "validators": validators,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::fixture;
    use rigcheck_core::Status;

    #[test]
    fn test_validate_reports_drift() {
        let dir = tempfile::tempdir().unwrap();
        let (document, scene) = fixture(&dir);
        let args = ValidateArgs {
            document,
            scene,
            validator: None,
            format: "text".into(),
            write: false,
        };

        let reports = validate(&args, ReconcileOptions::default()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, Status::Failed);
        assert!(!reports[0].is_valid());
    }

    #[test]
    fn test_validate_write_saves_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let (document, scene) = fixture(&dir);
        let args = ValidateArgs {
            document: document.clone(),
            scene,
            validator: Some("biped".into()),
            format: "json".into(),
            write: true,
        };

        validate(&args, ReconcileOptions::default()).unwrap();
        let saved = load_validators(&document).unwrap();
        assert_eq!(saved["biped"].status, Status::Failed);
    }

    #[test]
    fn test_validate_unknown_validator() {
        let dir = tempfile::tempdir().unwrap();
        let (document, scene) = fixture(&dir);
        let args = ValidateArgs {
            document,
            scene,
            validator: Some("quadruped".into()),
            format: "text".into(),
            write: false,
        };
        assert!(validate(&args, ReconcileOptions::default()).is_err());
    }
}
