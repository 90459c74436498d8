//! Rig repair command

use super::select;
use anyhow::Result;
use rigcheck_codec::{load_validators, save_validators};
use rigcheck_reconcile::{ReconcileOptions, RepairReport, ValidityEvaluator, ValidityRepairer};
use rigcheck_scene::{load_scene, save_scene};

pub struct RepairArgs {
    pub document: String,
    pub scene: String,
    pub validator: Option<String>,
    pub dry_run: bool,
    pub write_scene: bool,
}

pub fn run(args: RepairArgs, options: ReconcileOptions) -> Result<()> {
    let reports = repair(&args, options)?;

    if args.dry_run {
        println!("Dry run results:");
    }
    for report in &reports {
        print_report(report);
    }

    if !reports.iter().all(RepairReport::is_clean) {
        std::process::exit(1);
    }
    Ok(())
}

/// Repair the selected validators against the scene snapshot.
///
/// Each validator is validated against the scene first, so statuses saved
/// by an earlier run never hide drift. A real run saves the updated statuses
/// to the document, and the repaired scene back to its snapshot file when
/// `write_scene` is set.
pub fn repair(args: &RepairArgs, options: ReconcileOptions) -> Result<Vec<RepairReport>> {
    let mut validators = load_validators(&args.document)?;
    let (mut scene, scene_file) = load_scene(&args.scene)?;
    let repairer = ValidityRepairer::new().with_options(options);

    let mut reports = Vec::new();
    for validator in select(&mut validators, args.validator.as_deref())? {
        ValidityEvaluator::new(&scene)
            .with_options(options)
            .validate(validator);
        let report = if args.dry_run {
            repairer.dry_run(&scene, validator)
        } else {
            repairer.repair(&mut scene, validator)
        };
        reports.push(report);
    }

    if args.dry_run {
        return Ok(reports);
    }

    save_validators(&args.document, validators.values())?;
    if args.write_scene {
        save_scene(&args.scene, &scene, scene_file.scene.name)?;
        tracing::info!(scene = %args.scene, "saved repaired scene");
    }
    Ok(reports)
}

fn print_report(report: &RepairReport) {
    println!("{}", report.summary());

    for action in &report.actions {
        println!("  [{}] {}: {}", action.kind, action.node, action.description);
    }
    for error in &report.errors {
        println!("  [ERROR] {}: {}", error.node, error.message);
    }
    for source in &report.skipped_sources {
        println!("  [SKIP] {}: source object not found", source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::fixture;
    use rigcheck_core::Status;

    fn args(document: String, scene: String, dry_run: bool) -> RepairArgs {
        RepairArgs {
            document,
            scene,
            validator: None,
            dry_run,
            write_scene: true,
        }
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (document, scene) = fixture(&dir);
        let before_doc = std::fs::read_to_string(&document).unwrap();
        let before_scene = std::fs::read_to_string(&scene).unwrap();

        let reports = repair(&args(document.clone(), scene.clone(), true), ReconcileOptions::default())
            .unwrap();
        assert_eq!(reports[0].actions.len(), 1);
        assert_eq!(std::fs::read_to_string(&document).unwrap(), before_doc);
        assert_eq!(std::fs::read_to_string(&scene).unwrap(), before_scene);
    }

    #[test]
    fn test_saved_passed_status_does_not_hide_drift() {
        let dir = tempfile::tempdir().unwrap();
        let (document, scene) = fixture(&dir);
        let stale = std::fs::read_to_string(&document)
            .unwrap()
            .replace("not_applicable", "passed");
        std::fs::write(&document, stale).unwrap();

        let reports = repair(&args(document.clone(), scene.clone(), false), ReconcileOptions::default())
            .unwrap();
        assert_eq!(reports[0].actions.len(), 1);

        let (repaired, _) = load_scene(&scene).unwrap();
        assert_eq!(
            repaired.object("ctrl_L").and_then(|o| o.get("rotateOrder")).cloned(),
            Some(rigcheck_scene::Attribute::Value("xyz".into()))
        );
        assert_eq!(load_validators(&document).unwrap()["biped"].status, Status::Passed);
    }

    #[test]
    fn test_repair_writes_scene_and_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let (document, scene) = fixture(&dir);

        let reports = repair(&args(document.clone(), scene.clone(), false), ReconcileOptions::default())
            .unwrap();
        assert!(reports[0].is_clean());

        let saved = load_validators(&document).unwrap();
        assert_eq!(saved["biped"].status, Status::Passed);

        let (repaired, _) = load_scene(&scene).unwrap();
        let value = repaired
            .object("ctrl_L")
            .and_then(|o| o.get("rotateOrder"))
            .cloned();
        assert_eq!(
            value,
            Some(rigcheck_scene::Attribute::Value("xyz".into()))
        );
    }
}
