// Tests for report generation functionality

use wikigame_core::report::{
    ReportFormat, RunSummary, format_outcome, format_step, generate_json_report, generate_report,
    generate_text_report, save_report,
};
use wikigame_core::store::GameMode;
use wikigame_core::traversal::{StepAction, StepReport, TraversalOutcome};
use tempfile::TempDir;

fn won_summary() -> RunSummary {
    RunSummary {
        mode: GameMode::Race,
        start: "/wiki/Ginza".to_string(),
        end: Some("/wiki/Reason".to_string()),
        outcome: TraversalOutcome::Won {
            steps: 2,
            start_title: "Ginza".to_string(),
        },
        path: vec![
            "/wiki/Ginza".to_string(),
            "/wiki/Logic".to_string(),
            "/wiki/Reason".to_string(),
        ],
        dead_ends: 0,
        total_wins: Some(7),
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json)));
    assert!(ReportFormat::from_str("csv").is_none());
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_contains_summary() {
    let report = generate_text_report(&won_summary());

    assert!(report.contains("Mode:       race"));
    assert!(report.contains("Start:      Ginza"));
    assert!(report.contains("End:        Reason"));
    assert!(report.contains("Outcome:    won"));
    assert!(report.contains("Steps:      2"));
    assert!(report.contains("Total wins: 7"));
    assert!(report.contains("Found it! Took 2 steps from Ginza"));
    assert!(report.contains("  1. Logic"));
}

#[test]
fn test_text_report_without_end_page() {
    let mut summary = won_summary();
    summary.mode = GameMode::Philosophy;
    summary.end = None;
    summary.total_wins = None;

    let report = generate_text_report(&summary);
    assert!(!report.contains("End:"));
    assert!(!report.contains("Total wins"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_round_trips_outcome() {
    let json = generate_json_report(&won_summary()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["mode"], "Race");
    assert_eq!(value["outcome"]["Won"]["steps"], 2);
    assert_eq!(value["path"].as_array().unwrap().len(), 3);
    assert_eq!(value["total_wins"], 7);
}

#[test]
fn test_generate_report_dispatches_on_format() {
    let summary = won_summary();
    assert!(generate_report(&summary, ReportFormat::Json).unwrap().starts_with('{'));
    assert!(generate_report(&summary, ReportFormat::Text).unwrap().contains("Path:"));
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");

    save_report("hello", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
}

// ============================================================================
// Line Formatting Tests
// ============================================================================

#[test]
fn test_format_step_shows_start_and_index() {
    let report = StepReport {
        step_index: 3,
        page: "/wiki/Tokyo".to_string(),
        start_title: "Ginza".to_string(),
        current_title: Some("Tokyo".to_string()),
        fetch_error: None,
        action: StepAction::Advanced {
            next: "/wiki/Japan".to_string(),
            score: Some(0.4321),
        },
    };

    let line = format_step(&report);
    assert!(line.contains("(Ginza: 3)"));
    assert!(line.contains("Tokyo"));
    assert!(line.contains("Japan"));
    assert!(line.contains("0.43"));
}

#[test]
fn test_format_step_with_fetch_error() {
    let report = StepReport {
        step_index: 1,
        page: "/wiki/Odd_page".to_string(),
        start_title: "Ginza".to_string(),
        current_title: None,
        fetch_error: Some("No content body found on /wiki/Odd_page".to_string()),
        action: StepAction::Backtracked {
            to: "/wiki/Ginza".to_string(),
            depth: 1,
        },
    };

    let line = format_step(&report);
    assert!(line.contains("Odd page"));
    assert!(line.contains("No content body"));
    assert!(line.contains("going back 1 step to Ginza"));
}

#[test]
fn test_format_outcome() {
    let impossible = TraversalOutcome::Impossible {
        steps: 1,
        start_title: "A".to_string(),
        reason: "no links".to_string(),
    };
    assert_eq!(
        format_outcome(&impossible),
        "Can't step backwards anymore after 1 step from A: no links"
    );

    let failed = TraversalOutcome::FetchFailed {
        page: "/wiki/A".to_string(),
        error: "timeout".to_string(),
    };
    assert_eq!(format_outcome(&failed), "Could not fetch /wiki/A: timeout");
}
