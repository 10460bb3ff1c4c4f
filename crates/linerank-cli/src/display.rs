//! Terminal rendering for tasks, recorded judgments, and agreement reports.

use chrono::SecondsFormat;
use linerank_core::{
    AgreementReport, BoundingBox, DocumentSet, History, LabelScheme, LineView, ScheduledTask,
};

const MAX_MISMATCHES: usize = 20;

// ── Public API ──

/// Print one comparison as a card: the two line references, the proposed
/// label, the instruction, and the label options to choose from.
pub fn print_task_card(task: &ScheduledTask, scheme: &LabelScheme, title: &str) {
    let header = if title.is_empty() {
        task.id.doc_name()
    } else {
        title
    };
    println!("=== {header} ===");
    println!("  {:<10} {}", "task", task.id);
    print_line("first", &task.payload.first);
    print_line("second", &task.payload.second);
    println!("  {:<10} {}", "proposed", task.payload.proposed_label);
    println!();

    if !task.payload.instruction.is_empty() {
        println!("{}", task.payload.instruction);
        println!();
    }

    println!("Labels");
    for option in scheme.options() {
        let marker = if option.label == task.payload.proposed_label {
            "*"
        } else {
            " "
        };
        match option.color.as_deref() {
            Some(color) => println!("  {marker} {:<12} {color}", option.caption()),
            None => println!("  {marker} {}", option.caption()),
        }
    }
}

/// Print every recorded judgment in history order.
pub fn print_labeled(history: &History, documents: &DocumentSet) {
    if history.is_empty() {
        println!("No labeled tasks.");
        return;
    }

    println!(
        "{:<32} {:<20} {:<20} {:<16} {}",
        "task", "first image", "second image", "labels", "labeled at"
    );
    for entry in history.iter() {
        let task = &entry.task;
        let img = |uid: &str| {
            documents
                .line(task.doc_name(), uid)
                .map(|l| l.img_name.as_str())
                .unwrap_or("-")
        };
        let at = entry
            .record
            .labeled_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:<20} {:<20} {:<16} {}",
            task.encode(),
            img(task.first_uid()),
            img(task.second_uid()),
            entry.record.labels().join(";"),
            at
        );
    }
    println!();
    println!("{} labeled", history.len());
}

pub fn print_report(report: &AgreementReport) {
    println!("Agreement");
    println!("  {:<10} {}", "correct", report.correct.len());
    println!("  {:<10} {}", "mismatch", report.mismatch.len());
    println!("  {:<10} {}", "missed", report.missed.len());
    println!("  {:<10} {}", "added", report.added.len());
    println!();
    println!("  {:<10} {}", "precision", format_score(report.precision()));
    println!("  {:<10} {}", "recall", format_score(report.recall()));
    println!("  {:<10} {}", "f-measure", format_score(report.f_measure()));

    if report.mismatch.is_empty() {
        return;
    }
    println!();
    println!("Mismatches ({}):", report.mismatch.len());
    for m in report.mismatch.iter().take(MAX_MISMATCHES) {
        println!("  {:<32} {} / {}", m.task.encode(), m.first, m.second);
    }
    if report.mismatch.len() > MAX_MISMATCHES {
        println!("  ... and {} more", report.mismatch.len() - MAX_MISMATCHES);
    }
}

// ── Helpers ──

fn print_line(role: &str, line: &LineView) {
    println!(
        "  {:<10} {} on {} at {}",
        role,
        line.uid,
        line.img_name,
        format_bbox(&line.bbox)
    );
}

fn format_bbox(b: &BoundingBox) -> String {
    format!("({}, {}) {}x{}", b.left, b.top, b.width, b.height)
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| format!("{s:.3}"))
}
