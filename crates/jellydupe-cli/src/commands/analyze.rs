use super::connect;
use super::progress::ProgressUI;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use media_dedup_config::{Config, PathManager};
use media_dedup_core::{Actions, AnalysisReport, Analyzer, RetrievalError};
use media_dedup_models::{DuplicateVerdict, MovieRecord};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Which verdicts a run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    All,
    DuplicatesOnly,
    MismatchesOnly,
}

impl View {
    pub fn from_flags(duplicates_only: bool, mismatches_only: bool) -> Self {
        match (duplicates_only, mismatches_only) {
            (true, _) => View::DuplicatesOnly,
            (false, true) => View::MismatchesOnly,
            (false, false) => View::All,
        }
    }

    fn shows_duplicates(self) -> bool {
        self != View::MismatchesOnly
    }

    fn shows_mismatches(self) -> bool {
        self != View::DuplicatesOnly
    }

    fn includes(self, verdict: &DuplicateVerdict) -> bool {
        if verdict.is_duplicate {
            self.shows_duplicates()
        } else {
            self.shows_mismatches()
        }
    }
}

pub struct AnalyzeOptions {
    pub view: View,
    pub enrich: bool,
    pub csv: Option<PathBuf>,
}

pub async fn run_analyze(config: &Config, paths: &PathManager, options: AnalyzeOptions, output: &Output) -> Result<()> {
    tracing::debug!("Analyze command started");
    let session = connect(config, paths)?;

    let ui = ProgressUI::new("Fetching catalog and play states...", output.is_human() && !output.is_quiet());
    let analyzer = Analyzer::new(session.server.clone(), session.account_id.clone(), session.names.clone());
    let mut report = analyzer.run().await.map_err(analysis_failed)?;

    if options.enrich {
        ui.set_message("Fetching play counts...");
        let actions = Actions::new(session.server.clone(), session.names.clone());
        for verdict in report.verdicts.iter_mut().filter(|v| options.view.includes(v)) {
            actions.enrich_play_counts(verdict).await;
        }
    }
    ui.finish();

    if let Some(csv_path) = &options.csv {
        write_csv(csv_path, &report, options.view)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to write CSV to {}: {}", csv_path.display(), e))?;
    }

    match output.format() {
        OutputFormat::Human => print_report(&report, &options, output),
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&report_json(&report, options.view)),
    }

    Ok(())
}

fn analysis_failed(err: RetrievalError) -> color_eyre::Report {
    color_eyre::Report::new(err).wrap_err("Analysis failed")
}

fn report_json(report: &AnalysisReport, view: View) -> serde_json::Value {
    let mut value = json!({
        "started_at": report.started_at,
        "duration_ms": report.duration_ms,
        "movie_count": report.movie_count,
        "user_count": report.user_count,
        "duplicate_group_count": report.duplicate_group_count,
    });
    if view.shows_duplicates() {
        value["potential_duplicates"] = json!(report.potential_duplicates().collect::<Vec<_>>());
    }
    if view.shows_mismatches() {
        value["potential_mismatches"] = json!(report.potential_mismatches().collect::<Vec<_>>());
    }
    value
}

fn print_report(report: &AnalysisReport, options: &AnalyzeOptions, output: &Output) {
    output.info(format!(
        "Analyzed {} movies for {} users in {:.1}s: {} titles with more than one copy",
        report.movie_count,
        report.user_count,
        report.duration().as_secs_f64(),
        report.duplicate_group_count
    ));

    if options.view.shows_duplicates() {
        let duplicates: Vec<_> = report.potential_duplicates().collect();
        print_section(
            "Potential duplicates",
            "Copies whose file paths match; one of each pair can usually be removed.",
            &duplicates,
            options.enrich,
            output,
        );
    }
    if options.view.shows_mismatches() {
        let mismatches: Vec<_> = report.potential_mismatches().collect();
        print_section(
            "Potential mismatches",
            "Same title and year but different files; check these by hand.",
            &mismatches,
            options.enrich,
            output,
        );
    }

    if let Some(csv_path) = &options.csv {
        output.success(format!("Verdicts written to {}", csv_path.display()));
    }
}

fn print_section(title: &str, description: &str, verdicts: &[&DuplicateVerdict], enriched: bool, output: &Output) {
    output.println("");
    output.println(format!("{} ({})", title.bold().bright_cyan(), verdicts.len()));
    output.println(format!("{}", description.bright_black()));

    if verdicts.is_empty() {
        output.println(format!("{}", "  none found".bright_black()));
        return;
    }

    output.println(verdict_table(verdicts).to_string());

    let with_discrepancies: Vec<_> = verdicts.iter().filter(|v| v.has_play_status_discrepancy()).collect();
    if !with_discrepancies.is_empty() {
        output.println("");
        output.println(format!("{}", "Watch history to carry over before deleting:".yellow()));
        output.println(discrepancy_table(&with_discrepancies, enriched).to_string());
        output.println(format!(
            "{}",
            "Apply with: jellydupe mark-played --movie-id <Mark on> --user-id <User ID>".bright_black()
        ));
    }
}

fn styled(mut table: Table) -> Table {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold))
        .collect()
}

fn verdict_table(verdicts: &[&DuplicateVerdict]) -> Table {
    let mut table = Table::new();
    table.set_header(header(&["Title", "Copy A", "Copy B", "Similarity", "Play status", "Safe to delete"]));

    for verdict in verdicts {
        let status = if verdict.has_identical_play_status {
            Cell::new("identical").fg(Color::Green)
        } else if verdict.has_play_status_discrepancy() {
            Cell::new(format!("{} differ", verdict.discrepancies.len())).fg(Color::Yellow)
        } else {
            Cell::new("unknown").fg(Color::DarkGrey)
        };
        let safe = if verdict.is_safe_to_delete() {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("✗").fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(verdict.group_key().to_string()),
            Cell::new(copy_label(&verdict.movie_a)),
            Cell::new(copy_label(&verdict.movie_b)),
            Cell::new(format!("{}%", verdict.similarity)),
            status,
            safe,
        ]);
    }
    styled(table)
}

fn copy_label(movie: &MovieRecord) -> String {
    let path = if movie.path.is_empty() { "<no path>" } else { movie.path.as_str() };
    format!("{}\n{}", path, movie.id)
}

fn discrepancy_table(verdicts: &[&&DuplicateVerdict], enriched: bool) -> Table {
    let mut labels = vec!["Title", "User", "User ID", "Mark on"];
    if enriched {
        labels.push("Plays (A/B)");
    }
    let mut table = Table::new();
    table.set_header(header(&labels));

    for verdict in verdicts {
        for discrepancy in &verdict.discrepancies {
            let mut row = vec![
                Cell::new(verdict.group_key().to_string()),
                Cell::new(&discrepancy.user_name),
                Cell::new(&discrepancy.user_id),
                Cell::new(&discrepancy.movie_to_update),
            ];
            if enriched {
                row.push(Cell::new(format!(
                    "{}/{}",
                    play_count(&verdict.movie_a, &discrepancy.user_id),
                    play_count(&verdict.movie_b, &discrepancy.user_id)
                )));
            }
            table.add_row(row);
        }
    }
    styled(table)
}

fn play_count(movie: &MovieRecord, user_id: &str) -> u32 {
    movie.play_state(user_id).map(|s| s.play_count).unwrap_or(0)
}

/// One row per verdict; discrepancies are folded into "user:movie" pairs
fn write_csv(path: &Path, report: &AnalysisReport, view: View) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "title",
        "year",
        "movie_a_id",
        "movie_a_path",
        "movie_b_id",
        "movie_b_path",
        "similarity",
        "is_duplicate",
        "identical_play_status",
        "discrepancies",
    ])?;

    for verdict in report.verdicts.iter().filter(|v| view.includes(v)) {
        let discrepancies = verdict
            .discrepancies
            .iter()
            .map(|d| format!("{}:{}", d.user_id, d.movie_to_update))
            .collect::<Vec<_>>()
            .join(";");
        writer.write_record([
            verdict.movie_a.name.clone(),
            verdict.movie_a.production_year.to_string(),
            verdict.movie_a.id.clone(),
            verdict.movie_a.path.clone(),
            verdict.movie_b.id.clone(),
            verdict.movie_b.path.clone(),
            verdict.similarity.to_string(),
            verdict.is_duplicate.to_string(),
            verdict.has_identical_play_status.to_string(),
            discrepancies,
        ])?;
    }

    writer.flush()?;
    Ok(())
}
