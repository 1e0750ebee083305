// Entry point and high-level CLI flow.
//
// - Option [1] loads and cleans the register, printing diagnostics.
// - Option [2] writes one summary per category plus a JSON summary.
// - Option [3] writes the cross-category comparison series.
// After generating summaries the user can go back to the menu or exit.
// `--batch` runs all three once without prompting.
mod classifier;
mod config;
mod error;
mod loader;
mod output;
mod reports;
mod schema;
mod types;
mod util;

use clap::Parser;
use classifier::{partition, Classifier};
use config::{Cli, Settings};
use error::Result;
use loader::LoadReport;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use types::{AssetRecord, CategorySummary, LabelCount, SummaryStats};

// Loaded register for the current session, so the file is read once but
// summaries can be generated several times.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<(Vec<AssetRecord>, LoadReport)>,
}

fn loaded_data() -> Option<(Vec<AssetRecord>, LoadReport)> {
    let state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    state.data.clone()
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Option [1]: load, validate and coerce the input file.
fn handle_load(cli: &Cli, settings: &Settings) -> Result<()> {
    let (data, report) = loader::load_and_clean(&cli.input, settings)?;
    println!(
        "Processing register... ({} rows read, {} kept)",
        util::format_int(report.total_rows),
        util::format_int(report.kept_rows)
    );
    if report.missing_year_rows > 0 {
        println!(
            "Note: {} rows skipped for lacking a usable activation year.",
            util::format_int(report.missing_year_rows)
        );
    }
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows could not be read.",
            util::format_int(report.parse_errors)
        );
    }
    if !report.dropped_columns.is_empty() {
        println!("Info: ignored columns {}.", report.dropped_columns.join(", "));
    }
    println!();
    let mut state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    state.data = Some((data, report));
    Ok(())
}

fn build_summaries(
    data: &[AssetRecord],
    settings: &Settings,
) -> Result<(Vec<CategorySummary>, Vec<LabelCount>)> {
    let classifier = Classifier::new(&settings.rules);
    let parts = partition(data.to_vec(), &classifier, settings.on_unrecognized)?;
    debug!(rows = parts.len(), categories = parts.groups.len(), "partitioned records");
    Ok((reports::summarize_all(&parts), parts.unrecognized))
}

/// Option [2]: one CSV per non-empty category, a JSON summary and a
/// console preview of each table.
fn handle_generate_summaries(cli: &Cli, settings: &Settings) -> Result<()> {
    let Some((data, report)) = loaded_data() else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return Ok(());
    };
    let (summaries, unrecognized) = build_summaries(&data, settings)?;
    std::fs::create_dir_all(&cli.out_dir)?;

    println!("Generating summaries...\n");
    if summaries.is_empty() {
        println!("(no rows with a usable activation year)\n");
    }
    for summary in &summaries {
        let rows = reports::format_summary(summary);
        let file = cli
            .out_dir
            .join(format!("summary_{}.csv", summary.category.slug()));
        output::write_csv(&file, &rows)?;
        println!(
            "Summary by Year - {} ({} records)\n",
            summary.category,
            util::format_int(summary.total().map_or(0, |t| t.count))
        );
        println!("{}\n", output::render_summary(&rows));
        println!("(Full table exported to {})\n", file.display());
    }
    if !unrecognized.is_empty() {
        println!("Labels matching no rule:");
        for l in &unrecognized {
            println!("  {} ({} rows)", l.label, util::format_int(l.rows));
        }
        println!();
    }

    let stats = SummaryStats {
        total_rows: report.total_rows,
        kept_rows: report.kept_rows,
        missing_year_rows: report.missing_year_rows,
        unrecognized_labels: &unrecognized,
        summaries: &summaries,
    };
    let json = cli.out_dir.join("summary.json");
    output::write_json(&json, &stats)?;
    println!("Summary Stats ({})\n", json.display());
    Ok(())
}

/// Option [3]: the `(category, year, value)` series for the chosen metric.
fn handle_compare(cli: &Cli, settings: &Settings) -> Result<()> {
    let Some((data, _)) = loaded_data() else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return Ok(());
    };
    let (summaries, _) = build_summaries(&data, settings)?;
    let points = reports::build_comparison(&summaries, cli.metric);
    std::fs::create_dir_all(&cli.out_dir)?;
    let file = cli
        .out_dir
        .join(format!("comparison_{}.csv", cli.metric.slug()));
    output::write_csv(&file, &points)?;
    println!("Category Comparison ({})\n", cli.metric.slug());
    output::preview_table_rows(&points, 12);
    println!("(Full series exported to {})\n", file.display());
    Ok(())
}

fn run_batch(cli: &Cli, settings: &Settings) -> Result<()> {
    handle_load(cli, settings)?;
    handle_generate_summaries(cli, settings)?;
    handle_compare(cli, settings)
}

fn run_menu(cli: &Cli, settings: &Settings) {
    loop {
        println!("Select an option:");
        println!("[1] Load the file");
        println!("[2] Generate Summaries");
        println!("[3] Compare Categories\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Err(e) = handle_load(cli, settings) {
                    eprintln!("Failed to load file: {}\n", e);
                }
            }
            "2" => {
                println!();
                if let Err(e) = handle_generate_summaries(cli, settings) {
                    eprintln!("Failed to generate summaries: {}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                println!();
                if let Err(e) = handle_compare(cli, settings) {
                    eprintln!("Failed to build comparison: {}\n", e);
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match Settings::resolve(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.batch {
        if let Err(e) = run_batch(&cli, &settings) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    } else {
        run_menu(&cli, &settings);
    }
    ExitCode::SUCCESS
}
