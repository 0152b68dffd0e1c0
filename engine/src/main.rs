//! Panelshape CLI - union yearly exports and reshape them to one row per entity and year
//!
//! # Main Commands
//!
//! ```bash
//! panelshape run data/                  # Union every export in data/ and reshape
//! panelshape reshape union.xlsx         # Reshape an already-unioned file
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! panelshape union data/ -o union.xlsx  # Only union the exports
//! panelshape classify export.xlsx       # Show how each header is classified
//! ```

use clap::{Args, Parser, Subcommand};
use panelshape::logs::{init_file_log, log_error};
use panelshape::{
    classify_columns, discover_inputs, load_sources, run, run_single, write_wide_table,
    ColumnClass, PipelineOptions, DEFAULT_ENTITY_COLUMN,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "panelshape")]
#[command(about = "Union yearly spreadsheet exports and reshape year-suffixed columns", long_about = None)]
struct Cli {
    /// Directory for the JSON-lines log file
    #[arg(long, global = true, env = "PANELSHAPE_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Do not write a log file
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Sheet to read from spreadsheet files (and to write outputs to)
    #[arg(long, env = "PANELSHAPE_SHEET", default_value = "Results")]
    sheet: String,

    /// Column added to every row with its source file name
    #[arg(long, default_value = "origin")]
    origin_column: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: exports → union → reshape
    Run {
        /// Input files or directories
        #[arg(default_value = "data")]
        inputs: Vec<PathBuf>,

        /// Column holding the entity identifier
        #[arg(short, long, env = "PANELSHAPE_ENTITY_COLUMN", default_value = DEFAULT_ENTITY_COLUMN)]
        entity_column: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Output file (.xlsx, .csv or .json)
        #[arg(short, long, default_value = "Unified_and_Processed_Records.xlsx")]
        output: PathBuf,

        /// Also write the unioned exports
        #[arg(long)]
        union_output: Option<PathBuf>,

        /// Write a JSON data-quality report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Union exports without reshaping
    Union {
        /// Input files or directories
        #[arg(default_value = "data")]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        /// Output file (.xlsx, .csv or .json)
        #[arg(short, long, default_value = "UnionedDataFrame.xlsx")]
        output: PathBuf,
    },

    /// Reshape a single, already-unioned file
    Reshape {
        /// Input file (.xlsx, .xls, .xlsb, .ods or .csv)
        input: PathBuf,

        /// Column holding the entity identifier
        #[arg(short, long, env = "PANELSHAPE_ENTITY_COLUMN", default_value = DEFAULT_ENTITY_COLUMN)]
        entity_column: String,

        /// Sheet to read (and to write the output to)
        #[arg(long, env = "PANELSHAPE_SHEET", default_value = "Results")]
        sheet: String,

        /// Output file (.xlsx, .csv or .json)
        #[arg(short, long, default_value = "Unified_and_Processed_Records.xlsx")]
        output: PathBuf,

        /// Write a JSON data-quality report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show how each column header of a file is classified
    Classify {
        /// Input file
        input: PathBuf,

        /// Sheet to read
        #[arg(long, env = "PANELSHAPE_SHEET", default_value = "Results")]
        sheet: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if !cli.no_log_file && !matches!(cli.command, Commands::Classify { .. }) {
        match init_file_log(&cli.log_dir) {
            Ok(path) => eprintln!("📝 Logging to {}", path.display()),
            Err(e) => eprintln!("⚠️  Could not open log file in {}: {}", cli.log_dir.display(), e),
        }
    }

    let result = match cli.command {
        Commands::Run {
            inputs,
            entity_column,
            source,
            output,
            union_output,
            report,
            no_progress,
        } => {
            let options = PipelineOptions {
                entity_column,
                sheet: source.sheet,
                origin_column: source.origin_column,
                union_output,
                output: Some(output),
                report,
                progress: !no_progress,
            };
            cmd_run(&inputs, &options)
        }

        Commands::Union {
            inputs,
            source,
            output,
        } => cmd_union(&inputs, &source, &output),

        Commands::Reshape {
            input,
            entity_column,
            sheet,
            output,
            report,
            no_progress,
        } => {
            let options = PipelineOptions {
                entity_column,
                sheet,
                output: Some(output),
                report,
                progress: !no_progress,
                ..PipelineOptions::default()
            };
            cmd_reshape(&input, &options)
        }

        Commands::Classify { input, sheet, json } => cmd_classify(&input, &sheet, json),
    };

    if let Err(e) = result {
        log_error(format!("Process failed: {}", e));
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(inputs: &[PathBuf], options: &PipelineOptions) -> Result<(), Box<dyn std::error::Error>> {
    let output = run(inputs, options)?;
    eprintln!(
        "\n📊 {} files, {} rows → {} records",
        output.sources.len(),
        output.union_rows,
        output.outcome.table.len()
    );
    if !output.warnings.is_empty() {
        eprintln!("⚠️  {} warnings, see the log for details", output.warnings.len());
    }
    Ok(())
}

fn cmd_union(
    inputs: &[PathBuf],
    source: &SourceArgs,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = discover_inputs(inputs)?;
    let union = load_sources(&files, &source.sheet, &source.origin_column)?;
    write_wide_table(output, &source.sheet, &union.table)?;

    eprintln!("💾 Output written to: {}", output.display());
    Ok(())
}

fn cmd_reshape(input: &Path, options: &PipelineOptions) -> Result<(), Box<dyn std::error::Error>> {
    let output = run_single(input, options)?;
    eprintln!(
        "\n📊 {} rows → {} records",
        output.union_rows,
        output.outcome.table.len()
    );
    Ok(())
}

fn cmd_classify(input: &Path, sheet: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading headers: {}", input.display());

    let table = panelshape::ingest::read_source(input, sheet)?;
    let classes = classify_columns(table.columns());

    if json {
        let entries: Vec<serde_json::Value> = table
            .columns()
            .iter()
            .zip(&classes)
            .map(|(column, class)| serde_json::json!({ "column": column, "class": class }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (column, class) in table.columns().iter().zip(&classes) {
        match class {
            ColumnClass::Invariant { .. } => println!("  {:<50} invariant", column),
            ColumnClass::YearScoped { year, base_name } => {
                println!("  {:<50} {} → {}", column, year, base_name)
            }
        }
    }

    let year_scoped = classes.iter().filter(|c| c.is_year_scoped()).count();
    eprintln!("\n✅ {} of {} columns are year-scoped", year_scoped, classes.len());
    Ok(())
}
