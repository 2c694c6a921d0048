//! # CLI Module
//!
//! Command-line interface for the image sorter.
//!
//! ## Usage
//! ```bash
//! # Report groups of similar images
//! image-sorter analyze ~/Products
//!
//! # Stricter color matching, JSON output
//! image-sorter analyze ~/Products --method color --similarity 0.95 --output json
//!
//! # Move each group into its own folder
//! image-sorter sort ~/Products --destination ~/Sorted
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_sorter::core::comparator::{DetectionMethod, GroupingRule};
use image_sorter::core::organize::{GroupSorter, SortOptions, SortResult};
use image_sorter::core::pipeline::{AnalysisConfig, AnalysisResult, Analyzer, SorterSettings};
use image_sorter::error::{ImageSorterError, Result};
use image_sorter::events::{
    CompareEvent, Event, EventChannel, EventReceiver, ExtractEvent, PipelineEvent, ScanEvent, SortEvent,
    PROGRESS_BUFFER,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;

/// Image Sorter - Group similar images into folders
#[derive(Parser, Debug)]
#[command(name = "image-sorter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find groups of similar images without touching any file
    Analyze {
        #[command(flatten)]
        args: AnalyzeArgs,
    },
    /// Find groups, then move each group into its own folder
    Sort {
        #[command(flatten)]
        args: AnalyzeArgs,

        /// Root for the group folders (defaults to FOLDER)
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Folder to analyse
    folder: PathBuf,

    /// Detection method
    #[arg(short, long)]
    method: Option<Method>,

    /// Similarity threshold (0.5-1.0, higher = stricter)
    #[arg(short, long)]
    similarity: Option<f64>,

    /// Smallest group worth reporting
    #[arg(long)]
    min_group_size: Option<usize>,

    /// Descend into subfolders
    #[arg(short, long)]
    recursive: bool,

    /// Settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Method {
    /// Grayscale average hash - fast, layout only
    Basic,
    /// Per-channel color hash - tells recolored variants apart
    Color,
    /// Hashes at several sizes - robust to resizing
    MultiScale,
    /// Weighted fusion of every fingerprint (default)
    Combined,
    /// Byte-identical files only
    ExactDuplicate,
    /// Keypoint matching - robust to crops and rotation
    OrbFeatures,
    /// Learned embeddings - needs an ONNX model
    MlFeatures,
}

impl From<Method> for DetectionMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Basic => DetectionMethod::Basic,
            Method::Color => DetectionMethod::Color,
            Method::MultiScale => DetectionMethod::MultiScale,
            Method::Combined => DetectionMethod::Combined,
            Method::ExactDuplicate => DetectionMethod::ExactDuplicate,
            Method::OrbFeatures => DetectionMethod::OrbFeatures,
            Method::MlFeatures => DetectionMethod::MlFeatures,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (one path per line, groups separated by blank lines)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { args } => run_analyze(args),
        Commands::Sort { args, destination } => run_sort(args, destination),
    }
}

/// Settings file first, then command-line flags on top
fn resolve_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::default();
    SorterSettings::resolve(args.config.as_deref())?.apply(&mut config);

    if let Some(method) = args.method {
        config.method = method.into();
    }
    if let Some(similarity) = args.similarity {
        config.similarity = similarity;
    }
    if let Some(size) = args.min_group_size {
        config.min_group_size = size;
    }
    if args.recursive {
        config.recursive = true;
    }

    Ok(config)
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    image_sorter::init_tracing(if args.verbose { "debug" } else { "warn" });
    let term = Term::stderr();
    let config = resolve_config(&args)?;

    if args.output == OutputFormat::Pretty {
        print_header(&term);
    }

    let analyzer = Analyzer::builder().config(config).build()?;

    let (sender, receiver) = EventChannel::bounded(PROGRESS_BUFFER);
    let progress = progress_bar(args.output);
    let event_thread = spawn_progress(receiver, progress.clone());

    let result = analyzer.run_with_events(&args.folder, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = result?;
    match args.output {
        OutputFormat::Pretty => print_pretty_analysis(&term, &result, args.verbose),
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Minimal => print_minimal_analysis(&result),
    }

    Ok(())
}

fn run_sort(args: AnalyzeArgs, destination: Option<PathBuf>) -> Result<()> {
    image_sorter::init_tracing(if args.verbose { "debug" } else { "warn" });
    let term = Term::stderr();
    let config = resolve_config(&args)?;

    if args.output == OutputFormat::Pretty {
        print_header(&term);
    }

    let analyzer = Analyzer::builder().config(config).build()?;

    let (sender, receiver) = EventChannel::bounded(PROGRESS_BUFFER);
    let progress = progress_bar(args.output);
    let event_thread = spawn_progress(receiver, progress.clone());

    let outcome = analyzer.run_with_events(&args.folder, &sender).and_then(|analysis| {
        if args.output == OutputFormat::Pretty {
            if let Some(ref pb) = progress {
                pb.println(analysis_summary_line(&analysis));
            }
        }
        if !analysis.has_groups() {
            return Ok(None);
        }
        let options = SortOptions { destination };
        GroupSorter::sort_with_events(analysis, &options, &sender)
            .map(Some)
            .map_err(ImageSorterError::from)
    });

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match (outcome?, args.output) {
        (None, OutputFormat::Pretty) => {
            term.write_line(&format!(
                "  {} No groups found, nothing was moved.",
                style("ℹ").cyan()
            ))
            .ok();
        }
        (None, OutputFormat::Json) => print_json(&serde_json::json!({ "folders": [], "files_moved": 0 }))?,
        (None, OutputFormat::Minimal) => {}
        (Some(sorted), OutputFormat::Pretty) => print_pretty_sort(&term, &sorted),
        (Some(sorted), OutputFormat::Json) => print_json(&sorted)?,
        (Some(sorted), OutputFormat::Minimal) => {
            for folder in &sorted.folders {
                println!("{}", folder.path.display());
            }
        }
    }

    Ok(())
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Image Sorter").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn progress_bar(output: OutputFormat) -> Option<ProgressBar> {
    if output != OutputFormat::Pretty {
        return None;
    }

    let pb = ProgressBar::new(0);
    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(bar_style);
    Some(pb)
}

/// Drive the progress bar from engine events on a separate thread
fn spawn_progress(receiver: EventReceiver, progress: Option<ProgressBar>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Pipeline(PipelineEvent::CapabilityUnavailable { kind, reason }) => {
                    pb.println(format!(
                        "  {} {} unavailable: {}",
                        style("⚠").yellow(),
                        kind,
                        reason
                    ));
                }
                Event::Scan(ScanEvent::Completed { total_images }) => {
                    pb.set_length(total_images as u64);
                }
                Event::Extract(ExtractEvent::Started { total_images }) => {
                    pb.set_length(total_images as u64);
                    pb.set_position(0);
                }
                Event::Extract(ExtractEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Compare(CompareEvent::Started { total_images }) => {
                    pb.set_length(total_images as u64);
                    pb.set_position(0);
                }
                Event::Compare(CompareEvent::Progress(p)) => {
                    pb.set_position(p.images_assigned as u64);
                    pb.set_message(format!("Comparing ({} groups)", p.groups_found));
                }
                Event::Sort(SortEvent::Started { total_files, .. }) => {
                    pb.set_length(total_files as u64);
                    pb.set_position(0);
                    pb.set_message("Sorting");
                }
                Event::Sort(SortEvent::Progress(p)) => {
                    pb.set_position(p.processed as u64);
                }
                Event::Sort(SortEvent::MoveFailed { path, message }) => {
                    pb.println(format!("  {} {}: {}", style("✗").red(), path.display(), message));
                }
                _ => {}
            }
        }
    })
}

fn analysis_summary_line(result: &AnalysisResult) -> String {
    format!(
        "  {} {} groups from {} images",
        style("✓").green().bold(),
        style(result.groups.len()).cyan(),
        result.total_images
    )
}

fn describe_rule(rule: &GroupingRule) -> String {
    match rule {
        GroupingRule::MaxHammingDistance(distance) => format!("hamming distance ≤ {}", distance),
        GroupingRule::MinSimilarity(similarity) => format!("similarity ≥ {:.2}", similarity),
        GroupingRule::ExactMatch => "identical content".to_string(),
    }
}

fn print_pretty_analysis(term: &Term, result: &AnalysisResult, verbose: bool) {
    term.write_line(&format!("{} Analysis Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} images found, {} analysed in {:.1}s",
        style(result.total_images).cyan(),
        style(result.analyzed_images).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} method, {}",
        style(result.method).yellow(),
        describe_rule(&result.rule)
    ))
    .ok();
    term.write_line(&format!(
        "  {} groups covering {} images ({})",
        style(result.groups.len()).cyan(),
        style(result.grouped_images()).cyan(),
        format_bytes(result.groups.iter().map(|g| g.total_bytes()).sum())
    ))
    .ok();
    if !result.ungrouped.is_empty() {
        term.write_line(&format!("  {} images left ungrouped", style(result.ungrouped.len()).dim()))
            .ok();
    }
    if !result.excluded.is_empty() {
        term.write_line(&format!(
            "  {} images could not be analysed",
            style(result.excluded.len()).yellow()
        ))
        .ok();
    }
    if verbose {
        term.write_line(&format!("  {} comparisons", style(result.comparisons).dim()))
            .ok();
    }

    for notice in &result.unavailable {
        term.write_line(&format!(
            "  {} {} unavailable: {}",
            style("⚠").yellow(),
            notice.kind,
            notice.reason
        ))
        .ok();
    }

    term.write_line("").ok();

    if result.groups.is_empty() {
        term.write_line(&format!("  {} No similar images found", style("ℹ").cyan()))
            .ok();
    } else {
        term.write_line(&format!("{}", style("Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, group) in result.groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} ({} images, {})",
                style(format!("Group {}:", i + 1)).bold(),
                group.len(),
                format_bytes(group.total_bytes())
            ))
            .ok();

            for (idx, image) in group.images.iter().enumerate() {
                let marker = if idx == 0 {
                    style("★").green().to_string()
                } else {
                    style("○").dim().to_string()
                };
                term.write_line(&format!("    {} {}", marker, display_path(&image.path)))
                    .ok();
            }
            term.write_line("").ok();
        }
    }

    if verbose && !result.excluded.is_empty() {
        term.write_line(&format!("{}", style("Not analysed:").bold().underlined()))
            .ok();
        for excluded in &result.excluded {
            term.write_line(&format!(
                "    {} {}: {}",
                style("✗").red(),
                display_path(&excluded.path),
                style(&excluded.reason).dim()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("No files were moved. Run `image-sorter sort` to create the group folders.").dim()
    ))
    .ok();
}

fn print_pretty_sort(term: &Term, result: &SortResult) {
    term.write_line("").ok();
    term.write_line(&format!("{} Sort Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files ({}) moved into {} folders in {:.1}s",
        style(result.files_moved).cyan(),
        format_bytes(result.total_size_bytes),
        style(result.folders.len()).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line("").ok();

    for folder in &result.folders {
        term.write_line(&format!(
            "  {} {} ({} files)",
            style("▸").cyan(),
            display_path(&folder.path),
            folder.files_moved
        ))
        .ok();
    }

    if !result.is_complete() {
        term.write_line("").ok();
        term.write_line(&format!(
            "{} {} files could not be moved:",
            style("⚠").yellow(),
            result.failures.len()
        ))
        .ok();
        for failure in &result.failures {
            term.write_line(&format!(
                "    {} {}: {}",
                style("✗").red(),
                display_path(&failure.path),
                style(&failure.reason).dim()
            ))
            .ok();
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

fn render_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ImageSorterError::Report(format!("Failed to render JSON: {}", e)))
}

fn print_minimal_analysis(result: &AnalysisResult) {
    for (i, group) in result.groups.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for image in &group.images {
            println!("{}", image.path.display());
        }
    }
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
