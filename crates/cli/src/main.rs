use anyhow::Result;
use clap::{Parser, Subcommand};
use pdfsort::fs_apply::{self, CopyReport};
use pdfsort_core::config;
use pdfsort_core::config::AppConfig;
use pdfsort_core::extractor::PdfTextSource;
use pdfsort_core::pipeline::{self, BatchSummary, Pipeline, FEATURES_ARTIFACT};
use pdfsort_core::report::{self, CategorizeSummary};
use pdfsort_core::trainer::StandardPredictor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { dir, output, json } => run_extract(cfg, dir, output, json).await,
        Commands::Train { features, json } => run_train(cfg, features, json),
        Commands::Predict {
            roots,
            output_dir,
            report_dir,
            no_copy,
            json,
        } => run_predict(cfg, roots, output_dir, report_dir, no_copy, json).await,
        Commands::Run {
            roots,
            output_dir,
            no_copy,
            json,
        } => run_all(cfg, roots, output_dir, no_copy, json).await,
        Commands::Categorize {
            roots,
            output_dir,
            no_copy,
            json,
        } => run_categorize(cfg, roots, output_dir, no_copy, json).await,
    }
}

#[derive(Parser)]
#[command(name = "pdfsort")]
#[command(about = "Sorts PDF collections into standards and document categories", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract features from a directory of known standards
    Extract {
        /// Directory to scan; defaults to scan.standards
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Feature dump to write
        #[arg(short, long, default_value = FEATURES_ARTIFACT)]
        output: PathBuf,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Train the standard classifier from a feature dump
    Train {
        /// Feature dump written by `extract`
        #[arg(short, long, default_value = FEATURES_ARTIFACT)]
        features: PathBuf,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Predict standards under the given roots and copy accepted files
    Predict {
        /// Roots to scan; defaults to scan.include
        roots: Vec<PathBuf>,
        /// Where accepted files are copied; defaults to output.standard_dir
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Directory for prediction_results.json and friends
        #[arg(long, default_value = ".")]
        report_dir: PathBuf,
        /// Report only, do not copy
        #[arg(long, default_value_t = false)]
        no_copy: bool,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Extract, train and predict in one go
    Run {
        /// Roots to scan for prediction; defaults to scan.include
        roots: Vec<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        no_copy: bool,
        #[arg(long)]
        json: bool,
    },
    /// Sort PDFs into per-category directories using the keyword rules
    Categorize {
        /// Roots to scan; defaults to scan.include
        roots: Vec<PathBuf>,
        /// Parent of the per-category directories; defaults to output.category_dir
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        no_copy: bool,
        #[arg(long)]
        json: bool,
    },
}

fn build_pipeline(cfg: AppConfig) -> Result<Pipeline> {
    Ok(Pipeline::new(cfg, Arc::new(PdfTextSource))?)
}

fn roots_or_default(roots: Vec<PathBuf>, cfg: &AppConfig) -> Vec<PathBuf> {
    if roots.is_empty() {
        cfg.scan.include.iter().map(PathBuf::from).collect()
    } else {
        roots
    }
}

async fn run_extract(cfg: AppConfig, dir: Option<PathBuf>, output: PathBuf, json: bool) -> Result<()> {
    let dir = dir.unwrap_or_else(|| PathBuf::from(&cfg.scan.standards));
    let pipeline = build_pipeline(cfg)?;
    let (records, summary) = pipeline.extract_features(&[dir]).await?;
    pipeline::save_features(&output, &records)?;
    let standard = records.iter().filter(|r| r.is_standard).count();
    if json {
        let out = serde_json::json!({
            "status": "ok",
            "mode": "extract",
            "summary": summary,
            "standard": standard,
            "output": output,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_batch("extract", &summary);
        println!("scored standard: {}, features written to {}", standard, output.display());
    }
    Ok(())
}

fn run_train(cfg: AppConfig, features: PathBuf, json: bool) -> Result<()> {
    let records = pipeline::load_features(&features)?;
    let pipeline = build_pipeline(cfg)?;
    let model = pipeline.train(&records)?;
    let info = &model.info;
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
    } else {
        println!(
            "train: {} samples ({} standard, {} non-standard), model saved to {}",
            info.n_samples,
            info.n_standard,
            info.n_non_standard,
            pipeline.config().model.dir
        );
        match info.accuracy {
            Some(a) => println!("held-out accuracy: {:.4}", a),
            None => println!("held-out accuracy: n/a (empty test split)"),
        }
        let mut ranked: Vec<(&String, &f64)> = info.feature_importance.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(a.1));
        for (name, weight) in ranked.iter().take(5) {
            println!("  {:<24} {:.4}", name, weight);
        }
    }
    Ok(())
}

async fn run_predict(
    cfg: AppConfig,
    roots: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    report_dir: PathBuf,
    no_copy: bool,
    json: bool,
) -> Result<()> {
    let roots = roots_or_default(roots, &cfg);
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&cfg.output.standard_dir));
    let pipeline = build_pipeline(cfg)?;
    let predictor = pipeline.load_predictor()?;
    predict_and_copy(&pipeline, &predictor, &roots, &output_dir, &report_dir, no_copy, json).await
}

async fn run_all(
    cfg: AppConfig,
    roots: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    no_copy: bool,
    json: bool,
) -> Result<()> {
    let roots = roots_or_default(roots, &cfg);
    let standards = PathBuf::from(&cfg.scan.standards);
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&cfg.output.standard_dir));
    let model_dir = PathBuf::from(&cfg.model.dir);
    let pipeline = build_pipeline(cfg)?;

    info!("step 1/3: extracting features from {:?}", standards);
    let (records, summary) = pipeline.extract_features(&[standards]).await?;
    pipeline::save_features(&model_dir.join(FEATURES_ARTIFACT), &records)?;
    if !json {
        print_batch("extract", &summary);
    }

    info!("step 2/3: training");
    let model = pipeline.train(&records)?;
    let predictor = StandardPredictor::new(pipeline.config().scoring.min_confidence).with_model(model);

    info!("step 3/3: predicting");
    predict_and_copy(&pipeline, &predictor, &roots, &output_dir, &model_dir, no_copy, json).await
}

async fn predict_and_copy(
    pipeline: &Pipeline,
    predictor: &StandardPredictor,
    roots: &[PathBuf],
    output_dir: &Path,
    report_dir: &Path,
    no_copy: bool,
    json: bool,
) -> Result<()> {
    let (results, summary) = pipeline.predict(predictor, roots).await?;
    let stats = report::write_prediction_reports(report_dir, &results)?;
    let copy = if no_copy {
        CopyReport::default()
    } else {
        fs_apply::copy_all(
            results
                .iter()
                .filter(|r| r.is_standard)
                .map(|r| Path::new(r.file_path.as_str())),
            output_dir,
        )
    };

    if json {
        let out = serde_json::json!({
            "status": "ok",
            "mode": "predict",
            "summary": summary,
            "stats": stats,
            "copied": copy.copied.len(),
            "copy_failures": copy.failed.len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_batch("predict", &summary);
        println!(
            "standard: {} of {} ({:.1}%), confidence min {:.3} / max {:.3} / avg {:.3}",
            stats.standard_files,
            stats.total_files,
            stats.standard_ratio * 100.0,
            stats.confidence_stats.min,
            stats.confidence_stats.max,
            stats.confidence_stats.avg
        );
        if !no_copy {
            println!(
                "copied {} to {}, {} failed",
                copy.copied.len(),
                output_dir.display(),
                copy.failed.len()
            );
        }
    }
    Ok(())
}

async fn run_categorize(
    cfg: AppConfig,
    roots: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    no_copy: bool,
    json: bool,
) -> Result<()> {
    let roots = roots_or_default(roots, &cfg);
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&cfg.output.category_dir));
    let pipeline = build_pipeline(cfg)?;
    let files = pipeline.categorize(&roots).await?;

    let mut summary = CategorizeSummary::from_files(&files);
    if !no_copy {
        for file in &files {
            let Some(decision) = &file.decision else {
                continue;
            };
            let dest = output_dir.join(&decision.category);
            let report = fs_apply::copy_all([file.file_path.as_path()], &dest);
            summary.copy_failures += report.failed.len();
        }
    }

    if json {
        let out = serde_json::json!({
            "status": "ok",
            "mode": "categorize",
            "summary": summary,
            "files": files,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "categorize: {} files, {} unclassified, {} extraction failures, {} copy failures",
            summary.total, summary.unclassified, summary.extraction_failures, summary.copy_failures
        );
        for (category, count) in &summary.per_category {
            println!("  {:<16} {}", category, count);
        }
    }
    Ok(())
}

fn print_batch(label: &str, summary: &BatchSummary) {
    println!(
        "{}: {} files, {} ok, {} failed",
        label, summary.total, summary.succeeded, summary.failed
    );
}
