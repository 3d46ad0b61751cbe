use clap::Parser;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use wastesort::{
    AnnotationStyle, Classification, DebugConfig, InferencePipeline, ModelContext, ModelPaths,
    PipelineConfig, load_image,
};

#[derive(Parser)]
#[command(name = "wastesort")]
#[command(about = "Classify waste in an image as biodegradable or non-biodegradable")]
struct Cli {
    /// Path to input image file (JPEG or PNG)
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Classifier model (.rten)
    #[arg(long, value_name = "FILE")]
    classifier: PathBuf,

    /// Object detector model (.rten); enables detect-then-classify mode
    #[arg(long, value_name = "FILE")]
    detector: Option<PathBuf>,

    /// TOML file overriding thresholds and preprocessing constants
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Font used for box labels in the annotated image
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Where to write the annotated image (detection mode)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    mode: &'static str,
    image: &'a std::path::Path,
    results: &'a [Classification],
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    // Models are loaded once, before any image is touched
    let models = ModelContext::load(
        &ModelPaths {
            classifier: args.classifier.clone(),
            detector: args.detector.clone(),
        },
        &config,
    )?;

    let mut style = AnnotationStyle::new(config.box_color, config.font_scale);
    if let Some(font_path) = &args.font {
        style = style.with_font_file(font_path)?;
    }

    let mut pipeline = InferencePipeline::new(&models, config).with_style(style);
    if let Some(debug_dir) = &args.debug_out {
        pipeline = pipeline.with_debug(DebugConfig::new(debug_dir)?);
    }

    info!("Loading image: {}", args.image_path.display());
    let image = load_image(&args.image_path)?;
    info!("Image loaded: {}x{}", image.width(), image.height());

    if models.has_detector() {
        let report = pipeline.classify_regions(&image)?;

        if let Some(output) = &args.output {
            report
                .image
                .save(output)
                .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", output.display(), e))?;
            info!("Annotated image written to {}", output.display());
        }

        if args.json {
            print_json("regions", &args.image_path, &report.results)?;
        } else {
            println!("\n=== Waste Detection Results ===");
            println!("Total results: {}", report.results.len());
            for result in &report.results {
                match &result.region {
                    Some(r) => println!(
                        "  {} at ({}, {}) {}x{} - confidence: {}",
                        result.label,
                        r.x,
                        r.y,
                        r.width,
                        r.height,
                        result.percent(1)
                    ),
                    None => println!("  {}", result.label),
                }
            }
        }
    } else {
        let result = pipeline.classify_whole(&image)?;

        if args.json {
            print_json("whole_image", &args.image_path, std::slice::from_ref(&result))?;
        } else {
            println!("\n=== Waste Classification ===");
            println!("Prediction: {}", result.label);
            println!("Confidence: {}", result.percent(2));
        }
    }

    Ok(())
}

fn print_json(mode: &'static str, image: &std::path::Path, results: &[Classification]) -> anyhow::Result<()> {
    let report = Report { mode, image, results };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
