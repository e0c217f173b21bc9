use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use pet_classifier::pipeline::{self, RunConfig};
use pet_classifier::{report, store, Architecture, ModelManager, PetClassifier, ReportOptions};
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// Classify pet images with a pretrained CNN and report how well it
/// identifies dogs and dog breeds.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder of pet images, named <Label_words>_<number>.<ext>
    #[arg(long, default_value = "pet_images/")]
    dir: PathBuf,

    /// CNN model architecture
    #[arg(long, value_enum, default_value_t = Architecture::Vgg)]
    arch: Architecture,

    /// Text file of dog names, one per line
    #[arg(long, default_value = "dognames.txt")]
    dogfile: PathBuf,

    /// Where to save the statistics of this run
    #[arg(long, default_value = "results_stats.json")]
    results_file: PathBuf,

    /// Don't list images misclassified as dog / not dog
    #[arg(long)]
    hide_incorrect_dogs: bool,

    /// Don't list dogs assigned the wrong breed
    #[arg(long)]
    hide_incorrect_breed: bool,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,

    /// Model cache directory (defaults to $PET_CLASSIFIER_CACHE/models or the user cache)
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

async fn ensure_model_downloaded(manager: &ModelManager, arch: Architecture, fresh: bool) -> Result<()> {
    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(arch)?;
    }
    manager
        .ensure_model_downloaded(arch)
        .await
        .with_context(|| format!("Failed to prepare the {} model", arch))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start_time = Instant::now();

    let config = RunConfig {
        image_dir: args.dir.clone(),
        dogfile: args.dogfile.clone(),
    };
    config
        .validate()
        .with_context(|| format!("Invalid inputs in {}", args.dir.display()))?;

    let manager = match &args.models_dir {
        Some(dir) => ModelManager::new(dir),
        None => ModelManager::new_default(),
    }
    .context("Failed to open the model cache")?;
    ensure_model_downloaded(&manager, args.arch, args.fresh).await?;

    info!("Building {} classifier...", args.arch);
    let classifier = PetClassifier::builder()
        .with_models_dir(manager.models_dir())
        .with_architecture(args.arch)?
        .build()?;

    let outcome = pipeline::run(&config, &classifier)
        .with_context(|| format!("Failed to classify images in {}", args.dir.display()))?;

    let options = ReportOptions {
        print_incorrect_dogs: !args.hide_incorrect_dogs,
        print_incorrect_breed: !args.hide_incorrect_breed,
    };
    report::print_results(&outcome.results, &outcome.stats, args.arch.as_str(), options)?;

    println!(
        "\n** Total Elapsed Runtime: {}",
        report::format_elapsed(start_time.elapsed())
    );

    store::save_stats(&args.results_file, args.arch.as_str(), &outcome.stats)?;

    let stdout = io::stdout();
    report::write_summary_table(&mut stdout.lock(), &outcome.stats, args.arch.as_str())?;

    Ok(())
}
