//! Multi-task training binary.
//!
//! Trains the shared-trunk network on one cross-validation fold (or the
//! built-in synthetic dataset) and writes the model checkpoint, the metrics
//! history and, with the `plots` feature, loss/accuracy charts into the
//! output directory.
//!
//! # Usage
//!
//! ```bash
//! # Train on fold A with the default BCE mask loss
//! cargo run --release -- --fold A
//!
//! # Dice mask loss into its own output directory
//! cargo run --release -- --fold A --mask-loss dice --output output/dice
//!
//! # No dataset on disk? Smoke-run on synthetic blobs
//! cargo run --release -- --synthetic --epochs 5
//!
//! # Resume a stopped run from its checkpoint
//! cargo run --release -- --fold A --resume output/bce/modelA.json
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrite_mtl::data::loader::load_samples;
use ferrite_mtl::data::manifest::{fold_manifest_path, load_manifest};
use ferrite_mtl::data::synthetic;
use ferrite_mtl::model::{Checkpoint, InputType, ModelMetadata, NetConfig};
use ferrite_mtl::plot::{save_accuracy_plot, save_loss_plot};
use ferrite_mtl::train::metrics::save_history;
use ferrite_mtl::{
    train_loop, Dataset, GradNorm, MaskLossKind, MultiTaskNet, Optimizer, TrainConfig, TASK_COUNT,
};

#[derive(Parser)]
#[command(
    name = "ferrite-mtl",
    version,
    about = "Multi-task CNN training with gradient-norm task balancing"
)]
struct Cli {
    /// Letter of the cross-validation fold, capital case (e.g. A)
    #[arg(short = 'l', long)]
    fold: Option<String>,

    /// Output directory for the model, metrics and plots
    #[arg(short, long, default_value = "output/bce")]
    output: PathBuf,

    /// Directory holding the foldX_train.csv manifests
    #[arg(long, default_value = "dataset/crossValidationCSVs")]
    manifest_dir: PathBuf,

    /// Root directory the manifest's image paths are relative to
    #[arg(long, default_value = "dataset")]
    data_root: PathBuf,

    /// Train on generated blob images instead of a fold manifest
    #[arg(long)]
    synthetic: bool,

    /// Number of synthetic samples to generate
    #[arg(long, default_value_t = 512)]
    synthetic_samples: usize,

    /// Images are resized to side x side before flattening
    #[arg(long, default_value_t = 16)]
    image_side: u32,

    /// Number of label classes in the manifest dataset
    #[arg(long, default_value_t = 4)]
    num_classes: usize,

    /// Hidden trunk layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_value = "64,32")]
    trunk: Vec<usize>,

    #[arg(long, default_value_t = 40)]
    epochs: usize,

    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Learning rate of the main (Adam) optimizer
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Balancing strength; 0 equalizes raw gradient norms
    #[arg(long, default_value_t = 1.5)]
    alpha: f64,

    /// Learning rate of the task-weight update
    #[arg(long, default_value_t = 0.025)]
    weight_lr: f64,

    /// Segmentation loss: bce or dice
    #[arg(long, default_value = "bce")]
    mask_loss: String,

    /// Binarization threshold for dice and intensity accuracy
    #[arg(long, default_value_t = 0.5)]
    threshold: f64,

    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Continue training from a saved checkpoint
    #[arg(long)]
    resume: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mask_loss = match cli.mask_loss.as_str() {
        "bce" => MaskLossKind::Bce,
        "dice" => MaskLossKind::Dice,
        other => bail!("unknown mask loss '{}', expected 'bce' or 'dice'", other),
    };

    let fold = match (&cli.fold, cli.synthetic) {
        (Some(fold), _) => fold.clone(),
        (None, true) => "S".to_string(),
        (None, false) => bail!("--fold is required unless --synthetic is set"),
    };

    let side = cli.image_side;
    let input_len = (side * side) as usize;

    // ── Dataset ─────────────────────────────────────────────────────────
    let dataset = if cli.synthetic {
        info!(
            "Generating {} synthetic blob samples ({}x{})",
            cli.synthetic_samples, side, side
        );
        Dataset::new(
            synthetic::builtin_blobs(cli.synthetic_samples, side as usize, cli.seed),
            synthetic::NUM_CLASSES,
        )?
    } else {
        let manifest_path = fold_manifest_path(&cli.manifest_dir, &fold);
        info!("Loading fold manifest {}", manifest_path.display());
        let entries = load_manifest(&manifest_path)
            .with_context(|| format!("failed to load manifest {}", manifest_path.display()))?;
        info!("Decoding {} samples under {}", entries.len(), cli.data_root.display());
        let samples = load_samples(&cli.data_root, &entries, side, side)?;
        Dataset::new(samples, cli.num_classes)?
    };
    info!(
        "Dataset ready: {} samples, {} classes",
        dataset.len(),
        dataset.num_classes()
    );

    // ── Model and controller ────────────────────────────────────────────
    let (mut net, mut controller) = if let Some(resume_path) = &cli.resume {
        info!("Resuming from checkpoint {}", resume_path.display());
        let checkpoint = Checkpoint::load_json(resume_path)
            .with_context(|| format!("failed to load checkpoint {}", resume_path.display()))?;
        let controller = GradNorm::from_state(checkpoint.gradnorm)?;
        (checkpoint.net, controller)
    } else {
        let net_config = NetConfig {
            input_len,
            trunk: cli.trunk.clone(),
            mask_len: input_len,
            num_classes: dataset.num_classes(),
        };
        let mut rng = StdRng::seed_from_u64(cli.seed);
        let net = MultiTaskNet::new(&net_config, &mut rng)?;
        let controller = GradNorm::new(TASK_COUNT, cli.alpha, cli.weight_lr)?;
        (net, controller)
    };
    let mut optimizer = Optimizer::adam(cli.learning_rate);

    let mut train_config = TrainConfig::new(cli.epochs, cli.batch_size);
    train_config.mask_loss = mask_loss;
    train_config.threshold = cli.threshold;
    train_config.seed = cli.seed;

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    // ── Train ───────────────────────────────────────────────────────────
    let t_start = Instant::now();
    let report = train_loop(&mut net, &mut controller, &dataset, &mut optimizer, &train_config)?;
    info!(
        "Completed {} epochs in {:.2}s",
        report.epochs_run,
        t_start.elapsed().as_secs_f64()
    );

    // ── Persist results ─────────────────────────────────────────────────
    let metrics_path = cli.output.join(format!("metrics{}.json", fold));
    save_history(&metrics_path, &report.history)?;
    info!("Wrote {}", metrics_path.display());

    // Charts are best-effort; a missing `plots` feature must not lose the
    // trained model.
    let loss_plot = cli.output.join(format!("lossPlot{}.png", fold));
    if let Err(e) = save_loss_plot(&loss_plot, &report.history) {
        warn!("Skipping loss plot: {}", e);
    }
    let accuracy_plot = cli.output.join(format!("accuracyPlot{}.png", fold));
    if let Err(e) = save_accuracy_plot(&accuracy_plot, &report.history) {
        warn!("Skipping accuracy plot: {}", e);
    }

    let class_labels = if cli.synthetic {
        Some(
            ["top left", "top right", "bottom left", "bottom right"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    } else {
        None
    };
    let checkpoint = Checkpoint {
        net,
        gradnorm: controller.state(),
        metadata: Some(ModelMetadata {
            description: Some(format!("fold {} multi-task run", fold)),
            input_type: Some(InputType::ImageGrayscale { width: side, height: side }),
            class_labels,
        }),
    };
    let model_path = cli.output.join(format!("model{}.json", fold));
    checkpoint.save_json(&model_path)?;
    info!("Wrote {}", model_path.display());

    Ok(())
}
