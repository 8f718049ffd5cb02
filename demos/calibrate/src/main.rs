use anyhow::{Context, Result};
use clap::Parser;
use flatfield_calib::{Calibration, CalibrationConfig, DisplacementOrder, SceneBuilder};
use flatfield_core::NandFlash;
use flatfield_io::{populate_store, DisplacementTable, FitsImage};
use flatfield_math::FP32_FWL;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON configuration file; command-line values override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input frames (FITS), one per pointing, in displacement-table order
    #[arg(long, num_args = 1..)]
    frames: Vec<PathBuf>,

    /// Detector mask (FITS), nonzero for live pixels
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Displacement table, two integers per frame
    #[arg(long)]
    displacement: Option<PathBuf>,

    /// Output gain map (FITS, Q24.8 words)
    #[arg(long, default_value = "gain.fits")]
    output: PathBuf,

    /// Write the run report (pairs, per-iteration statistics, gain) as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Lower (exclusive) bound of accepted counts
    #[arg(long)]
    intensity_min: Option<i32>,

    /// Upper (inclusive) bound of accepted counts
    #[arg(long)]
    intensity_max: Option<i32>,

    /// Refinement iterations
    #[arg(long)]
    iterations: Option<u16>,

    /// Displacement table lists the row offset first
    #[arg(long)]
    dy_first: bool,

    /// Calibrate a generated scene of this size instead of reading frames
    #[arg(long)]
    synthetic: Option<u16>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => CalibrationConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => CalibrationConfig::default(),
    };

    let mut store = if let Some(size) = args.synthetic {
        println!("Generating synthetic {size}x{size} scene");
        let scene = SceneBuilder::new(size, size)
            .offsets(&[(0, 0), (3, 0), (0, 3), (-2, -2), (5, 4)])
            .gain_at(size / 2, size / 2, 1.2)
            .noise(42, 3.0)
            .build();
        let defaults = scene.config();
        config.frames = defaults.frames;
        config.rows = defaults.rows;
        config.cols = defaults.cols;
        config.displacement_order = DisplacementOrder::DxDy;
        Some(scene.store(DisplacementOrder::DxDy).context("fill synthetic store")?)
    } else {
        None
    };

    if let Some(v) = args.intensity_min {
        config.intensity_min = v;
    }
    if let Some(v) = args.intensity_max {
        config.intensity_max = v;
    }
    if let Some(v) = args.iterations {
        config.iterations = v;
    }
    if args.dy_first {
        config.displacement_order = DisplacementOrder::DyDx;
    }

    if store.is_none() && !args.dump_config {
        let (nand, frames, rows, cols) = read_inputs(&args)?;
        config.frames = frames;
        config.rows = rows;
        config.cols = cols;
        store = Some(nand);
    }

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    let mut store = store.context("no input store")?;

    let calibration = Calibration::new(config).context("configure calibration")?;
    info!("{}", calibration.layout());
    let mut ws = calibration.workspace().context("allocate working memory")?;
    let report = calibration.run(&mut ws, &mut store).context("calibrate")?;

    if let Some(last) = report.last_iteration() {
        println!(
            "Pairs: {}  iterations: {}  final trimmed average: {}",
            report.pairs.len(),
            report.iterations.len(),
            last.trimmed_average
        );
    }
    let uncovered = report.gain.uncovered();
    if uncovered > 0 {
        warn!("{uncovered} pixels had no overlap and are left at zero");
    }

    let gain = &report.gain;
    FitsImage::new(gain.rows, gain.cols, gain.data.data.clone())
        .context("shape gain map")?
        .with_card("FRACBITS", &FP32_FWL.to_string())
        .with_card("CONTENT", "flatfield gain")
        .save(&args.output)
        .with_context(|| format!("write {}", args.output.display()))?;
    println!("✓ Wrote gain map to {}", args.output.display());

    if let Some(path) = args.report.as_ref() {
        std::fs::write(path, report.to_json().context("encode report")?)
            .with_context(|| format!("write {}", path.display()))?;
        println!("✓ Wrote report to {}", path.display());
    }
    Ok(())
}

fn read_inputs(args: &Args) -> Result<(NandFlash, usize, u16, u16)> {
    if args.frames.is_empty() {
        anyhow::bail!("No frames given (use --frames or --synthetic)")
    }
    let mask_path = args.mask.as_ref().context("--mask is required with --frames")?;
    let table_path = args
        .displacement
        .as_ref()
        .context("--displacement is required with --frames")?;

    let frames = args
        .frames
        .iter()
        .map(|p| FitsImage::load(p).with_context(|| format!("read frame {}", p.display())))
        .collect::<Result<Vec<_>>>()?;
    let mask = FitsImage::load(mask_path)
        .with_context(|| format!("read mask {}", mask_path.display()))?;
    let table = DisplacementTable::load(table_path)
        .with_context(|| format!("read displacement table {}", table_path.display()))?;
    println!("Read {} frames of {}x{}", frames.len(), mask.rows, mask.cols);

    let nand = populate_store(&frames, &mask, &table).context("fill bulk store")?;
    Ok((nand, frames.len(), mask.rows, mask.cols))
}
