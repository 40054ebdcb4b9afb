use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use canvas_evolve::engine::Engine;
use canvas_evolve::settings::{Settings, DEFAULT_SETTINGS_FILE};
use canvas_evolve::{engine_thread, imageio};

#[derive(Parser, Debug)]
#[command(name = "canvas-evolve")]
#[command(about = "Evolve translucent polygon paintings toward a target image")]
struct Args {
    /// Image to approximate (overrides the settings file)
    #[arg(long)]
    target: Option<PathBuf>,

    /// Directory for snapshots and the final image
    #[arg(long)]
    out: Option<PathBuf>,

    /// Population size
    #[arg(long = "pop")]
    population: Option<usize>,

    /// Number of generations
    #[arg(long = "gen")]
    generations: Option<usize>,

    /// Base mutation rate in [0, 1]
    #[arg(long = "mut")]
    mutation_rate: Option<f64>,

    /// Draws per mini-tournament
    #[arg(long = "tour")]
    tournament: Option<usize>,

    /// Keep the target at full resolution
    #[arg(long)]
    nocompress: bool,

    /// Write a snapshot every N generations
    #[arg(long)]
    report_every: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Settings file to read
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_settings: bool,
}

impl Args {
    /// command line values win over the settings file
    fn apply(&self, settings: &mut Settings) {
        if let Some(target) = &self.target {
            settings.target = Some(target.clone());
        }
        if let Some(out) = &self.out {
            settings.output_dir = out.clone();
        }
        if let Some(v) = self.population {
            settings.population_size = v;
        }
        if let Some(v) = self.generations {
            settings.generations = v;
        }
        if let Some(v) = self.mutation_rate {
            settings.mutation_rate = v;
        }
        if let Some(v) = self.tournament {
            settings.tournament_size = v;
        }
        if self.nocompress {
            settings.compress = false;
        }
        if let Some(v) = self.report_every {
            settings.report_interval = v;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // configure Rayon's global thread pool once at startup so worker threads get nice names like "rayon-0".
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let args = Args::parse();
    let mut settings = Settings::load(&args.settings);
    args.apply(&mut settings);

    if args.save_settings {
        settings
            .save(&args.settings)
            .with_context(|| format!("saving settings to {}", args.settings.display()))?;
        tracing::info!(path = %args.settings.display(), "settings saved");
    }

    let Some(target_path) = settings.target.clone() else {
        bail!("no target image given (use --target or set \"target\" in the settings file)");
    };

    let mut target = imageio::read(&target_path)
        .with_context(|| format!("reading target image {}", target_path.display()))?;
    if let Some(max_dim) = settings.resize_limit() {
        target = imageio::resize(&target, max_dim).context("resizing target image")?;
    }

    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("creating output directory {}", settings.output_dir.display()))?;

    let start = Instant::now();
    let mut engine = Engine::new(target, settings.to_evolution_config()).context("building engine")?;

    // the engine waits on the writer rather than queueing snapshots in memory
    let (tx, rx) = mpsc::sync_channel(1);
    let writer = engine_thread::spawn_snapshot_writer(settings.output_dir.clone(), rx)
        .context("starting snapshot writer")?;

    let best = engine.run(tx, settings.report_interval);

    let snapshots = match writer.join() {
        Ok(n) => n,
        Err(_) => bail!("snapshot writer panicked"),
    };

    let final_path = settings.output_dir.join("final_result.png");
    imageio::save(&final_path, &best.pixels)
        .with_context(|| format!("saving {}", final_path.display()))?;

    tracing::info!(
        elapsed = ?start.elapsed(),
        fitness = best.fitness,
        snapshots,
        path = %final_path.display(),
        "done"
    );
    Ok(())
}
