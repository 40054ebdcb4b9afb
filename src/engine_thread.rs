use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use crate::app_types::EngineUpdate;
use crate::error::Result;
use crate::imageio;

/// file name of the snapshot written for `generation`
pub fn snapshot_path(out_dir: &Path, generation: usize) -> PathBuf {
    out_dir.join(format!("best_gen_{generation}.png"))
}

/// spawn a background thread that drains engine updates and writes one PNG per
/// record into `out_dir`. the thread exits once every sender is gone (the engine
/// drops its sink when the run ends); joining it yields the number of files written.
/// a failed write is logged and skipped so a full disk cannot stall the engine.
pub fn spawn_snapshot_writer(
    out_dir: impl Into<PathBuf>,
    updates: mpsc::Receiver<EngineUpdate>,
) -> Result<thread::JoinHandle<usize>> {
    let out_dir = out_dir.into();
    let handle = thread::Builder::new()
        .name("snapshot-writer".to_owned())
        .spawn(move || {
            let mut written = 0;
            for update in updates {
                profiling::scope!("write_snapshot");
                let path = snapshot_path(&out_dir, update.generation);
                tracing::info!(
                    generation = update.generation,
                    fitness = update.fitness,
                    mutation_rate = update.mutation_rate,
                    "best so far"
                );
                match imageio::save(&path, &update.image) {
                    Ok(()) => written += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to write snapshot")
                    }
                }
            }
            written
        })?;
    Ok(handle)
}
