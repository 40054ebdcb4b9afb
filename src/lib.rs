pub mod app_types;
pub mod crossover;
pub mod dna;
pub mod engine;
pub mod engine_thread;
pub mod error;
pub mod fitness;
pub mod geom;
pub mod imageio;
pub mod mutation_config;
pub mod render;
pub mod selection;
pub mod settings;

pub use app_types::EngineUpdate;
pub use dna::Individual;
pub use engine::Engine;
pub use error::{Error, Result};
pub use mutation_config::EvolutionConfig;
pub use render::PixelBuffer;
pub use settings::Settings;
