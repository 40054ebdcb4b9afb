use std::sync::Arc;

use crate::render::PixelBuffer;

/// progress record published by the engine to the caller's sink.
/// the image is the best individual of that generation, shared rather than copied;
/// buffers are never written once published, so readers can hold on to it.
#[derive(Clone, Debug)]
pub struct EngineUpdate {
    pub generation: usize,
    pub image: Arc<PixelBuffer>, // premultiplied, same size as the target
    pub fitness: f64,
    pub mutation_rate: f64,
}
