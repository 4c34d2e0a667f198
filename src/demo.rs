use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::DemoConfig,
    rendering::{
        bindable_cache::BindableCache, context::GraphicsContext, drawable::Drawable,
        error::GraphicsError,
    },
    shapes::{Cube, MotionDistributions},
};

/// The stress-test scene: a swarm of cubes tumbling around a point in front of the viewer.
pub struct DemoState {
    pub drawables: Vec<Box<dyn Drawable>>,
    pub cache: BindableCache,
}

impl DemoState {
    pub fn new(gfx: &mut dyn GraphicsContext, config: &DemoConfig) -> Result<Self, GraphicsError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dists = MotionDistributions::default();
        let mut cache = BindableCache::new();

        let drawables = (0..config.box_count)
            .map(|_| {
                Cube::new(gfx, &mut cache, &mut rng, &dists)
                    .map(|cube| Box::new(cube) as Box<dyn Drawable>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Spawned {} cubes sharing {} static pool(s)",
            drawables.len(),
            cache.len()
        );

        Ok(Self { drawables, cache })
    }

    pub fn update(&mut self, dt: f32) {
        for drawable in &mut self.drawables {
            drawable.update(dt);
        }
    }

    /// Drops every drawable and releases the shared pools they were built from.
    pub fn teardown(&mut self) {
        log::info!(
            "Releasing {} drawables and {} static pool(s)",
            self.drawables.len(),
            self.cache.len()
        );
        self.drawables.clear();
        self.cache.clear_all();
    }
}
