use crate::config::Config;
use crate::ldf::LdfRegistry;

pub struct AppState {
    pub registry: LdfRegistry,
    pub default_tick_spacing: i32,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let registry = LdfRegistry::new();
        log::info!(
            "LDF registry ready with {} shapes, default tick spacing {}",
            registry.kinds().len(),
            config.default_tick_spacing
        );
        AppState { registry, default_tick_spacing: config.default_tick_spacing }
    }
}
