use std::sync::Arc;

use crate::stats::StatsUpdateCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<StatsUpdateCoordinator>,
}

impl AppState {
    pub fn new(stats: Arc<StatsUpdateCoordinator>) -> Self {
        Self { stats }
    }
}
