use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::modules::images::dispatcher::ImageDispatcher;
use crate::modules::images::status::StatusService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dispatcher: Arc<ImageDispatcher>,
    pub statuses: Arc<StatusService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        dispatcher: ImageDispatcher,
        statuses: StatusService,
    ) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            statuses: Arc::new(statuses),
        }
    }
}
