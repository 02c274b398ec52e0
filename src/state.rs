use std::sync::Arc;

use crate::pipeline::ReplyPipeline;
use crate::slack::Messenger;

// app's shared state
pub struct AppState {
    pub pipeline: ReplyPipeline,
    pub messenger: Arc<dyn Messenger>,
    pub signing_secret: Option<String>, // verification disabled when None
}
