mod logging;
mod settings;

pub use logging::init_logging;
pub use settings::{AppConfig, DEFAULT_API_BASE};
