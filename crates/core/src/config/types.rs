use serde::{Deserialize, Serialize};

use crate::batch::OptionSet;
use crate::executor::ExecutorConfig;
use crate::orchestrator::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global options applied to every command unless overridden
    #[serde(default)]
    pub defaults: OptionSet,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}
