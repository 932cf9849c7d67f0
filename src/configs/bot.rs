use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Never read from disk; filled from `DISCORD_TOKEN`.
    #[serde(skip)]
    pub token: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            token: String::new(),
        }
    }
}

fn default_prefix() -> String {
    ",,".to_string()
}
