//! Configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `BH2E_`-prefixed environment variables (nested keys split on `__`, e.g.
//! `BH2E_RULES__USAGE_DIE_THRESHOLD=2`).

use std::net::SocketAddr;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::dice::DieFace;

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "bh2e.toml";

/// Rules knobs shared by the scheduler and the resolution engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Namespace for flags stored on the combat session
    pub flag_scope: String,
    /// Class whose members put two tokens in the initiative bag
    pub double_token_class: String,
    /// Usage-die results below this are consumed
    pub usage_die_threshold: u32,
    /// Die rolled for attacks and attribute tests
    pub test_die: DieFace,
    /// Extra damage die added when a critical hit's damage is rolled
    pub critical_bonus_die: DieFace,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            flag_scope: "17thcmin".to_string(),
            double_token_class: "illusionist".to_string(),
            usage_die_threshold: 3,
            test_die: DieFace::D20,
            critical_bonus_die: DieFace::D4,
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rules: RulesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            rules: RulesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, `path` (or `bh2e.toml`) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::figment(file).extract()
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("BH2E_").split("__"))
    }
}
