use std::{env, str::FromStr, time::Duration};

use coopsweeper_common::GameParams;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the relay, `host:port`.
    pub server_addr: String,
    /// Seed used until a peer announces a different one.
    pub seed: u32,
    /// Ticks per second.
    pub tick_rate: u32,
    /// Upper bound for each send and each receive within a tick.
    pub network_timeout_ms: u64,
    /// Number of peer slots read per receive.
    pub max_peers: usize,
    pub game: GameParams,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:12345".to_string(),
            seed: 0,
            tick_rate: 60,
            network_timeout_ms: 250,
            max_peers: 100,
            game: GameParams::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `COOPSWEEPER_*` environment variables. Unparsable values fall
    /// back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_addr: env::var("COOPSWEEPER_SERVER_ADDR").unwrap_or(defaults.server_addr),
            seed: env_or("COOPSWEEPER_SEED", defaults.seed),
            tick_rate: env_or("COOPSWEEPER_TICK_RATE", defaults.tick_rate),
            network_timeout_ms: env_or(
                "COOPSWEEPER_NETWORK_TIMEOUT_MS",
                defaults.network_timeout_ms,
            ),
            max_peers: env_or("COOPSWEEPER_MAX_PEERS", defaults.max_peers),
            game: defaults.game,
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.game.validate()?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use coopsweeper_common::{FirstCell, GameError};

    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let config = ClientConfig::default();

        assert_eq!(config.server_addr, "127.0.0.1:12345");
        assert_eq!(config.game.width, 10);
        assert_eq!(config.game.height, 18);
        assert_eq!(config.game.mines, 35);
        assert_eq!(config.game.cell_size, 108);
        assert_eq!(config.tick_interval(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let config = ClientConfig::from_json(
            r#"{ "seed": 9, "network_timeout_ms": 40, "game": { "mines": 12, "first_cell": "any" } }"#,
        )
        .unwrap();

        assert_eq!(config.seed, 9);
        assert_eq!(config.network_timeout(), Duration::from_millis(40));
        assert_eq!(config.game.mines, 12);
        assert_eq!(config.game.first_cell, FirstCell::Any);
        assert_eq!(config.game.width, 10);
        assert_eq!(config.max_peers, 100);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            ClientConfig::from_json("{ seed: }"),
            Err(crate::ClientError::Config(_))
        ));
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        assert!(matches!(
            ClientConfig::from_json(r#"{ "game": { "cell_size": 0 } }"#),
            Err(crate::ClientError::Game(GameError::InvalidParams { .. }))
        ));
        assert!(ClientConfig::from_json(r#"{ "game": { "width": 0 } }"#).is_err());
    }

    #[test]
    fn zero_tick_rate_does_not_divide_by_zero() {
        let config = ClientConfig {
            tick_rate: 0,
            ..ClientConfig::default()
        };

        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }
}
