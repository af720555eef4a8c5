use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub max_clients: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:12345".to_string(),
            max_clients: 100,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            env::var("RELAY_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:12345".to_string());

        let max_clients: usize = env::var("RELAY_MAX_CLIENTS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);

        Self {
            bind_addr,
            max_clients,
        }
    }
}
