use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub title: String,
    pub seed: Option<u64>,
    // Sessions without activity for this long are closed and discarded
    pub session_idle_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let host = env::var("ASKME_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("ASKME_PORT").unwrap_or_else(|_| "2222".to_string());
        let title = env::var("ASKME_TITLE").unwrap_or_else(|_| "Ask me".to_string());
        let seed = env::var("ASKME_SEED")
            .ok()
            .and_then(|s| match s.parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    tracing::warn!("Ignoring ASKME_SEED, not a valid u64: {}", s);
                    None
                }
            });
        let session_idle_secs = env::var("ASKME_SESSION_IDLE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30 * 60);

        Self {
            host,
            port,
            title,
            seed,
            session_idle_secs,
        }
    }
}

impl AppConfig {
    /// Apply values passed on the command line over the environment.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<String>,
        seed: Option<u64>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }
}
