#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Base URL of the engine, e.g. `http://127.0.0.1:2375`.
    pub endpoint: String,
    /// API version prefix, e.g. `v1.43`. Empty means unversioned paths.
    pub api_version: String,
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:2375".to_string(),
            api_version: "v1.43".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Absolute URL of an API path such as `services/web`.
    pub fn url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        if version.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{version}/{path}")
        }
    }
}
