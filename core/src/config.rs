//! Client configuration.
//!
//! # Design
//! Everything the transport needs to reach the service lives in one value
//! passed to `SimpyClient::new` — there is no global, mutable
//! configuration. `host` and `realm` exist because Simpy's Basic Auth
//! challenge is scoped to them; the core itself only reads `base_url`.

/// Connection settings and credentials for the Simpy REST API.
///
/// The core uses `base_url` when building request paths; the remaining
/// fields are carried for the host executing the requests (Basic Auth
/// realm/host pair and the `User-Agent` header value).
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub host: String,
    pub realm: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
}

const DEFAULT_BASE_URL: &str = "http://www.simpy.com/simpy/api/rest";
const DEFAULT_HOST: &str = "www.simpy.com";
const DEFAULT_REALM: &str = "/simpy/api/rest";

impl Config {
    /// Service defaults with the given credentials.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            realm: DEFAULT_REALM.to_string(),
            user_agent: format!(
                "Mozilla (compatible; simpy-core {})",
                env!("CARGO_PKG_VERSION")
            ),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Like [`Config::new`], but honors the `SIMPY_BASE_URL` environment
    /// variable when set, for pointing a client at a test server.
    pub fn from_env(username: &str, password: &str) -> Self {
        let mut config = Self::new(username, password);
        if let Ok(base_url) = std::env::var("SIMPY_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }

    /// Override the base URL, e.g. to target a local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_simpy() {
        let config = Config::new("user", "secret");
        assert_eq!(config.base_url, "http://www.simpy.com/simpy/api/rest");
        assert_eq!(config.host, "www.simpy.com");
        assert_eq!(config.realm, "/simpy/api/rest");
        assert_eq!(config.username, "user");
        assert_eq!(config.password, "secret");
        assert!(config.user_agent.starts_with("Mozilla (compatible; simpy-core"));
    }

    #[test]
    fn with_base_url_overrides() {
        let config = Config::new("u", "p").with_base_url("http://127.0.0.1:8080");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
    }
}
