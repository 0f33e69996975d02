use std::env;
use std::net::SocketAddr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub seed_catalog: bool,
    pub completed_event_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    warn!("BIND_ADDR is not a valid socket address, using default");
                    None
                }
            })
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let seed_catalog = env::var("SEED_CATALOG")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let completed_event_capacity = env::var("COMPLETED_EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(256);

        Self {
            bind_addr,
            seed_catalog,
            completed_event_capacity,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            seed_catalog: true,
            completed_event_capacity: 256,
        }
    }
}
