use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Careboard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address, used when `CAREBOARD_BIND_ADDR` is not set.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Default tracing filter, used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "careboard=debug,info";

/// Get the application data directory.
/// `CAREBOARD_DATA_DIR` overrides; otherwise `~/.careboard`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("CAREBOARD_DATA_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".careboard"),
        // No resolvable home (containers, stripped-down service users).
        None => PathBuf::from(".careboard"),
    }
}

/// Get the SQLite database path inside the data directory.
pub fn database_path() -> PathBuf {
    data_dir().join("careboard.db")
}

/// Get the address the API server binds to.
/// `CAREBOARD_BIND_ADDR` overrides; unparseable values fall back to the
/// default.
pub fn bind_addr() -> SocketAddr {
    match std::env::var("CAREBOARD_BIND_ADDR") {
        Ok(raw) => match raw.parse() {
            Ok(addr) => addr,
            Err(_) => {
                tracing::warn!(addr = %raw, "Unparseable CAREBOARD_BIND_ADDR, using default");
                default_bind_addr()
            }
        },
        Err(_) => default_bind_addr(),
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}
