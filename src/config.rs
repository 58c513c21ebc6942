// Runtime configuration, collected from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// HMAC secret for signing bearer tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub jwt_expiry_secs: i64,
    /// bcrypt work factor for password hashing.
    pub bcrypt_cost: u32,
    /// Optional JSON snapshot path; state is reloaded from here at boot
    /// and written back on graceful shutdown.
    pub state_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let bind_addr = std::env::var("BETIS_BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development placeholder");
            "placeholder".to_string()
        });

        let jwt_expiry_secs = std::env::var("JWT_EXPIRY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        // Work factor below 10 is not acceptable for stored credentials.
        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(bcrypt::DEFAULT_COST)
            .max(10);

        let state_file = std::env::var("BETIS_STATE_FILE").ok().map(PathBuf::from);

        Self {
            bind_addr,
            jwt_secret,
            jwt_expiry_secs,
            bcrypt_cost,
            state_file,
        }
    }
}
