//! Serves a host directory with the same buffer sizes a microcontroller
//! build would use.
//!
//! Configuration comes from the environment (or a `.env` file):
//!
//! - `SDHTTPD_ADDR`: listen address, default `0.0.0.0:8080`
//! - `SDHTTPD_ROOT`: directory to serve, default `.`
//! - `SDHTTPD_READ_TIMEOUT_SECS`: per-connection read timeout, default `10`,
//!   `0` disables it

use log::{error, info};
use sdhttpd::network::application::http::{Outcome, Server};
use sdhttpd::network::tcp::TcpAcceptor;
use sdhttpd::storage::host::HostFs;
use std::env;
use std::net::TcpListener;
use std::time::Duration;

const SCRATCH_SIZE: usize = 512;
const STREAMING_SIZE: usize = 64;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let address = env::var("SDHTTPD_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let root = env::var("SDHTTPD_ROOT").unwrap_or_else(|_| ".".to_string());
    let timeout_secs: u64 = match env::var("SDHTTPD_READ_TIMEOUT_SECS") {
        Ok(value) => value.parse()?,
        Err(_) => 10,
    };
    let read_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

    let listener = TcpListener::bind(&address)?;
    info!("serving {} on http://{}", root, listener.local_addr()?);

    let mut scratch = [0u8; SCRATCH_SIZE];
    let mut streaming = [0u8; STREAMING_SIZE];
    let mut server = Server::new(
        TcpAcceptor::new(listener, read_timeout),
        HostFs::new(root),
        &mut scratch,
        &mut streaming,
    )?;

    loop {
        match server.poll() {
            Ok(Some(Outcome::Uploaded(report))) => info!("{:?}", report),
            Ok(_) => {}
            Err(e) => {
                error!("{}", e);
                return Err(e.into());
            }
        }
    }
}
