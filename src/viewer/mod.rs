//! Minimal HTTP viewer over a summary log directory.
//!
//! Served by a synchronous tiny_http server, one thread per request.

pub mod render;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use tiny_http::Server;
use tracing::info;

use crate::error::{Error, Result};

/// Serves `logdir` on `addr` until the process is stopped.
pub fn serve(logdir: PathBuf, addr: &str) -> Result<()> {
    let server = Server::http(addr).map_err(|e| Error::Http(format!("cannot bind {}: {}", addr, e)))?;
    let logdir = Arc::new(logdir);

    println!("Serving {} at http://{}", logdir.display(), addr);
    info!(addr, logdir = %logdir.display(), "viewer listening");

    for request in server.incoming_requests() {
        let logdir = Arc::clone(&logdir);
        std::thread::spawn(move || routes::dispatch(request, &logdir));
    }
    Ok(())
}
