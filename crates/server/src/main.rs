mod config;
mod handlers;
mod http;
mod page;
mod server;

use std::process;
use std::sync::Arc;

use facemark_core::detection::infrastructure::model_resolver::{self, ProgressFn};
use facemark_core::detection::infrastructure::onnx_mesh_detector::MeshDetectorConfig;
use facemark_core::shared::constants::{
    FACE_FINDER_MODEL_NAME, FACE_FINDER_MODEL_URL, MESH_MODEL_NAME, MESH_MODEL_URL,
};

use config::ServerConfig;
use server::{DetectorFactory, Server};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    log::info!(
        "usage telemetry {}",
        if config.telemetry { "enabled" } else { "disabled" }
    );

    // Model files resolve once at startup; sessions stay per-request
    let face_model = resolve_model(FACE_FINDER_MODEL_NAME, FACE_FINDER_MODEL_URL, &config)?;
    let mesh_model = resolve_model(MESH_MODEL_NAME, MESH_MODEL_URL, &config)?;

    let factory: DetectorFactory = Arc::new(move || {
        Box::new(MeshDetectorConfig::new(face_model.clone(), mesh_model.clone()).build())
    });

    let server = Server::new(config.clone(), factory);
    let (listener, addr) = server.bind()?;
    let url = format!("http://{addr}");
    log::info!("facemark listening on {url}");

    if config.headless {
        log::info!("headless mode: not opening a browser");
    } else if let Err(err) = open::that(&url) {
        log::warn!("could not open browser: {err}");
    }

    server.run(listener)?;
    Ok(())
}

fn resolve_model(
    name: &str,
    url: &str,
    config: &ServerConfig,
) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    let label = name.to_string();
    let progress: ProgressFn = Box::new(move |downloaded, total| {
        if total > 0 {
            eprint!("\rDownloading {label}: {}%", downloaded * 100 / total);
        }
    });
    let path = model_resolver::resolve(name, url, config.model_dir.as_deref(), Some(progress))?;
    log::info!("model {name} at {}", path.display());
    Ok(path)
}
