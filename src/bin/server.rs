#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use log::{info, warn};
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::io::{Cursor, Read};
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use tetress::opponent::OpponentKind;
#[cfg(not(target_arch = "wasm32"))]
use tetress::service::{GameStore, ServerConfig};
#[cfg(not(target_arch = "wasm32"))]
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Tetress game service: JSON API for the demo page plus static replay files.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug, Clone)]
struct Opts {
    /// Address to listen on
    #[arg(long)]
    listen: Option<String>,
    /// Allowed CORS origin; repeat for several. Replaces the defaults.
    #[arg(long = "origin")]
    origins: Vec<String>,
    /// Seconds a game may sit idle before it is dropped
    #[arg(long)]
    idle_timeout: Option<u64>,
    /// Minimum seconds between idle sweeps
    #[arg(long)]
    sweep_interval: Option<u64>,
    /// Move policy for the service's side: random or greedy
    #[arg(long)]
    opponent: Option<OpponentKind>,
    /// Directory served for non-API paths (replay files live under astar_replays/)
    #[arg(long)]
    static_dir: Option<PathBuf>,
    /// Fixed seed for game ids and opponent choices
    #[arg(long)]
    seed: Option<u64>,
}

#[cfg(not(target_arch = "wasm32"))]
impl Opts {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if !self.origins.is_empty() {
            config.allowed_origins = self.origins;
        }
        if let Some(secs) = self.idle_timeout {
            config.idle_timeout_secs = secs;
        }
        if let Some(secs) = self.sweep_interval {
            config.sweep_interval_secs = secs;
        }
        if let Some(kind) = self.opponent {
            config.opponent = kind;
        }
        config.static_dir = self.static_dir;
        config.seed = self.seed;
        config
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Opts::parse().into_config();
    let root = match &config.static_dir {
        Some(dir) => Some(dir.canonicalize()?),
        None => None,
    };

    let server = Server::http(&config.listen).map_err(|e| anyhow::anyhow!(e))?;
    info!(
        "listening on http://{} (opponent: {}, static: {})",
        config.listen,
        config.opponent,
        root.as_ref().map_or("none".to_string(), |r| r.display().to_string())
    );

    let mut store = GameStore::new(&config, Instant::now());
    for request in server.incoming_requests() {
        let method = request.method().to_string();
        let url = request.url().to_string();
        let status = serve(request, &mut store, &config, root.as_deref());
        info!("{} {} -> {}", method, url, status);
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn serve(
    mut request: Request,
    store: &mut GameStore,
    config: &ServerConfig,
    root: Option<&Path>,
) -> u16 {
    let origin = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Origin"))
        .map(|h| h.value.as_str().to_string())
        .filter(|o| config.allows_origin(o));

    if *request.method() == Method::Options {
        let resp = with_cors(Response::empty(StatusCode(204)), origin.as_deref());
        return respond(request, resp);
    }

    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        warn!("failed to read request body: {e}");
        let resp = Response::from_string(r#"{"detail":"Unreadable request body"}"#)
            .with_status_code(StatusCode(400));
        return respond(request, with_json(with_cors(resp, origin.as_deref())));
    }

    let method = request.method().to_string();
    let url = request.url().to_string();
    if let Some(reply) = store.handle(&method, &url, &body, Instant::now()) {
        let resp = Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
        return respond(request, with_json(with_cors(resp, origin.as_deref())));
    }

    let path = match (&method[..], root) {
        ("GET", Some(root)) => sanitize_path(root, url.split('?').next().unwrap_or("/")),
        _ => None,
    };
    match path.map(|p| fs::File::open(&p).map(|file| (file, p))) {
        Some(Ok((file, p))) => {
            let mut resp = Response::from_file(file).with_status_code(StatusCode(200));
            if let Ok(h) = Header::from_bytes("Content-Type", content_type_for(&p).as_bytes()) {
                resp.add_header(h);
            }
            respond(request, with_cors(resp, origin.as_deref()))
        }
        _ => respond(request, with_cors(not_found_response(), origin.as_deref())),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn respond<R: Read>(request: Request, resp: Response<R>) -> u16 {
    let status = resp.status_code().0;
    if let Err(e) = request.respond(resp) {
        warn!("failed to send response: {e}");
    }
    status
}

#[cfg(not(target_arch = "wasm32"))]
fn with_json<R: Read>(mut resp: Response<R>) -> Response<R> {
    if let Ok(h) = Header::from_bytes("Content-Type", "application/json") {
        resp.add_header(h);
    }
    resp
}

#[cfg(not(target_arch = "wasm32"))]
fn with_cors<R: Read>(mut resp: Response<R>, origin: Option<&str>) -> Response<R> {
    let Some(origin) = origin else {
        return resp;
    };
    let headers = [
        ("Access-Control-Allow-Origin", origin),
        ("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
        ("Access-Control-Allow-Credentials", "true"),
        ("Vary", "Origin"),
    ];
    for (field, value) in headers {
        if let Ok(h) = Header::from_bytes(field, value) {
            resp.add_header(h);
        }
    }
    resp
}

#[cfg(not(target_arch = "wasm32"))]
fn sanitize_path(root: &Path, url: &str) -> Option<PathBuf> {
    let rel = if url == "/" { "index.html" } else { url.trim_start_matches('/') };
    if rel.split('/').any(|part| part == "..") {
        return None;
    }
    let full = root.join(rel.replace("%20", " "));
    let path = if full.is_dir() {
        full.join("index.html")
    } else {
        full
    };
    if path.exists() && path.starts_with(root) {
        Some(path)
    } else {
        None
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript",
        "css" => "text/css",
        "wasm" => "application/wasm",
        "json" => "application/json",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn not_found_response() -> Response<Cursor<Vec<u8>>> {
    Response::from_string(r#"{"detail":"Not Found"}"#).with_status_code(StatusCode(404))
}
