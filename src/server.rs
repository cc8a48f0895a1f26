use std::{
    fs,
    path::{Component, Path, PathBuf},
    sync::Arc,
    thread,
};

use tiny_http::{Header, Method, Request, Server};

use crate::{
    config::Config,
    pipeline::{Pipeline, Response},
};

/// Maps a request line onto what should answer it.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Generate,
    Static(PathBuf),
    NotFound,
}

pub fn route(method: &Method, url: &str) -> Route {
    let path = url.split('?').next().unwrap_or("");

    match (method, path) {
        (Method::Post, "/generate_wordcloud") => Route::Generate,
        (Method::Get, "/favicon.ico") => Route::Static(PathBuf::from("favicon.ico")),
        (Method::Get, "/swagger") | (Method::Get, "/swagger.json") => {
            Route::Static(PathBuf::from("swagger.json"))
        }
        (Method::Get, p) => match p.strip_prefix("/static/").and_then(safe_relative_path) {
            Some(relative) => Route::Static(relative),
            None => Route::NotFound,
        },
        _ => Route::NotFound,
    }
}

/// Only plain components, so a request can not climb out of the static dir.
fn safe_relative_path(path: &str) -> Option<PathBuf> {
    let relative = PathBuf::from(path);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));

    (plain && !path.is_empty()).then_some(relative)
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("ttf") => "font/ttf",
        _ => "application/octet-stream",
    }
}

fn serve_static(static_dir: &Path, relative: &Path) -> Response {
    let path = static_dir.join(relative);
    match fs::read(&path) {
        Ok(body) => Response {
            status: 200,
            content_type: content_type_for(&path),
            body,
        },
        Err(_) => Response::error(404, "not found"),
    }
}

fn respond(request: Request, response: Response) {
    let mut reply = tiny_http::Response::from_data(response.body).with_status_code(response.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()) {
        reply = reply.with_header(header);
    }

    if let Err(e) = request.respond(reply) {
        log::warn!("Unable to send response: {e}");
    }
}

fn handle_request(mut request: Request, pipeline: &Pipeline, static_dir: &Path) {
    let url = request.url().to_string();
    log::info!("{} {}", request.method(), url);

    let response = match route(request.method(), &url) {
        Route::Generate => {
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());

            let mut body = Vec::new();
            match request.as_reader().read_to_end(&mut body) {
                Ok(_) => pipeline.handle(content_type.as_deref(), &body),
                Err(e) => {
                    log::warn!("Unable to read body of {url}: {e}");
                    Response::error(400, "无效的 JSON 数据")
                }
            }
        }
        Route::Static(relative) => serve_static(static_dir, &relative),
        Route::NotFound => Response::error(404, "not found"),
    };

    if response.status >= 400 {
        log::info!("{url} -> {}", response.status);
    }
    respond(request, response);
}

/// Serves until the listener fails. Each worker thread pulls requests off the
/// shared listener and runs them to completion.
pub fn run(
    config: &Config,
    pipeline: Pipeline,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = Arc::new(Server::http(config.bind.as_str())?);
    let pipeline = Arc::new(pipeline);
    let static_dir = Arc::new(config.static_dir.clone());
    let workers = config.workers();
    log::info!("Listening on {} with {workers} workers", config.bind);

    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let server = Arc::clone(&server);
            let pipeline = Arc::clone(&pipeline);
            let static_dir = Arc::clone(&static_dir);

            thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || loop {
                    match server.recv() {
                        Ok(request) => handle_request(request, &pipeline, &static_dir),
                        Err(e) => {
                            log::error!("Listener failed: {e}");
                            break;
                        }
                    }
                })
        })
        .collect::<Result<_, _>>()?;

    for handle in handles {
        if handle.join().is_err() {
            log::error!("Worker thread panicked");
        }
    }

    Ok(())
}
