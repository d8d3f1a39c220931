use std::io::Cursor;

use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::handlers::predict::MAX_UPLOAD_BYTES;
use crate::render::render_upload_page;
use crate::state::SharedState;

fn response(status: u16, content_type: &str, bytes: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = bytes.len();
    let mut headers = Vec::new();
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        headers.push(h);
    }
    Response::new(StatusCode(status), headers, Cursor::new(bytes), Some(len), None)
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    response(200, "text/html; charset=utf-8", body.into_bytes())
}

pub fn json_response(status: u16, body: &Value) -> Response<Cursor<Vec<u8>>> {
    response(status, "application/json", body.to_string().into_bytes())
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    json_response(404, &json!({ "error": "Not found." }))
}

pub fn method_not_allowed() -> Response<Cursor<Vec<u8>>> {
    json_response(405, &json!({ "message": "Method not allowed." }))
}

/// What a method and path resolve to.
#[derive(Debug, PartialEq, Eq)]
pub enum Endpoint {
    UploadPage,
    Predict,
    MethodNotAllowed,
    NotFound,
}

pub fn resolve(method: &Method, url: &str) -> Endpoint {
    let path = url.split('?').next().unwrap_or("");
    match (method, path) {
        (Method::Get, "/") => Endpoint::UploadPage,
        (Method::Post, "/api/predict") => Endpoint::Predict,
        (_, "/api/predict") => Endpoint::MethodNotAllowed,
        _ => Endpoint::NotFound,
    }
}

/// Dispatches one request and responds to it.
pub fn dispatch(mut request: Request, state: SharedState) {
    let endpoint = resolve(request.method(), request.url());

    let response = match endpoint {
        Endpoint::UploadPage => html_response(render_upload_page(MAX_UPLOAD_BYTES)),
        Endpoint::Predict => handlers::predict::handle(&mut request, &state),
        Endpoint::MethodNotAllowed => method_not_allowed(),
        Endpoint::NotFound => not_found(),
    };

    let _ = request.respond(response);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_serves_the_upload_page() {
        assert_eq!(resolve(&Method::Get, "/"), Endpoint::UploadPage);
        assert_eq!(resolve(&Method::Get, "/?from=nav"), Endpoint::UploadPage);
        assert_eq!(resolve(&Method::Post, "/"), Endpoint::NotFound);
    }

    #[test]
    fn predict_accepts_only_post() {
        assert_eq!(resolve(&Method::Post, "/api/predict"), Endpoint::Predict);
        assert_eq!(resolve(&Method::Get, "/api/predict"), Endpoint::MethodNotAllowed);
        assert_eq!(resolve(&Method::Put, "/api/predict"), Endpoint::MethodNotAllowed);
        assert_eq!(resolve(&Method::Get, "/models"), Endpoint::NotFound);
    }
}
