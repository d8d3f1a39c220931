use std::io::{Cursor, Read};

use log::{error, warn};
use serde_json::{json, Value};
use tiny_http::{Request, Response};

use crate::routes::json_response;
use crate::state::ServerState;
use crate::util::multipart::extract_file_part;

pub const ALLOWED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

/// Largest request body read into memory.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Reads at most `limit` bytes; `None` when the body is longer.
pub fn read_limited<R: Read>(reader: R, limit: usize) -> std::io::Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut body)?;
    Ok((body.len() <= limit).then_some(body))
}

pub fn handle(request: &mut Request, state: &ServerState) -> Response<Cursor<Vec<u8>>> {
    let content_type = request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let (status, payload) = match read_limited(request.as_reader(), MAX_UPLOAD_BYTES) {
        Ok(Some(body)) => predict(&content_type, &body, state),
        Ok(None) => {
            warn!("Error parsing the file: body exceeds {} bytes", MAX_UPLOAD_BYTES);
            (500, json!({ "error": "Error parsing the file." }))
        }
        Err(e) => {
            error!("Error parsing the file: {}", e);
            (500, json!({ "error": "Error parsing the file." }))
        }
    };
    json_response(status, &payload)
}

/// Maps a multipart upload to a status code and JSON body.
pub fn predict(content_type: &str, body: &[u8], state: &ServerState) -> (u16, Value) {
    let part = match extract_file_part(body, content_type, "file") {
        Ok(Some(part)) => part,
        Ok(None) => return (400, json!({ "error": "No file uploaded." })),
        Err(e) => {
            error!("Error parsing the file: {:?}", e);
            return (500, json!({ "error": "Error parsing the file." }));
        }
    };

    if !ALLOWED_TYPES.contains(&part.content_type.as_str()) {
        return (400, json!({ "error": "Unsupported file type." }));
    }

    match state.predict_bytes(&part.data) {
        Ok(label) => (200, json!({ "prediction_label": label })),
        Err(e) => {
            warn!("Prediction error for {}: {}", part.filename, e);
            (500, json!({ "error": "Error processing the image." }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_cluster::cluster::ClusterModel;
    use ferrite_cluster::features::{Backbone, Scorer};
    use image::{ImageOutputFormat, Rgb, RgbImage};

    const CT: &str = "multipart/form-data; boundary=b0und";

    fn state() -> ServerState {
        let backbone = Backbone::seeded(2, &[4], 3, 7);
        let dim = backbone.embedding_dim();
        let model = ClusterModel::new(0, vec![vec![0.0; dim], vec![1.0; dim]]).unwrap();
        ServerState::new(backbone, model).unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, Rgb([200, 30, 90]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    fn upload(mime: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"--b0und\r\n");
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"file\"; filename=\"x.png\"\r\n");
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n--b0und--\r\n");
        body
    }

    #[test]
    fn png_upload_gets_a_label() {
        let (status, payload) = predict(CT, &upload("image/png", &png_bytes()), &state());
        assert_eq!(status, 200);
        let label = payload["prediction_label"].as_u64().unwrap();
        assert!(label < 2);
    }

    #[test]
    fn missing_file_is_bad_request() {
        let body = b"--b0und\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--b0und--\r\n";
        assert_eq!(predict(CT, body, &state()), (400, json!({ "error": "No file uploaded." })));
    }

    #[test]
    fn unsupported_type_is_bad_request() {
        let (status, payload) = predict(CT, &upload("text/plain", b"hello"), &state());
        assert_eq!(status, 400);
        assert_eq!(payload, json!({ "error": "Unsupported file type." }));
    }

    #[test]
    fn undecodable_image_is_server_error() {
        let (status, payload) = predict(CT, &upload("image/jpeg", b"not a jpeg"), &state());
        assert_eq!(status, 500);
        assert_eq!(payload, json!({ "error": "Error processing the image." }));
    }

    #[test]
    fn non_multipart_body_is_parse_error() {
        let (status, payload) = predict("application/json", b"{}", &state());
        assert_eq!(status, 500);
        assert_eq!(payload, json!({ "error": "Error parsing the file." }));
    }

    #[test]
    fn oversized_body_is_not_read() {
        let big = vec![7u8; 64];
        assert_eq!(read_limited(Cursor::new(big.clone()), 64).unwrap(), Some(big));
        assert_eq!(read_limited(Cursor::new(vec![7u8; 65]), 64).unwrap(), None);
    }
}
