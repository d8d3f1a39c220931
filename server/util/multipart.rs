/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    if !content_type.trim_start().to_ascii_lowercase().starts_with("multipart/form-data") {
        return None;
    }
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// A file part of a multipart/form-data body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub filename: String,
    /// Declared `Content-Type` of the part, lowercased; empty when absent.
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MultipartError {
    MissingBoundary,
    MissingDelimiter,
    MalformedPart,
}

/// Finds the file part named `field_name`.
///
/// `Ok(None)` means the body is well formed but has no such file part.
pub fn extract_file_part(
    body: &[u8],
    content_type: &str,
    field_name: &str,
) -> Result<Option<FilePart>, MultipartError> {
    let boundary = extract_boundary(content_type).ok_or(MultipartError::MissingBoundary)?;
    let delimiter = format!("--{}", boundary);
    let parts = split_on(body, delimiter.as_bytes());
    if parts.len() < 2 {
        return Err(MultipartError::MissingDelimiter);
    }

    // parts[0] is the preamble; a part starting with "--" is the epilogue.
    for part in &parts[1..] {
        if part.starts_with(b"--") {
            break;
        }
        let part = part.strip_prefix(b"\r\n").unwrap_or(part);
        let sep = b"\r\n\r\n";
        let sep_pos = find_subsequence(part, sep).ok_or(MultipartError::MalformedPart)?;
        let headers = String::from_utf8_lossy(&part[..sep_pos]);

        if parse_param(&headers, "name").as_deref() != Some(field_name) {
            continue;
        }
        let Some(filename) = parse_param(&headers, "filename") else {
            continue;
        };

        let raw = &part[sep_pos + sep.len()..];
        let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);
        return Ok(Some(FilePart {
            filename,
            content_type: part_content_type(&headers),
            data: data.to_vec(),
        }));
    }
    Ok(None)
}

/// Parses `key="..."` from a Content-Disposition header, matching the key
/// as a whole parameter so `name` does not match inside `filename`.
fn parse_param(headers: &str, key: &str) -> Option<String> {
    let disposition = headers
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-disposition:"))?;
    disposition
        .split(';')
        .map(|s| s.trim())
        .find_map(|s| s.strip_prefix(key)?.strip_prefix('='))
        .map(|v| v.trim_matches('"').to_owned())
}

fn part_content_type(headers: &str) -> String {
    headers
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.trim().eq_ignore_ascii_case("content-type").then(|| value.trim().to_ascii_lowercase())
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CT: &str = "multipart/form-data; boundary=XyZ";

    fn body(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        for (headers, data) in parts {
            out.extend_from_slice(b"--XyZ\r\n");
            out.extend_from_slice(headers.as_bytes());
            out.extend_from_slice(b"\r\n\r\n");
            out.extend_from_slice(data.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--XyZ--\r\n");
        out
    }

    #[test]
    fn finds_named_file_part() {
        let b = body(&[
            ("Content-Disposition: form-data; name=\"note\"", "hi"),
            (
                "Content-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\nContent-Type: image/PNG",
                "PNGDATA",
            ),
        ]);
        let part = extract_file_part(&b, CT, "file").unwrap().unwrap();
        assert_eq!(part.filename, "cat.png");
        assert_eq!(part.content_type, "image/png");
        assert_eq!(part.data, b"PNGDATA");
    }

    #[test]
    fn other_fields_are_not_files() {
        let b = body(&[("Content-Disposition: form-data; name=\"file\"", "text only")]);
        assert_eq!(extract_file_part(&b, CT, "file").unwrap(), None);

        let b = body(&[("Content-Disposition: form-data; name=\"upload\"; filename=\"a.png\"", "x")]);
        assert_eq!(extract_file_part(&b, CT, "file").unwrap(), None);
    }

    #[test]
    fn malformed_bodies_are_errors() {
        assert_eq!(
            extract_file_part(b"whatever", "application/json", "file"),
            Err(MultipartError::MissingBoundary)
        );
        assert_eq!(extract_file_part(b"no delimiter here", CT, "file"), Err(MultipartError::MissingDelimiter));
        assert_eq!(
            extract_file_part(b"--XyZ\r\nContent-Disposition: form-data; name=\"file\"", CT, "file"),
            Err(MultipartError::MalformedPart)
        );
    }

    #[test]
    fn boundary_may_be_quoted() {
        assert_eq!(extract_boundary("multipart/form-data; boundary=\"abc\""), Some("abc".into()));
        assert_eq!(extract_boundary("text/plain; boundary=abc"), None);
    }
}
