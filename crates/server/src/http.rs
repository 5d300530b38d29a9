//! Minimal HTTP/1.1 plumbing over raw streams.
//!
//! Enough for a loopback demo server: request-line + headers +
//! Content-Length bodies in, fixed-status responses out. No keep-alive,
//! no chunked encoding.

use std::collections::HashMap;
use std::io::{Read, Write};

const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Upload cap. Large phone photos fit comfortably; anything bigger is
/// rejected before decode.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Header lookup by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// First value of a query parameter, if present.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == key).then_some(v)
        })
    }
}

pub fn read_request<R: Read>(stream: &mut R) -> Result<HttpRequest, String> {
    // Read up to the end of the header block
    let mut buf = [0u8; 1024];
    let mut data = Vec::new();
    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if data.len() > MAX_HEADER_BYTES {
            return Err("request headers too large".to_string());
        }
        let n = stream.read(&mut buf).map_err(|e| e.to_string())?;
        if n == 0 {
            return Err("connection closed mid-request".to_string());
        }
        data.extend_from_slice(&buf[..n]);
    };

    let header_text = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or("empty request")?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or("missing method")?.to_string();
    let raw_path = parts.next().ok_or("missing path")?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let (path, query) = match raw_path.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (raw_path.to_string(), None),
    };

    // Read the body, part of which may already be buffered
    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    if content_length > MAX_BODY_BYTES {
        return Err("request body too large".to_string());
    }

    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).map_err(|e| e.to_string())?;
        if n == 0 {
            return Err("connection closed mid-body".to_string());
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    Ok(HttpRequest {
        method,
        path,
        query,
        headers,
        body,
    })
}

pub fn write_response<W: Write>(
    stream: &mut W,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> std::io::Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        413 => "HTTP/1.1 413 Content Too Large",
        422 => "HTTP/1.1 422 Unprocessable Content",
        502 => "HTTP/1.1 502 Bad Gateway",
        503 => "HTTP/1.1 503 Service Unavailable",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()
}

pub fn write_json<W: Write>(stream: &mut W, status: u16, body: &str) -> std::io::Result<()> {
    write_response(stream, status, "application/json", body.as_bytes())
}

pub fn write_html<W: Write>(stream: &mut W, status: u16, body: &str) -> std::io::Result<()> {
    write_response(stream, status, "text/html; charset=utf-8", body.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(raw: &[u8]) -> Result<HttpRequest, String> {
        read_request(&mut Cursor::new(raw.to_vec()))
    }

    #[test]
    fn test_parse_get_request() {
        let req = parse(b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/health");
        assert!(req.query.is_none());
        assert_eq!(req.header("host"), Some("localhost"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_parse_query_string() {
        let req = parse(b"GET /?mode=live&x=1 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.path, "/");
        assert_eq!(req.query_param("mode"), Some("live"));
        assert_eq!(req.query_param("x"), Some("1"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn test_parse_post_with_body() {
        let req = parse(
            b"POST /api/detect HTTP/1.1\r\nContent-Length: 5\r\nContent-Type: image/png\r\n\r\nhello",
        )
        .unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.body, b"hello");
        assert_eq!(req.header("content-type"), Some("image/png"));
    }

    #[test]
    fn test_header_names_lowercased() {
        let req = parse(b"GET / HTTP/1.1\r\nX-Custom-Header:  value  \r\n\r\n").unwrap();
        assert_eq!(req.header("x-custom-header"), Some("value"));
    }

    #[test]
    fn test_body_split_across_reads_is_reassembled() {
        // Cursor reads in 1024-byte chunks; a body longer than the first
        // chunk exercises the continuation loop
        let body = vec![b'x'; 3000];
        let mut raw = format!("POST /api/detect HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len())
            .into_bytes();
        raw.extend_from_slice(&body);
        let req = parse(&raw).unwrap();
        assert_eq!(req.body.len(), 3000);
    }

    #[test]
    fn test_oversized_header_rejected() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Filler: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_HEADER_BYTES + 100));
        let result = parse(&raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_body_rejected() {
        let raw = format!(
            "POST /api/detect HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
            MAX_BODY_BYTES + 1
        );
        assert!(parse(raw.as_bytes()).is_err());
    }

    #[test]
    fn test_truncated_request_rejected() {
        assert!(parse(b"GET / HTTP/1.1\r\nHost: local").is_err());
    }

    #[test]
    fn test_empty_request_rejected() {
        assert!(parse(b"").is_err());
    }

    #[test]
    fn test_missing_content_length_means_empty_body() {
        let req = parse(b"POST /api/detect HTTP/1.1\r\n\r\nleftover").unwrap();
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_write_response_shape() {
        let mut out = Vec::new();
        write_response(&mut out, 200, "text/plain", b"ok").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\nok"));
    }

    #[test]
    fn test_write_json_status_lines() {
        for (status, expected) in [
            (404, "404 Not Found"),
            (405, "405 Method Not Allowed"),
            (422, "422 Unprocessable Content"),
            (503, "503 Service Unavailable"),
            (599, "500 Internal Server Error"),
        ] {
            let mut out = Vec::new();
            write_json(&mut out, status, "{}").unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains(expected), "status {status}: {text}");
        }
    }
}
