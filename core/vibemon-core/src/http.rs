//! Blocking HTTP primitives.
//!
//! Each invocation is a short-lived process, so a blocking client with a
//! fixed timeout is all the delivery path needs. Failures (connect error,
//! timeout, non-2xx) are returned as `None` and logged at debug; they never
//! propagate.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

fn client() -> Option<Client> {
    match Client::builder().timeout(HTTP_TIMEOUT).build() {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::debug!(error = %err, "Failed to build HTTP client");
            None
        }
    }
}

/// POSTs an optional JSON body to `{base}{endpoint}`.
///
/// Returns the response body on 2xx, `None` otherwise.
pub fn post(base: &str, endpoint: &str, body: Option<&str>) -> Option<String> {
    let url = format!("{base}{endpoint}");
    let mut request = client()?.post(&url);
    if let Some(body) = body {
        request = request
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
    }
    read_success(url, request.send())
}

/// GETs `{base}{endpoint}`. Same failure contract as [`post`].
pub fn get(base: &str, endpoint: &str) -> Option<String> {
    let url = format!("{base}{endpoint}");
    let request = client()?.get(&url);
    read_success(url, request.send())
}

fn read_success(
    url: String,
    result: reqwest::Result<reqwest::blocking::Response>,
) -> Option<String> {
    match result {
        Ok(response) if response.status().is_success() => {
            Some(response.text().unwrap_or_default())
        }
        Ok(response) => {
            tracing::debug!(url = %url, status = %response.status(), "HTTP request rejected");
            None
        }
        Err(err) => {
            tracing::debug!(url = %url, error = %err, "HTTP request failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves a single canned HTTP response on an ephemeral port.
    fn one_shot_server(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_get_returns_body_on_success() {
        let base = one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
        assert_eq!(get(&base, "/status").as_deref(), Some("ok"));
    }

    #[test]
    fn test_post_fails_on_server_error() {
        let base = one_shot_server("HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n");
        assert!(post(&base, "/status", Some("{}")).is_none());
    }

    #[test]
    fn test_post_fails_on_connection_refused() {
        // Port 9 (discard) is almost never listening locally.
        assert!(post("http://127.0.0.1:9", "/status", None).is_none());
    }
}
