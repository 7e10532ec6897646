//! Delivery of encoded payloads to the metrics backend.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::error::DeliveryError;
use crate::metrics::EncodedPayload;

/// Sends one payload to the backend.
pub trait Pusher {
    /// Delivers `payload`, returning the HTTP status on success.
    fn push(&self, payload: &EncodedPayload) -> Result<u16, DeliveryError>;
}

impl<T: Pusher + ?Sized> Pusher for &T {
    fn push(&self, payload: &EncodedPayload) -> Result<u16, DeliveryError> {
        (**self).push(payload)
    }
}

/// Blocking HTTP POST pusher.
///
/// Any status in `200..300` is success; everything else, including transport
/// failures, is a [`DeliveryError`]. Redirects are not followed, so a 3xx is
/// reported as-is. The response body is never read and no retry is attempted.
pub struct HttpPusher {
    client: Client,
    endpoint: Url,
}

impl HttpPusher {
    /// Creates a pusher for `endpoint`.
    ///
    /// `timeout` bounds each request end to end; `None` lets a stalled
    /// backend block the caller indefinitely.
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .user_agent(concat!("ethtool-exporter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(DeliveryError::Client)?;

        Ok(Self { client, endpoint })
    }
}

impl Pusher for HttpPusher {
    fn push(&self, payload: &EncodedPayload) -> Result<u16, DeliveryError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .body(payload.body.clone());
        for (name, value) in &payload.headers {
            request = request.header(*name, *value);
        }

        let response = request.send().map_err(DeliveryError::Transport)?;
        let status = response.status().as_u16();
        debug!("{} answered HTTP {}", self.endpoint, status);

        if (200..300).contains(&status) {
            Ok(status)
        } else {
            Err(DeliveryError::Status { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one request with `status` and returns the received headers and body.
    fn serve_once(status: &'static str) -> (Url, thread::JoinHandle<(Vec<String>, Vec<u8>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!(
            "http://{}/api/v1/write",
            listener.local_addr().unwrap()
        ))
        .unwrap();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut headers = Vec::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                headers.push(line);
            }

            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
            (headers, body)
        });

        (url, handle)
    }

    fn payload() -> EncodedPayload {
        EncodedPayload {
            body: b"ethtool_rx_errors{interface=\"eth0\"} 3\n".to_vec(),
            headers: vec![("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
        }
    }

    #[test]
    fn test_push_success_sends_headers_and_body() {
        let (url, server) = serve_once("204 No Content");
        let pusher = HttpPusher::new(url, Some(Duration::from_secs(5))).unwrap();

        assert_eq!(pusher.push(&payload()).unwrap(), 204);

        let (headers, body) = server.join().unwrap();
        assert!(headers[0].starts_with("POST /api/v1/write"));

        let headers: Vec<String> = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        assert!(
            headers
                .iter()
                .any(|h| h == "content-type: text/plain; version=0.0.4; charset=utf-8")
        );
        assert!(
            headers
                .iter()
                .any(|h| h.starts_with("user-agent: ethtool-exporter/"))
        );
        assert_eq!(body, payload().body);
    }

    #[test]
    fn test_push_non_success_status() {
        let (url, server) = serve_once("503 Service Unavailable");
        let pusher = HttpPusher::new(url, Some(Duration::from_secs(5))).unwrap();

        let err = pusher.push(&payload()).unwrap_err();
        assert!(matches!(err, DeliveryError::Status { status: 503 }));
        server.join().unwrap();
    }

    #[test]
    fn test_push_redirect_is_not_followed() {
        let (url, server) = serve_once("302 Found\r\nLocation: /elsewhere");
        let pusher = HttpPusher::new(url, Some(Duration::from_secs(5))).unwrap();

        let err = pusher.push(&payload()).unwrap_err();
        assert!(matches!(err, DeliveryError::Status { status: 302 }));

        let (headers, _) = server.join().unwrap();
        assert!(headers[0].starts_with("POST /api/v1/write"));
    }

    #[test]
    fn test_push_connection_refused() {
        // Bind and drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/write")).unwrap();
        let pusher = HttpPusher::new(url, Some(Duration::from_secs(5))).unwrap();

        let err = pusher.push(&payload()).unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }
}
