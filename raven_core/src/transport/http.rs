/*!
 * Default HTTP transport.
 *
 * Uses `ureq` — a pure-Rust blocking HTTP client with no async runtime.
 * Capture calls block until the collector answers or the timeout elapses,
 * so a blocking client is all we need.
 *
 * - **Single attempt** — no retries; a failure is reported once.
 * - **Statuses are data** — `http_status_as_error(false)` so a 4xx/5xx
 *   comes back as a `Response` and its body can be surfaced.
 */

use std::time::Duration;

use ureq::Agent;

use super::{Response, Transport, TransportError};

/// Thin wrapper around `ureq::Agent`.
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    /**
     * Creates a transport whose requests (connect + send + read) are bounded
     * by `timeout`. Connection pooling and keep-alive are handled by the
     * agent.
     */
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<Response, TransportError> {
        let mut request = self.agent.post(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send(body)
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .unwrap_or_else(|_| "<unreadable body>".into());

        Ok(Response { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Instant;

    /// Reads one request (headers plus `Content-Length` body) off the socket.
    fn read_request(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            head.push_str(&line);
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
        head + &String::from_utf8_lossy(&body)
    }

    #[test]
    fn test_error_status_is_a_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/1/store/", listener.local_addr().unwrap());

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&stream);
            let body = "collector down";
            write!(
                stream,
                "HTTP/1.1 500 Internal Server Error\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            request
        });

        let transport = HttpTransport::new(Duration::from_secs(5));
        let headers = vec![("X-Sentry-Auth".to_string(), "Sentry sentry_key=public".to_string())];
        let response = transport.post(&url, &headers, b"{\"message\":\"m\"}");

        assert_eq!(response.unwrap(), Response::new(500, "collector down"));

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/1/store/ HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("x-sentry-auth: sentry sentry_key=public"));
        assert!(request.ends_with("{\"message\":\"m\"}"));
    }

    #[test]
    fn test_silent_collector_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/1/store/", listener.local_addr().unwrap());

        // Holds the connection open without ever answering.
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        });

        let transport = HttpTransport::new(Duration::from_millis(200));
        let started = Instant::now();
        let result = transport.post(&url, &[], b"{}");

        assert!(matches!(result, Err(TransportError::Request(_))), "{result:?}");
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
