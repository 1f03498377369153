//! reqwest-backed transport

use super::{FetchRequest, FetchResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;

/// Transport over a shared reqwest client.
///
/// No timeout is set: a fetch that never answers leaves the load pending.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .headers(header_map(&request.headers)?)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        // the loader rejects anything outside 2xx without looking at the body
        let body = if response.status().is_success() {
            response.text().await?
        } else {
            String::new()
        };

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT, USER_AGENT};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single connection with `response` and hang up
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket.write_all(response).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn local_transport() -> HttpTransport {
        HttpTransport::with_client(Client::builder().no_proxy().build().unwrap())
    }

    #[test]
    fn test_header_map() {
        let map = header_map(&[
            ("accept".into(), "text/turtle".into()),
            ("user-agent".into(), "https://pchampin.github.io/sowasm/".into()),
        ])
        .unwrap();
        assert_eq!(map.get(ACCEPT).unwrap(), "text/turtle");
        assert_eq!(map.get(USER_AGENT).unwrap(), "https://pchampin.github.io/sowasm/");
    }

    #[test]
    fn test_invalid_header_value() {
        let err = header_map(&[("accept".into(), "text/turtle\n".into())]).unwrap_err();
        assert!(matches!(err, TransportError::InvalidHeader { ref name, .. } if name == "accept"));
    }

    #[tokio::test]
    async fn test_fetch_reads_body_on_success() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-type: text/turtle\r\ncontent-length: 13\r\nconnection: close\r\n\r\n<a> <b> <c> .",
        )
        .await;
        let response = local_transport()
            .fetch(&FetchRequest::new(url))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("text/turtle"));
        assert_eq!(response.body, "<a> <b> <c> .");
    }

    #[tokio::test]
    async fn test_fetch_keeps_status_when_error_body_is_cut_short() {
        // announces more body than it sends
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\ncontent-type: text/html\r\ncontent-length: 100\r\n\r\nnot found",
        )
        .await;
        let response = local_transport()
            .fetch(&FetchRequest::new(url))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, "");
    }
}
