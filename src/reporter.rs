use anyhow::{Context, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

use crate::classifier::LinkEvent;
use crate::settings::Settings;

/// Posts link events to the collector endpoint as URL-encoded forms.
///
/// Sends are fire-and-forget: each one runs in its own task and the caller
/// may drop the returned handle. Failures are logged either way.
#[derive(Clone)]
pub struct Reporter {
    client: reqwest::Client,
    endpoint: Url,
}

impl Reporter {
    pub fn new(settings: &Settings, page_url: &Url) -> Result<Self> {
        let endpoint = page_url
            .join(&settings.endpoint)
            .with_context(|| format!("Invalid endpoint: {}", settings.endpoint))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Spawns the POST for `event`. Must be called inside a tokio runtime.
    pub fn send(&self, event: LinkEvent) -> JoinHandle<Result<()>> {
        let reporter = self.clone();

        tokio::spawn(async move {
            let result = reporter.post(&event).await;
            if let Err(ref e) = result {
                log::warn!("Failed to report click on {}: {:#}", event.url, e);
            }
            result
        })
    }

    /// Posts `event` and waits for the response status
    pub async fn post(&self, event: &LinkEvent) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(event)
            .send()
            .await
            .context("Failed to send link event")?;

        if !response.status().is_success() {
            anyhow::bail!("Collector returned HTTP {}", response.status());
        }

        log::debug!("Reported {} ({})", event.url, event.location);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::LocationLabel;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one request, answers with `status_line` and returns the raw request text
    async fn one_shot_server(status_line: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (Url::parse(&format!("http://{}/blog/post", addr)).unwrap(), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    fn sample_event() -> LinkEvent {
        LinkEvent::link_clicked(
            "https://example.com/a?b=c".to_string(),
            "Tom & Jerry".to_string(),
            LocationLabel::CommentSection,
        )
    }

    #[tokio::test]
    async fn test_send_posts_urlencoded_form() {
        let (page_url, server) = one_shot_server("HTTP/1.1 200 OK").await;
        let reporter = Reporter::new(&Settings::default(), &page_url).unwrap();

        reporter.send(sample_event()).await.unwrap().unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /track-link.php HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/x-www-form-urlencoded"));
        assert!(request.ends_with(
            "action=link_clicked&link_url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc&link_anchor=Tom+%26+Jerry&link_location=Comment+Section"
        ));
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let (page_url, server) = one_shot_server("HTTP/1.1 500 Internal Server Error").await;
        let reporter = Reporter::new(&Settings::default(), &page_url).unwrap();

        let result = reporter.send(sample_event()).await.unwrap();
        server.await.unwrap();

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_surfaced() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let page_url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let reporter = Reporter::new(&Settings::default(), &page_url).unwrap();

        assert!(reporter.post(&sample_event()).await.is_err());
    }

    #[test]
    fn test_endpoint_resolution() {
        let page_url = Url::parse("https://shop.example.com/products/42").unwrap();

        let reporter = Reporter::new(&Settings::default(), &page_url).unwrap();
        assert_eq!(reporter.endpoint().as_str(), "https://shop.example.com/track-link.php");

        let settings = Settings {
            endpoint: "https://collector.example.net/events".to_string(),
            ..Settings::default()
        };
        let reporter = Reporter::new(&settings, &page_url).unwrap();
        assert_eq!(reporter.endpoint().as_str(), "https://collector.example.net/events");
    }
}
