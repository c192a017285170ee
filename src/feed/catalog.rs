// SPDX-License-Identifier: GPL-3.0-only
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};
use crate::streams::StreamItem;

/// Lists the streams currently known to the server archive.
/// Used once at start-up so the snapshot is populated before the first push.
#[derive(Debug, Clone)]
pub struct ArchiveCatalog {
    client: Client,
    base_url: String,
    instance: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ListStreamsResponse {
    #[serde(default)]
    streams: Vec<StreamItem>,
}

impl ArchiveCatalog {
    pub fn new(base_url: String, instance: String, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("stream-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            instance,
            api_key,
        })
    }

    fn build_request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.client.get(&url);

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        request
    }

    pub async fn list_streams(&self) -> anyhow::Result<Vec<StreamItem>> {
        info!(instance = %self.instance, "Fetching stream list from archive");

        let response = self
            .build_request(&format!("api/archive/{}/streams", self.instance))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Stream list request failed");
            return Err(anyhow::anyhow!("Stream list request failed: {} - {}", status, text));
        }

        let body: ListStreamsResponse = response.json().await?;
        info!(count = body.streams.len(), "Fetched stream list");

        Ok(body.streams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_streams_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/archive/simulator/streams")
            .match_header("authorization", "Bearer key-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"streams":[
                    {"name":"tm_realtime","column":[],"dataCount":"42"},
                    {"name":"cmdhist_realtime","dataCount":3}
                ]}"#,
            )
            .create_async()
            .await;

        let catalog = ArchiveCatalog::new(
            format!("{}/", server.url()),
            "simulator".to_string(),
            Some("key-1".to_string()),
        )
        .unwrap();

        let streams = catalog.list_streams().await.unwrap();
        assert_eq!(
            streams,
            vec![StreamItem::new("tm_realtime", 42), StreamItem::new("cmdhist_realtime", 3)]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_streams_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/archive/simulator/streams")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let catalog = ArchiveCatalog::new(server.url(), "simulator".to_string(), None).unwrap();
        assert!(catalog.list_streams().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_streams_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/archive/missing/streams")
            .with_status(404)
            .with_body("No such instance")
            .create_async()
            .await;

        let catalog = ArchiveCatalog::new(server.url(), "missing".to_string(), None).unwrap();
        let err = catalog.list_streams().await.unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("No such instance"));
    }
}
