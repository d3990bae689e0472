use anyhow::{
    Context,
    Result,
    anyhow,
};
use base64::{
    Engine,
    engine::general_purpose::STANDARD,
};
use serde::Deserialize;
use url::Url;

/// Cartridge access through the rollup node's inspect endpoint. Inspect
/// responses carry their data as hex report payloads; a cartridge binary
/// is the payloads of all reports concatenated in order.
pub struct CartridgeFetcher {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct InspectResponse {
    #[serde(default)]
    reports: Vec<InspectReport>,
}

#[derive(Debug, Deserialize)]
struct InspectReport {
    payload: String,
}

/// Cartridge metadata as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartridgeInfo {
    pub id: String,
    pub user_address: String,
    #[serde(default)]
    pub info: serde_json::Value,
    pub created_at: u64,
    /// Cover art, base64 encoded.
    #[serde(default)]
    pub cover: String,
}

impl CartridgeInfo {
    pub fn cover_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.cover)
            .context("cartridge cover is not valid base64")
    }
}

impl CartridgeFetcher {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Download the packaged game binary. Comes back empty when the node
    /// has nothing for this id or the request fails; the board stays
    /// usable without a cartridge.
    pub async fn cartridge(&self, game_id: &str) -> Vec<u8> {
        match self.try_cartridge(game_id).await {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(%game_id, %err, "cartridge download failed");
                Vec::new()
            }
        }
    }

    async fn try_cartridge(&self, game_id: &str) -> Result<Vec<u8>> {
        let response = self
            .inspect(&format!("cartridges/{game_id}/cartridge"))
            .await?;
        let mut data = Vec::new();
        for report in &response.reports {
            data.extend(decode_hex_payload(&report.payload)?);
        }
        Ok(data)
    }

    /// Cartridge metadata: title info, author address, cover art.
    pub async fn cartridge_info(&self, game_id: &str) -> Result<CartridgeInfo> {
        let response = self.inspect(&format!("cartridges/{game_id}/info")).await?;
        let report = response
            .reports
            .first()
            .ok_or_else(|| anyhow!("no info report for cartridge {game_id}"))?;
        let raw = decode_hex_payload(&report.payload)?;
        serde_json::from_slice(&raw).context("parsing cartridge info")
    }

    async fn inspect(&self, path: &str) -> Result<InspectResponse> {
        let url = format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("querying inspect endpoint {url}"))?;
        if !response.status().is_success() {
            return Err(anyhow!("inspect endpoint answered {}", response.status()));
        }
        response.json().await.context("reading inspect response")
    }
}

fn decode_hex_payload(payload: &str) -> Result<Vec<u8>> {
    let hexdata = payload.strip_prefix("0x").unwrap_or(payload);
    hex::decode(hexdata).context("report payload is not valid hex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cartridge_info_decodes_the_backend_shape() {
        let raw = r#"{
            "id": "snake",
            "userAddress": "0xabc",
            "info": {"name": "Snake"},
            "createdAt": 1712000000,
            "cover": "aGVsbG8="
        }"#;

        let info: CartridgeInfo = serde_json::from_str(raw).unwrap();

        assert_eq!(info.id, "snake");
        assert_eq!(info.user_address, "0xabc");
        assert_eq!(info.created_at, 1712000000);
        assert_eq!(info.cover_bytes().unwrap(), b"hello");
    }
}
