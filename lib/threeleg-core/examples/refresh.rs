//! Refreshes the access token of a profile stored as YAML, then prints the
//! updated profile.
//!
//! ```text
//! cargo run --example refresh --features yaml -- profile.yaml
//! ```

use std::env;
use std::fs;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use threeleg_core::{OAuth2Client, OAuth2ProfileSettings, OutboundRequest, SharedOAuth2Profile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().pretty().init();

    let path = env::args()
        .nth(1)
        .context("usage: refresh <profile.yaml>")?;
    let yaml = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let settings = OAuth2ProfileSettings::from_yaml(&yaml)?;
    let profile = SharedOAuth2Profile::new(settings.into_profile("example"));

    let client = OAuth2Client::builder()
        .with_request_timeout(Duration::from_secs(30))
        .build()?;
    client.refresh_access_token(&profile).await?;
    info!(status = ?profile.access_token_status().await, "token refreshed");

    let mut request = OutboundRequest::new();
    client.apply_access_token(&profile, &mut request).await;
    info!(
        headers = request.headers.len(),
        params = request.params.len(),
        "request prepared"
    );

    let out = profile.to_settings().await.to_yaml()?;
    println!("{out}");

    Ok(())
}
