use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use tracing::info;

use threeleg_core::{ConsentSurface, OAuth2Client, OAuth2Profile, SharedOAuth2Profile};

mod fake_provider;
pub use self::fake_provider::*;

mod scripted_surface;
pub use self::scripted_surface::*;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const HTTP_REDIRECT: &str = "http://localhost:8080/callback";

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub async fn provider() -> FakeProvider {
    init_tracing();
    match FakeProvider::start().await {
        Ok(provider) => provider,
        Err(error) => {
            panic!("fail to start fake provider: {error:?}");
        }
    }
}

#[fixture]
pub fn surface() -> Arc<ScriptedSurface> {
    Arc::new(ScriptedSurface::default())
}

pub fn profile(provider: &FakeProvider, redirect_uri: &str) -> SharedOAuth2Profile {
    SharedOAuth2Profile::new(
        OAuth2Profile::builder("fake-provider")
            .with_authorization_uri(provider.authorization_uri())
            .with_access_token_uri(provider.token_uri())
            .with_redirect_uri(redirect_uri)
            .with_client_id(CLIENT_ID)
            .with_client_secret(CLIENT_SECRET)
            .with_scope("read write")
            .build(),
    )
}

pub fn client(surface: &Arc<ScriptedSurface>) -> OAuth2Client {
    client_with_timeout(surface, Some(Duration::from_secs(30)))
}

pub fn client_with_timeout(
    surface: &Arc<ScriptedSurface>,
    consent_timeout: Option<Duration>,
) -> OAuth2Client {
    let surface: Arc<dyn ConsentSurface> = surface.clone();
    OAuth2Client::builder()
        .with_consent_surface(surface)
        .with_consent_timeout(consent_timeout)
        .with_request_timeout(Duration::from_secs(5))
        .build()
        .expect("valid client")
}
