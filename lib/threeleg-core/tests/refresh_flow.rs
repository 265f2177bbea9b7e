#![allow(missing_docs)]

use std::sync::Arc;

use rstest::rstest;

use threeleg_core::{
    AccessTokenPosition, AccessTokenStatus, OAuth2Error, OAuth2Profile, OutboundRequest,
    ParameterField, SharedOAuth2Profile, TokenExchangeError,
};

mod common;
pub use self::common::*;

fn refreshable_profile(token_uri: &str, refresh_token: &str) -> SharedOAuth2Profile {
    SharedOAuth2Profile::new(
        OAuth2Profile::builder("refresh")
            .with_access_token_uri(token_uri)
            .with_client_id(CLIENT_ID)
            .with_client_secret(CLIENT_SECRET)
            .with_access_token("OLD")
            .with_refresh_token(refresh_token)
            .build(),
    )
}

#[rstest]
#[tokio::test]
async fn should_refresh_and_rotate_tokens(
    #[future] provider: FakeProvider,
    surface: Arc<ScriptedSurface>,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let profile = refreshable_profile(&provider.token_uri(), "R1");
    let client = client(&surface);

    client.refresh_access_token(&profile).await?;

    let access_token = profile.access_token().await.expect("access token");
    assert!(access_token.equals_str("NEW"));
    let refresh_token = profile.refresh_token().await.expect("refresh token");
    assert!(refresh_token.equals_str("R2"));
    assert_eq!(
        profile.access_token_status().await,
        Some(AccessTokenStatus::RetrievedFromServer)
    );
    assert!(surface.opened_urls().is_empty());

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["grant_type"], "refresh_token");
    assert_eq!(requests[0]["refresh_token"], "R1");
    assert!(!requests[0].contains_key("redirect_uri"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_keep_refresh_token_without_rotation(
    #[future] provider: FakeProvider,
    surface: Arc<ScriptedSurface>,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let profile = refreshable_profile(&provider.token_uri(), "R-no-rotation");

    client(&surface).refresh_access_token(&profile).await?;

    let access_token = profile.access_token().await.expect("access token");
    assert!(access_token.equals_str("NEW"));
    let refresh_token = profile.refresh_token().await.expect("refresh token");
    assert!(refresh_token.equals_str("R-no-rotation"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_require_refresh_token(
    #[future] provider: FakeProvider,
    surface: Arc<ScriptedSurface>,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let profile = profile(&provider, HTTP_REDIRECT);

    let error = client(&surface)
        .refresh_access_token(&profile)
        .await
        .expect_err("no refresh token");

    let OAuth2Error::InvalidParameters(invalid) = &error else {
        anyhow::bail!("expected invalid parameters, got {error:?}");
    };
    assert_eq!(invalid.field(), ParameterField::RefreshToken);
    assert!(provider.requests().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_propagate_rejected_refresh(
    #[future] provider: FakeProvider,
    surface: Arc<ScriptedSurface>,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let profile = refreshable_profile(&provider.token_uri(), "revoked");

    let error = client(&surface)
        .refresh_access_token(&profile)
        .await
        .expect_err("revoked refresh token");

    assert_eq!(
        error,
        OAuth2Error::TokenExchange(TokenExchangeError::Rejected {
            status: 400,
            error: "invalid_grant".to_string(),
            description: Some("unknown code or refresh token".to_string()),
        })
    );
    let access_token = profile.access_token().await.expect("access token");
    assert!(access_token.equals_str("OLD"));
    assert_eq!(
        profile.access_token_status().await,
        Some(AccessTokenStatus::EnteredManually)
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_report_unreachable_token_endpoint(
    surface: Arc<ScriptedSurface>,
) -> anyhow::Result<()> {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let token_uri = format!("http://{}/token", listener.local_addr()?);
    drop(listener);
    let profile = refreshable_profile(&token_uri, "R1");

    let error = client(&surface)
        .refresh_access_token(&profile)
        .await
        .expect_err("nothing listens");

    assert!(
        matches!(
            error,
            OAuth2Error::TokenExchange(TokenExchangeError::Network { .. })
        ),
        "unexpected error: {error:?}"
    );
    Ok(())
}

#[rstest]
#[case::header(AccessTokenPosition::Header)]
#[case::query(AccessTokenPosition::Query)]
#[case::body(AccessTokenPosition::Body)]
#[tokio::test]
async fn should_apply_refreshed_token(
    #[future] provider: FakeProvider,
    surface: Arc<ScriptedSurface>,
    #[case] position: AccessTokenPosition,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let profile = SharedOAuth2Profile::new(
        OAuth2Profile::builder("apply")
            .with_access_token_uri(provider.token_uri())
            .with_client_id(CLIENT_ID)
            .with_client_secret(CLIENT_SECRET)
            .with_refresh_token("R1")
            .with_access_token_position(position)
            .build(),
    );
    let client = client(&surface);
    client.refresh_access_token(&profile).await?;

    let mut request = OutboundRequest::new()
        .with_header("Authorization", "Bearer OLD")
        .with_param("page", "1")
        .with_body("q=birds&");
    client.apply_access_token(&profile, &mut request).await;

    match position {
        AccessTokenPosition::Header => {
            assert_eq!(request.headers.get_all("Authorization"), ["Bearer NEW"]);
            assert_eq!(request.params.len(), 1);
            assert_eq!(request.body, "q=birds&");
        }
        AccessTokenPosition::Query => {
            assert_eq!(request.headers.get_all("Authorization"), ["Bearer OLD"]);
            assert_eq!(request.params.get_all("access_token"), ["NEW"]);
            assert_eq!(request.params.len(), 2);
            assert_eq!(request.body, "q=birds&");
        }
        AccessTokenPosition::Body => {
            assert_eq!(request.headers.get_all("Authorization"), ["Bearer OLD"]);
            assert_eq!(request.params.len(), 1);
            assert_eq!(request.body, "q=birds&access_token=NEW");
        }
    }
    Ok(())
}
