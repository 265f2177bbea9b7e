//! Bearer token injection into outbound requests (RFC 6750).
//!
//! Each [`AccessTokenPosition`] variant maps to one transform:
//!
//! | Position | Effect |
//! |---|---|
//! | `Header` | `Authorization: Bearer <token>`, replacing any previous value |
//! | `Query` | a single `access_token=<token>` query parameter, replacing any previous one |
//! | `Body` | `access_token=<urlencoded token>` appended to the body |

use http::HeaderValue;
use tracing::{debug, warn};

use crate::profile::AccessTokenPosition;
use crate::secret::SecureString;

mod request;
pub use self::request::{MultiMap, OutboundRequest, RequestHeaders, RequestParams};

/// Name of the bearer token query and body parameter.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Name of the header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Errors raised while turning a token into a request fragment.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum AuthenticationError {
    /// Bearer token contains invalid characters for HTTP headers.
    #[display("Bearer token contains invalid characters: {message}")]
    InvalidBearerToken {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// The token cannot be form-encoded.
    #[display("Bearer token cannot be encoded: {message}")]
    Encoding {
        /// Description of the encoding failure.
        message: String,
    },
}

/// A non-blank bearer access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(SecureString);

impl BearerToken {
    /// Wraps a token, `None` when it is blank.
    pub fn new(token: SecureString) -> Option<Self> {
        (!token.is_blank()).then_some(Self(token))
    }

    /// The `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::InvalidBearerToken`] if the token
    /// contains characters not allowed in a header.
    pub fn header_value(&self) -> Result<HeaderValue, AuthenticationError> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {}", self.0.as_str())).map_err(|err| {
                AuthenticationError::InvalidBearerToken {
                    message: err.to_string(),
                }
            })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// The `access_token=...` form fragment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::Encoding`] if the token cannot be encoded.
    pub fn body_fragment(&self) -> Result<String, AuthenticationError> {
        serde_urlencoded::to_string([(ACCESS_TOKEN_PARAM, self.0.as_str())]).map_err(|err| {
            AuthenticationError::Encoding {
                message: err.to_string(),
            }
        })
    }

    fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AccessTokenPosition {
    /// Places `token` on `request`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the token cannot be turned into the
    /// fragment this position needs. The request is left untouched.
    pub fn apply(
        self,
        token: &BearerToken,
        request: &mut OutboundRequest,
    ) -> Result<(), AuthenticationError> {
        match self {
            Self::Header => apply_header(token, request),
            Self::Query => {
                apply_query(token, request);
                Ok(())
            }
            Self::Body => apply_body(token, request),
        }
    }
}

fn apply_header(
    token: &BearerToken,
    request: &mut OutboundRequest,
) -> Result<(), AuthenticationError> {
    let value = token.header_value()?;
    let value = value
        .to_str()
        .map_err(|err| AuthenticationError::InvalidBearerToken {
            message: err.to_string(),
        })?;
    request.headers.set(AUTHORIZATION_HEADER, value);
    Ok(())
}

fn apply_query(token: &BearerToken, request: &mut OutboundRequest) {
    request.params.set(ACCESS_TOKEN_PARAM, token.as_str());
}

fn apply_body(
    token: &BearerToken,
    request: &mut OutboundRequest,
) -> Result<(), AuthenticationError> {
    let fragment = token.body_fragment()?;
    request.body.push_str(&fragment);
    Ok(())
}

/// Applies the current access token, if any, at `position`.
///
/// Without a token, any `Authorization` header is removed and nothing else
/// changes. Failures are logged and leave the request untouched; this
/// function never fails.
pub fn apply_access_token(
    token: Option<&SecureString>,
    position: AccessTokenPosition,
    request: &mut OutboundRequest,
) {
    let Some(token) = token.cloned().and_then(BearerToken::new) else {
        if request.headers.remove(AUTHORIZATION_HEADER).is_some() {
            debug!("no access token, Authorization header removed");
        }
        return;
    };

    match position.apply(&token, request) {
        Ok(()) => debug!(?position, "access token applied"),
        Err(error) => warn!(?position, %error, "failed to apply access token"),
    }
}
