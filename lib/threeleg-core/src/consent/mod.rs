//! Consent surface abstraction.
//!
//! A consent surface is anything able to show the provider's authorization
//! page and report what happens on it: a webview, an embedded browser, a
//! headless driver in tests. The flow only relies on two notifications,
//! location changes and content changes, delivered through the
//! [`ConsentListener`] handed to [`ConsentSurface::open`].

use std::fmt::Debug;

use tokio::sync::mpsc;
use url::Url;

mod extract;
pub use self::extract::{extract_authorization_code, extract_title};

/// Which notifications carry the authorization code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentMode {
    /// The provider redirects to an HTTP redirect URI; the code is in the new location.
    Location,
    /// Out-of-band redirect; the code is in the title of the rendered page.
    Content,
}

/// A notification from the consent surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentEvent {
    /// The surface navigated to a new location.
    LocationChanged(String),
    /// The rendered textual content changed.
    ContentChanged(String),
    /// The surface was closed.
    Closed,
}

/// Per-open listener a surface reports to.
///
/// Callbacks can be invoked from any thread. Dropping every clone of the
/// listener has the same effect as [`ConsentListener::closed`].
#[derive(Debug, Clone)]
pub struct ConsentListener {
    sender: mpsc::UnboundedSender<ConsentEvent>,
}

impl ConsentListener {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<ConsentEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Reports a navigation to `location`.
    pub fn location_changed(&self, location: impl Into<String>) {
        self.send(ConsentEvent::LocationChanged(location.into()));
    }

    /// Reports new rendered content.
    pub fn content_changed(&self, content: impl Into<String>) {
        self.send(ConsentEvent::ContentChanged(content.into()));
    }

    /// Reports that the surface was closed by the user or the host.
    pub fn closed(&self) {
        self.send(ConsentEvent::Closed);
    }

    /// Returns `true` once the flow stopped listening.
    pub fn is_detached(&self) -> bool {
        self.sender.is_closed()
    }

    fn send(&self, event: ConsentEvent) {
        // The flow may have finished already; late events are irrelevant.
        let _ = self.sender.send(event);
    }
}

/// Error reported by a surface that cannot open the authorization URL.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[display("{reason}")]
pub struct ConsentSurfaceError {
    reason: String,
}

impl ConsentSurfaceError {
    /// Creates an error with a description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Capability of showing the consent page and reporting its evolution.
///
/// Each call to [`open`](ConsentSurface::open) scopes its own listener, so a
/// surface never needs a shared listener registry.
pub trait ConsentSurface: Debug + Send + Sync {
    /// Shows `url` and reports subsequent events to `listener`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentSurfaceError`] if the surface cannot be shown.
    fn open(&self, url: &Url, listener: ConsentListener) -> Result<(), ConsentSurfaceError>;

    /// Closes the surface, dropping the listener given to `open`.
    fn close(&self);
}
