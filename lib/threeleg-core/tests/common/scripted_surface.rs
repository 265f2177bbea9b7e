use std::sync::Mutex;

use url::Url;

use threeleg_core::{ConsentListener, ConsentSurface, ConsentSurfaceError};

/// Consent surface driven by the test: it records what the flow asks for and
/// lets the test play the user's navigation.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    state: Mutex<SurfaceState>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    opened: Vec<Url>,
    listener: Option<ConsentListener>,
    close_count: usize,
    refuse_open: bool,
}

impl ScriptedSurface {
    pub fn refusing_to_open() -> Self {
        let surface = Self::default();
        surface.lock().refuse_open = true;
        surface
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
        self.state.lock().expect("not poisoned")
    }

    fn listener(&self) -> ConsentListener {
        self.lock().listener.clone().expect("surface is open")
    }

    pub fn opened_urls(&self) -> Vec<Url> {
        self.lock().opened.clone()
    }

    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    pub fn is_open(&self) -> bool {
        self.lock().listener.is_some()
    }

    /// The provider redirected the surface.
    pub fn navigate(&self, location: &str) {
        self.listener().location_changed(location);
    }

    /// The surface rendered a new page.
    pub fn render(&self, content: &str) {
        self.listener().content_changed(content);
    }

    /// The user closed the window.
    pub fn user_closes(&self) {
        if let Some(listener) = self.lock().listener.take() {
            listener.closed();
        }
    }

    /// The host dropped the surface without notifying.
    pub fn vanish(&self) {
        self.lock().listener = None;
    }
}

impl ConsentSurface for ScriptedSurface {
    fn open(&self, url: &Url, listener: ConsentListener) -> Result<(), ConsentSurfaceError> {
        let mut state = self.lock();
        if state.refuse_open {
            return Err(ConsentSurfaceError::new("no display available"));
        }
        state.opened.push(url.clone());
        state.listener = Some(listener);
        Ok(())
    }

    fn close(&self) {
        let mut state = self.lock();
        state.close_count += 1;
        state.listener = None;
    }
}
