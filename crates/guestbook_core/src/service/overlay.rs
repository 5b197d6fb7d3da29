//! Guestbook overlay visibility.
//!
//! Components that need to dismiss the guestbook (pause menu, close
//! button) hold a `Closable` instead of looking the overlay up by name.

/// Capability to dismiss an open surface.
pub trait Closable {
    /// Closes the surface; no-op when already closed.
    fn close(&mut self);
}

/// Open/closed state of the guestbook overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    open: bool,
}

impl OverlayState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns `true` when the overlay was closed before.
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.open, true)
    }

    /// Returns `true` when the overlay was open before.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }
}

#[cfg(test)]
mod tests {
    use super::OverlayState;

    #[test]
    fn open_and_close_report_transitions_only() {
        let mut overlay = OverlayState::default();
        assert!(overlay.open());
        assert!(!overlay.open());
        assert!(overlay.close());
        assert!(!overlay.close());
    }
}
