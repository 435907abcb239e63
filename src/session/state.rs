//! Capture session state machine.
//!
//! [`SessionState`] drives the capture session.  The transitions are:
//!
//! ```text
//! Idle ──start──▶ Recording
//!                 ──stop / deadline──▶ Finalizing
//!                                      ──encoded──▶ Idle
//!                                      ──decode error──▶ Failed
//! Failed ──start (retry)──▶ Recording
//! ```
//!
//! A failed device acquisition never leaves `Idle` — the capture does not
//! become active when the microphone cannot be opened.

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// States of the voice-sample capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture in progress; a start request will be honoured.
    Idle,

    /// Microphone is held and samples are being accumulated.
    Recording,

    /// The recording has stopped; the clip is being downmixed and encoded.
    Finalizing,

    /// Finalizing failed (empty or undecodable clip).  The next start request
    /// begins a fresh capture.
    Failed,
}

impl SessionState {
    /// Returns `true` while a capture is in progress.
    ///
    /// Start requests are ignored while active; stop requests are ignored
    /// while inactive.
    ///
    /// ```
    /// use voice_sample::session::SessionState;
    ///
    /// assert!(!SessionState::Idle.is_active());
    /// assert!(SessionState::Recording.is_active());
    /// assert!(SessionState::Finalizing.is_active());
    /// assert!(!SessionState::Failed.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Finalizing)
    }

    /// A short human-readable label for logs and status displays.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Finalizing => "Finalizing",
            SessionState::Failed => "Failed",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
