/// Sent from a session to the window that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Activated,
    ActivationFailed { reason: String },
    /// Focus was lost; the owner should bring the overlay back to the front.
    ReclaimFocus,
    Closed,
}
