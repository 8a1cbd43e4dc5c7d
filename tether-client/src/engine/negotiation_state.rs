use std::fmt;

/// Caller path: `Idle → OfferCreated → OfferSent → AnswerReceived → Connected`.
/// Callee path: `Idle → OfferReceived → AnswerCreated → AnswerSent → Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferCreated,
    OfferSent,
    AnswerReceived,
    OfferReceived,
    AnswerCreated,
    AnswerSent,
    Connected,
    Closed,
}

impl NegotiationState {
    /// States in which progress depends on the remote peer.
    pub fn awaits_peer(&self) -> bool {
        matches!(
            self,
            NegotiationState::Idle | NegotiationState::OfferSent | NegotiationState::AnswerSent
        )
    }

    pub fn is_closed(&self) -> bool {
        *self == NegotiationState::Closed
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
