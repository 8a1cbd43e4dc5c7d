use crate::capability::LocalStream;
use tether_core::{CallMode, IceCandidate, SessionDescription, Signal};

/// Work item for a session actor. Processed strictly one at a time.
#[derive(Debug)]
pub enum SessionEvent {
    /// Become the caller: attach `local` and send an offer.
    Call {
        mode: CallMode,
        local: Option<LocalStream>,
    },
    Offer {
        offer: SessionDescription,
        local: Option<LocalStream>,
    },
    Answer(SessionDescription),
    Candidate(IceCandidate),
    Shutdown,
}

impl SessionEvent {
    /// Maps a relayed answer or candidate. Offers need local media and go through [`SessionEvent::Offer`].
    pub fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Answer { answer } => Some(SessionEvent::Answer(answer)),
            Signal::Candidate { candidate } => Some(SessionEvent::Candidate(candidate)),
            Signal::Offer { .. } => None,
        }
    }
}
