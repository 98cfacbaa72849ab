//! Immutable view state
//!
//! Every user action ends in an [`Action`] describing its result. The pure
//! [`reduce`] folds it into a fresh [`ViewState`] snapshot; nothing mutates a
//! snapshot in place.

use crate::error::{LicenseError, SealError};
use crate::identity::ClientId;
use crate::types::{Thought, PURCHASE_URL};

/// Status line shown under the seal button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    NotReady,
    FreeLimitReached,
    Sealed,
    SealFailed,
    TooLong,
    LicenseMissing,
    LicenseValid,
    LicenseInvalid,
    LicenseUnavailable,
}

impl Status {
    pub fn message(&self) -> &'static str {
        match self {
            Status::Idle => "",
            Status::NotReady => "Preparing secure session… try again in a second.",
            Status::FreeLimitReached => "Free limit reached. Unlock unlimited thoughts.",
            Status::Sealed => "This thought has been sealed.",
            Status::SealFailed => "Error sealing thought.",
            Status::TooLong => "Thoughts are limited to 800 characters.",
            Status::LicenseMissing => "Please enter a license key.",
            Status::LicenseValid => "License valid! Unlimited thoughts unlocked.",
            Status::LicenseInvalid => "Invalid license key. Please try again.",
            Status::LicenseUnavailable => "Error verifying license key. Try again later.",
        }
    }
}

/// Snapshot of everything a front end renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub client_id: Option<ClientId>,
    pub unlocked: bool,
    pub status: Status,
    pub public_thoughts: Vec<Thought>,
    pub my_thoughts: Vec<Thought>,
    /// Id of the thought sealed most recently in this session
    pub last_sealed: Option<String>,
}

impl ViewState {
    /// Upsell is offered only to locked clients who just hit the limit
    pub fn show_upsell(&self) -> bool {
        self.status == Status::FreeLimitReached && !self.unlocked
    }

    pub fn purchase_url(&self) -> Option<&'static str> {
        self.show_upsell().then_some(PURCHASE_URL)
    }

    /// Public sharing toggle is offered only once unlocked
    pub fn can_publish(&self) -> bool {
        self.unlocked
    }
}

/// Outcome of one user action
#[derive(Debug)]
pub enum Action<'a> {
    IdentityResolved { client_id: ClientId, unlocked: bool },
    ThoughtsLoaded { public: Vec<Thought>, mine: Vec<Thought> },
    Sealed(Thought),
    SealIgnored,
    SealFailed(&'a SealError),
    LicenseAccepted,
    LicenseFailed(&'a LicenseError),
}

/// Fold an action into a new snapshot
pub fn reduce(state: &ViewState, action: Action<'_>) -> ViewState {
    let mut next = state.clone();
    match action {
        Action::IdentityResolved { client_id, unlocked } => {
            next.client_id = Some(client_id);
            next.unlocked = unlocked;
        }
        Action::ThoughtsLoaded { public, mine } => {
            next.public_thoughts = public;
            next.my_thoughts = mine;
        }
        Action::Sealed(thought) => {
            next.status = Status::Sealed;
            next.last_sealed = Some(thought.id);
        }
        Action::SealIgnored => {}
        Action::SealFailed(err) => {
            next.status = match err {
                SealError::NotReady => Status::NotReady,
                SealError::QuotaExceeded { .. } => Status::FreeLimitReached,
                SealError::Validation(_) => Status::TooLong,
                SealError::Storage(_) => Status::SealFailed,
            };
        }
        Action::LicenseAccepted => {
            next.unlocked = true;
            next.status = Status::LicenseValid;
        }
        Action::LicenseFailed(err) => {
            next.status = match err {
                LicenseError::EmptyKey => Status::LicenseMissing,
                LicenseError::Invalid => Status::LicenseInvalid,
                LicenseError::Transient(_) | LicenseError::State(_) => Status::LicenseUnavailable,
            };
        }
    }
    next
}
