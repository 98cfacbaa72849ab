//! One client profile's session
//!
//! Resolves identity and unlock state from the local store, runs the seal
//! and license workflows, and keeps the latest [`ViewState`] snapshot.

use std::sync::Arc;
use tracing::warn;

use crate::error::{LicenseError, SealError, StateError};
use crate::identity::{self, LocalStore};
use crate::services::{LicenseService, ThoughtService, Unlocked};
use crate::types::Thought;
use crate::view::{reduce, Action, ViewState};

pub struct Session {
    local: Arc<dyn LocalStore>,
    thoughts: ThoughtService,
    license: LicenseService,
    view: ViewState,
}

impl Session {
    /// Session with identity not yet resolved; seals fail with `NotReady`
    pub fn new(local: Arc<dyn LocalStore>, thoughts: ThoughtService, license: LicenseService) -> Self {
        Self {
            local,
            thoughts,
            license,
            view: ViewState::default(),
        }
    }

    /// Create a session and resolve its identity right away
    pub fn open(
        local: Arc<dyn LocalStore>,
        thoughts: ThoughtService,
        license: LicenseService,
    ) -> Result<Self, StateError> {
        let mut session = Self::new(local, thoughts, license);
        session.resolve_identity()?;
        Ok(session)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn thoughts(&self) -> &ThoughtService {
        &self.thoughts
    }

    /// Load or generate the client id and read the unlock flag
    pub fn resolve_identity(&mut self) -> Result<&ViewState, StateError> {
        let client_id = identity::load_or_generate(self.local.as_ref())?;
        let unlocked = identity::is_unlocked(self.local.as_ref());
        self.apply(Action::IdentityResolved { client_id, unlocked });
        Ok(&self.view)
    }

    /// Re-query the public list and, once identity is known, my list
    pub async fn refresh(&mut self) -> Result<&ViewState, SealError> {
        let public = self.thoughts.list_public().await?;
        let mine = match self.view.client_id {
            Some(ref client_id) => self.thoughts.list_mine(client_id).await?,
            None => Vec::new(),
        };
        self.apply(Action::ThoughtsLoaded { public, mine });
        Ok(&self.view)
    }

    /// Run the seal workflow with this session's identity and unlock state
    pub async fn seal(&mut self, content: &str, want_public: bool) -> Result<Option<Thought>, SealError> {
        let result = self
            .thoughts
            .seal(
                content,
                want_public,
                self.view.client_id.as_ref(),
                self.view.unlocked,
            )
            .await;

        match result {
            Ok(Some(thought)) => {
                self.apply(Action::Sealed(thought.clone()));
                if let Err(e) = self.refresh().await {
                    warn!("Refresh after seal failed: {}", e);
                }
                Ok(Some(thought))
            }
            Ok(None) => {
                self.apply(Action::SealIgnored);
                Ok(None)
            }
            Err(e) => {
                self.apply(Action::SealFailed(&e));
                Err(e)
            }
        }
    }

    /// Verify a license key; success takes effect for the next seal
    pub async fn redeem(&mut self, license_key: &str) -> Result<Unlocked, LicenseError> {
        match self.license.verify(license_key).await {
            Ok(unlocked) => {
                self.apply(Action::LicenseAccepted);
                Ok(unlocked)
            }
            Err(e) => {
                self.apply(Action::LicenseFailed(&e));
                Err(e)
            }
        }
    }

    fn apply(&mut self, action: Action<'_>) {
        self.view = reduce(&self.view, action);
    }
}
