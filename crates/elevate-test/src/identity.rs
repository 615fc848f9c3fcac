//! In-memory identity provider.
//!
//! Behaves like the GoTrue endpoints the service uses: bearer tokens resolve
//! to live identities only, activation tokens are single use and expire,
//! and deleting an identity revokes its tokens.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use elevate_service::identity::{
    GatewayError, GatewayResult, Identity, IdentityGateway, InviteMetadata, Session,
};

/// Gateway operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    ResolveToken,
    Invite,
    Delete,
    List,
    Verify,
    SetCredential,
    SignIn,
}

struct Record {
    identity: Identity,
    password: Option<String>,
}

struct Activation {
    subject: uuid::Uuid,
    used: bool,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Default)]
struct GatewayState {
    identities: HashMap<uuid::Uuid, Record>,
    tokens: HashMap<String, uuid::Uuid>,
    activations: HashMap<String, Activation>,
    failures: HashMap<GatewayOp, VecDeque<GatewayError>>,
    accept_duplicate_emails: bool,
    reinvite_pending: bool,
}

#[derive(Default)]
pub struct MemoryIdentityGateway {
    state: Mutex<GatewayState>,
    mutations: AtomicUsize,
}

impl MemoryIdentityGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn injected(&self, op: GatewayOp) -> GatewayResult<()> {
        match self.state().failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Queues `err` as the result of the next call to `op`.
    pub fn fail_next(&self, op: GatewayOp, err: GatewayError) {
        self.state().failures.entry(op).or_default().push_back(err);
    }

    /// Lets a second invitation for a registered email through, so the
    /// profile store's constraint is the only guard.
    pub fn accept_duplicate_emails(&self, accept: bool) {
        self.state().accept_duplicate_emails = accept;
    }

    /// Re-inviting an email whose identity was never activated returns the
    /// existing subject id, as GoTrue does for unconfirmed users.
    pub fn reinvite_pending(&self, reinvite: bool) {
        self.state().reinvite_pending = reinvite;
    }

    /// Creates an active identity with an optional password.
    #[must_use]
    pub fn create_identity(
        &self,
        email: &str,
        password: Option<&str>,
        metadata: Option<InviteMetadata>,
    ) -> uuid::Uuid {
        let id = uuid::Uuid::new_v4();
        self.insert_identity(
            Identity {
                id,
                email: Some(email.to_string()),
                created_at: chrono::Utc::now(),
                metadata,
            },
            password,
        );
        id
    }

    /// Stores an identity as given, e.g. with a backdated `created_at`.
    pub fn insert_identity(&self, identity: Identity, password: Option<&str>) {
        self.state().identities.insert(
            identity.id,
            Record {
                identity,
                password: password.map(str::to_string),
            },
        );
    }

    /// Issues a bearer token for `subject`.
    #[must_use]
    pub fn issue_token(&self, subject: uuid::Uuid) -> String {
        let token = format!("token-{}", uuid::Uuid::new_v4());
        self.state().tokens.insert(token.clone(), subject);
        token
    }

    #[must_use]
    pub fn activation_token_for(&self, email: &str) -> Option<String> {
        let state = self.state();
        let subject = state
            .identities
            .values()
            .find(|r| r.identity.email.as_deref() == Some(email))?
            .identity
            .id;
        state
            .activations
            .iter()
            .find(|(_, a)| a.subject == subject)
            .map(|(token, _)| token.clone())
    }

    pub fn expire_activation(&self, token: &str) {
        if let Some(activation) = self.state().activations.get_mut(token) {
            activation.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
        }
    }

    #[must_use]
    pub fn identity(&self, id: uuid::Uuid) -> Option<Identity> {
        self.state().identities.get(&id).map(|r| r.identity.clone())
    }

    #[must_use]
    pub fn identities_with_email(&self, email: &str) -> usize {
        self.state()
            .identities
            .values()
            .filter(|r| r.identity.email.as_deref() == Some(email))
            .count()
    }

    #[must_use]
    pub fn identity_count(&self) -> usize {
        self.state().identities.len()
    }

    #[must_use]
    pub fn has_password(&self, id: uuid::Uuid) -> bool {
        self.state()
            .identities
            .get(&id)
            .is_some_and(|r| r.password.is_some())
    }

    /// Number of invite and delete calls that reached the provider.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn open_session(state: &mut GatewayState, subject: uuid::Uuid) -> Session {
        let access_token = format!("session-{}", uuid::Uuid::new_v4());
        state.tokens.insert(access_token.clone(), subject);
        Session {
            access_token,
            refresh_token: Some(format!("refresh-{}", uuid::Uuid::new_v4())),
            expires_in: Some(3600),
            user_id: subject,
        }
    }
}

#[async_trait]
impl IdentityGateway for MemoryIdentityGateway {
    async fn resolve_token(&self, token: &str) -> GatewayResult<uuid::Uuid> {
        self.injected(GatewayOp::ResolveToken)?;
        let state = self.state();
        state
            .tokens
            .get(token)
            .copied()
            .filter(|subject| state.identities.contains_key(subject))
            .ok_or(GatewayError::InvalidToken)
    }

    async fn invite_identity(
        &self,
        email: &str,
        metadata: &InviteMetadata,
    ) -> GatewayResult<uuid::Uuid> {
        // Let a concurrent caller run between the pre-check and the write.
        tokio::task::yield_now().await;
        self.injected(GatewayOp::Invite)?;
        self.mutations.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state();
        let registered = state
            .identities
            .values()
            .find(|r| r.identity.email.as_deref() == Some(email))
            .map(|r| (r.identity.id, r.password.is_some()));

        let id = match registered {
            Some((existing, false)) if state.reinvite_pending => existing,
            Some(_) if !state.accept_duplicate_emails => return Err(GatewayError::EmailExists),
            _ => {
                let id = uuid::Uuid::new_v4();
                state.identities.insert(
                    id,
                    Record {
                        identity: Identity {
                            id,
                            email: Some(email.to_string()),
                            created_at: chrono::Utc::now(),
                            metadata: Some(metadata.clone()),
                        },
                        password: None,
                    },
                );
                id
            }
        };
        state.activations.insert(
            format!("activation-{}", uuid::Uuid::new_v4()),
            Activation {
                subject: id,
                used: false,
                expires_at: chrono::Utc::now() + chrono::Duration::hours(24),
            },
        );
        Ok(id)
    }

    async fn delete_identity(&self, subject: uuid::Uuid) -> GatewayResult<()> {
        self.injected(GatewayOp::Delete)?;
        self.mutations.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state();
        if state.identities.remove(&subject).is_none() {
            return Err(GatewayError::NotFound);
        }
        state.tokens.retain(|_, s| *s != subject);
        state.activations.retain(|_, a| a.subject != subject);
        Ok(())
    }

    async fn list_identities(&self) -> GatewayResult<Vec<Identity>> {
        self.injected(GatewayOp::List)?;
        let mut identities: Vec<Identity> = self
            .state()
            .identities
            .values()
            .map(|r| r.identity.clone())
            .collect();
        identities.sort_by_key(|i| i.created_at);
        Ok(identities)
    }

    async fn verify_activation(&self, token: &str) -> GatewayResult<Session> {
        self.injected(GatewayOp::Verify)?;
        let mut state = self.state();

        let subject = match state.activations.get_mut(token) {
            Some(a) if !a.used && a.expires_at > chrono::Utc::now() => {
                a.used = true;
                a.subject
            }
            _ => return Err(GatewayError::InvalidToken),
        };
        if !state.identities.contains_key(&subject) {
            return Err(GatewayError::InvalidToken);
        }
        Ok(Self::open_session(&mut state, subject))
    }

    async fn set_credential(&self, session: &Session, password: &str) -> GatewayResult<()> {
        self.injected(GatewayOp::SetCredential)?;
        let mut state = self.state();

        let subject = state
            .tokens
            .get(&session.access_token)
            .copied()
            .ok_or(GatewayError::InvalidToken)?;
        let record = state
            .identities
            .get_mut(&subject)
            .ok_or(GatewayError::InvalidToken)?;
        record.password = Some(password.to_string());
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<Session> {
        self.injected(GatewayOp::SignIn)?;
        let mut state = self.state();

        let subject = state
            .identities
            .values()
            .find(|r| {
                r.identity.email.as_deref() == Some(email)
                    && r.password.as_deref() == Some(password)
            })
            .map(|r| r.identity.id)
            .ok_or(GatewayError::InvalidCredentials)?;
        Ok(Self::open_session(&mut state, subject))
    }
}
