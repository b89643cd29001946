//! The cart reconciliation store.
//!
//! One logical cart backed by whichever set the session selects: browser
//! storage while anonymous, the remote cart service while signed in. When a
//! session appears and anonymous lines are still stored, they are replayed
//! into the remote cart once and the local set is wiped.
//!
//! # Publishing
//!
//! Every successful load or mutation publishes a fresh [`CartState`] on a
//! watch channel. New subscribers see the latest state immediately; dropping
//! the receiver unsubscribes.
//!
//! # Ordering
//!
//! Local mutations within one store are serialized. Remote calls are not:
//! two concurrent updates of the same line race and the last response wins.

use crate::auth::{AuthProvider, Session};
use crate::config::StoreConfig;
use crate::error::{RemoteError, Result, StorageError, StoreError};
use crate::remote::RemoteCartService;
use crate::storage::KeyValueStorage;
use basket_engine::{
    decode_lines, encode_lines, AddLine, Applied, CartCommand, CartMode, CartView, LineId,
    LineRef, LocalCart, MigrationOutcome, MigrationPlan, Origin, Quantity, Timestamp,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Snapshot published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub view: CartView,
    pub mode: CartMode,
    /// Message of the last failed remote operation, cleared by the next success
    pub error: Option<String>,
    pub loading: bool,
}

impl Default for CartState {
    fn default() -> Self {
        Self {
            view: CartView::empty(Origin::Local),
            mode: CartMode::Local,
            error: None,
            loading: false,
        }
    }
}

struct Inner {
    id: Uuid,
    config: StoreConfig,
    remote: Arc<dyn RemoteCartService>,
    storage: Arc<dyn KeyValueStorage>,
    auth: Arc<dyn AuthProvider>,
    /// Last local cart read or written; also serializes local writes
    local: Mutex<LocalCart>,
    migration: Mutex<()>,
    state: watch::Sender<CartState>,
}

/// Cart store shared by every view of the cart.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("id", &self.inner.id)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    pub fn new(
        remote: Arc<dyn RemoteCartService>,
        storage: Arc<dyn KeyValueStorage>,
        auth: Arc<dyn AuthProvider>,
        config: StoreConfig,
    ) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                config,
                remote,
                storage,
                auth,
                local: Mutex::new(LocalCart::new()),
                migration: Mutex::new(()),
                state,
            }),
        }
    }

    /// Identifier of this instance, attached to its storage writes.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Subscribe to cart state. The receiver holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// The latest published state.
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// The latest published view.
    pub fn view(&self) -> CartView {
        self.inner.state.borrow().view.clone()
    }

    /// The mode implied by the current session and stored local lines.
    pub fn mode(&self) -> CartMode {
        let has_session = self.inner.auth.session().is_some();
        CartMode::of(has_session, has_session && self.has_pending_local())
    }

    /// Fetch the active set and publish it.
    ///
    /// A store mounted with a session and leftover local lines migrates them
    /// first, like [`sync`](Self::sync). A remote failure keeps the previously
    /// published lines and sets the error message. Local loads never fail.
    pub async fn load(&self) -> Result<CartView> {
        self.sync().await
    }

    /// Re-evaluate the cart after a session or storage change.
    ///
    /// With a session and stored local lines, the lines are migrated first.
    /// A failed migration leaves them stored and is retried on the next call.
    pub async fn sync(&self) -> Result<CartView> {
        self.purge_legacy_keys();

        let Some(session) = self.inner.auth.session() else {
            return Ok(self.load_local().await);
        };

        if self.has_pending_local() {
            self.migrate_local_to_remote(&session).await?;
        }

        self.load_remote(&session).await
    }

    /// Add a product configuration.
    ///
    /// Adding a configuration already in the cart increases its quantity.
    pub async fn add(&self, add: AddLine) -> Result<CartView> {
        self.dispatch(CartCommand::Add(add)).await
    }

    /// Set a line's quantity. Zero or below removes the line.
    pub async fn update_quantity(&self, line: LineRef, quantity: i64) -> Result<CartView> {
        self.dispatch(CartCommand::UpdateQuantity { line, quantity })
            .await
    }

    pub async fn remove(&self, line: LineRef) -> Result<CartView> {
        self.dispatch(CartCommand::Remove { line }).await
    }

    /// Empty the active set.
    pub async fn clear(&self) -> Result<CartView> {
        self.dispatch(CartCommand::Clear).await
    }

    /// Watch session and storage changes in the background.
    ///
    /// The task starts with a [`sync`](Self::sync), so a store mounted with a
    /// session migrates leftover local lines. After that, any change of the
    /// signed-in user triggers a sync: a session appearing migrates stored
    /// local lines, a session ending reloads the local cart and a different
    /// user gets their own remote cart. Writes to the cart key by other
    /// instances trigger a reload. The task ends when the auth provider or
    /// the storage goes away.
    pub fn spawn_watcher(&self) -> JoinHandle<()> {
        let store = self.clone();
        let mut auth_rx = self.inner.auth.watch();
        let mut storage_rx = self.inner.storage.subscribe();
        let mut current_user = session_user(&auth_rx.borrow_and_update());

        tokio::spawn(async move {
            store.sync_logged("mount").await;

            loop {
                tokio::select! {
                    changed = auth_rx.changed() => {
                        if changed.is_err() {
                            tracing::debug!(store = %store.id(), "auth provider closed, stopping cart watcher");
                            break;
                        }
                        let user = session_user(&auth_rx.borrow_and_update());
                        if user == current_user {
                            continue;
                        }
                        tracing::debug!(
                            store = %store.id(),
                            from = ?current_user,
                            to = ?user,
                            "session changed"
                        );
                        current_user = user;
                        store.sync_logged("session change").await;
                    }
                    event = storage_rx.recv() => match event {
                        Ok(event) => {
                            if event.origin == store.id() || event.key != store.inner.config.cart_key {
                                continue;
                            }
                            tracing::debug!(store = %store.id(), origin = %event.origin, "cart changed by another instance");
                            store.sync_logged("storage change").await;
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::debug!(store = %store.id(), missed, "storage events lagged");
                            store.sync_logged("storage lag").await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::debug!(store = %store.id(), "storage closed, stopping cart watcher");
                            break;
                        }
                    },
                }
            }
        })
    }

    async fn sync_logged(&self, reason: &str) {
        if let Err(err) = self.sync().await {
            tracing::warn!(store = %self.id(), reason, error = %err, "cart sync failed");
        }
    }

    async fn dispatch(&self, command: CartCommand) -> Result<CartView> {
        let command = command.normalize();

        match self.inner.auth.session() {
            Some(session) => self.dispatch_remote(&session, command).await,
            None => self.dispatch_local(command).await,
        }
    }

    // ------------------------------------------------------------------
    // Remote set
    // ------------------------------------------------------------------

    async fn load_remote(&self, session: &Session) -> Result<CartView> {
        self.inner.state.send_modify(|state| state.loading = true);

        match self.inner.remote.list_lines(session).await {
            Ok(lines) => {
                let view = CartView::from_remote(&lines);
                self.publish(view.clone());
                Ok(view)
            }
            Err(err) => {
                tracing::warn!(store = %self.id(), error = %err, "failed to load remote cart");
                self.record_error(&err);
                Err(err.into())
            }
        }
    }

    async fn dispatch_remote(&self, session: &Session, command: CartCommand) -> Result<CartView> {
        let remote = &self.inner.remote;

        let result = match &command {
            CartCommand::Add(add) if add.quantity == 0 => return Ok(self.view()),
            CartCommand::Add(add) => remote.add_line(session, &add.to_request()).await,
            CartCommand::UpdateQuantity { line, quantity } => {
                let id = remote_id(*line)?;
                // normalize() leaves only positive quantities here
                let quantity = Quantity::try_from(*quantity).unwrap_or(Quantity::MAX);
                remote.update_line_quantity(session, id, quantity).await
            }
            CartCommand::Remove { line } => remote.remove_line(session, remote_id(*line)?).await,
            CartCommand::Clear => remote.clear(session).await,
        };

        if let Err(err) = result {
            tracing::warn!(
                store = %self.id(),
                command = command.name(),
                error = %err,
                "remote cart operation failed"
            );
            self.record_error(&err);
            return Err(err.into());
        }

        // The service is authoritative; always re-read instead of patching locally.
        self.load_remote(session).await
    }

    // ------------------------------------------------------------------
    // Local set
    // ------------------------------------------------------------------

    async fn load_local(&self) -> CartView {
        let mut local = self.inner.local.lock().await;
        *local = self.read_local();
        let view = local.view();

        // Published under the lock so a concurrent write cannot be overtaken.
        self.publish(view.clone());
        view
    }

    async fn dispatch_local(&self, command: CartCommand) -> Result<CartView> {
        let mut local = self.inner.local.lock().await;

        // Start from storage so writes by other instances are not overwritten.
        let mut cart = self.read_local();
        let applied = cart.apply(command, now_millis())?;

        if applied != Applied::Ignored {
            self.write_local(&cart)?;
        }

        *local = cart;
        let view = local.view();

        tracing::debug!(store = %self.id(), ?applied, items = view.item_count, "local cart updated");
        self.publish(view.clone());
        Ok(view)
    }

    fn read_local(&self) -> LocalCart {
        let key = &self.inner.config.cart_key;

        let raw = match self.inner.storage.get(key) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(store = %self.id(), key = %key, error = %err, "failed to read local cart");
                None
            }
        };

        let decoded = decode_lines(raw.as_deref());
        if decoded.malformed {
            tracing::warn!(store = %self.id(), key = %key, "stored cart is not a JSON array, ignoring it");
        }
        if decoded.skipped > 0 || decoded.merged > 0 {
            tracing::debug!(
                store = %self.id(),
                skipped = decoded.skipped,
                merged = decoded.merged,
                "repaired stored cart"
            );
        }

        decoded.cart
    }

    /// Persist the local cart. A failed write leaves storage as it was.
    fn write_local(&self, cart: &LocalCart) -> std::result::Result<(), StorageError> {
        let key = &self.inner.config.cart_key;

        let raw = encode_lines(cart.lines()).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.inner
            .storage
            .set(key, &raw, self.inner.id)
            .inspect_err(|err| {
                tracing::warn!(store = %self.id(), key = %key, error = %err, "failed to write local cart, change dropped");
            })
    }

    /// Drop the stored local set after a completed migration.
    ///
    /// Every line is already on the remote, so leaving them stored would
    /// replay them on the next sync. If the key cannot be removed it is
    /// overwritten with an empty set instead.
    fn discard_migrated_lines(&self) -> std::result::Result<(), StorageError> {
        let key = &self.inner.config.cart_key;
        let Err(err) = self.inner.storage.remove(key, self.inner.id) else {
            return Ok(());
        };

        tracing::warn!(
            store = %self.id(),
            key = %key,
            error = %err,
            "failed to remove migrated cart, writing an empty one"
        );
        self.write_local(&LocalCart::new()).inspect_err(|fallback| {
            tracing::error!(
                store = %self.id(),
                key = %key,
                error = %fallback,
                "migrated lines are still stored and will be replayed"
            );
        })
    }

    fn has_pending_local(&self) -> bool {
        !self.read_local().is_empty()
    }

    fn purge_legacy_keys(&self) {
        for key in &self.inner.config.legacy_keys {
            if let Err(err) = self.inner.storage.remove(key, self.inner.id) {
                tracing::debug!(store = %self.id(), key = %key, error = %err, "failed to purge legacy cart key");
            }
        }
    }

    // ------------------------------------------------------------------
    // Migration
    // ------------------------------------------------------------------

    /// Replay stored local lines into the remote cart, one at a time.
    ///
    /// The local set is wiped only after every line was accepted. On the
    /// first failure the loop stops and nothing is wiped, so a retry replays
    /// every line again, including those already accepted.
    async fn migrate_local_to_remote(&self, session: &Session) -> Result<()> {
        // A second caller waits for the running migration, then finds
        // nothing left to send.
        let _running = self.inner.migration.lock().await;

        let mut local = self.inner.local.lock().await;
        let cart = self.read_local();
        if cart.is_empty() {
            return Ok(());
        }

        let plan = MigrationPlan::from_lines(cart.lines());
        tracing::info!(
            store = %self.id(),
            user_id = %session.user_id,
            lines = plan.len(),
            "migrating local cart to remote"
        );
        self.inner
            .state
            .send_modify(|state| state.mode = CartMode::Migrating);

        let mut progress = plan.progress();
        let mut failure: Option<RemoteError> = None;

        for (index, step) in plan.iter() {
            match self.inner.remote.add_line(session, step).await {
                Ok(()) => progress.record_success(),
                Err(err) => {
                    progress.record_failure(index, err.to_string());
                    failure = Some(err);
                    break;
                }
            }
        }

        match progress.outcome() {
            MigrationOutcome::Completed { migrated } => {
                self.discard_migrated_lines()?;
                *local = LocalCart::new();
                tracing::info!(store = %self.id(), migrated, "local cart migrated");
                Ok(())
            }
            MigrationOutcome::Aborted {
                migrated,
                failed_at,
                reason,
            } => {
                tracing::warn!(
                    store = %self.id(),
                    migrated,
                    failed_at,
                    reason = %reason,
                    "cart migration aborted, local lines kept"
                );
                let err = StoreError::Migration {
                    migrated,
                    total: plan.len(),
                    source: failure.unwrap_or(RemoteError::Unavailable(reason)),
                };
                self.inner.state.send_modify(|state| {
                    state.error = Some(err.to_string());
                    state.loading = false;
                });
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    fn publish(&self, view: CartView) {
        self.inner.state.send_modify(|state| {
            state.mode = match view.source {
                Origin::Local => CartMode::Local,
                Origin::Remote => CartMode::Remote,
            };
            state.view = view;
            state.error = None;
            state.loading = false;
        });
    }

    fn record_error(&self, err: &RemoteError) {
        let message = err.to_string();
        self.inner.state.send_modify(|state| {
            state.error = Some(message);
            state.loading = false;
        });
    }
}

fn remote_id(line: LineRef) -> std::result::Result<LineId, basket_engine::Error> {
    match line {
        LineRef::Remote(id) => Ok(id),
        other => Err(basket_engine::Error::WrongLineRef {
            expected: Origin::Remote.as_str(),
            got: other,
        }),
    }
}

fn session_user(session: &Option<Session>) -> Option<String> {
    session.as_ref().map(|s| s.user_id.clone())
}

fn now_millis() -> Timestamp {
    Timestamp::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_id_rejects_local_refs() {
        assert_eq!(remote_id(LineRef::Remote(3)), Ok(3));
        assert!(matches!(
            remote_id(LineRef::Local(0)),
            Err(basket_engine::Error::WrongLineRef {
                expected: "remote",
                ..
            })
        ));
    }

    #[test]
    fn default_state_is_empty_local() {
        let state = CartState::default();
        assert_eq!(state.mode, CartMode::Local);
        assert!(state.view.is_empty());
        assert!(state.error.is_none());
    }

    #[test]
    fn clock_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
