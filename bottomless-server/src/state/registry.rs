use std::sync::Arc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tokio::sync::Mutex as TurnLock;
use crate::error::{AppResult, DomainError};
use crate::net::output::SyncOutlet;
use crate::net::protocol::ActionRequest;
use crate::models::types::OwnerId;
use crate::services::{ActionOutcome, ActionPipeline, StorePersistence, StoreService};
use crate::state::session::Session;

/// Online owners and the services that act on their stores.
///
/// Each session sits behind its own mutex, so actions for one owner run one
/// at a time while different owners proceed in parallel. Join, leave and
/// snapshot additionally take the owner's turn lock, held across storage
/// I/O, so a reconnect never loads a record older than the last save.
pub struct Registry {
    stores: StoreService,
    pipeline: ActionPipeline,
    online: DashMap<OwnerId, Arc<Mutex<Session>>>,
    turns: DashMap<OwnerId, Arc<TurnLock<()>>>,
}

impl Registry {
    pub fn new(stores: StoreService) -> Self {
        Self::with_pipeline(stores, ActionPipeline::new())
    }

    pub fn with_pipeline(stores: StoreService, pipeline: ActionPipeline) -> Self {
        Self {
            stores,
            pipeline,
            online: DashMap::new(),
            turns: DashMap::new(),
        }
    }

    pub fn is_online(&self, owner: OwnerId) -> bool {
        self.online.contains_key(&owner)
    }

    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    fn session(&self, owner: OwnerId) -> AppResult<Arc<Mutex<Session>>> {
        self.online
            .get(&owner)
            .map(|s| s.value().clone())
            .ok_or(DomainError::NotOnline(owner))
    }

    fn turn(&self, owner: OwnerId) -> Arc<TurnLock<()>> {
        self.turns.entry(owner).or_default().value().clone()
    }

    /// Drop the owner's turn lock once nobody else holds or waits on it.
    fn release_turn(&self, owner: OwnerId) {
        self.turns.remove_if(&owner, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Load the owner's store, register the session and seed the client
    /// with a full sync.
    pub async fn join(&self, owner: OwnerId, outlet: SyncOutlet) -> AppResult<()> {
        let turn = self.turn(owner);
        let _turn = turn.lock().await;

        if self.is_online(owner) {
            return Err(DomainError::AlreadyOnline(owner));
        }

        let store = self.stores.load(owner).await?;

        match self.online.entry(owner) {
            Entry::Occupied(_) => Err(DomainError::AlreadyOnline(owner)),
            Entry::Vacant(slot) => {
                let session = Session::new(owner, store, outlet);
                session.send_full();
                tracing::info!(
                    %owner,
                    unique = session.store.unique_item_count(),
                    total = session.store.total_item_count(),
                    "owner joined"
                );
                slot.insert(Arc::new(Mutex::new(session)));
                Ok(())
            }
        }
    }

    /// Send the full store again, e.g. after the client lost its view.
    pub fn resync(&self, owner: OwnerId) -> AppResult<()> {
        let session = self.session(owner)?;
        session.lock().send_full();
        tracing::debug!(%owner, "full resync sent");
        Ok(())
    }

    pub fn handle_action(&self, owner: OwnerId, req: &ActionRequest) -> AppResult<ActionOutcome> {
        let session = self.session(owner)?;
        let mut guard = session.lock();
        let sess = &mut *guard;

        let outcome = self
            .pipeline
            .handle(owner, req, &mut sess.store, &mut sess.inventory, &sess.outlet);
        if outcome.moved() > 0 {
            sess.dirty = true;
        }
        Ok(outcome)
    }

    /// Run `f` against the owner's session under its lock.
    pub fn with_session<R>(&self, owner: OwnerId, f: impl FnOnce(&mut Session) -> R) -> AppResult<R> {
        let session = self.session(owner)?;
        let mut guard = session.lock();
        Ok(f(&mut guard))
    }

    /// Save the store and drop the session. A join for the same owner waits
    /// until the save has finished.
    pub async fn leave(&self, owner: OwnerId) -> AppResult<()> {
        let turn = self.turn(owner);
        let result = {
            let _turn = turn.lock().await;
            self.leave_in_turn(owner).await
        };
        drop(turn);
        self.release_turn(owner);
        result
    }

    async fn leave_in_turn(&self, owner: OwnerId) -> AppResult<()> {
        let (_, session) = self.online.remove(&owner).ok_or(DomainError::NotOnline(owner))?;
        self.pipeline.limiter().forget(owner);

        let record = {
            let sess = session.lock();
            StorePersistence::encode(&sess.store)
        };
        self.stores.save_record(owner, record).await?;

        tracing::info!(%owner, "owner left");
        Ok(())
    }

    /// Save every online store that changed since its last save. Returns the
    /// number of stores written.
    pub async fn snapshot_all(&self) -> usize {
        let sessions: Vec<(OwnerId, Arc<Mutex<Session>>)> = self
            .online
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();

        let mut saved = 0;
        for (owner, session) in sessions {
            let turn = self.turn(owner);
            let guard = turn.lock().await;

            // the owner left while we waited; leave already saved the store
            let current = self.online.get(&owner).map(|s| Arc::ptr_eq(s.value(), &session));
            if current != Some(true) {
                drop(guard);
                drop(turn);
                self.release_turn(owner);
                continue;
            }

            let record = {
                let mut sess = session.lock();
                if !sess.dirty {
                    continue;
                }
                sess.dirty = false;
                StorePersistence::encode(&sess.store)
            };

            match self.stores.save_record(owner, record).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    tracing::error!(%owner, error = %e, "failed to snapshot store");
                    session.lock().dirty = true;
                }
            }
        }

        if saved > 0 {
            tracing::info!(saved, "store snapshot complete");
        }
        saved
    }
}
