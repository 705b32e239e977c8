use bottomless_core::ItemStack;
use governor::clock::{Clock, DefaultClock};
use crate::models::bounded::BoundedInventory;
use crate::models::inventory::UnboundedStore;
use crate::models::types::OwnerId;
use crate::net::output::SyncOutlet;
use crate::net::protocol::{ActionKind, ActionRequest, RequestFault, SyncMessage};
use crate::services::rate_limit::RateLimiter;

/// What happened to one request. Nothing here is sent back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Malformed request, dropped before the rate limiter
    Rejected(RequestFault),
    /// Arrived inside the owner's minimum interval
    Throttled,
    /// Items moved from the store into the bounded inventory
    Took(u64),
    /// Items moved from the bounded inventory into the store
    Deposited(u64),
    /// Valid request that moved nothing
    Idle,
}

impl ActionOutcome {
    pub fn moved(&self) -> u64 {
        match self {
            ActionOutcome::Took(n) | ActionOutcome::Deposited(n) => *n,
            _ => 0,
        }
    }
}

/// Executes take / deposit / quick-move requests for one owner at a time.
///
/// The caller must hold whatever lock guards `store` and `inventory`; the
/// pipeline itself only shares the rate limiter across owners.
pub struct ActionPipeline<C: Clock = DefaultClock> {
    limiter: RateLimiter<C>,
}

impl Default for ActionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPipeline {
    pub fn new() -> Self {
        Self::with_limiter(RateLimiter::new())
    }
}

impl<C: Clock> ActionPipeline<C> {
    pub fn with_limiter(limiter: RateLimiter<C>) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> &RateLimiter<C> {
        &self.limiter
    }

    pub fn handle(
        &self,
        owner: OwnerId,
        req: &ActionRequest,
        store: &mut UnboundedStore,
        inventory: &mut dyn BoundedInventory,
        outlet: &SyncOutlet,
    ) -> ActionOutcome {
        if let Err(fault) = req.validate() {
            tracing::warn!(%owner, kind = %req.kind, %fault, "dropping invalid action request");
            return ActionOutcome::Rejected(fault);
        }

        if !self.limiter.allow(owner) {
            tracing::warn!(%owner, kind = %req.kind, "action request rate limited");
            return ActionOutcome::Throttled;
        }

        // quick move looks at the slots only; the carried item never decides the direction
        let kind = match req.kind {
            ActionKind::QuickMove if slots_hold(inventory, &req.stack) > 0 => ActionKind::Deposit,
            ActionKind::QuickMove if store.contains(&req.stack) => ActionKind::Take,
            ActionKind::QuickMove => {
                tracing::debug!(%owner, item = %req.stack.item, "quick move with nothing to move");
                return ActionOutcome::Idle;
            }
            other => other,
        };

        let outcome = match kind {
            ActionKind::Take => match take(store, inventory, &req.stack, req.amount) {
                0 => ActionOutcome::Idle,
                n => ActionOutcome::Took(n),
            },
            ActionKind::Deposit => match deposit(store, inventory, &req.stack, req.amount) {
                0 => ActionOutcome::Idle,
                n => ActionOutcome::Deposited(n),
            },
            ActionKind::QuickMove => ActionOutcome::Idle,
        };

        if outcome.moved() > 0 {
            outlet.send(SyncMessage::item_changed(&req.stack, store.count(&req.stack)));
        }

        tracing::debug!(
            %owner,
            requested = %req.kind,
            ?outcome,
            item = %req.stack.item,
            remaining = store.count(&req.stack),
            "action handled"
        );
        outcome
    }
}

/// Quantity of `stack` across the slots, ignoring the carried item.
fn slots_hold(inventory: &dyn BoundedInventory, stack: &ItemStack) -> u64 {
    (0..inventory.slot_count())
        .map(|i| inventory.slot(i))
        .filter(|s| ItemStack::is_same_item_same_components(s, stack))
        .map(|s| u64::from(s.count))
        .sum()
}

/// Quantity of `stack` across the slots plus the carried item.
fn player_holds(inventory: &dyn BoundedInventory, stack: &ItemStack) -> u64 {
    let in_slots = slots_hold(inventory, stack);
    let carried = inventory.carried();
    if ItemStack::is_same_item_same_components(carried, stack) {
        in_slots + u64::from(carried.count)
    } else {
        in_slots
    }
}

fn take(
    store: &mut UnboundedStore,
    inventory: &mut dyn BoundedInventory,
    stack: &ItemStack,
    amount: u64,
) -> u64 {
    let Some(entry) = store.entry(stack) else {
        return 0;
    };
    let to_give = amount.min(entry.count());

    let mut given = 0u64;
    while given < to_give {
        let chunk = entry.stack_with_count(to_give - given);
        if !inventory.try_add(&chunk) {
            break;
        }
        given += u64::from(chunk.count);
    }

    if given > 0 {
        store.remove_item(stack, given);
    }
    given
}

fn deposit(
    store: &mut UnboundedStore,
    inventory: &mut dyn BoundedInventory,
    stack: &ItemStack,
    amount: u64,
) -> u64 {
    let to_take = amount.min(player_holds(inventory, stack));
    let mut taken = 0u64;

    for i in 0..inventory.slot_count() {
        if taken == to_take {
            break;
        }
        let slot = inventory.slot(i);
        if !ItemStack::is_same_item_same_components(slot, stack) {
            continue;
        }
        let n = (to_take - taken).min(u64::from(slot.count));
        inventory.shrink_slot(i, n as u32);
        taken += n;
    }

    // the carried item goes last, only if the slots fell short
    if taken < to_take {
        let mut carried = inventory.carried().clone();
        if ItemStack::is_same_item_same_components(&carried, stack) {
            let n = (to_take - taken).min(u64::from(carried.count));
            carried.shrink(n as u32);
            inventory.set_carried(carried);
            taken += n;
        }
    }

    if taken > 0 {
        store.add_item(stack, taken);
    }
    taken
}
