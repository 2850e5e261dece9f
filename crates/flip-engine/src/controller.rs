//! The container's event entry points.
//!
//! `FlipController` owns every piece of mutable bookkeeping (store, keys,
//! children, flights, subscriptions). Notifications and timers reach it only
//! through `&mut self`, so two callbacks can never interleave writes.
//!
//! ```ignore
//! let mut controller = FlipController::new(FlipOptions::default());
//! controller.attach(&mut host, root);
//!
//! // MutationObserver callback
//! controller.on_structural_change(&mut host, &records);
//! // ResizeObserver callback
//! controller.on_size_change(&mut host, &entries);
//! // setTimeout callback
//! controller.on_timer(&mut host, token);
//! ```

use std::collections::HashSet;

use flip_config::ResyncPolicy;
use tracing::{debug, info};

use crate::classify::ChangeClassifier;
use crate::driver::{AnimationDriver, Flight, Phase, TimerOutcome};
use crate::host::{Host, MutationRecord, NodeHandle, ResizeEntry, TimerToken};
use crate::keys::{self, ElementKey, KEY_ATTRIBUTE, KeyAssigner};
use crate::observe::ObservationBridge;
use crate::options::FlipOptions;
use crate::store::RectStore;

#[derive(Debug, Clone)]
pub struct FlipController<N: NodeHandle> {
    root: Option<N>,
    store: RectStore,
    keys: KeyAssigner<N>,
    classifier: ChangeClassifier<N>,
    driver: AnimationDriver<N>,
    bridge: ObservationBridge<N>,
}

impl<N: NodeHandle> FlipController<N> {
    pub fn new(options: FlipOptions) -> Self {
        Self {
            root: None,
            store: RectStore::new(),
            keys: KeyAssigner::new(),
            classifier: ChangeClassifier::new(),
            driver: AnimationDriver::new(options),
            bridge: ObservationBridge::new(),
        }
    }

    pub fn options(&self) -> &FlipOptions {
        self.driver.options()
    }

    /// Start tracking `root` and everything below it.
    ///
    /// Keys every element, records its current geometry and subscribes both
    /// notifiers. Attaching an already attached controller detaches first.
    pub fn attach<H>(&mut self, host: &mut H, root: N)
    where
        H: Host<Node = N>,
    {
        if self.root.is_some() {
            self.detach(host);
        }
        self.root = Some(root);
        self.keys.assign(host, &mut self.store, root);
        let children = self.classifier.refresh(&*host, root).to_vec();
        for &child in &children {
            self.keys.assign(host, &mut self.store, child);
        }
        self.bridge.attach(host, root, &children);
        info!(?root, children = children.len(), "attached");
    }

    /// Stop tracking. Pending timers become no-ops and the store is emptied.
    pub fn detach<H>(&mut self, host: &mut H)
    where
        H: Host<Node = N>,
    {
        let Some(root) = self.root.take() else {
            return;
        };
        self.driver.cancel_all(host);
        self.bridge.detach(host);
        for (node, _) in self.keys.release_all() {
            host.remove_attribute(node, KEY_ATTRIBUTE);
        }
        self.store.clear();
        self.classifier.clear();
        info!(?root, "detached");
    }

    /// Handle one batch of child-list mutation records.
    ///
    /// Returns the flights started by the batch.
    pub fn on_structural_change<H>(
        &mut self,
        host: &mut H,
        records: &[MutationRecord<N>],
    ) -> Vec<Flight<N>>
    where
        H: Host<Node = N>,
    {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if records.is_empty() {
            return Vec::new();
        }

        let classification = self.classifier.classify(
            host,
            &mut self.keys,
            &mut self.store,
            root,
            records,
        );
        let children = self.classifier.children().to_vec();
        self.prune_detached(host, root, &children);
        self.bridge.resync(host, &children);
        self.animate_all(host, root, &classification.entering)
    }

    /// Handle one batch of size-change entries.
    pub fn on_size_change<H>(&mut self, host: &mut H, entries: &[ResizeEntry<N>]) -> Vec<Flight<N>>
    where
        H: Host<Node = N>,
    {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if entries.is_empty() {
            return Vec::new();
        }
        debug!(entries = entries.len(), "size change");
        self.animate_all(host, root, &[])
    }

    /// Handle a viewport (window) resize.
    pub fn on_viewport_resize<H>(&mut self, host: &mut H) -> Vec<Flight<N>>
    where
        H: Host<Node = N>,
    {
        let Some(root) = self.root else {
            return Vec::new();
        };
        self.animate_all(host, root, &[])
    }

    /// Deliver a timer scheduled by the driver. Settling an element resyncs
    /// the store.
    pub fn on_timer<H>(&mut self, host: &mut H, token: TimerToken) -> Option<TimerOutcome<N>>
    where
        H: Host<Node = N>,
    {
        self.root?;
        let outcome = self.driver.on_timer(host, token)?;
        if let TimerOutcome::Settled { .. } = outcome {
            self.resync(host);
        }
        Some(outcome)
    }

    /// Bring the store, keys and subscriptions in line with the live tree.
    ///
    /// Detached elements lose their key and entry. Under
    /// [`ResyncPolicy::PerElement`] elements that are mid-flight keep their
    /// baseline; under [`ResyncPolicy::Global`] the whole store is cleared and
    /// re-captured, in-flight elements included.
    pub fn resync<H>(&mut self, host: &mut H)
    where
        H: Host<Node = N>,
    {
        let Some(root) = self.root else {
            return;
        };
        let children = self.classifier.refresh(&*host, root).to_vec();
        self.prune_detached(host, root, &children);

        let policy = self.driver.options().resync;
        if policy == ResyncPolicy::Global {
            self.store.clear();
        }
        for node in std::iter::once(root).chain(children.iter().copied()) {
            let key = self.keys.assign(host, &mut self.store, node);
            if policy == ResyncPolicy::Global || !self.driver.is_in_flight(key) {
                keys::capture(&*host, &mut self.store, node, key);
            }
        }

        self.bridge.resync(host, &children);
    }

    /// Release the key, entry and flight of every element no longer under `root`.
    fn prune_detached<H>(&mut self, host: &mut H, root: N, children: &[N])
    where
        H: Host<Node = N>,
    {
        let live: HashSet<N> = std::iter::once(root).chain(children.iter().copied()).collect();
        for (node, key) in self.keys.retain(&live) {
            self.store.remove(key);
            self.driver.forget(host, key);
            host.remove_attribute(node, KEY_ATTRIBUTE);
            debug!(?node, %key, "dropped detached element");
        }
    }

    fn animate_all<H>(&mut self, host: &mut H, root: N, entering: &[N]) -> Vec<Flight<N>>
    where
        H: Host<Node = N>,
    {
        let mut started = Vec::new();
        let targets = std::iter::once(root).chain(self.classifier.children().iter().copied());
        for node in targets {
            let is_entering = entering.contains(&node);
            match self
                .driver
                .animate(host, &self.keys, &mut self.store, node, is_entering)
            {
                Ok(flight) => started.push(flight),
                Err(reason) => debug!(?node, %reason, "not animated"),
            }
        }
        started
    }

    pub fn root(&self) -> Option<N> {
        self.root
    }

    pub fn is_attached(&self) -> bool {
        self.root.is_some()
    }

    pub fn store(&self) -> &RectStore {
        &self.store
    }

    pub fn key_of(&self, node: N) -> Option<ElementKey> {
        self.keys.key_of(node)
    }

    pub fn phase_of(&self, node: N) -> Option<Phase> {
        self.key_of(node).and_then(|key| self.driver.phase_of(key))
    }

    /// Current children sequence, root excluded.
    pub fn tracked(&self) -> &[N] {
        self.classifier.children()
    }

    pub fn in_flight(&self) -> usize {
        self.driver.in_flight()
    }

    pub fn observed(&self) -> usize {
        self.bridge.len()
    }
}

static_assertions::assert_impl_all!(FlipController<u32>: Send);
