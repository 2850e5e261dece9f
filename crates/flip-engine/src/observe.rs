//! Subscription bookkeeping for the structural and size notifiers.

use std::collections::HashSet;

use tracing::trace;

use crate::host::{NodeHandle, ObservationKind, Observers};

/// Keeps the set of observed elements equal to root ∪ current children.
///
/// The bridge, not the host, is responsible for never subscribing the same
/// element twice: hosts are free to count duplicate `observe` calls as
/// separate subscriptions.
#[derive(Debug, Clone)]
pub struct ObservationBridge<N: NodeHandle> {
    root: Option<N>,
    observed: HashSet<N>,
}

impl<N: NodeHandle> Default for ObservationBridge<N> {
    fn default() -> Self {
        Self {
            root: None,
            observed: HashSet::new(),
        }
    }
}

impl<N: NodeHandle> ObservationBridge<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `root` and each of `children` for both notification kinds.
    pub fn attach<H>(&mut self, host: &mut H, root: N, children: &[N])
    where
        H: Observers<Node = N>,
    {
        if self.root.is_some() {
            self.detach(host);
        }
        self.root = Some(root);
        self.observe(host, root);
        for &child in children {
            self.observe(host, child);
        }
    }

    /// Drop every subscription of both kinds.
    pub fn detach<H>(&mut self, host: &mut H)
    where
        H: Observers<Node = N>,
    {
        for kind in ObservationKind::ALL {
            host.disconnect(kind);
        }
        self.observed.clear();
        self.root = None;
    }

    /// Bring the observed set in line with `children` after the tracked set
    /// changed. Already-observed elements are skipped; elements that left the
    /// set are unobserved.
    pub fn resync<H>(&mut self, host: &mut H, children: &[N])
    where
        H: Observers<Node = N>,
    {
        let Some(root) = self.root else {
            return;
        };

        let wanted: HashSet<N> = std::iter::once(root).chain(children.iter().copied()).collect();

        let departed: Vec<N> = self
            .observed
            .iter()
            .filter(|node| !wanted.contains(node))
            .copied()
            .collect();
        for node in departed {
            for kind in ObservationKind::ALL {
                host.unobserve(node, kind);
            }
            self.observed.remove(&node);
            trace!(?node, "unobserved");
        }

        for &child in children {
            self.observe(host, child);
        }
    }

    fn observe<H>(&mut self, host: &mut H, node: N)
    where
        H: Observers<Node = N>,
    {
        if !self.observed.insert(node) {
            return;
        }
        for kind in ObservationKind::ALL {
            host.observe(node, kind);
        }
        trace!(?node, "observed");
    }

    pub fn root(&self) -> Option<N> {
        self.root
    }

    pub fn is_observed(&self, node: N) -> bool {
        self.observed.contains(&node)
    }

    /// Number of observed elements (each holds one subscription per kind).
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }
}
