//! Interpretation of structural-change batches.

use tracing::debug;

use crate::geometry::Rect;
use crate::host::{Layout, MutationRecord, NodeHandle, Styles};
use crate::keys::KeyAssigner;
use crate::store::RectStore;

/// Result of classifying one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<N> {
    /// Elements that received their first key in this batch.
    pub entering: Vec<N>,
    /// Entering elements whose baseline was synthesized from a sibling.
    pub synthesized: Vec<(N, Rect)>,
}

impl<N> Default for Classification<N> {
    fn default() -> Self {
        Self {
            entering: Vec::new(),
            synthesized: Vec::new(),
        }
    }
}

/// Tracks the current children sequence and decides the "before" geometry of
/// inserted elements.
#[derive(Debug, Clone)]
pub struct ChangeClassifier<N> {
    children: Vec<N>,
    child_count: usize,
}

impl<N> Default for ChangeClassifier<N> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            child_count: 0,
        }
    }
}

impl<N: NodeHandle> ChangeClassifier<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload the children sequence from the live tree.
    pub fn refresh<H>(&mut self, host: &H, root: N) -> &[N]
    where
        H: Layout<Node = N> + ?Sized,
    {
        self.children = host.tracked_elements(root);
        self.child_count = self.children.len();
        &self.children
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.child_count = 0;
    }

    /// Key newly inserted elements and seed their store entries.
    ///
    /// When the tracked count grew since the last batch, an inserted element
    /// with a keyed previous sibling gets a baseline flush against that
    /// sibling's right edge instead of its live rectangle. Elements that
    /// already had a key (reorders) keep their recorded geometry.
    pub fn classify<H>(
        &mut self,
        host: &mut H,
        keys: &mut KeyAssigner<N>,
        store: &mut RectStore,
        root: N,
        records: &[MutationRecord<N>],
    ) -> Classification<N>
    where
        H: Styles<Node = N>,
    {
        let live = host.tracked_elements(root);
        let grown = live.len() > self.child_count;
        let mut result = Classification::default();

        for record in records {
            for added in &record.added {
                let node = added.node;
                if host.bounding_rect(node).is_none() {
                    // Inserted and removed again within the batch.
                    continue;
                }

                let fresh = keys.key_of(node).is_none();
                let key = keys.assign(host, store, node);
                if !fresh {
                    continue;
                }
                result.entering.push(node);

                if !grown {
                    continue;
                }
                let Some(sibling_rect) = added
                    .previous_sibling
                    .and_then(|sibling| keys.key_of(sibling))
                    .and_then(|sibling_key| store.get(sibling_key))
                else {
                    continue;
                };
                let estimate = sibling_rect.right_of();
                store.set(key, estimate);
                result.synthesized.push((node, estimate));
            }
        }

        debug!(
            before = self.child_count,
            after = live.len(),
            entering = result.entering.len(),
            synthesized = result.synthesized.len(),
            "classified structural batch"
        );
        self.children = live;
        self.child_count = self.children.len();
        result
    }

    pub fn children(&self) -> &[N] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.child_count
    }
}
