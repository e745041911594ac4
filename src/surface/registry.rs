//! Handle registry for surfaces backed by foreign nodes
//!
//! A browser element has no stable Rust identity, so the DOM surface hands
//! out [`ElementId`]s and keeps the node here. Nodes the host page dropped
//! are pruned, so the registry only ever holds what is still on the page
//! plus what the scheduler created itself.

use std::collections::HashMap;

use super::ElementId;

pub struct Registry<N> {
    next_id: u64,
    nodes: HashMap<ElementId, N>,
}

impl<N> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Registry<N> {
    pub fn new() -> Self {
        Self { next_id: 1, nodes: HashMap::new() }
    }

    pub fn insert(&mut self, node: N) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn remove(&mut self, id: ElementId) -> Option<N> {
        self.nodes.remove(&id)
    }

    /// Drop every node `live` rejects and return them, so an identity index
    /// kept beside the registry can forget them too.
    pub fn prune(&mut self, live: impl Fn(&N) -> bool) -> Vec<N> {
        let dead: Vec<ElementId> =
            self.nodes.iter().filter(|(_, n)| !live(n)).map(|(id, _)| *id).collect();
        dead.into_iter().filter_map(|id| self.nodes.remove(&id)).collect()
    }

    /// Forget everything. Ids are never reused.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Node {
        name: &'static str,
        connected: bool,
    }

    fn node(name: &'static str, connected: bool) -> Node {
        Node { name, connected }
    }

    #[test]
    fn detached_nodes_are_pruned() {
        let mut registry = Registry::new();
        let kept = registry.insert(node("canvas", true));
        let gone = registry.insert(node("old-card", false));

        let pruned = registry.prune(|n| n.connected);
        assert_eq!(pruned, vec![node("old-card", false)]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(kept).is_some());
        assert!(registry.get(gone).is_none());
    }

    #[test]
    fn rerendered_list_does_not_grow_registry() {
        let mut registry: Registry<Node> = Registry::new();
        for _ in 0..10 {
            // Host re-renders: the previous list is detached, a new one appears
            for n in registry.nodes.values_mut() {
                n.connected = false;
            }
            registry.prune(|n| n.connected);
            for _ in 0..500 {
                registry.insert(node("card", true));
            }
        }
        assert_eq!(registry.len(), 500);
    }

    #[test]
    fn ids_survive_clear_without_reuse() {
        let mut registry = Registry::new();
        let first = registry.insert(node("a", true));
        registry.clear();
        assert!(registry.is_empty());
        let second = registry.insert(node("b", true));
        assert_ne!(first, second);
        assert_eq!(registry.remove(second), Some(node("b", true)));
    }
}
