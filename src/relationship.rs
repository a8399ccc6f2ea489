//! Relationship Manager
//!
//! Symmetric, typed adjacency between entities, stored as an undirected
//! petgraph graph with a `EntityKey -> NodeIndex` index. Edges are added at
//! most once per pair, so associating the same pair again is a no-op.
//!
//! FAQ "see also" links may name articles that have not been loaded yet;
//! those are parked as pending pairs and resolved in one sweep after loading.
//!
//! The manager is filled during corpus initialization and read-only
//! afterwards; borrowed query results keep it from being mutated while
//! consumers iterate.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::debug;

use crate::registry::{EntityKey, EntityKind};

#[derive(Debug, Clone, Default)]
pub struct RelationshipManager {
    graph: UnGraph<EntityKey, ()>,
    node_indices: HashMap<EntityKey, NodeIndex>,
    pending_faqs: Vec<(String, String)>,
}

impl RelationshipManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, key: &EntityKey) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(key) {
            return idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.node_indices.insert(key.clone(), idx);
        idx
    }

    /// Record `b` as related to `a` and `a` as related to `b`
    pub fn associate(&mut self, a: &EntityKey, b: &EntityKey) {
        let from = self.node(a);
        let to = self.node(b);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Entities of `kind` related to `key`, in association order
    pub fn related(&self, key: &EntityKey, kind: EntityKind) -> Vec<&EntityKey> {
        let Some(&idx) = self.node_indices.get(key) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self.graph.edges(idx).collect();
        edges.sort_by_key(|edge| edge.id());

        let mut related: Vec<&EntityKey> = Vec::new();
        for edge in edges {
            let other = if edge.source() == idx { edge.target() } else { edge.source() };
            let other_key = &self.graph[other];
            if other_key.kind == kind && !related.contains(&other_key) {
                related.push(other_key);
            }
        }
        related
    }

    /// Related entities ordered by `sort_key`; ties keep association order
    pub fn related_sorted_by<K, F>(&self, key: &EntityKey, kind: EntityKind, sort_key: F) -> Vec<&EntityKey>
    where
        K: Ord,
        F: Fn(&EntityKey) -> K,
    {
        let mut related = self.related(key, kind);
        related.sort_by_key(|other| sort_key(other));
        related
    }

    pub fn has_related(&self, key: &EntityKey, kind: EntityKind) -> bool {
        !self.related(key, kind).is_empty()
    }

    /// Park a FAQ pair whose members may not exist yet
    pub fn add_unresolved_faq_pair(&mut self, first: &str, second: &str) {
        let pair = (first.to_string(), second.to_string());
        let mirrored = (second.to_string(), first.to_string());
        if !self.pending_faqs.contains(&pair) && !self.pending_faqs.contains(&mirrored) {
            self.pending_faqs.push(pair);
        }
    }

    pub fn pending_faq_pairs(&self) -> &[(String, String)] {
        &self.pending_faqs
    }

    /// Associate every pending pair whose FAQs both exist; drop the rest.
    ///
    /// Returns the number of pairs associated.
    pub fn resolve_faqs(&mut self, exists: impl Fn(&str) -> bool) -> usize {
        let pending = std::mem::take(&mut self.pending_faqs);
        let mut resolved = 0;
        for (first, second) in pending {
            if exists(&first) && exists(&second) {
                self.associate(
                    &EntityKey::new(EntityKind::Faq, first),
                    &EntityKey::new(EntityKind::Faq, second),
                );
                resolved += 1;
            } else {
                debug!(%first, %second, "dropping FAQ link to unknown article");
            }
        }
        resolved
    }

    /// Every association as an ordered pair, sorted
    pub fn pairs(&self) -> Vec<(&EntityKey, &EntityKey)> {
        let mut pairs: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| {
                let a = &self.graph[edge.source()];
                let b = &self.graph[edge.target()];
                if a <= b { (a, b) } else { (b, a) }
            })
            .collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

impl PartialEq for RelationshipManager {
    fn eq(&self, other: &Self) -> bool {
        self.pairs() == other.pairs() && self.pending_faqs == other.pending_faqs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(kind: EntityKind, id: &str) -> EntityKey {
        EntityKey::new(kind, id)
    }

    #[test]
    fn test_associate_is_symmetric() {
        let mut rel = RelationshipManager::new();
        let gl = key(EntityKind::Guideline, "gl-text-alt");
        let check = key(EntityKind::Check, "0001");
        rel.associate(&gl, &check);

        assert_eq!(rel.related(&gl, EntityKind::Check), vec![&check]);
        assert_eq!(rel.related(&check, EntityKind::Guideline), vec![&gl]);
        assert!(rel.related(&gl, EntityKind::Faq).is_empty());
    }

    #[test]
    fn test_associate_is_idempotent() {
        let mut rel = RelationshipManager::new();
        let gl = key(EntityKind::Guideline, "gl-text-alt");
        let check = key(EntityKind::Check, "0001");
        rel.associate(&gl, &check);
        rel.associate(&gl, &check);
        rel.associate(&check, &gl);

        assert_eq!(rel.related(&gl, EntityKind::Check).len(), 1);
        assert_eq!(rel.related(&check, EntityKind::Guideline).len(), 1);
        assert_eq!(rel.len(), 1);
    }

    #[test]
    fn test_related_of_unknown_entity_is_empty() {
        let rel = RelationshipManager::new();
        assert!(rel.related(&key(EntityKind::Faq, "p0001"), EntityKind::Faq).is_empty());
    }

    #[test]
    fn test_related_keeps_association_order() {
        let mut rel = RelationshipManager::new();
        let gl = key(EntityKind::Guideline, "gl");
        for id in ["0003", "0001", "0002"] {
            rel.associate(&gl, &key(EntityKind::Check, id));
        }
        let ids: Vec<_> = rel.related(&gl, EntityKind::Check).iter().map(|k| k.id.as_str()).collect();
        assert_eq!(ids, ["0003", "0001", "0002"]);

        let sorted: Vec<_> = rel
            .related_sorted_by(&gl, EntityKind::Check, |k| k.id.clone())
            .iter()
            .map(|k| k.id.as_str())
            .collect();
        assert_eq!(sorted, ["0001", "0002", "0003"]);
    }

    #[test]
    fn test_pending_faq_pairs_resolve_symmetrically() {
        let mut rel = RelationshipManager::new();
        rel.add_unresolved_faq_pair("p0009", "d0001");
        rel.add_unresolved_faq_pair("d0001", "p0009");
        assert_eq!(rel.pending_faq_pairs().len(), 1);

        let resolved = rel.resolve_faqs(|id| id == "p0009" || id == "d0001");
        assert_eq!(resolved, 1);

        let p = key(EntityKind::Faq, "p0009");
        let d = key(EntityKind::Faq, "d0001");
        assert_eq!(rel.related(&p, EntityKind::Faq), vec![&d]);
        assert_eq!(rel.related(&d, EntityKind::Faq), vec![&p]);
        assert!(rel.pending_faq_pairs().is_empty());
    }

    #[test]
    fn test_pending_pair_with_missing_faq_is_dropped() {
        let mut rel = RelationshipManager::new();
        rel.add_unresolved_faq_pair("p0001", "p9999");
        assert_eq!(rel.resolve_faqs(|id| id == "p0001"), 0);
        assert!(rel.is_empty());
        assert!(rel.pending_faq_pairs().is_empty());
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a_key = key(EntityKind::Guideline, "a");
        let b_key = key(EntityKind::Check, "b");
        let c_key = key(EntityKind::Faq, "c");

        let mut first = RelationshipManager::new();
        first.associate(&a_key, &b_key);
        first.associate(&b_key, &c_key);

        let mut second = RelationshipManager::new();
        second.associate(&c_key, &b_key);
        second.associate(&b_key, &a_key);

        assert_eq!(first, second);
    }
}
