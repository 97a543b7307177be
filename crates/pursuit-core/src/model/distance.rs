//! Shortest hop-count oracle over the environment graph.
//!
//! Every edge has unit weight, so a breadth-first search settles nodes in
//! non-decreasing distance order. Unreachable destinations report
//! [`Graph::unreachable_distance`], which compares greater than any real distance.

use super::graph::{Graph, NodeId};
use crate::config::unreachable_distance;
use std::collections::VecDeque;

impl Graph {
    /// Sentinel hop count standing in for "infinity".
    pub fn unreachable_distance(&self) -> u32 {
        unreachable_distance(self.node_count())
    }

    /// Minimum hop count from `source` to `dest`.
    pub fn distance(&self, source: NodeId, dest: NodeId) -> u32 {
        self.distance_excluding(source, dest, &[])
    }

    /// Minimum hop count from `source` to `dest` never entering a node in `excluded`.
    pub fn distance_excluding(&self, source: NodeId, dest: NodeId, excluded: &[NodeId]) -> u32 {
        let unreachable = self.unreachable_distance();
        let blocked = self.blocked_mask(excluded);
        if blocked[source] || blocked[dest] {
            return unreachable;
        }
        if source == dest {
            return 0;
        }

        let mut dist = vec![u32::MAX; self.node_count()];
        let mut fringe = VecDeque::new();
        dist[source] = 0;
        fringe.push_back(source);

        while let Some(current) = fringe.pop_front() {
            let next = dist[current] + 1;
            for &neighbor in self.neighbors(current) {
                if blocked[neighbor] || dist[neighbor] != u32::MAX {
                    continue;
                }
                if neighbor == dest {
                    return next;
                }
                dist[neighbor] = next;
                fringe.push_back(neighbor);
            }
        }

        unreachable
    }

    /// Hop counts from `source` to every node.
    ///
    /// On an undirected graph entry `i` is also the distance from `i` to `source`,
    /// which lets callers answer many "distance to X" queries with one search.
    pub fn distances_from(&self, source: NodeId) -> Vec<u32> {
        self.distances_from_excluding(source, &[])
    }

    pub fn distances_from_excluding(&self, source: NodeId, excluded: &[NodeId]) -> Vec<u32> {
        let unreachable = self.unreachable_distance();
        let blocked = self.blocked_mask(excluded);
        let mut dist = vec![unreachable; self.node_count()];
        if blocked[source] {
            return dist;
        }

        let mut seen = vec![false; self.node_count()];
        let mut fringe = VecDeque::new();
        dist[source] = 0;
        seen[source] = true;
        fringe.push_back(source);

        while let Some(current) = fringe.pop_front() {
            for &neighbor in self.neighbors(current) {
                if blocked[neighbor] || seen[neighbor] {
                    continue;
                }
                seen[neighbor] = true;
                dist[neighbor] = dist[current] + 1;
                fringe.push_back(neighbor);
            }
        }

        dist
    }

    fn blocked_mask(&self, excluded: &[NodeId]) -> Vec<bool> {
        let mut blocked = vec![false; self.node_count()];
        for &node in excluded {
            if let Some(slot) = blocked.get_mut(node) {
                *slot = true;
            }
        }
        blocked
    }
}
