//! Undirected environment graph: a ring augmented with short random chords.

use super::entity::Entity;
use super::occupancy::OccupantMask;
use crate::config::GameConfig;
use rand::Rng;

pub type NodeId = usize;

#[derive(Debug, Clone, Default)]
pub struct Node {
    neighbors: Vec<NodeId>,
    occupants: OccupantMask,
}

impl Node {
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub fn occupants(&self) -> OccupantMask {
        self.occupants
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Nodes without any edges.
    pub fn empty(node_count: usize) -> Self {
        Self {
            nodes: vec![Node::default(); node_count],
        }
    }

    /// Ring `0 - 1 - ... - (n-1) - 0`.
    pub fn ring(node_count: usize) -> Self {
        let mut graph = Self::empty(node_count);
        for index in 0..node_count {
            graph.add_edge(index, (index + 1) % node_count);
        }
        graph
    }

    /// Builds the ring and then tries one chord per node below the degree cap.
    ///
    /// The chord spans `2..=max_chord_length` hops forward or backward. When both
    /// endpoints are still below the cap one is picked uniformly; otherwise the
    /// eligible one is used, or the node is skipped.
    pub fn generate<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let n = config.node_count;
        let mut graph = Self::ring(n);

        for src in 0..n {
            if graph.degree(src) >= config.max_degree {
                continue;
            }

            let step = rng.gen_range(2..=config.max_chord_length) % n;
            let forward = (src + step) % n;
            let backward = (src + n - step) % n;

            let forward_ok = graph.accepts_chord(src, forward, config.max_degree);
            let backward_ok = graph.accepts_chord(src, backward, config.max_degree);

            let dest = match (forward_ok, backward_ok) {
                (true, true) => {
                    if rng.gen_bool(0.5) {
                        forward
                    } else {
                        backward
                    }
                }
                (true, false) => forward,
                (false, true) => backward,
                (false, false) => continue,
            };

            graph.add_edge(src, dest);
        }

        graph
    }

    fn accepts_chord(&self, src: NodeId, dest: NodeId, max_degree: usize) -> bool {
        dest != src && self.degree(dest) < max_degree && !self.has_edge(src, dest)
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.has_edge(a, b) {
            return;
        }
        self.nodes[a].neighbors.push(b);
        self.nodes[b].neighbors.push(a);
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes[a].neighbors.contains(&b)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, node: NodeId) -> &Node {
        &self.nodes[node]
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].neighbors
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.nodes[node].neighbors.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node < self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Owned copy of the adjacency lists, for snapshots.
    pub fn adjacency(&self) -> Vec<Vec<NodeId>> {
        self.nodes.iter().map(|node| node.neighbors.clone()).collect()
    }

    pub fn occupants(&self, node: NodeId) -> OccupantMask {
        self.nodes[node].occupants
    }

    pub fn is_occupied_by(&self, node: NodeId, entity: Entity) -> bool {
        self.nodes[node].occupants.contains(entity)
    }

    pub fn place(&mut self, entity: Entity, node: NodeId) {
        let slot = &mut self.nodes[node].occupants;
        *slot = slot.with(entity);
    }

    pub fn vacate(&mut self, entity: Entity, node: NodeId) {
        let slot = &mut self.nodes[node].occupants;
        *slot = slot.without(entity);
    }

    pub fn relocate(&mut self, entity: Entity, from: NodeId, to: NodeId) {
        self.vacate(entity, from);
        self.place(entity, to);
    }

    /// Removes every occupancy flag, keeping the edges.
    pub fn clear_occupants(&mut self) {
        for node in &mut self.nodes {
            node.occupants = OccupantMask::EMPTY;
        }
    }
}
