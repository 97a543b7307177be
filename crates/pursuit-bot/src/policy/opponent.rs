//! Movement rules of the prey and the predator.

use pursuit_core::model::graph::{Graph, NodeId};
use rand::Rng;

/// Uniform choice among staying and every neighbor.
pub fn prey_move<R: Rng + ?Sized>(graph: &Graph, at: NodeId, rng: &mut R) -> NodeId {
    let neighbors = graph.neighbors(at);
    let pick = rng.gen_range(0..=neighbors.len());
    neighbors.get(pick).copied().unwrap_or(at)
}

/// Uniform choice among the neighbors closest to `target`.
pub fn predator_move<R: Rng + ?Sized>(
    graph: &Graph,
    at: NodeId,
    target: NodeId,
    rng: &mut R,
) -> NodeId {
    let to_target = graph.distances_from(target);
    let neighbors = graph.neighbors(at);
    let Some(nearest) = neighbors.iter().map(|&n| to_target[n]).min() else {
        return at;
    };
    let closest: Vec<NodeId> = neighbors
        .iter()
        .copied()
        .filter(|&n| to_target[n] == nearest)
        .collect();
    closest[rng.gen_range(0..closest.len())]
}

/// Uniform choice among the neighbors, ignoring the agent.
pub fn random_neighbor<R: Rng + ?Sized>(graph: &Graph, at: NodeId, rng: &mut R) -> NodeId {
    let neighbors = graph.neighbors(at);
    if neighbors.is_empty() {
        return at;
    }
    neighbors[rng.gen_range(0..neighbors.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn prey_stays_or_steps_uniformly() {
        let graph = Graph::ring(8);
        let mut rng = SmallRng::seed_from_u64(11);
        let mut counts = [0usize; 8];
        for _ in 0..3_000 {
            counts[prey_move(&graph, 4, &mut rng)] += 1;
        }
        for node in [3, 4, 5] {
            assert!((850..=1_150).contains(&counts[node]), "{counts:?}");
        }
        assert_eq!(counts.iter().sum::<usize>(), 3_000);
    }

    #[test]
    fn predator_steps_toward_target() {
        let graph = Graph::ring(10);
        let mut rng = SmallRng::seed_from_u64(12);
        for _ in 0..20 {
            assert_eq!(predator_move(&graph, 3, 0, &mut rng), 2);
        }
        let mut seen = [false; 10];
        for _ in 0..50 {
            seen[predator_move(&graph, 5, 0, &mut rng)] = true;
        }
        assert!(seen[4] && seen[6]);
    }

    #[test]
    fn random_neighbor_never_stays() {
        let graph = Graph::ring(6);
        let mut rng = SmallRng::seed_from_u64(13);
        for _ in 0..100 {
            let next = random_neighbor(&graph, 2, &mut rng);
            assert!(next == 1 || next == 3);
        }
    }
}
