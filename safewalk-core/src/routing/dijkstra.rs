use std::{cmp::Ordering, collections::BinaryHeap};

use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::CityGraph;

use super::RouteMode;

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

// Costs are finite and non-negative by graph invariant, so total_cmp is a
// genuine total order here.
impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) struct SearchTree {
    /// Best known cumulative cost per reached node
    pub(crate) distances: HashMap<NodeIndex, f64>,
    /// Node and street over which each reached node was first settled
    pub(crate) predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
}

/// Dijkstra's algorithm over the street graph under the selected cost mode.
///
/// Streets are expanded in both directions. When `ada_required` is set,
/// non-accessible streets are excluded from the induced subgraph entirely.
/// Relaxation uses strict improvement, so ties in cumulative cost keep the
/// first-discovered predecessor and path selection is deterministic for a
/// fixed adjacency ordering. Terminates early once `target` is popped with a
/// finalized cost.
pub(crate) fn shortest_path_tree(
    graph: &CityGraph,
    start: NodeIndex,
    target: Option<NodeIndex>,
    mode: RouteMode,
    ada_required: bool,
) -> SearchTree {
    let estimated_nodes = graph.node_count().min(1000);
    let mut distances: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> =
        HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if Some(node) == target {
            break;
        }

        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        for edge in graph.graph.edges(node) {
            let street = edge.weight();
            if ada_required && !street.is_accessible {
                continue;
            }
            // Undirected expansion: step to whichever endpoint isn't `node`.
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let next_cost = cost + mode.edge_cost(street);

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessors.insert(next, (node, edge.id()));
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessors.insert(next, (node, edge.id()));
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    SearchTree {
        distances,
        predecessors,
    }
}
