//! Breadth-first hop distances.

use std::collections::VecDeque;

use crate::graph::NodeId;

/// Marker for nodes not reached by the current search.
const UNREACHED: u32 = u32::MAX;

/// Reusable BFS scratch over a fixed adjacency list.
pub(crate) struct Bfs<'a> {
    adjacency: &'a [Vec<NodeId>],
    distance: Vec<u32>,
    queue: VecDeque<usize>,
}

impl<'a> Bfs<'a> {
    pub(crate) fn new(adjacency: &'a [Vec<NodeId>]) -> Self {
        Self {
            adjacency,
            distance: vec![UNREACHED; adjacency.len()],
            queue: VecDeque::with_capacity(adjacency.len()),
        }
    }

    /// Run a search from `source`, optionally stopping once `target` is reached.
    fn run(&mut self, source: usize, target: Option<usize>) {
        self.distance.fill(UNREACHED);
        self.queue.clear();
        if source >= self.adjacency.len() {
            return;
        }

        self.distance[source] = 0;
        self.queue.push_back(source);
        while let Some(current) = self.queue.pop_front() {
            if Some(current) == target {
                return;
            }
            let next = self.distance[current] + 1;
            for neighbor in &self.adjacency[current] {
                let n = neighbor.index();
                if self.distance[n] == UNREACHED {
                    self.distance[n] = next;
                    self.queue.push_back(n);
                }
            }
        }
    }

    /// Sum of hop distances from `source` to every reachable node, and the
    /// number of reachable nodes other than `source`.
    pub(crate) fn distance_sum(&mut self, source: NodeId) -> (u64, u64) {
        self.run(source.index(), None);
        self.distance
            .iter()
            .filter(|&&d| d != UNREACHED && d != 0)
            .fold((0, 0), |(sum, count), &d| (sum + d as u64, count + 1))
    }

    /// Hop count from `source` to `target`, None when unreachable.
    pub(crate) fn hops(&mut self, source: NodeId, target: NodeId) -> Option<u32> {
        if target.index() >= self.adjacency.len() {
            return None;
        }
        self.run(source.index(), Some(target.index()));
        let d = self.distance.get(target.index()).copied()?;
        (d != UNREACHED).then_some(d)
    }
}
