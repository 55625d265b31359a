//! Graph traversal helpers

use std::collections::{HashSet, VecDeque};

/// Breadth-first search from `start` up to `max_depth` hops.
///
/// `neighbors` is asked for the adjacent ids of each visited node. Returns
/// every reached node (start nodes included) in visitation order, each once.
/// `max_depth == 0` returns just the start nodes.
pub fn bfs<F, I>(start: &[usize], max_depth: usize, mut neighbors: F) -> Vec<usize>
where
    F: FnMut(usize) -> I,
    I: IntoIterator<Item = usize>,
{
    let mut seen = HashSet::with_capacity(start.len());
    let mut queue = VecDeque::new();
    let mut result = Vec::new();

    for &node in start {
        if seen.insert(node) {
            queue.push_back((node, 0usize));
            result.push(node);
        }
    }

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for next in neighbors(node) {
            if seen.insert(next) {
                result.push(next);
                queue.push_back((next, depth + 1));
            }
        }
    }

    result
}
