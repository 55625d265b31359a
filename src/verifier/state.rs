//! Shared VF2-family search state and the lazy match iterator.

use super::{labels_compatible, MatchGraph, Mapping};

const NONE: usize = usize::MAX;

/// Search plan produced by a [`SubgraphMatcher`](super::SubgraphMatcher).
///
/// `order` lists every query node once. `parent[i]`, when set, is a query
/// node that appears before `order[i]` and is adjacent to it: candidates
/// for `order[i]` are then limited to host neighbors of the parent's image.
/// `domain`, when set, is a row-major `query_n x host_n` table of allowed
/// pairs computed up front.
#[derive(Debug, Clone)]
pub struct MatchPlan {
    pub(crate) viable: bool,
    pub(crate) order: Vec<usize>,
    pub(crate) parent: Vec<Option<usize>>,
    pub(crate) domain: Option<Vec<bool>>,
}

impl MatchPlan {
    /// A plan that yields no matches without searching.
    pub(crate) fn rejected() -> Self {
        Self {
            viable: false,
            order: Vec::new(),
            parent: Vec::new(),
            domain: None,
        }
    }

    /// A plan over `order`, deriving each node's parent as its
    /// earliest-ordered neighbor.
    pub(crate) fn with_order(query: &MatchGraph, order: Vec<usize>, domain: Option<Vec<bool>>) -> Self {
        let mut position = vec![NONE; query.node_count()];
        for (i, &u) in order.iter().enumerate() {
            position[u] = i;
        }
        let parent = order
            .iter()
            .enumerate()
            .map(|(i, &u)| {
                query
                    .neighbors(u)
                    .iter()
                    .copied()
                    .filter(|&w| position[w] < i)
                    .min_by_key(|&w| position[w])
            })
            .collect();
        Self {
            viable: true,
            order,
            parent,
            domain,
        }
    }

    pub fn is_viable(&self) -> bool {
        self.viable
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

struct Frame {
    candidates: Vec<usize>,
    cursor: usize,
    chosen: Option<usize>,
}

/// Lazy, finite sequence of matches for one `(query, host)` pair.
///
/// Owns all per-search state (partial mapping, terminal counters, the
/// backtracking stack); nothing is shared with other searches.
pub struct Matches<'a> {
    query: &'a MatchGraph,
    host: &'a MatchGraph,
    plan: MatchPlan,
    /// query node -> host node, `NONE` when unmapped
    core_query: Vec<usize>,
    /// host node -> query node, `NONE` when unmapped
    core_host: Vec<usize>,
    /// number of mapped neighbors; an unmapped node with a non-zero count
    /// is in the terminal set
    mapped_nbrs_query: Vec<u32>,
    mapped_nbrs_host: Vec<u32>,
    stack: Vec<Frame>,
    started: bool,
    exhausted: bool,
    states_explored: u64,
}

impl<'a> Matches<'a> {
    pub fn new(query: &'a MatchGraph, host: &'a MatchGraph, plan: MatchPlan) -> Self {
        Self {
            query,
            host,
            core_query: vec![NONE; query.node_count()],
            core_host: vec![NONE; host.node_count()],
            mapped_nbrs_query: vec![0; query.node_count()],
            mapped_nbrs_host: vec![0; host.node_count()],
            stack: Vec::with_capacity(plan.order.len()),
            plan,
            started: false,
            exhausted: false,
            states_explored: 0,
        }
    }

    /// Number of candidate pairs that passed feasibility so far.
    pub fn states_explored(&self) -> u64 {
        self.states_explored
    }

    fn candidates(&self, depth: usize) -> Vec<usize> {
        match self.plan.parent[depth] {
            Some(parent) => self
                .host
                .neighbors(self.core_query[parent])
                .iter()
                .copied()
                .filter(|&v| self.core_host[v] == NONE)
                .collect(),
            None => (0..self.host.node_count())
                .filter(|&v| self.core_host[v] == NONE)
                .collect(),
        }
    }

    fn feasible(&self, u: usize, v: usize) -> bool {
        if self.core_host[v] != NONE {
            return false;
        }
        if let Some(domain) = &self.plan.domain {
            if !domain[u * self.host.node_count() + v] {
                return false;
            }
        } else if !labels_compatible(self.query, u, self.host, v)
            || self.query.degree(u) > self.host.degree(v)
        {
            return false;
        }

        // adjacency with the mapped part, and neighbor counts for look-ahead
        let mut query_terminal = 0;
        let mut query_unmapped = 0;
        for &w in self.query.neighbors(u) {
            let image = self.core_query[w];
            if image != NONE {
                if !self.host.has_edge(v, image) {
                    return false;
                }
            } else {
                query_unmapped += 1;
                if self.mapped_nbrs_query[w] > 0 {
                    query_terminal += 1;
                }
            }
        }

        let mut host_terminal = 0;
        let mut host_unmapped = 0;
        for &x in self.host.neighbors(v) {
            if self.core_host[x] == NONE {
                host_unmapped += 1;
                if self.mapped_nbrs_host[x] > 0 {
                    host_terminal += 1;
                }
            }
        }

        // the image of a terminal query neighbor is a terminal host neighbor
        query_terminal <= host_terminal && query_unmapped <= host_unmapped
    }

    fn push_pair(&mut self, u: usize, v: usize) {
        self.core_query[u] = v;
        self.core_host[v] = u;
        for &w in self.query.neighbors(u) {
            self.mapped_nbrs_query[w] += 1;
        }
        for &x in self.host.neighbors(v) {
            self.mapped_nbrs_host[x] += 1;
        }
    }

    fn pop_pair(&mut self, u: usize, v: usize) {
        for &w in self.query.neighbors(u) {
            self.mapped_nbrs_query[w] -= 1;
        }
        for &x in self.host.neighbors(v) {
            self.mapped_nbrs_host[x] -= 1;
        }
        self.core_query[u] = NONE;
        self.core_host[v] = NONE;
    }

    fn current_mapping(&self) -> Mapping {
        Mapping::new(self.core_query.clone())
    }
}

impl Iterator for Matches<'_> {
    type Item = Mapping;

    fn next(&mut self) -> Option<Mapping> {
        if self.exhausted {
            return None;
        }

        if !self.started {
            self.started = true;
            if !self.plan.viable {
                self.exhausted = true;
                return None;
            }
            if self.plan.order.is_empty() {
                self.exhausted = true;
                return Some(Mapping::new(Vec::new()));
            }
            let candidates = self.candidates(0);
            self.stack.push(Frame {
                candidates,
                cursor: 0,
                chosen: None,
            });
        }

        while let Some(top) = self.stack.len().checked_sub(1) {
            let u = self.plan.order[top];

            // undo the choice made at this depth before trying the next one
            if let Some(previous) = self.stack[top].chosen.take() {
                self.pop_pair(u, previous);
            }

            let mut next_choice = None;
            while self.stack[top].cursor < self.stack[top].candidates.len() {
                let v = self.stack[top].candidates[self.stack[top].cursor];
                self.stack[top].cursor += 1;
                if self.feasible(u, v) {
                    next_choice = Some(v);
                    break;
                }
            }

            let Some(v) = next_choice else {
                self.stack.pop();
                continue;
            };

            self.states_explored += 1;
            self.push_pair(u, v);
            self.stack[top].chosen = Some(v);

            if top + 1 == self.plan.order.len() {
                return Some(self.current_mapping());
            }
            let candidates = self.candidates(top + 1);
            self.stack.push(Frame {
                candidates,
                cursor: 0,
                chosen: None,
            });
        }

        self.exhausted = true;
        None
    }
}
