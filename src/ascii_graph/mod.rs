use std::fs;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::{GraphError, ImmutableGraph};

/// A plain graph whose successor lists are kept sorted and without duplicates.
///
/// `graph_memory` holds all the successor lists one after the other; the list of node
/// *x* spans `graph_memory[offsets[x]..offsets[x + 1]]`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AsciiGraph {
    n: usize,
    m: usize,
    pub graph_memory: Vec<usize>,
    pub offsets: Vec<usize>,
}

impl ImmutableGraph for AsciiGraph {
    type NodeT = usize;

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.n
    }

    #[inline(always)]
    fn num_arcs(&self) -> usize {
        self.m
    }

    /// Returns the number of adjacent nodes of the given node (if in bounds).
    #[inline(always)]
    fn outdegree(&self, x: usize) -> Option<usize> {
        if x >= self.n {
            return None;
        }

        Some(self.offsets[x + 1] - self.offsets[x])
    }

    fn successors(&self, x: usize) -> Result<Box<[usize]>, GraphError> {
        Ok(self.successors_slice(x)?.into())
    }
}

impl AsciiGraph {
    /// Returns the sorted successors of `x` without copying them.
    #[inline(always)]
    pub fn successors_slice(&self, x: usize) -> Result<&[usize], GraphError> {
        if x >= self.n {
            return Err(GraphError::NodeOutOfRange { node: x, num_nodes: self.n });
        }

        Ok(&self.graph_memory[self.offsets[x]..self.offsets[x + 1]])
    }

    /// Iterates on `(node, successors)` pairs in node order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        (0..self.n).map(move |x| (x, &self.graph_memory[self.offsets[x]..self.offsets[x + 1]]))
    }
}

#[derive(Default)]
pub struct AsciiGraphBuilder {
    adjacency: Vec<Vec<usize>>,
    /// Upper bound on the number of nodes, if declared
    num_nodes: Option<usize>,
}

impl AsciiGraphBuilder {
    pub fn new() -> AsciiGraphBuilder {
        Self::default()
    }

    /// Rejects any node id that is not in `[0, num_nodes)`.
    pub fn set_num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = Some(num_nodes);

        self
    }

    /// Makes room for the nodes up to `node` included.
    fn grow_to(&mut self, node: usize) -> Result<(), GraphError> {
        let limit = self.num_nodes;
        let out_of_range = || GraphError::NodeOutOfRange { node, num_nodes: limit.unwrap_or(usize::MAX) };

        let needed = node.checked_add(1).ok_or_else(out_of_range)?;
        if limit.is_some_and(|n| needed > n) {
            return Err(out_of_range());
        }

        if self.adjacency.len() < needed {
            self.adjacency
                .try_reserve(needed - self.adjacency.len())
                .map_err(|_| out_of_range())?;
            self.adjacency.resize_with(needed, Vec::new);
        }

        Ok(())
    }

    /// Parses ASCII text containing, for each line, a node followed by the list of its successors.
    ///
    /// Fields are separated by tabs or spaces; empty lines are ignored. A node appearing only
    /// as a successor is still part of the graph, with no successors of its own. Node ids
    /// beyond [`Self::set_num_nodes()`], or too large to allocate, are a [`GraphError::Parse`].
    pub fn parse_ascii(mut self, data: &str) -> Result<Self, GraphError> {
        for (i, line) in data.lines().enumerate() {
            let mut node_list = line.split_whitespace();

            let node = match node_list.next() {
                Some(node) => parse_node(node, i + 1)?,
                None => continue,
            };

            let mut succs = node_list
                .map(|succ| parse_node(succ, i + 1))
                .collect::<Result<Vec<_>, _>>()?;

            let max_node = succs.iter().copied().fold(node, usize::max);
            self.grow_to(max_node)
                .map_err(|e| GraphError::Parse { line: i + 1, message: e.to_string() })?;

            self.adjacency[node].append(&mut succs);
        }

        Ok(self)
    }

    /// Loads the ASCII file at `path`, see [`Self::parse_ascii()`].
    pub fn load_ascii(self, path: &str) -> Result<Self, GraphError> {
        let data = fs::read_to_string(path)?;

        debug!(path, bytes = data.len(), "loading ascii graph");

        self.parse_ascii(&data)
    }

    /// Adds the arc `x -> y`.
    pub fn add_arc(mut self, x: usize, y: usize) -> Result<Self, GraphError> {
        self.grow_to(x.max(y))?;
        self.adjacency[x].push(y);

        Ok(self)
    }

    /// Constructs the AsciiGraph object, sorting and deduplicating every list.
    pub fn build(self) -> AsciiGraph {
        let n = self.adjacency.len();
        let mut graph_memory = Vec::new();
        let mut offsets = Vec::with_capacity(n + 1);

        offsets.push(0);
        for mut succs in self.adjacency {
            succs.sort_unstable();
            succs.dedup();

            graph_memory.append(&mut succs);
            offsets.push(graph_memory.len());
        }

        AsciiGraph {
            n,
            m: graph_memory.len(),
            graph_memory,
            offsets,
        }
    }
}

fn parse_node(s: &str, line: usize) -> Result<usize, GraphError> {
    s.parse().map_err(|_| GraphError::Parse { line, message: format!("invalid node {}", s) })
}
