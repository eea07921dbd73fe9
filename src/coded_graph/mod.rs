use std::path::Path;

use sucds::mii_sequences::{EliasFano, EliasFanoBuilder};
use tracing::{debug, info};

use crate::{CodecError, EncodingType, GraphError, ImmutableGraph, Properties};
use crate::ascii_graph::{AsciiGraph, AsciiGraphBuilder};
use crate::bitstreams::{BinaryReader, BinaryWriter, BitBuffer, DEFAULT_MAX_UNARY_LENGTH};
use crate::utils::{int2nat, nat2int, encodings::{read_with, write_with, len_with}};

/// An immutable graph whose successor lists are stored as universal codes in one bit buffer.
///
/// The list of node *x* is its outdegree, followed (if non-empty) by the first successor
/// as `int2nat(s0 - x)` and by the gaps `s[i] - s[i - 1] - 1` of the others. The bit offset
/// at which each list starts is kept in an Elias-Fano sequence of `n + 1` entries, the last
/// one being the total length.
pub struct CodedGraph {
    n: usize,
    m: usize,
    graph_memory: BitBuffer,
    offsets: EliasFano,
    zeta_k: Option<u64>,
    max_unary_length: u64,
    outdegree_coding: EncodingType,
    residual_coding: EncodingType,
}

impl ImmutableGraph for CodedGraph {
    type NodeT = usize;

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.n
    }

    #[inline(always)]
    fn num_arcs(&self) -> usize {
        self.m
    }

    /// Decodes just the outdegree of `x`.
    ///
    /// Returns `None` both when `x` is out of range and when the outdegree cannot be
    /// decoded; [`Self::successors()`] tells the two apart.
    fn outdegree(&self, x: usize) -> Option<usize> {
        if x >= self.n {
            return None;
        }

        let mut ibs = self.reader_at(x).ok()?;
        self.read_outdegree(&mut ibs).ok()
    }

    fn successors(&self, x: usize) -> Result<Box<[usize]>, GraphError> {
        if x >= self.n {
            return Err(GraphError::NodeOutOfRange { node: x, num_nodes: self.n });
        }

        let mut ibs = self.reader_at(x)?;
        let mut succs = Vec::new();
        self.decode_list(x, &mut ibs, &mut succs)?;

        Ok(succs.into_boxed_slice())
    }
}

impl CodedGraph {
    /// Returns a sequential iterator over the nodes of the graph.
    pub fn iter(&self) -> CodedGraphNodeIterator<'_> {
        CodedGraphNodeIterator {
            graph: self,
            ibs: self.reader(),
            curr: 0,
            successors: Vec::new(),
        }
    }

    /// The number of bits used by all the successor lists.
    pub fn graph_bits(&self) -> u64 {
        self.offset(self.n)
    }

    /// The bit offset at which the list of `x` starts; `x` may be `n`.
    #[inline(always)]
    pub fn offset(&self, x: usize) -> u64 {
        self.offsets.select(x).unwrap_or_default() as u64
    }

    pub fn outdegree_coding(&self) -> EncodingType {
        self.outdegree_coding
    }

    pub fn residual_coding(&self) -> EncodingType {
        self.residual_coding
    }

    pub fn zeta_k(&self) -> Option<u64> {
        self.zeta_k
    }

    /// Describes the graph with the properties needed to rebuild it.
    pub fn properties(&self) -> Properties {
        Properties {
            nodes: self.n,
            arcs: self.m,
            zeta_k: self.zeta_k,
            max_unary_length: self.max_unary_length,
            outdegree_coding: self.outdegree_coding,
            residual_coding: self.residual_coding,
        }
    }

    fn reader(&self) -> BinaryReader<'_> {
        let mut ibs = BinaryReader::from_buffer(&self.graph_memory);
        ibs.set_max_unary_length(self.max_unary_length);
        ibs
    }

    fn reader_at(&self, x: usize) -> Result<BinaryReader<'_>, GraphError> {
        let mut ibs = self.reader();
        ibs.seek(self.offset(x))?;
        Ok(ibs)
    }

    #[inline(always)]
    fn read_outdegree(&self, ibs: &mut BinaryReader<'_>) -> Result<usize, GraphError> {
        Ok(read_with(self.outdegree_coding, ibs, self.zeta_k)? as usize)
    }

    #[inline(always)]
    fn read_residual(&self, ibs: &mut BinaryReader<'_>) -> Result<u64, GraphError> {
        Ok(read_with(self.residual_coding, ibs, self.zeta_k)?)
    }

    /// Decodes the successor list of `x` starting at the current position of `ibs`.
    fn decode_list(&self, x: usize, ibs: &mut BinaryReader<'_>, succs: &mut Vec<usize>) -> Result<(), GraphError> {
        succs.clear();

        let d = self.read_outdegree(ibs)?;
        if d == 0 {
            return Ok(());
        }
        if d > self.n {
            return Err(GraphError::Codec(CodecError::InvalidArgument(
                format!("node {} claims {} successors in a graph of {} nodes", x, d, self.n)
            )));
        }

        succs.reserve(d);

        let mut prev = x as i64 + nat2int(self.read_residual(ibs)?);
        succs.push(self.check_node(prev)?);

        for _ in 1..d {
            prev += self.read_residual(ibs)? as i64 + 1;
            succs.push(self.check_node(prev)?);
        }

        Ok(())
    }

    #[inline(always)]
    fn check_node(&self, y: i64) -> Result<usize, GraphError> {
        if y < 0 || y as usize >= self.n {
            return Err(GraphError::NodeOutOfRange { node: y.max(0) as usize, num_nodes: self.n });
        }
        Ok(y as usize)
    }
}

/// Walks the nodes of a [`CodedGraph`] in order, decoding each list with a single reader.
///
/// After `next()` returns a node, [`Self::outdegree()`] and [`Self::successor_array()`]
/// describe that node.
pub struct CodedGraphNodeIterator<'a> {
    graph: &'a CodedGraph,
    ibs: BinaryReader<'a>,
    // The index of the next node
    curr: usize,
    successors: Vec<usize>,
}

impl<'a> Iterator for CodedGraphNodeIterator<'a> {
    type Item = Result<usize, GraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }

        let x = self.curr;
        self.curr += 1;

        match self.graph.decode_list(x, &mut self.ibs, &mut self.successors) {
            Ok(()) => Some(Ok(x)),
            Err(e) => {
                // Stop at the first corrupt list
                self.curr = self.graph.n;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.graph.n - self.curr;
        (left, Some(left))
    }
}

impl<'a> CodedGraphNodeIterator<'a> {
    #[inline(always)]
    pub fn has_next(&self) -> bool {
        self.curr < self.graph.n
    }

    #[inline(always)]
    pub fn outdegree(&self) -> usize {
        self.successors.len()
    }

    #[inline(always)]
    pub fn successor_array(&self) -> &[usize] {
        &self.successors
    }
}

pub struct CodedGraphBuilder {
    zeta_k: Option<u64>,
    max_unary_length: u64,
    outdegree_coding: EncodingType,
    residual_coding: EncodingType,
}

impl Default for CodedGraphBuilder {
    fn default() -> Self {
        Self {
            zeta_k: Some(3),
            max_unary_length: DEFAULT_MAX_UNARY_LENGTH,
            outdegree_coding: EncodingType::GAMMA,
            residual_coding: EncodingType::ZETA,
        }
    }
}

impl CodedGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes codes and parameters from `props`.
    pub fn load_properties(self, props: &Properties) -> Self {
        self.set_zeta(props.zeta_k)
            .set_max_unary_length(props.max_unary_length)
            .set_outdegree_coding(props.outdegree_coding)
            .set_residual_coding(props.residual_coding)
    }

    pub fn set_zeta(mut self, zk: Option<u64>) -> Self {
        self.zeta_k = zk;

        self
    }

    pub fn set_max_unary_length(mut self, max_unary_length: u64) -> Self {
        self.max_unary_length = max_unary_length;

        self
    }

    pub fn set_outdegree_coding(mut self, coding: EncodingType) -> Self {
        self.outdegree_coding = coding;

        self
    }

    pub fn set_residual_coding(mut self, coding: EncodingType) -> Self {
        self.residual_coding = coding;

        self
    }

    /// Yields the naturals written for the list of `x`, in order.
    fn list_values<'b>(x: usize, succs: &'b [usize]) -> impl Iterator<Item = (bool, u64)> + 'b {
        let first = succs.first().map(|&s0| (false, int2nat(s0 as i64 - x as i64)));
        let gaps = succs.windows(2).map(|w| (false, (w[1] - w[0] - 1) as u64));

        std::iter::once((true, succs.len() as u64)).chain(first).chain(gaps)
    }

    /// Compresses `plain_graph`.
    ///
    /// The exact size of the encoding is computed first, so that the buffer is allocated once.
    /// Unary values longer than the configured maximum fail with [`CodecError::CodeTooLong`],
    /// since the graph readers would refuse them.
    pub fn build(self, plain_graph: &AsciiGraph) -> Result<CodedGraph, GraphError> {
        let n = plain_graph.num_nodes();
        let coding_of = |is_outdegree: bool| if is_outdegree {self.outdegree_coding} else {self.residual_coding};

        let mut total_bits = 0u64;
        for (x, succs) in plain_graph.iter() {
            for (is_outdegree, v) in Self::list_values(x, succs) {
                let coding = coding_of(is_outdegree);
                if coding == EncodingType::UNARY && v > self.max_unary_length {
                    return Err(CodecError::CodeTooLong { position: total_bits, limit: self.max_unary_length }.into());
                }
                total_bits += len_with(coding, v, self.zeta_k)?;
            }
        }

        let mut graph_memory = BitBuffer::with_capacity_bits(total_bits);
        let mut efb = EliasFanoBuilder::new(total_bits as usize + 1, n + 1)
            .map_err(|e| GraphError::Offsets(e.to_string()))?;

        {
            let mut graph_obs = BinaryWriter::new(&mut graph_memory);

            for (x, succs) in plain_graph.iter() {
                efb.push(graph_obs.position() as usize).map_err(|e| GraphError::Offsets(e.to_string()))?;

                for (is_outdegree, v) in Self::list_values(x, succs) {
                    write_with(coding_of(is_outdegree), &mut graph_obs, v, self.zeta_k)?;
                }
            }

            efb.push(graph_obs.position() as usize).map_err(|e| GraphError::Offsets(e.to_string()))?;
            graph_obs.flush()?;
        }

        debug!(
            nodes = n,
            arcs = plain_graph.num_arcs(),
            bits = total_bits,
            outdegree_coding = %self.outdegree_coding,
            residual_coding = %self.residual_coding,
            "compressed graph"
        );

        Ok(CodedGraph {
            n,
            m: plain_graph.num_arcs(),
            graph_memory,
            offsets: efb.build(),
            zeta_k: self.zeta_k,
            max_unary_length: self.max_unary_length,
            outdegree_coding: self.outdegree_coding,
            residual_coding: self.residual_coding,
        })
    }
}

/// Loads the graph `basename`.
///
/// Successor lists are read from `<basename>.graph.txt` (see
/// [`AsciiGraphBuilder::parse_ascii()`]); codes and parameters from the optional
/// `<basename>.properties`. If the properties declare `nodes` or `arcs`, they must match
/// the loaded graph.
pub fn load_graph(basename: &str) -> Result<CodedGraph, GraphError> {
    let props = Properties::load_or_default(basename)?;

    let path = format!("{}.graph.txt", basename);
    if !Path::new(&path).exists() {
        return Err(GraphError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("could not find {}", path),
        )));
    }

    let mut builder = AsciiGraphBuilder::new();
    if props.nodes != 0 {
        builder = builder.set_num_nodes(props.nodes);
    }
    let plain_graph = builder.load_ascii(&path)?.build();

    if props.nodes != 0 && props.nodes != plain_graph.num_nodes() {
        return Err(GraphError::Properties(format!(
            "properties declare {} nodes, the graph has {}", props.nodes, plain_graph.num_nodes()
        )));
    }
    if props.arcs != 0 && props.arcs != plain_graph.num_arcs() {
        return Err(GraphError::Properties(format!(
            "properties declare {} arcs, the graph has {}", props.arcs, plain_graph.num_arcs()
        )));
    }

    let graph = CodedGraphBuilder::new()
        .load_properties(&props)
        .build(&plain_graph)?;

    info!(
        basename,
        nodes = graph.num_nodes(),
        arcs = graph.num_arcs(),
        bits = graph.graph_bits(),
        "loaded graph"
    );

    Ok(graph)
}
