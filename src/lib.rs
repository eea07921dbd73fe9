pub mod error;
pub mod bitstreams;
pub mod utils;
pub mod properties;
pub mod ascii_graph;
pub mod coded_graph;

pub use error::{CodecError, GraphError};
pub use utils::EncodingType;
pub use properties::Properties;
pub use coded_graph::load_graph;

pub trait ImmutableGraph {
    type NodeT;

    fn num_nodes(&self) -> usize;
    fn num_arcs(&self) -> usize;
    fn outdegree(&self, x: Self::NodeT) -> Option<usize>;
    fn successors(&self, x: Self::NodeT) -> Result<Box<[Self::NodeT]>, GraphError>;
}
