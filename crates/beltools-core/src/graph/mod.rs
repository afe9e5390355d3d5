pub mod bel_graph;
pub mod io;
pub mod model;
pub mod summary;

pub use bel_graph::BelGraph;
pub use model::{parse_node, BelEdge, BelNode, Function, Relation};
