//! beltools core: analysis engine for BEL knowledge graphs.
//!
//! This crate contains the graph model and node-link JSON I/O, graph
//! selection and mutation, candidate mechanism generation, the analyses
//! (heat diffusion, reverse causal reasoning, CausalR, concordance,
//! NeuroMMSig, spanning-tree sampling, stability motifs), the ideogram
//! assembler and the transformation pipeline.

pub mod analysis;
pub mod assembler;
pub mod config;
pub mod error;
pub mod filters;
pub mod generation;
pub mod graph;
pub mod mutation;
pub mod output;
pub mod pipeline;
pub mod selection;

pub use error::{BelError, Result};
pub use graph::{BelEdge, BelGraph, BelNode, Function, Relation};
