//! Assemblers that turn a graph into another document format.

pub mod ideogram;
