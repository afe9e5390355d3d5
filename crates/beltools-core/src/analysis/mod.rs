//! Analyses run over BEL graphs with experimental data overlaid.

pub mod causalr;
pub mod concordance;
pub mod heat;
pub mod neurommsig;
pub mod rcr;
pub mod sst;
pub mod stability;
pub mod stats;
