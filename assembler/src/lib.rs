//! Online breakend assembler.
//!
//! Evidence (soft-clipped reads and anomalous read pairs) is folded, in coordinate order,
//! into one positional de Bruijn graph per breakend direction. Connected components are flushed as soon as
//! no later evidence can reach them, walked into a contig, and classified into a single breakend or a small indel.
//! The remaining modules are the collaborators of the assembler: the gapped aligner, the realignment
//! correlation protocol, the annotation step, the sorted sink, and the optional diagnostics.
pub mod alignment;
pub mod annotate;
pub mod assembler;
pub mod breakpoint;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod graph;
pub mod kmer;
pub mod path;
pub mod realign;
pub mod reference;
pub mod seq;
pub mod sink;
pub mod subgraph;
#[macro_use]
extern crate log;

pub use assembler::{sort_evidence, DeBruijnSubgraphAssembler};
pub use config::{AssemblyConfig, ProcessingConfig};
pub use error::AssemblyError;
pub use reference::{InMemoryReference, ReferenceLookup};
