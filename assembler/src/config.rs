use crate::error::AssemblyError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parameters of the assembler itself. Fixed for the lifetime of one assembler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssemblyConfig {
    /// K-mer length. At most 32.
    pub k: usize,
    /// Contigs whose total k-mer weight is below this value are dropped.
    pub min_path_weight: u64,
    /// A subgraph is flushed once the frontier passes its last coordinate by more than this margin.
    /// The same margin is the positional tolerance when two windows share a k-mer.
    pub window_margin: usize,
    /// Largest expected fragment size of the library. Bounds read-pair placement.
    pub max_fragment_size: usize,
    /// Largest deletion or insertion searched for when only one anchor is found in the graph.
    pub max_indel_size: usize,
    /// Minimum exact match length of a second anchor found outside the graph.
    pub min_far_anchor: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            k: 25,
            min_path_weight: 1,
            window_margin: 50,
            max_fragment_size: 300,
            max_indel_size: 100,
            min_far_anchor: 8,
        }
    }
}

impl AssemblyConfig {
    pub fn new(k: usize, min_path_weight: u64, window_margin: usize, max_fragment_size: usize) -> Self {
        Self {
            k,
            min_path_weight,
            window_margin,
            max_fragment_size,
            ..Default::default()
        }
    }
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.k == 0 {
            return Err(AssemblyError::config("k", "should be positive"));
        }
        if 32 < self.k {
            return Err(AssemblyError::config("k", format!("is {} but at most 32 is supported", self.k)));
        }
        if self.min_far_anchor == 0 {
            return Err(AssemblyError::config("min_far_anchor", "should be positive"));
        }
        Ok(())
    }
    /// Length of the exact match required for a second anchor outside the graph.
    pub fn far_anchor_length(&self) -> usize {
        self.k.max(self.min_far_anchor)
    }
}

/// Process-wide settings, built once at start up and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub assembly: AssemblyConfig,
    /// Verify the graph structure after every incorporated evidence. Slow.
    pub sanity_check_graph: bool,
    /// Verify every anchor of every assembly against the reference before it is returned.
    pub sanity_check_contigs: bool,
    /// Use the native aligner if it was compiled in.
    pub native_aligner: bool,
    /// Breakend sequences shorter than this are not realigned.
    pub min_realign_length: usize,
    /// Realignments with more edits than this fraction of the breakend length are dropped.
    pub max_realign_error: f64,
    /// Write one sorted file per reference instead of one per genome.
    pub per_reference_output: bool,
    pub threads: usize,
    /// Directory for graph snapshots and assembly metrics. Nothing is written if `None`.
    pub diagnostics: Option<PathBuf>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            assembly: AssemblyConfig::default(),
            sanity_check_graph: false,
            sanity_check_contigs: false,
            native_aligner: true,
            min_realign_length: 20,
            max_realign_error: 0.1,
            per_reference_output: false,
            threads: 1,
            diagnostics: None,
        }
    }
}

impl ProcessingConfig {
    pub fn new(assembly: AssemblyConfig) -> Self {
        Self {
            assembly,
            ..Default::default()
        }
    }
    pub fn validate(&self) -> Result<(), AssemblyError> {
        self.assembly.validate()?;
        if self.threads == 0 {
            return Err(AssemblyError::config("threads", "should be positive"));
        }
        if !(0f64..=1f64).contains(&self.max_realign_error) {
            return Err(AssemblyError::config("max_realign_error", "should be in [0,1]"));
        }
        Ok(())
    }
}
