use thiserror::Error;

/// Every fatal condition of the assembler and its collaborators.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Evidence {id} at {reference_index}:{position} is out of order (current frontier {frontier_reference}:{frontier}). Evidence must be sorted by reference and start position")]
    OutOfOrder {
        id: String,
        reference_index: usize,
        position: usize,
        frontier_reference: usize,
        frontier: usize,
    },
    #[error("Contract violation: {message}")]
    ContractViolation { message: String },
    #[error("Invalid configuration: {field} {reason}")]
    Config { field: String, reason: String },
    #[error("Sanity check failed: {message}")]
    SanityCheck { message: String },
    #[error("Unable to decode realignment read name {name}")]
    Encoding { name: String },
    #[error("Realigned records are out of order: {name} follows {previous}. The realignment output must be sorted in the order the sequences were exported")]
    RealignmentOrder { name: String, previous: String },
    #[error("Unable to find realignment record for {name}. This is likely due to either a) alignment not completed successfully or b) chosen aligner writing records out of order. The aligner is required to write records in same order as the input fastq")]
    MissingRealignment { name: String },
    #[error("{stage} not completed. Unable to process {path}")]
    Prerequisite { stage: String, path: String },
    #[error("Unable to {stage}: {source}")]
    Persist {
        stage: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AssemblyError {
    pub fn contract(message: impl Into<String>) -> Self {
        AssemblyError::ContractViolation {
            message: message.into(),
        }
    }
    pub fn config(field: &str, reason: impl Into<String>) -> Self {
        AssemblyError::Config {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<AssemblyError> for std::io::Error {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::Io(err) => err,
            err => std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
        }
    }
}
