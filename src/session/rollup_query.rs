use thiserror::Error;

/// Read access to the processed outputs of the rollup node.
pub trait RollupQuery {
    /// payloads of every notice emitted so far, oldest first
    fn notices(&self) -> impl Future<Output = Result<Vec<Vec<u8>>, QueryError>>;

    /// the notice produced by processing the given input
    fn notice(
        &self,
        input_index: u64,
    ) -> impl Future<Output = Result<Vec<u8>, QueryError>>;

    /// the diagnostic report the node emits instead of a notice when the
    /// input fails validation
    fn report(
        &self,
        input_index: u64,
    ) -> impl Future<Output = Result<Vec<u8>, QueryError>>;

    /// both output kinds for one input
    fn input_results(
        &self,
        input_index: u64,
    ) -> impl Future<Output = Result<InputResults, QueryError>>;
}

/// Everything the node produced for a single input.
#[derive(Debug, Clone, Default)]
pub struct InputResults {
    pub notices: Vec<Vec<u8>>,
    pub reports: Vec<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}
