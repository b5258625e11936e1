use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("model error: {0}")]
    Model(#[from] sr_model::ModelError),
    #[error("tensor error: {0}")]
    Tensor(#[from] sr_tensor::TensorError),
    #[error("source text produced no tokens")]
    EmptySource,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
