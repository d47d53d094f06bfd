pub mod evaluation;

pub use evaluation::{EvaluationApi, EvaluationClient, UpstreamError};

#[cfg(test)]
pub use evaluation::MockEvaluationApi;
