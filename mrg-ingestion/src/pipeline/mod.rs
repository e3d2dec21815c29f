use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, TryStreamExt};
use mrg_client::StoreError;

use crate::transform::CoercionWarning;

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
    /// Sheet row the payload was read from.
    pub row: usize,
    pub warnings: Vec<CoercionWarning>,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, row: usize) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
            row,
            warnings: Vec::new(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    type Output: Send;

    async fn run<S>(&self, input: S) -> Result<Self::Output, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    /// Applied in order; each keeps the payload type.
    pub transforms: Vec<Arc<dyn Transform<T, T> + Send + Sync>>,
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<K::Output, PipelineError> {
        let mut stream = self.source.stream().await;

        // Upstream errors skip the remaining transforms and reach the sink.
        for t in self.transforms {
            stream = Box::pin(stream.and_then(move |env| {
                let t = Arc::clone(&t);
                async move { t.apply(env).await }
            }));
        }

        self.sink.run(stream).await
    }
}
