//! Replicate Adapter - 预测传输实现

mod http_client;
mod scripted_transport;

pub use http_client::{ReplicateHttpClient, ReplicateHttpClientConfig};
pub use scripted_transport::{RecordedCreate, ScriptedPredictionTransport};
