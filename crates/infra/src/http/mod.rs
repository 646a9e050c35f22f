//! HTTP plumbing: transport, response normalization and the retrying
//! request executor.

pub mod executor;
pub mod response;
pub mod transport;

pub use executor::{ExecutorSettings, RequestAttempt, RequestExecutor};
pub use response::{
    error_detail, first_bool, first_f64, first_string, infer_validity_from_status, parse_object, ApiResponse,
};
pub use transport::{
    ReqwestTransport, ReqwestTransportBuilder, Transport, TransportError, TransportRequest, TransportResponse,
};
