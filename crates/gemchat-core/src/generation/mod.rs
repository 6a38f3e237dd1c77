//! Generation capability seam: requests, responses and the decoder.

pub mod capability;
pub mod request;
pub mod response;

pub use capability::{GenerationCapability, GenerationError, ResponseStream};
pub use request::{GenerationRequest, RequestPart};
pub use response::{
    DecodeMode, GenerationResponse, ResponseShape, normalize_response, normalize_unit,
};
