//! Request and response DTOs for the cache server API.

mod requests;
mod responses;

pub use requests::SetRequest;
pub use responses::{
    DeleteResponse, ErrorResponse, GetResponse, HealthResponse, MessageResponse, SetResponse,
};
