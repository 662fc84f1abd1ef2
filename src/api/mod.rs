//! HTTP boundary for the extraction pipeline.
//!
//! A thin adapter: multipart upload in, `ExtractionResult` JSON out. All
//! extraction semantics live in `crate::pipeline`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::extraction_router;
pub use server::serve;
pub use types::ApiContext;
