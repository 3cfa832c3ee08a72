//! HTTP protocol module
//!
//! Protocol-level response building, decoupled from specific business logic.

pub mod response;

pub use response::{
    build_405_response, build_413_response, build_options_response, strip_body_for_head,
};
