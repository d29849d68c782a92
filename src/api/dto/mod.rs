//! Data Transfer Objects for REST request/response serialization.

pub mod pair_dto;
pub mod participant_dto;
pub mod round_dto;

pub use pair_dto::*;
pub use participant_dto::*;
pub use round_dto::*;
