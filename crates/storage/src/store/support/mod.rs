#![forbid(unsafe_code)]

mod counters;
mod schema;
mod tags;

pub(super) use counters::*;
pub(super) use schema::ensure_declared_shape;
pub use tags::{decode_tags, encode_tags};
