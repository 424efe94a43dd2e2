//! Tag codec: conversion between field values and the restricted blob-tag
//! alphabet.
//!
//! A blob tag value must match `^[A-Za-z0-9 .\-/:_]+$` and the server
//! compares values byte-lexicographically. The codec guarantees that source
//! equality maps to byte equality, and that integers and timestamps keep
//! their natural order under the rendered form so range predicates can be
//! pushed to the server.

mod scalar;
mod tag_codec;

pub use scalar::{encode_integer, encode_timestamp};
pub use tag_codec::{decode_tag_value, encode_tag_value, hash_str, hash_tag_value};
