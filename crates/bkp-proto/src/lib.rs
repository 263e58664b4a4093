//! Protocol buffer definitions for the O2 Bookkeeping gRPC services.
//!
//! This crate contains the generated protobuf types and tonic stubs from
//! `proto/bookkeeping.proto`. Conversions to the client's domain records live
//! in the `bookkeeping-api` crate, keeping this crate free of domain types.

#![allow(missing_docs)] // Generated code doesn't have docs

/// Generated bookkeeping protocol buffer types.
pub mod bookkeeping {
    tonic::include_proto!("o2.bookkeeping");
}

// Re-export commonly used types at crate root
pub use bookkeeping::*;
