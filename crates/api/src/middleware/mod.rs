//! Request extractors.
//!
//! - [`owner::OwnerId`] -- The calling account, from the `X-Owner-Id` header.

pub mod owner;
