//! State module for tracking page progress
//!
//! # Components
//!
//! - `PageState`: The stage a page has reached (pending, fetching, extracted, ... persisted)
//! - `SkipReason` / `FailureKind`: Why a page left the pipeline early

mod page_state;

pub use page_state::{FailureKind, PageState, SkipReason};
