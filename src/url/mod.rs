//! URL handling module for page-harvest
//!
//! This module provides URL normalization, domain extraction and the site key used for
//! same-site scoping.

mod domain;
mod normalize;

pub use domain::{extract_domain, site_key};
pub use normalize::{normalize_parsed, normalize_url};
