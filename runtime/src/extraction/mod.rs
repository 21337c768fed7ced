//! Text extraction from fetched HTML.
//!
//! Produces the title, meta description, and main-text excerpt that the
//! oracle sees when neither markup nor URL patterns decide a page.

pub mod content;
