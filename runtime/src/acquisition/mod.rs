//! Getting URLs and page data: HTTP fetching, sitemap discovery, URL inputs,
//! and structured data parsing.

pub mod http_client;
pub mod sitemap;
pub mod structured_data;
pub mod url_source;
