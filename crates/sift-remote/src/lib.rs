//! Infrastructure layer for sift: the HTTP client for the remote analysis
//! service.

mod http_analysis_service;

pub use http_analysis_service::HttpAnalysisService;
