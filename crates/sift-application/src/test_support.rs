//! Test doubles shared by the application-layer test suites.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sift_core::analysis::{MetricsPatch, Session, Unit, UnitMetrics};
use sift_core::error::{Result, SiftError};
use sift_core::service::AnalysisService;

/// One recorded call against the mock service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    Initialize {
        text: String,
        topic: String,
    },
    Fetch {
        session_id: String,
    },
    Restructure {
        session_id: String,
        unit_id: u64,
        text: String,
    },
    Merge {
        session_id: String,
        first_id: u64,
        second_id: u64,
    },
    Reorder {
        session_id: String,
        ordered_ids: Vec<u64>,
    },
    Delete {
        session_id: String,
        unit_id: u64,
    },
    Metrics {
        session_id: String,
        unit_id: u64,
        text: String,
    },
}

/// Mock analysis service with scripted responses and call recording.
///
/// Session-returning operations pop from one shared response queue in call
/// order (structural calls are serialized by the save gate, so ordering is
/// deterministic). Metrics calls pop from their own queue and default to an
/// empty patch so background refreshes don't need scripting.
#[derive(Default)]
pub struct MockAnalysisService {
    calls: Mutex<Vec<ServiceCall>>,
    session_responses: Mutex<VecDeque<Result<Session>>>,
    metrics_responses: Mutex<VecDeque<Result<MetricsPatch>>>,
}

impl MockAnalysisService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_session(&self, response: Result<Session>) {
        self.session_responses.lock().unwrap().push_back(response);
    }

    pub fn push_metrics(&self, response: Result<MetricsPatch>) {
        self.metrics_responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn metrics_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ServiceCall::Metrics { .. }))
            .count()
    }

    fn record(&self, call: ServiceCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_session(&self) -> Result<Session> {
        self.session_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SiftError::network("mock: no scripted session response")))
    }

    fn next_metrics(&self) -> Result<MetricsPatch> {
        self.metrics_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(MetricsPatch::default()))
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    async fn initialize_analysis(&self, text: &str, topic: &str) -> Result<Session> {
        self.record(ServiceCall::Initialize {
            text: text.to_string(),
            topic: topic.to_string(),
        });
        self.next_session()
    }

    async fn fetch_analysis(&self, session_id: &str) -> Result<Session> {
        self.record(ServiceCall::Fetch {
            session_id: session_id.to_string(),
        });
        self.next_session()
    }

    async fn update_text_and_restructure_paragraph(
        &self,
        session_id: &str,
        unit_id: u64,
        text: &str,
    ) -> Result<Session> {
        self.record(ServiceCall::Restructure {
            session_id: session_id.to_string(),
            unit_id,
            text: text.to_string(),
        });
        self.next_session()
    }

    async fn merge_paragraphs(
        &self,
        session_id: &str,
        first_id: u64,
        second_id: u64,
    ) -> Result<Session> {
        self.record(ServiceCall::Merge {
            session_id: session_id.to_string(),
            first_id,
            second_id,
        });
        self.next_session()
    }

    async fn reorder_paragraphs(
        &self,
        session_id: &str,
        ordered_unit_ids: &[u64],
    ) -> Result<Session> {
        self.record(ServiceCall::Reorder {
            session_id: session_id.to_string(),
            ordered_ids: ordered_unit_ids.to_vec(),
        });
        self.next_session()
    }

    async fn delete_paragraph(&self, session_id: &str, unit_id: u64) -> Result<Session> {
        self.record(ServiceCall::Delete {
            session_id: session_id.to_string(),
            unit_id,
        });
        self.next_session()
    }

    async fn calculate_paragraph_metrics(
        &self,
        session_id: &str,
        unit_id: u64,
        text: &str,
    ) -> Result<MetricsPatch> {
        self.record(ServiceCall::Metrics {
            session_id: session_id.to_string(),
            unit_id,
            text: text.to_string(),
        });
        self.next_metrics()
    }
}

/// Builds a session with default metrics from `(id, text)` pairs.
pub fn sample_session(session_id: &str, units: &[(u64, &str)]) -> Session {
    Session {
        session_id: session_id.to_string(),
        topic: "topic".to_string(),
        units: units
            .iter()
            .map(|(id, text)| Unit {
                id: *id,
                text: text.to_string(),
                metrics: UnitMetrics::default(),
            })
            .collect(),
    }
}
