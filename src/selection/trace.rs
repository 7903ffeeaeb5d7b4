//! Observational trace of a selection run.
//!
//! Sinks only receive events. Nothing they do can change which image wins.

use super::types::{Origin, ScoreBreakdown};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    InlineOnRichPage,
    InlineUnsupported,
    InlineTooSmall { estimated_bytes: usize },
    InlineUndecodable,
    Unresolvable,
    Keyword { keyword: String },
    ExcludedTag { tag: String },
    ExcludedZone { id_class: String },
    LoadFailed { error: String },
    TooSmall { width: u32, height: u32 },
    AspectRatio { ratio: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    TierStarted {
        index: usize,
        label: String,
        min_width: u32,
        min_height: u32,
    },
    CandidateAccepted {
        source: String,
        origin: Origin,
        width: u32,
        height: u32,
    },
    CandidateRejected {
        source: String,
        origin: Origin,
        #[serde(flatten)]
        reason: RejectReason,
    },
    Scored {
        source: String,
        breakdown: ScoreBreakdown,
        total: f64,
    },
    Winner {
        source: String,
        score: f64,
        tier: Option<usize>,
    },
    Exhausted,
}

pub trait TraceSink: Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// Forwards events to the `ogcard::trace` log target at debug level.
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&self, event: TraceEvent) {
        log::debug!(target: "ogcard::trace", "{event:?}");
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TraceSink for RecordingSink {
    fn record(&self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Sends each event to both sinks.
pub struct Tee<'a>(pub &'a dyn TraceSink, pub &'a dyn TraceSink);

impl TraceSink for Tee<'_> {
    fn record(&self, event: TraceEvent) {
        self.0.record(event.clone());
        self.1.record(event);
    }
}
