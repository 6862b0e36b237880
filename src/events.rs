//! Lifecycle events published to the external message bus as a scenario
//! runs. The bus itself is outside this crate's scope; [`EventBus`] is the
//! abstract sink the engine publishes through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One lifecycle event for a single optimization scenario.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename = "optimization.started")]
    Started {
        scenario_id: String,
        job_id: String,
        started_at: DateTime<Utc>,
    },
    #[serde(rename = "optimization.progress")]
    Progress {
        scenario_id: String,
        progress: f64,
        message: String,
    },
    #[serde(rename = "optimization.completed")]
    Completed {
        scenario_id: String,
        plan_id: String,
        plan_number: u32,
        total_waste: u64,
        waste_percentage: f64,
        stock_used_count: usize,
        completed_at: DateTime<Utc>,
    },
    #[serde(rename = "optimization.failed")]
    Failed {
        scenario_id: String,
        error: String,
        failed_at: DateTime<Utc>,
    },
}

/// An event wrapped with the envelope fields every event carries regardless
/// of kind.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub aggregate_type: &'static str,
    #[serde(flatten)]
    pub event: Event,
}

impl Envelope {
    pub fn wrap(event: Event) -> Self {
        Envelope {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            aggregate_type: "OptimizationScenario",
            event,
        }
    }
}

/// Abstract publish sink. At-least-once delivery is the bus's concern;
/// implementations only need to accept an envelope.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, envelope: Envelope);
}

/// An [`EventBus`] that logs every event at `debug` and otherwise discards
/// it. Useful for tests and for embedding contexts with no real bus.
pub struct LoggingEventBus;

#[async_trait]
impl EventBus for LoggingEventBus {
    async fn publish(&self, envelope: Envelope) {
        log::debug!(target: "cutstock_core::events", "{}", serde_json::to_string(&envelope).unwrap_or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_bus_accepts_every_event_kind() {
        let bus = LoggingEventBus;
        bus.publish(Envelope::wrap(Event::Started {
            scenario_id: "s1".into(),
            job_id: "j1".into(),
            started_at: Utc::now(),
        }))
        .await;
        bus.publish(Envelope::wrap(Event::Progress {
            scenario_id: "s1".into(),
            progress: 0.5,
            message: "halfway".into(),
        }))
        .await;
    }

    #[test]
    fn envelope_carries_a_unique_event_id_per_call() {
        let a = Envelope::wrap(Event::Failed {
            scenario_id: "s1".into(),
            error: "boom".into(),
            failed_at: Utc::now(),
        });
        let b = Envelope::wrap(Event::Failed {
            scenario_id: "s1".into(),
            error: "boom".into(),
            failed_at: Utc::now(),
        });
        assert_ne!(a.event_id, b.event_id);
    }
}
