//! Post-call analysis storage and aggregation
//!
//! Plain filtering and summation over submitted call analyses; nothing here
//! touches the dialogue engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Post-call analysis submitted for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAnalysis {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Call duration in seconds.
    pub duration: f64,
    /// 1-5 caller rating, when collected.
    pub user_satisfaction: Option<u8>,
    pub intent_fulfilled: bool,
    #[serde(default)]
    pub conversation_flow: Vec<Value>,
    pub error_count: u32,
    pub resolution_status: String,
    #[serde(default)]
    pub pending_actions: Option<Vec<String>>,
}

/// Filters accepted by the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_satisfaction: Option<u8>,
}

/// Aggregates over every stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallMetrics {
    pub total_calls: usize,
    pub average_satisfaction: f64,
    pub intent_fulfillment_rate: f64,
    pub average_duration: f64,
    pub error_rate: f64,
}

impl CallMetrics {
    fn empty() -> Self {
        Self {
            total_calls: 0,
            average_satisfaction: 0.0,
            intent_fulfillment_rate: 0.0,
            average_duration: 0.0,
            error_rate: 0.0,
        }
    }
}

/// In-memory analysis store, one entry per session id.
#[derive(Default)]
pub struct AnalyticsStore {
    analyses: RwLock<HashMap<String, CallAnalysis>>,
}

impl AnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, analysis: CallAnalysis) {
        self.analyses
            .write()
            .await
            .insert(analysis.session_id.clone(), analysis);
    }

    pub async fn get(&self, session_id: &str) -> Option<CallAnalysis> {
        self.analyses.read().await.get(session_id).cloned()
    }

    pub async fn list(&self, filter: &AnalysisFilter) -> Vec<CallAnalysis> {
        let analyses = self.analyses.read().await;
        let mut matched: Vec<CallAnalysis> = analyses
            .values()
            .filter(|analysis| {
                filter
                    .start_date
                    .map_or(true, |bound| analysis.start_time >= bound)
                    && filter
                        .end_date
                        .map_or(true, |bound| analysis.end_time <= bound)
                    && filter.min_satisfaction.map_or(true, |min| {
                        analysis.user_satisfaction.is_some_and(|rating| rating >= min)
                    })
            })
            .cloned()
            .collect();
        matched.sort_by_key(|analysis| analysis.start_time);
        matched
    }

    pub async fn metrics(&self) -> CallMetrics {
        let analyses = self.analyses.read().await;
        if analyses.is_empty() {
            return CallMetrics::empty();
        }

        let total = analyses.len();
        let satisfaction: u64 = analyses
            .values()
            .filter_map(|analysis| analysis.user_satisfaction)
            .map(u64::from)
            .sum();
        let fulfilled = analyses
            .values()
            .filter(|analysis| analysis.intent_fulfilled)
            .count();
        let duration: f64 = analyses.values().map(|analysis| analysis.duration).sum();
        let errors: u64 = analyses
            .values()
            .map(|analysis| u64::from(analysis.error_count))
            .sum();

        let total_f = total as f64;
        CallMetrics {
            total_calls: total,
            average_satisfaction: satisfaction as f64 / total_f,
            intent_fulfillment_rate: fulfilled as f64 / total_f,
            average_duration: duration / total_f,
            error_rate: errors as f64 / total_f,
        }
    }

    /// Distinct pending actions across every analysis, sorted for stable
    /// output.
    pub async fn pending_actions(&self) -> Vec<String> {
        let analyses = self.analyses.read().await;
        let actions: BTreeSet<String> = analyses
            .values()
            .filter_map(|analysis| analysis.pending_actions.as_ref())
            .flatten()
            .cloned()
            .collect();
        actions.into_iter().collect()
    }

    /// Full dump keyed by session id, for the export endpoint.
    pub async fn export_json(&self) -> Value {
        let analyses = self.analyses.read().await;
        serde_json::to_value(&*analyses).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn analysis(session_id: &str, satisfaction: Option<u8>, fulfilled: bool) -> CallAnalysis {
        CallAnalysis {
            session_id: session_id.to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 8, 1, 10, 5, 0).unwrap(),
            duration: 300.0,
            user_satisfaction: satisfaction,
            intent_fulfilled: fulfilled,
            conversation_flow: vec![],
            error_count: 1,
            resolution_status: "resolved".to_string(),
            pending_actions: Some(vec!["callback".to_string()]),
        }
    }

    #[tokio::test]
    async fn empty_store_yields_zeroed_metrics() {
        let store = AnalyticsStore::new();
        let metrics = store.metrics().await;
        assert_eq!(metrics.total_calls, 0);
        assert!(metrics.average_satisfaction.abs() < f64::EPSILON);
        assert!(metrics.intent_fulfillment_rate.abs() < f64::EPSILON);
        assert!(metrics.average_duration.abs() < f64::EPSILON);
        assert!(metrics.error_rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn metrics_aggregate_over_all_analyses() {
        let store = AnalyticsStore::new();
        store.put(analysis("a", Some(4), true)).await;
        store.put(analysis("b", Some(2), false)).await;
        store.put(analysis("c", None, true)).await;

        let metrics = store.metrics().await;
        assert_eq!(metrics.total_calls, 3);
        assert!((metrics.average_satisfaction - 2.0).abs() < f64::EPSILON);
        assert!((metrics.intent_fulfillment_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!((metrics.average_duration - 300.0).abs() < f64::EPSILON);
        assert!((metrics.error_rate - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn resubmitting_a_session_overwrites() {
        let store = AnalyticsStore::new();
        store.put(analysis("a", Some(1), false)).await;
        store.put(analysis("a", Some(5), true)).await;

        assert_eq!(store.metrics().await.total_calls, 1);
        assert_eq!(store.get("a").await.unwrap().user_satisfaction, Some(5));
    }

    #[tokio::test]
    async fn listing_applies_satisfaction_and_date_filters() {
        let store = AnalyticsStore::new();
        store.put(analysis("low", Some(2), true)).await;
        store.put(analysis("high", Some(5), true)).await;
        store.put(analysis("unrated", None, true)).await;

        let filter = AnalysisFilter {
            min_satisfaction: Some(4),
            ..AnalysisFilter::default()
        };
        let matched = store.list(&filter).await;
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].session_id, "high");

        let filter = AnalysisFilter {
            start_date: Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()),
            ..AnalysisFilter::default()
        };
        assert!(store.list(&filter).await.is_empty());
    }

    #[tokio::test]
    async fn pending_actions_are_deduplicated() {
        let store = AnalyticsStore::new();
        store.put(analysis("a", None, true)).await;
        store.put(analysis("b", None, true)).await;

        assert_eq!(store.pending_actions().await, vec!["callback".to_string()]);
    }
}
