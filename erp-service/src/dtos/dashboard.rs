use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_subscriptions: i64,
    pub total_revenue: Decimal,
    pub pending_invoices: i64,
    pub total_customers: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemCounts {
    pub products: i64,
    pub active_plans: i64,
    pub active_taxes: i64,
}

/// One entry of the merged recent-activity feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub title: String,
    pub description: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub activity: Vec<ActivityEntry>,
    pub system: SystemCounts,
}

/// Merge recent subscriptions and invoices into one feed, newest first,
/// truncated to the top five events.
pub fn merge_activity_feed(mut entries: Vec<ActivityEntry>) -> Vec<ActivityEntry> {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries.truncate(5);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(entry_type: &str, secs: i64) -> ActivityEntry {
        ActivityEntry {
            id: Uuid::new_v4(),
            entry_type: entry_type.to_string(),
            title: String::new(),
            description: String::new(),
            amount: Decimal::ZERO,
            date: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn feed_is_sorted_newest_first() {
        let feed = merge_activity_feed(vec![
            entry("subscription", 100),
            entry("invoice", 300),
            entry("subscription", 200),
        ]);
        let times: Vec<i64> = feed.iter().map(|e| e.date.timestamp()).collect();
        assert_eq!(times, vec![300, 200, 100]);
    }

    #[test]
    fn feed_truncates_to_five_entries() {
        let feed = merge_activity_feed((0..8).map(|i| entry("invoice", i)).collect());
        assert_eq!(feed.len(), 5);
        assert_eq!(feed[0].date.timestamp(), 7);
        assert_eq!(feed[4].date.timestamp(), 3);
    }

    #[test]
    fn mixed_types_interleave_by_date() {
        let feed = merge_activity_feed(vec![
            entry("subscription", 10),
            entry("invoice", 20),
            entry("subscription", 30),
            entry("invoice", 5),
        ]);
        let types: Vec<&str> = feed.iter().map(|e| e.entry_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["subscription", "invoice", "subscription", "invoice"]
        );
    }
}
