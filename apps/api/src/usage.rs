//! Usage accounting — advisory request counters persisted as a single JSON
//! file, rewritten in full after each update. Never authoritative for
//! billing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Requests per day covered by the provider free tier.
const FREE_TIER_DAILY_REQUESTS: u64 = 1500;
/// Paid-tier pricing per million tokens (Gemini 1.5 Flash).
const INPUT_COST_PER_MILLION: f64 = 0.075;
const OUTPUT_COST_PER_MILLION: f64 = 0.30;
/// Assumed token footprint of one screening request.
const ASSUMED_INPUT_TOKENS: f64 = 2000.0;
const ASSUMED_OUTPUT_TOKENS: f64 = 1000.0;
/// Blended per-request estimate used for monthly projections.
const AVERAGE_COST_PER_REQUEST: f64 = 0.00045;

/// What one tracked request reports back.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedRequest {
    pub daily_count: u64,
    pub cost: f64,
}

/// Advisory usage counter. Called at most once per screening request;
/// failure must never block screening.
///
/// Selected at construction time: `NoopUsageTracker` unless a usage file is
/// configured.
#[async_trait]
pub trait UsageTracker: Send + Sync {
    async fn track_request(&self) -> Result<TrackedRequest>;
}

/// Default tracker: counts nothing, never fails.
pub struct NoopUsageTracker;

#[async_trait]
impl UsageTracker for NoopUsageTracker {
    async fn track_request(&self) -> Result<TrackedRequest> {
        Ok(TrackedRequest::default())
    }
}

/// Persisted counter structure, mirrored 1:1 into the JSON file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct UsageData {
    daily: BTreeMap<String, u64>,
    monthly: BTreeMap<String, u64>,
    total_requests: u64,
    total_cost: f64,
}

/// Today's usage snapshot.
#[derive(Debug)]
pub struct DailyStats {
    pub date: String,
    pub requests: u64,
    pub free_remaining: u64,
    pub is_paid_tier: bool,
}

/// This month's usage and cost projection.
#[derive(Debug)]
pub struct MonthlyStats {
    pub month: String,
    pub requests: u64,
    pub projected_total: u64,
    pub estimated_cost: f64,
}

/// File-backed tracker. The mutex serializes the read-modify-write so
/// concurrent requests cannot corrupt the persisted structure.
pub struct FileUsageTracker {
    path: PathBuf,
    data: Mutex<UsageData>,
}

impl FileUsageTracker {
    /// Loads existing counters from `path`, starting fresh if the file does
    /// not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("usage file {} is not valid JSON", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UsageData::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read usage file {}", path.display()))
            }
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    async fn save(path: &Path, data: &UsageData) -> Result<()> {
        let contents = serde_json::to_string_pretty(data)?;
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("failed to write usage file {}", path.display()))
    }

    pub async fn daily_stats(&self) -> DailyStats {
        let data = self.data.lock().await;
        let today = Local::now().format("%Y-%m-%d").to_string();
        let requests = data.daily.get(&today).copied().unwrap_or(0);
        DailyStats {
            free_remaining: FREE_TIER_DAILY_REQUESTS.saturating_sub(requests),
            is_paid_tier: requests > FREE_TIER_DAILY_REQUESTS,
            date: today,
            requests,
        }
    }

    pub async fn monthly_stats(&self) -> MonthlyStats {
        let data = self.data.lock().await;
        let now = Local::now();
        let month = now.format("%Y-%m").to_string();
        let requests = data.monthly.get(&month).copied().unwrap_or(0);

        // Project the month-to-date average over a 30-day month; only
        // requests beyond the free tier contribute estimated cost.
        let average_daily = requests as f64 / now.day() as f64;
        let projected_total = average_daily * 30.0;
        let free = projected_total.min((FREE_TIER_DAILY_REQUESTS * 30) as f64);
        let paid = (projected_total - free).max(0.0);

        MonthlyStats {
            month,
            requests,
            projected_total: projected_total as u64,
            estimated_cost: paid * AVERAGE_COST_PER_REQUEST,
        }
    }
}

#[async_trait]
impl UsageTracker for FileUsageTracker {
    async fn track_request(&self) -> Result<TrackedRequest> {
        let mut data = self.data.lock().await;
        let now = Local::now();
        let today = now.format("%Y-%m-%d").to_string();
        let month = now.format("%Y-%m").to_string();

        *data.daily.entry(today.clone()).or_insert(0) += 1;
        *data.monthly.entry(month).or_insert(0) += 1;
        data.total_requests += 1;

        let daily_count = data.daily[&today];
        // Requests beyond the daily free tier accrue paid-tier token cost.
        let cost = if daily_count > FREE_TIER_DAILY_REQUESTS {
            ASSUMED_INPUT_TOKENS / 1_000_000.0 * INPUT_COST_PER_MILLION
                + ASSUMED_OUTPUT_TOKENS / 1_000_000.0 * OUTPUT_COST_PER_MILLION
        } else {
            0.0
        };
        data.total_cost += cost;

        Self::save(&self.path, &data).await?;
        Ok(TrackedRequest { daily_count, cost })
    }
}
