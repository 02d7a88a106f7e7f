use axum::extract::State;
use chrono::Utc;

use crate::middleware::ApiResponse;
use crate::server::AppState;
use crate::types::HealthReport;

/// GET /healthz - process liveness with uptime and resident memory
pub async fn healthz(State(state): State<AppState>) -> ApiResponse<HealthReport> {
    ApiResponse::success(HealthReport {
        status: "ok".to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        rss_kb: resident_memory_kb(),
        timestamp: Utc::now(),
    })
}

/// VmRSS from /proc/self/status; `None` where procfs is unavailable
fn resident_memory_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}
