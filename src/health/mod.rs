use crate::err::Error;
use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub mod routes;
mod version;

pub use version::VersionInfo;

#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    #[serde(rename = "OK")]
    Healthy,
    #[serde(rename = "WARNING")]
    Degraded,
    #[serde(rename = "CRITICAL")]
    Unhealthy,
}

/// A downstream dependency whose health contributes to the overall status.
pub trait Checker: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self) -> BoxFuture<'_, Result<(), Error>>;
}

#[derive(Default)]
struct CheckState {
    ok: bool,
    message: String,
    last_checked: Option<SystemTime>,
    last_success: Option<SystemTime>,
    last_failure: Option<SystemTime>,
}

struct Check {
    checker: Box<dyn Checker>,
    state: RwLock<CheckState>,
}

impl Check {
    async fn run(&self) {
        let result = self.checker.check().await;
        let now = SystemTime::now();
        let mut state = self.state.write().await;
        state.last_checked = Some(now);
        match result {
            Ok(()) => {
                if !state.ok {
                    log::info!("Health check {} succeeded", self.checker.name());
                }
                state.ok = true;
                state.message = "OK".to_string();
                state.last_success = Some(now);
            }
            Err(e) => {
                log::warn!("Health check {} failed: {}", self.checker.name(), e);
                state.ok = false;
                state.message = e.to_string();
                state.last_failure = Some(now);
            }
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CheckReport {
    pub name: String,
    pub status: Status,
    pub message: String,
    pub last_checked: Option<String>,
    pub last_success: Option<String>,
    pub last_failure: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct Report {
    pub status: Status,
    pub version: VersionInfo,
    /// milliseconds
    pub uptime: u64,
    pub start_time: String,
    pub checks: Vec<CheckReport>,
}

pub struct HealthCheck {
    version: VersionInfo,
    start_time: SystemTime,
    critical_timeout: Duration,
    interval: Duration,
    checks: Vec<Check>,
}

impl HealthCheck {
    pub fn new(
        version: VersionInfo,
        critical_timeout: Duration,
        interval: Duration,
        checkers: Vec<Box<dyn Checker>>,
    ) -> Self {
        Self {
            version,
            start_time: SystemTime::now(),
            critical_timeout,
            interval,
            checks: checkers
                .into_iter()
                .map(|checker| Check {
                    checker,
                    state: RwLock::default(),
                })
                .collect(),
        }
    }

    /// Runs every registered check once per interval until the returned task is aborted.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.checks.is_empty() {
            log::debug!("No health checks registered");
            return None;
        }

        let health = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = interval(health.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                health.run_checks().await;
            }
        }))
    }

    async fn run_checks(&self) {
        join_all(self.checks.iter().map(Check::run)).await;
    }

    pub async fn report(&self) -> Report {
        self.report_at(SystemTime::now()).await
    }

    async fn report_at(&self, now: SystemTime) -> Report {
        let mut checks = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let state = check.state.read().await;
            checks.push(CheckReport {
                name: check.checker.name().to_string(),
                status: self.check_status(&state, now),
                message: state.message.clone(),
                last_checked: state.last_checked.map(rfc3339),
                last_success: state.last_success.map(rfc3339),
                last_failure: state.last_failure.map(rfc3339),
            });
        }

        Report {
            status: checks
                .iter()
                .map(|c| c.status)
                .max()
                .unwrap_or(Status::Healthy),
            version: self.version.clone(),
            uptime: u64::try_from(elapsed(self.start_time, now).as_millis()).unwrap_or(u64::MAX),
            start_time: rfc3339(self.start_time),
            checks,
        }
    }

    /// A failing or not yet run check only becomes critical once it has gone
    /// `critical_timeout` without success (counting from startup if it never succeeded).
    fn check_status(&self, state: &CheckState, now: SystemTime) -> Status {
        if state.ok && state.last_checked.is_some() {
            return Status::Healthy;
        }
        let since = state.last_success.unwrap_or(self.start_time);
        if elapsed(since, now) > self.critical_timeout {
            Status::Unhealthy
        } else {
            Status::Degraded
        }
    }
}

fn elapsed(since: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(since).unwrap_or_default()
}

fn rfc3339(time: SystemTime) -> String {
    humantime::format_rfc3339_seconds(time).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering::Relaxed};

    struct Switch {
        up: Arc<AtomicBool>,
    }

    impl Checker for Switch {
        fn name(&self) -> &str {
            "switch"
        }

        fn check(&self) -> BoxFuture<'_, Result<(), Error>> {
            Box::pin(async move {
                if self.up.load(Relaxed) {
                    Ok(())
                } else {
                    Err("switched off".into())
                }
            })
        }
    }

    fn health(checkers: Vec<Box<dyn Checker>>) -> HealthCheck {
        HealthCheck::new(
            VersionInfo::new(Some("0"), Some("abc"), "0.1.0").unwrap(),
            Duration::from_secs(60),
            Duration::from_secs(10),
            checkers,
        )
    }

    fn with_switch(up: bool) -> (HealthCheck, Arc<AtomicBool>) {
        let up = Arc::new(AtomicBool::new(up));
        let health = health(vec![Box::new(Switch {
            up: Arc::clone(&up),
        })]);
        (health, up)
    }

    #[tokio::test]
    async fn no_checks_is_always_healthy() {
        let health = health(Vec::new());
        let later = health.start_time + Duration::from_secs(3600);
        let report = health.report_at(later).await;
        assert_eq!(report.status, Status::Healthy);
        assert_eq!(report.uptime, 3_600_000);
        assert!(report.checks.is_empty());
    }

    #[tokio::test]
    async fn not_yet_run() {
        let (health, _) = with_switch(true);
        let soon = health.start_time + Duration::from_secs(1);
        assert_eq!(health.report_at(soon).await.status, Status::Degraded);
        let late = health.start_time + Duration::from_secs(61);
        assert_eq!(health.report_at(late).await.status, Status::Unhealthy);
    }

    #[tokio::test]
    async fn passing_check() {
        let (health, _) = with_switch(true);
        health.run_checks().await;
        let report = health.report_at(SystemTime::now()).await;
        assert_eq!(report.status, Status::Healthy);
        assert_eq!(report.checks[0].name, "switch");
        assert_eq!(report.checks[0].message, "OK");
        assert!(report.checks[0].last_success.is_some());
        assert!(report.checks[0].last_failure.is_none());
    }

    #[tokio::test]
    async fn failing_check_becomes_critical() {
        let (health, up) = with_switch(true);
        health.run_checks().await;
        up.store(false, Relaxed);
        health.run_checks().await;

        let now = SystemTime::now();
        let report = health.report_at(now).await;
        assert_eq!(report.status, Status::Degraded);
        assert_eq!(report.checks[0].message, "switched off");
        assert!(report.checks[0].last_failure.is_some());

        let report = health.report_at(now + Duration::from_secs(61)).await;
        assert_eq!(report.status, Status::Unhealthy);
    }

    #[tokio::test]
    async fn never_passed() {
        let (health, _) = with_switch(false);
        health.run_checks().await;
        let late = health.start_time + Duration::from_secs(61);
        assert_eq!(health.report_at(late).await.status, Status::Unhealthy);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::Healthy).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&Status::Degraded).unwrap(), "\"WARNING\"");
        assert_eq!(
            serde_json::to_string(&Status::Unhealthy).unwrap(),
            "\"CRITICAL\""
        );
    }
}
