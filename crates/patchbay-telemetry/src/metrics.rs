//! Prometheus collectors for the HTTP, scheduler, and syslog surfaces.
//!
//! # Design
//!
//! Every clone of [`Metrics`] shares one registry, so the application factory
//! builds a single instance and hands copies to the router, the scheduler, and
//! the syslog listener. Collectors are registered at construction; a
//! registration failure is a programming error surfaced to the caller rather
//! than a panic.

use std::sync::Arc;

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Handle to the process-wide collector set.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    login_sessions_issued_total: IntCounter,
    scheduler_task_runs_total: IntCounterVec,
    scheduler_tasks_due: IntGauge,
    syslog_messages_ingested_total: IntCounter,
}

/// Point-in-time view of the scalar collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Login sessions issued since process start.
    pub login_sessions_issued: u64,
    /// Due tasks observed by the most recent scheduler tick.
    pub scheduler_tasks_due: i64,
    /// Syslog datagrams persisted since process start.
    pub syslog_messages_ingested: u64,
}

impl Metrics {
    /// Create the collector set backed by a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error when a collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests served, by route and status code."),
            &["route", "code"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let login_sessions_issued_total = IntCounter::with_opts(Opts::new(
            "login_sessions_issued_total",
            "Login sessions issued since process start.",
        ))?;
        registry.register(Box::new(login_sessions_issued_total.clone()))?;

        let scheduler_task_runs_total = IntCounterVec::new(
            Opts::new("scheduler_task_runs_total", "Scheduler task executions, by outcome."),
            &["outcome"],
        )?;
        registry.register(Box::new(scheduler_task_runs_total.clone()))?;

        let scheduler_tasks_due = IntGauge::with_opts(Opts::new(
            "scheduler_tasks_due",
            "Due tasks observed by the most recent scheduler tick.",
        ))?;
        registry.register(Box::new(scheduler_tasks_due.clone()))?;

        let syslog_messages_ingested_total = IntCounter::with_opts(Opts::new(
            "syslog_messages_ingested_total",
            "Syslog datagrams persisted since process start.",
        ))?;
        registry.register(Box::new(syslog_messages_ingested_total.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                login_sessions_issued_total,
                scheduler_task_runs_total,
                scheduler_tasks_due,
                syslog_messages_ingested_total,
            }),
        })
    }

    /// Count one served HTTP request for the given route template and status.
    pub fn inc_http_request(&self, route: &str, code: &str) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, code])
            .inc();
    }

    /// Count one issued login session.
    pub fn inc_session_issued(&self) {
        self.inner.login_sessions_issued_total.inc();
    }

    /// Count one scheduler task execution with its outcome label.
    pub fn inc_scheduler_run(&self, outcome: &str) {
        self.inner
            .scheduler_task_runs_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record how many tasks the current scheduler tick found due.
    pub fn set_tasks_due(&self, count: i64) {
        self.inner.scheduler_tasks_due.set(count);
    }

    /// Count one persisted syslog datagram.
    pub fn inc_syslog_message(&self) {
        self.inner.syslog_messages_ingested_total.inc();
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding fails or produces invalid UTF-8.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&self.inner.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Snapshot the scalar collectors.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            login_sessions_issued: self.inner.login_sessions_issued_total.get(),
            scheduler_tasks_due: self.inner.scheduler_tasks_due.get(),
            syslog_messages_ingested: self.inner.syslog_messages_ingested_total.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_collectors() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/base/health", "200");
        metrics.inc_session_issued();
        metrics.inc_scheduler_run("completed");
        metrics.set_tasks_due(3);
        metrics.inc_syslog_message();

        let body = metrics.render()?;
        assert!(body.contains("http_requests_total"));
        assert!(body.contains("login_sessions_issued_total 1"));
        assert!(body.contains("scheduler_task_runs_total"));
        assert!(body.contains("scheduler_tasks_due 3"));
        assert!(body.contains("syslog_messages_ingested_total 1"));
        Ok(())
    }

    #[test]
    fn snapshot_reports_scalar_collectors() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_session_issued();
        metrics.inc_session_issued();
        metrics.set_tasks_due(5);
        metrics.inc_syslog_message();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                login_sessions_issued: 2,
                scheduler_tasks_due: 5,
                syslog_messages_ingested: 1,
            }
        );
        Ok(())
    }
}
