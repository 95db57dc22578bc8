//! Heartbeat lifecycle tests against an in-memory registry.
//!
//! All tests run on a paused tokio clock, so tick instants are exact and the
//! suite does not actually sleep.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use thermo_core::health::{AlwaysHealthy, HealthCheck, HealthStatus};
use thermo_registry::{
    RegistrationHandle, RegistryError, ServiceRegistration, ServiceRegistry, Ttl,
};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Register(String),
    Pass { check_id: String, note: String },
    Fail { check_id: String, reason: String },
    Deregister(String),
}

/// Records every call with the (virtual) instant it happened at.
#[derive(Default)]
struct RecordingRegistry {
    calls: Mutex<Vec<(Call, Instant)>>,
    reject_register: bool,
    /// Number of upcoming pass/fail reports that should error.
    failing_reports: AtomicUsize,
    /// Simulated round-trip time of each report.
    report_latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingRegistry {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    fn report_instants(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| matches!(c, Call::Pass { .. } | Call::Fail { .. }))
            .map(|(_, at)| *at)
            .collect()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn passes(&self) -> usize {
        self.count(|c| matches!(c, Call::Pass { .. }))
    }

    fn fails(&self) -> usize {
        self.count(|c| matches!(c, Call::Fail { .. }))
    }

    fn deregistrations(&self) -> usize {
        self.count(|c| matches!(c, Call::Deregister(_)))
    }

    async fn report(&self, call: Call) -> Result<(), RegistryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.report_latency {
            tokio::time::sleep(latency).await;
        }
        self.record(call);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let should_fail = self
            .failing_reports
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            Err(RegistryError::Unreachable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ServiceRegistry for RecordingRegistry {
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), RegistryError> {
        if self.reject_register {
            return Err(RegistryError::Rejected {
                status: 500,
                body: "agent not ready".into(),
            });
        }
        self.record(Call::Register(registration.id.clone()));
        Ok(())
    }

    async fn pass_ttl(&self, check_id: &str, note: &str) -> Result<(), RegistryError> {
        self.report(Call::Pass {
            check_id: check_id.to_string(),
            note: note.to_string(),
        })
        .await
    }

    async fn fail_ttl(&self, check_id: &str, reason: &str) -> Result<(), RegistryError> {
        self.report(Call::Fail {
            check_id: check_id.to_string(),
            reason: reason.to_string(),
        })
        .await
    }

    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError> {
        self.record(Call::Deregister(service_id.to_string()));
        Ok(())
    }
}

struct AlwaysFailing(&'static str);

#[async_trait]
impl HealthCheck for AlwaysFailing {
    async fn check(&self) -> HealthStatus {
        HealthStatus::failing(self.0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registration(ttl: &str) -> ServiceRegistration {
    ServiceRegistration {
        id: "temperature-service".into(),
        name: "temperature-service".into(),
        address: "raspi.local".into(),
        port: 8080,
        tags: vec!["raspi".into(), "temperature".into()],
        ttl: Ttl::parse(ttl).unwrap(),
    }
}

async fn register(registry: &Arc<RecordingRegistry>, ttl: &str) -> RegistrationHandle {
    RegistrationHandle::register(registry.clone(), &registration(ttl))
        .await
        .expect("registration should succeed")
}

async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn healthy_ticks_report_one_pass_each_at_half_ttl() {
    let registry = Arc::new(RecordingRegistry::default());
    let mut handle = register(&registry, "10s").await;

    let started = Instant::now();
    handle.start_heartbeat(Arc::new(AlwaysHealthy)).unwrap();
    advance(15_500).await;

    assert_eq!(registry.passes(), 3);
    assert_eq!(registry.fails(), 0);

    let offsets: Vec<Duration> = registry
        .report_instants()
        .into_iter()
        .map(|at| at - started)
        .collect();
    for (i, offset) in offsets.iter().enumerate() {
        let expected = Duration::from_secs(5 * (i as u64 + 1));
        let drift = if *offset > expected {
            *offset - expected
        } else {
            expected - *offset
        };
        assert!(
            drift <= Duration::from_millis(1),
            "tick {i} at {offset:?}, expected {expected:?}"
        );
    }

    assert!(registry.calls().contains(&Call::Pass {
        check_id: "service:temperature-service".into(),
        note: String::new(),
    }));

    handle.deregister().await;
}

#[tokio::test(start_paused = true)]
async fn unhealthy_ticks_report_fail_with_reason() {
    let registry = Arc::new(RecordingRegistry::default());
    let mut handle = register(&registry, "4s").await;

    handle
        .start_heartbeat(Arc::new(AlwaysFailing("sensor offline")))
        .unwrap();
    advance(6_500).await;

    assert_eq!(registry.passes(), 0);
    assert_eq!(registry.fails(), 3);
    for call in registry.calls() {
        if let Call::Fail { check_id, reason } = call {
            assert_eq!(check_id, "service:temperature-service");
            assert_eq!(reason, "sensor offline");
        }
    }

    handle.deregister().await;
}

#[tokio::test(start_paused = true)]
async fn report_error_does_not_stop_the_loop() {
    let registry = Arc::new(RecordingRegistry {
        failing_reports: AtomicUsize::new(1),
        ..Default::default()
    });
    let mut handle = register(&registry, "4s").await;

    handle.start_heartbeat(Arc::new(AlwaysHealthy)).unwrap();
    advance(2_500).await;
    assert_eq!(registry.passes(), 1, "first tick attempted (and failed)");

    advance(4_000).await;
    assert_eq!(registry.passes(), 3, "later ticks keep coming on schedule");
    assert!(handle.is_heartbeat_running());

    handle.deregister().await;
}

#[tokio::test(start_paused = true)]
async fn register_then_immediate_deregister() {
    let registry = Arc::new(RecordingRegistry::default());
    let handle = register(&registry, "10s").await;

    handle.deregister().await;

    assert_eq!(
        registry.calls(),
        vec![
            Call::Register("temperature-service".into()),
            Call::Deregister("temperature-service".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn deregister_before_first_tick_sends_no_reports() {
    let registry = Arc::new(RecordingRegistry::default());
    let mut handle = register(&registry, "10s").await;

    handle.start_heartbeat(Arc::new(AlwaysHealthy)).unwrap();
    handle.deregister().await;
    advance(60_000).await;

    assert_eq!(registry.passes() + registry.fails(), 0);
    assert_eq!(registry.deregistrations(), 1);
}

#[tokio::test(start_paused = true)]
async fn ttl_four_seconds_then_deregister_stops_reports() {
    let registry = Arc::new(RecordingRegistry::default());
    let mut handle = register(&registry, "4s").await;

    handle.start_heartbeat(Arc::new(AlwaysHealthy)).unwrap();
    advance(4_500).await;
    assert_eq!(registry.passes(), 2, "ticks at ~2s and ~4s");

    handle.deregister().await;
    advance(20_000).await;

    assert_eq!(registry.passes(), 2);
    assert_eq!(registry.deregistrations(), 1);
    assert_eq!(
        registry.calls().last(),
        Some(&Call::Deregister("temperature-service".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn slow_reports_never_overlap() {
    let registry = Arc::new(RecordingRegistry {
        report_latency: Some(Duration::from_secs(3)),
        ..Default::default()
    });
    let mut handle = register(&registry, "4s").await;

    handle.start_heartbeat(Arc::new(AlwaysHealthy)).unwrap();
    advance(12_500).await;

    assert_eq!(registry.max_in_flight.load(Ordering::SeqCst), 1);

    // Each report takes 3s against a 2s period: ticks are delayed, not queued.
    let instants = registry.report_instants();
    assert!(instants.len() >= 2);
    for pair in instants.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(3));
    }

    handle.deregister().await;
}

#[tokio::test(start_paused = true)]
async fn second_heartbeat_is_rejected() {
    let registry = Arc::new(RecordingRegistry::default());
    let mut handle = register(&registry, "10s").await;

    handle.start_heartbeat(Arc::new(AlwaysHealthy)).unwrap();
    assert_matches!(
        handle.start_heartbeat(Arc::new(AlwaysHealthy)),
        Err(RegistryError::HeartbeatAlreadyRunning)
    );

    advance(5_500).await;
    assert_eq!(registry.passes(), 1);

    handle.deregister().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_registration_yields_no_handle() {
    let registry = Arc::new(RecordingRegistry {
        reject_register: true,
        ..Default::default()
    });

    let result = RegistrationHandle::register(registry.clone(), &registration("10s")).await;

    assert_matches!(result, Err(RegistryError::Rejected { status: 500, .. }));
    assert!(registry.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn handle_exposes_registration_identity() {
    let registry = Arc::new(RecordingRegistry::default());
    let handle = register(&registry, "2m").await;

    assert_eq!(handle.service_id(), "temperature-service");
    assert_eq!(handle.check_id(), "service:temperature-service");
    assert_eq!(handle.ttl().heartbeat_period(), Duration::from_secs(60));
    assert!(!handle.is_heartbeat_running());

    handle.deregister().await;
}
