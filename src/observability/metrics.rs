use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub parcels_booked_total: IntCounter,
    pub assignments_total: IntCounterVec,
    pub status_updates_total: IntCounterVec,
    pub lifecycle_rejections_total: IntCounterVec,
    pub events_published_total: IntCounterVec,
    pub realtime_observers: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let parcels_booked_total =
            IntCounter::new("parcels_booked_total", "Total parcels booked")
                .expect("valid parcels_booked_total metric");

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Agent assignments by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let status_updates_total = IntCounterVec::new(
            Opts::new("status_updates_total", "Applied status transitions by target status"),
            &["status"],
        )
        .expect("valid status_updates_total metric");

        let lifecycle_rejections_total = IntCounterVec::new(
            Opts::new(
                "lifecycle_rejections_total",
                "Rejected lifecycle operations by operation and error kind",
            ),
            &["operation", "kind"],
        )
        .expect("valid lifecycle_rejections_total metric");

        let events_published_total = IntCounterVec::new(
            Opts::new("events_published_total", "Lifecycle events broadcast by kind"),
            &["kind"],
        )
        .expect("valid events_published_total metric");

        let realtime_observers =
            IntGauge::new("realtime_observers", "Currently connected realtime observers")
                .expect("valid realtime_observers metric");

        registry
            .register(Box::new(parcels_booked_total.clone()))
            .expect("register parcels_booked_total");
        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(status_updates_total.clone()))
            .expect("register status_updates_total");
        registry
            .register(Box::new(lifecycle_rejections_total.clone()))
            .expect("register lifecycle_rejections_total");
        registry
            .register(Box::new(events_published_total.clone()))
            .expect("register events_published_total");
        registry
            .register(Box::new(realtime_observers.clone()))
            .expect("register realtime_observers");

        Self {
            registry,
            parcels_booked_total,
            assignments_total,
            status_updates_total,
            lifecycle_rejections_total,
            events_published_total,
            realtime_observers,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
