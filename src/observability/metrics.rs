use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub booking_transitions_total: IntCounterVec,
    pub booking_transition_seconds: HistogramVec,
    pub bookings_created_total: IntCounter,
    pub vehicles_available: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let booking_transitions_total = IntCounterVec::new(
            Opts::new(
                "booking_transitions_total",
                "Booking lifecycle operations by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid booking_transitions_total metric");

        let booking_transition_seconds = HistogramVec::new(
            HistogramOpts::new(
                "booking_transition_seconds",
                "Latency of booking lifecycle operations in seconds",
            ),
            &["operation"],
        )
        .expect("valid booking_transition_seconds metric");

        let bookings_created_total =
            IntCounter::new("bookings_created_total", "Total bookings created")
                .expect("valid bookings_created_total metric");

        let vehicles_available = IntGauge::new(
            "vehicles_available",
            "Approved vehicles not currently on a trip",
        )
        .expect("valid vehicles_available metric");

        registry
            .register(Box::new(booking_transitions_total.clone()))
            .expect("register booking_transitions_total");
        registry
            .register(Box::new(booking_transition_seconds.clone()))
            .expect("register booking_transition_seconds");
        registry
            .register(Box::new(bookings_created_total.clone()))
            .expect("register bookings_created_total");
        registry
            .register(Box::new(vehicles_available.clone()))
            .expect("register vehicles_available");

        Self {
            registry,
            booking_transitions_total,
            booking_transition_seconds,
            bookings_created_total,
            vehicles_available,
        }
    }

    pub fn observe_transition(&self, operation: &str, outcome: &str, elapsed_secs: f64) {
        self.booking_transitions_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.booking_transition_seconds
            .with_label_values(&[operation])
            .observe(elapsed_secs);
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
