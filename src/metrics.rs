//! Prometheus metrics shared by the bot and the HTTP server

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    /// Labels: `command`, `outcome` (`ok` or `error`).
    pub commands_total: IntCounterVec,
    /// Labels: `listener` (`autoobs` or `dot_taxon`).
    pub listener_triggers_total: IntCounterVec,
    /// Labels: `service` (`inat` or `ebird`), `outcome`.
    pub api_requests_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests being served")?;
        let commands_total = IntCounterVec::new(
            Opts::new("fieldnotes_commands_total", "Chat commands handled"),
            &["command", "outcome"],
        )?;
        let listener_triggers_total = IntCounterVec::new(
            Opts::new(
                "fieldnotes_listener_triggers_total",
                "Messages answered by a listener",
            ),
            &["listener"],
        )?;
        let api_requests_total = IntCounterVec::new(
            Opts::new("fieldnotes_api_requests_total", "Requests sent to web APIs"),
            &["service", "outcome"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(commands_total.clone()))?;
        registry.register(Box::new(listener_triggers_total.clone()))?;
        registry.register(Box::new(api_requests_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            commands_total,
            listener_triggers_total,
            api_requests_total,
        })
    }

    pub fn record_command(&self, command: &str, ok: bool) {
        self.commands_total
            .with_label_values(&[command, if ok { "ok" } else { "error" }])
            .inc();
    }

    pub fn record_listener(&self, listener: &str) {
        self.listener_triggers_total
            .with_label_values(&[listener])
            .inc();
    }

    pub fn record_api_request(&self, service: &str, ok: bool) {
        self.api_requests_total
            .with_label_values(&[service, if ok { "ok" } else { "error" }])
            .inc();
    }

    /// Text exposition format for `/metrics`.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
