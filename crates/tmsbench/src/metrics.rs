//! Suite metrics through the `metrics` facade, with an in-process recorder
//! that prints a summary when `--metrics` is passed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use parking_lot::RwLock;

use crate::suite::MetricsRecord;

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!(
        "tmsbench_runs_total",
        Unit::Count,
        "Benchmark pairs measured, by status"
    );
    describe_counter!(
        "tmsbench_passed_total",
        Unit::Count,
        "Benchmark pairs that reached the idle halt"
    );
    describe_gauge!(
        "tmsbench_code_size_bytes",
        Unit::Bytes,
        ".text size per benchmark and opt level"
    );
    describe_gauge!(
        "tmsbench_steps",
        Unit::Count,
        "Instructions executed per benchmark and opt level"
    );
    describe_gauge!(
        "tmsbench_cycles",
        Unit::Count,
        "Simulated cycles per benchmark and opt level"
    );
    describe_histogram!(
        "tmsbench_sim_duration_seconds",
        Unit::Seconds,
        "Wall-clock time of simulator invocations"
    );
}

/// Record one finished pair.
#[allow(clippy::cast_precision_loss)]
pub fn record_outcome(record: &MetricsRecord) {
    counter!("tmsbench_runs_total", "status" => record.status.to_string()).increment(1);
    if record.status.is_pass() {
        counter!("tmsbench_passed_total").increment(1);
    }

    let labels = [
        ("bench", record.bench.clone()),
        ("opt", record.opt.tag()),
    ];
    gauge!("tmsbench_code_size_bytes", &labels).set(record.code_size as f64);
    gauge!("tmsbench_steps", &labels).set(record.steps as f64);
    gauge!("tmsbench_cycles", &labels).set(record.cycles as f64);
}

/// Record the wall time of one simulator invocation.
pub fn record_simulation(elapsed: Duration) {
    histogram!("tmsbench_sim_duration_seconds").record(elapsed.as_secs_f64());
}

// ============================================================================
// CLI recorder
// ============================================================================

#[derive(Default)]
struct Store {
    counters: RwLock<BTreeMap<String, u64>>,
    gauges: RwLock<BTreeMap<String, f64>>,
    histograms: RwLock<BTreeMap<String, Vec<f64>>>,
}

struct Handle {
    key: String,
    store: Arc<Store>,
}

impl metrics::CounterFn for Handle {
    fn increment(&self, value: u64) {
        *self.store.counters.write().entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.store.counters.write().insert(self.key.clone(), value);
    }
}

impl metrics::GaugeFn for Handle {
    fn increment(&self, value: f64) {
        *self.store.gauges.write().entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        *self.store.gauges.write().entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        self.store.gauges.write().insert(self.key.clone(), value);
    }
}

impl metrics::HistogramFn for Handle {
    fn record(&self, value: f64) {
        self.store
            .histograms
            .write()
            .entry(self.key.clone())
            .or_default()
            .push(value);
    }
}

fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

/// Recorder that keeps everything in memory for a terminal summary.
#[derive(Default)]
pub struct CliRecorder {
    store: Arc<Store>,
}

impl CliRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the global recorder. `None` if one is already installed.
    #[must_use]
    pub fn install(self) -> Option<CliRecorderHandle> {
        let store = Arc::clone(&self.store);
        metrics::set_global_recorder(self).ok()?;
        Some(CliRecorderHandle { store })
    }

    fn handle(&self, key: &Key) -> Arc<Handle> {
        Arc::new(Handle {
            key: key_to_string(key),
            store: Arc::clone(&self.store),
        })
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(self.handle(key))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(self.handle(key))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(self.handle(key))
    }
}

/// Access to the values collected by an installed [`CliRecorder`].
pub struct CliRecorderHandle {
    store: Arc<Store>,
}

impl CliRecorderHandle {
    #[must_use]
    pub fn counter(&self, key: &str) -> Option<u64> {
        self.store.counters.read().get(key).copied()
    }

    #[must_use]
    pub fn gauge(&self, key: &str) -> Option<f64> {
        self.store.gauges.read().get(key).copied()
    }

    /// Render all collected metrics.
    #[must_use]
    pub fn render_summary(&self) -> String {
        use std::fmt::Write;

        let counters = self.store.counters.read();
        let gauges = self.store.gauges.read();
        let histograms = self.store.histograms.read();
        if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
            return "No metrics collected.\n".to_string();
        }

        let mut out = String::from("\n## Metrics Summary\n\n");
        if !counters.is_empty() {
            out.push_str("### Counters\n");
            for (key, value) in counters.iter() {
                let _ = writeln!(out, "  {key}: {value}");
            }
            out.push('\n');
        }
        if !gauges.is_empty() {
            out.push_str("### Gauges\n");
            for (key, value) in gauges.iter() {
                let _ = writeln!(out, "  {key}: {value}");
            }
            out.push('\n');
        }
        let recorded: Vec<_> = histograms.iter().filter(|(_, v)| !v.is_empty()).collect();
        if !recorded.is_empty() {
            out.push_str("### Histograms\n");
        }
        for (key, values) in recorded {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            #[allow(clippy::cast_precision_loss)]
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            let _ = writeln!(
                out,
                "  {key}: count={}, min={min:.6}, max={max:.6}, avg={avg:.6}",
                values.len()
            );
        }
        out
    }

    /// Print the summary to stderr, keeping stdout for reports.
    pub fn print_summary(&self) {
        eprint!("{}", self.render_summary());
    }
}
