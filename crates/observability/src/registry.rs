//! Process-wide metric registry with Prometheus text exposition.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::{Counter, Gauge, Histogram};

type Labels = Vec<(String, String)>;

fn sorted_labels(labels: &[(&str, &str)]) -> Labels {
    let mut v: Labels = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    v.sort();
    v
}

fn format_labels(labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", parts.join(","))
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
struct MetricKey {
    name: String,
    labels: Labels,
}

/// A process-wide sink for counters, gauges, and histograms, keyed by
/// `(name, sorted_labels)` so repeated registration with the same labels
/// returns the same instrument instead of creating duplicates.
#[derive(Default)]
pub struct Registry {
    counters: RwLock<BTreeMap<MetricKey, Arc<Counter>>>,
    gauges: RwLock<BTreeMap<MetricKey, Arc<Gauge>>>,
    histograms: RwLock<BTreeMap<MetricKey, Arc<Histogram>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> Arc<Counter> {
        let key = MetricKey { name: name.to_string(), labels: sorted_labels(labels) };
        if let Some(c) = self.counters.read().unwrap().get(&key) {
            return c.clone();
        }
        let mut map = self.counters.write().unwrap();
        map.entry(key).or_insert_with(|| Arc::new(Counter::new())).clone()
    }

    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Arc<Gauge> {
        let key = MetricKey { name: name.to_string(), labels: sorted_labels(labels) };
        if let Some(g) = self.gauges.read().unwrap().get(&key) {
            return g.clone();
        }
        let mut map = self.gauges.write().unwrap();
        map.entry(key).or_insert_with(|| Arc::new(Gauge::new())).clone()
    }

    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Arc<Histogram> {
        let key = MetricKey { name: name.to_string(), labels: sorted_labels(labels) };
        if let Some(h) = self.histograms.read().unwrap().get(&key) {
            return h.clone();
        }
        let mut map = self.histograms.write().unwrap();
        map.entry(key)
            .or_insert_with(|| Arc::new(Histogram::with_default_buckets()))
            .clone()
    }

    /// Render every registered instrument as Prometheus exposition text
    /// (text/plain; version=0.0.4).
    pub fn export_text(&self) -> String {
        let mut out = String::new();

        let counters = self.counters.read().unwrap();
        let mut by_name: BTreeMap<&str, Vec<(&MetricKey, &Arc<Counter>)>> = BTreeMap::new();
        for (k, v) in counters.iter() {
            by_name.entry(k.name.as_str()).or_default().push((k, v));
        }
        for (name, entries) in by_name {
            out.push_str(&format!("# TYPE {name} counter\n"));
            for (key, counter) in entries {
                out.push_str(&format!(
                    "{name}{} {}\n",
                    format_labels(&key.labels),
                    counter.get()
                ));
            }
        }

        let gauges = self.gauges.read().unwrap();
        let mut by_name: BTreeMap<&str, Vec<(&MetricKey, &Arc<Gauge>)>> = BTreeMap::new();
        for (k, v) in gauges.iter() {
            by_name.entry(k.name.as_str()).or_default().push((k, v));
        }
        for (name, entries) in by_name {
            out.push_str(&format!("# TYPE {name} gauge\n"));
            for (key, gauge) in entries {
                out.push_str(&format!(
                    "{name}{} {}\n",
                    format_labels(&key.labels),
                    gauge.get()
                ));
            }
        }

        let histograms = self.histograms.read().unwrap();
        let mut by_name: BTreeMap<&str, Vec<(&MetricKey, &Arc<Histogram>)>> = BTreeMap::new();
        for (k, v) in histograms.iter() {
            by_name.entry(k.name.as_str()).or_default().push((k, v));
        }
        for (name, entries) in by_name {
            out.push_str(&format!("# TYPE {name} histogram\n"));
            for (key, hist) in entries {
                for (le, cumulative) in hist.buckets() {
                    let mut labels = key.labels.clone();
                    labels.push(("le".to_string(), le.to_string()));
                    out.push_str(&format!(
                        "{name}_bucket{} {}\n",
                        format_labels(&labels),
                        cumulative
                    ));
                }
                let mut inf_labels = key.labels.clone();
                inf_labels.push(("le".to_string(), "+Inf".to_string()));
                out.push_str(&format!(
                    "{name}_bucket{} {}\n",
                    format_labels(&inf_labels),
                    hist.count()
                ));
                out.push_str(&format!(
                    "{name}_sum{} {}\n",
                    format_labels(&key.labels),
                    hist.sum()
                ));
                out.push_str(&format!(
                    "{name}_count{} {}\n",
                    format_labels(&key.labels),
                    hist.count()
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_and_labels_returns_same_instrument() {
        let reg = Registry::new();
        let a = reg.counter("requests_total", &[("route", "/foo")]);
        let b = reg.counter("requests_total", &[("route", "/foo")]);
        a.inc();
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn label_order_does_not_create_duplicates() {
        let reg = Registry::new();
        let a = reg.counter("x", &[("a", "1"), ("b", "2")]);
        let b = reg.counter("x", &[("b", "2"), ("a", "1")]);
        a.inc();
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn export_text_contains_type_and_value_lines() {
        let reg = Registry::new();
        reg.counter("jobs_total", &[]).add(3);
        let text = reg.export_text();
        assert!(text.contains("# TYPE jobs_total counter"));
        assert!(text.contains("jobs_total 3"));
    }

    #[test]
    fn histogram_export_includes_buckets_sum_count() {
        let reg = Registry::new();
        let h = reg.histogram("latency_ms", &[]);
        h.observe(7.0);
        let text = reg.export_text();
        assert!(text.contains("latency_ms_bucket"));
        assert!(text.contains("latency_ms_sum"));
        assert!(text.contains("latency_ms_count"));
    }
}
