//! Process-wide logging setup: `RUST_LOG`-driven filter plus a compact fmt layer.

use std::io::{self, IsTerminal, Write};
use std::str::FromStr;

use indicatif::ProgressBar;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

/// Crates whose events are raised to the requested verbosity.
const PIPELINE_TARGETS: [&str; 3] = ["shelf_ingest", "ingest_store", "embed_service"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Buffers one event and writes it in a single call, hiding the progress bar meanwhile.
struct BarAwareWriter {
    bar: Option<ProgressBar>,
    sink: Box<dyn Write + Send>,
    buf: Vec<u8>,
}

impl Write for BarAwareWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for BarAwareWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let buf = std::mem::take(&mut self.buf);
        let sink = &mut self.sink;
        let mut emit = || {
            let _ = sink.write_all(&buf);
            let _ = sink.flush();
        };
        match &self.bar {
            Some(pb) => pb.suspend(emit),
            None => emit(),
        }
    }
}

/// Compact single-line layer; every field choice lives on the event format,
/// which replaces the layer's own defaults.
fn layer<S, W>(make_writer: W, ansi: bool) -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(make_writer)
        .with_ansi(ansi)
        .event_format(
            fmt::format()
                .compact()
                .with_timer(ChronoRfc3339Utc)
                .with_level(true)
                .with_target(true),
        )
}

/// Filter from `RUST_LOG`, or `default` plus `level` for the pipeline crates.
fn env_filter(default: &str, level: Level) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    PIPELINE_TARGETS
        .iter()
        .filter_map(|target| {
            Directive::from_str(&format!("{target}={}", level.as_str().to_lowercase())).ok()
        })
        .fold(EnvFilter::new(default), EnvFilter::add_directive)
}

/// Installs the global subscriber writing to stderr, so stdout stays free for the summary.
///
/// With a `bar`, log lines are printed above it instead of tearing it.
/// Safe to call once; later calls are ignored.
pub fn init(verbose: bool, bar: Option<ProgressBar>) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let make_writer = move || BarAwareWriter {
        bar: bar.clone(),
        sink: Box::new(io::stderr()),
        buf: Vec::new(),
    };
    let _ = tracing_subscriber::registry()
        .with(env_filter("warn", level))
        .with(layer(make_writer, io::stderr().is_terminal()))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn default_filter_raises_pipeline_crates() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let rendered = env_filter("warn", Level::DEBUG).to_string();
        assert!(rendered.contains("ingest_store=debug"));
        assert!(rendered.contains("embed_service=debug"));
    }

    #[test]
    fn lines_start_with_whole_second_utc_timestamp() {
        let out = Shared::default();
        let sink = out.clone();
        let subscriber =
            tracing_subscriber::registry().with(layer(move || sink.clone(), false));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(batch = 1, "batch done");
        });

        let line = out.text();
        let stamp = line.split_whitespace().next().unwrap();
        assert_eq!(stamp.len(), "2025-09-12T10:20:30Z".len(), "line: {line}");
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
        assert!(line.contains("INFO"));
        assert!(line.contains("batch done"));
    }

    #[test]
    fn bar_aware_writer_emits_whole_event_on_drop() {
        let out = Shared::default();
        let mut w = BarAwareWriter {
            bar: Some(ProgressBar::hidden()),
            sink: Box::new(out.clone()),
            buf: Vec::new(),
        };
        w.write_all(b"2025-09-12T10:20:30Z  INFO ").unwrap();
        w.write_all(b"batch done\n").unwrap();
        assert!(out.text().is_empty());

        drop(w);
        assert_eq!(out.text(), "2025-09-12T10:20:30Z  INFO batch done\n");
    }
}
