//! Colorful console output for detection progress.
//!
//! Provides a `tracing` layer that formats the `detection_start`,
//! `round_end` and `detection_end` events of the detection loop.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. Does
/// nothing beyond that if another global subscriber is already installed.
/// `RUST_LOG` directives are honored; the default level is `info`.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(DetectionConsoleLayer)
            .try_init();
    });
}

fn print_banner() {
    let banner = r#"
 ____  _            _    _____
| __ )| | ___   ___| | _|  ___|__  _ __ __ _  ___
|  _ \| |/ _ \ / __| |/ / |_ / _ \| '__/ _` |/ _ \
| |_) | | (_) | (__|   <|  _| (_) | | | (_| |  __/
|____/|_|\___/ \___|_|\_\_|  \___/|_|  \__, |\___|
                                       |___/
"#;

    let version_line = format!(
        "             v{} - Decomposition Structure Detection\n",
        env!("CARGO_PKG_VERSION")
    );

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats detection events with colors.
pub struct DetectionConsoleLayer;

impl<S: Subscriber> Layer<S> for DetectionConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("blockforge_detect") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_detection_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    conss: Option<u64>,
    vars: Option<u64>,
    nonzeros: Option<u64>,
    detectors: Option<u64>,
    max_rounds: Option<u64>,
    round: Option<u64>,
    frontier: Option<u64>,
    complete: Option<u64>,
    elapsed_ms: Option<u64>,
    rounds: Option<u64>,
    candidates: Option<u64>,
    duplicates: Option<u64>,
    duration_ms: Option<u64>,
    best_score: Option<f64>,
    terminated_early: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "event" {
            self.event = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "event" {
            self.event = Some(value.to_string());
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let slot = match field.name() {
            "conss" => &mut self.conss,
            "vars" => &mut self.vars,
            "nonzeros" => &mut self.nonzeros,
            "detectors" => &mut self.detectors,
            "max_rounds" => &mut self.max_rounds,
            "round" => &mut self.round,
            "frontier" => &mut self.frontier,
            "complete" => &mut self.complete,
            "elapsed_ms" => &mut self.elapsed_ms,
            "rounds" => &mut self.rounds,
            "candidates" => &mut self.candidates,
            "duplicates" => &mut self.duplicates,
            "duration_ms" => &mut self.duration_ms,
            _ => return,
        };
        *slot = Some(value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if field.name() == "best_score" {
            self.best_score = Some(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "terminated_early" {
            self.terminated_early = Some(value);
        }
    }
}

fn format_detection_event(v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("detection_start") => format_detection_start(v),
        Some("round_end") => format_round_end(v),
        Some("detection_end") => format_detection_end(v),
        _ => String::new(),
    }
}

fn count(value: Option<u64>) -> String {
    value.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn format_detection_start(v: &EventVisitor) -> String {
    format!(
        "{} {} {} constraints ({}), variables ({}), nonzeros ({}), detectors ({}), max rounds ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Detection]".bright_cyan(),
        count(v.conss).bright_yellow(),
        count(v.vars).bright_yellow(),
        count(v.nonzeros).bright_yellow(),
        count(v.detectors).white(),
        count(v.max_rounds).white()
    )
}

fn format_round_end(v: &EventVisitor) -> String {
    format!(
        "    {} Round {:>3} | open ({}) | complete ({}) | {}",
        "->".bright_blue(),
        v.round.unwrap_or(0).to_string().yellow(),
        count(v.frontier).white(),
        count(v.complete).bright_green(),
        format_duration_ms(v.elapsed_ms.unwrap_or(0)).bright_black()
    )
}

fn format_detection_end(v: &EventVisitor) -> String {
    let score = v.best_score.unwrap_or(0.0);
    let mut output = format!(
        "{} {} {} Detection ended: time spent ({}), rounds ({}), best score ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Detection]".bright_cyan(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        count(v.rounds).white(),
        format_score(score)
    );

    let border = "═".repeat(58);
    output.push_str("\n\n");
    output.push_str(&format!("╔{}╗", border).bright_cyan().to_string());
    output.push('\n');
    let rows = [
        ("Candidates:", count(v.candidates)),
        ("Duplicates dropped:", count(v.duplicates)),
        ("Best score:", format!("{:.4}", score)),
        (
            "Stopped early:",
            if v.terminated_early.unwrap_or(false) { "yes" } else { "no" }.to_string(),
        ),
    ];
    for (label, value) in rows {
        output.push_str(&format!(
            "{}  {:<20}{:>34}  {}",
            "║".bright_cyan(),
            label,
            value,
            "║".bright_cyan()
        ));
        output.push('\n');
    }
    output.push_str(&format!("╚{}╝", border).bright_cyan().to_string());
    output.push('\n');

    output
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Scores lie in `[0, 1]`; higher is better.
fn format_score(score: f64) -> String {
    let text = format!("{:.4}", score);
    if score >= 0.5 {
        text.bright_green().to_string()
    } else if score > 0.0 {
        text.yellow().to_string()
    } else {
        text.white().to_string()
    }
}
