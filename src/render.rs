//! Plain-text console rendering of a report.

use std::fmt::Write as FmtWrite;
use std::path::Path;

use crate::report::Report;
use crate::text::{self, Lang};
use crate::trend::TrendResult;

fn or_dash(v: Option<&str>) -> &str {
    v.unwrap_or("-")
}

pub fn render_trend(trend: &TrendResult, lang: Lang) -> String {
    let d = &trend.delta;
    let dir = &trend.direction;
    format!(
        "trend: {} vs {} (score {:+.1}{} / alerts {:+}{} / cpu {:+.1}{} / mem {:+.1}{})",
        text::trend_summary(lang, trend.summary),
        trend.previous_report,
        d.stress_score,
        text::direction_arrow(dir.stress_score),
        d.alerts_count,
        text::direction_arrow(dir.alerts_count),
        d.cpu_avg,
        text::direction_arrow(dir.cpu_avg),
        d.mem_avg,
        text::direction_arrow(dir.mem_avg),
    )
}

/// The short summary printed after every run.
pub fn render_summary(report: &Report, path: Option<&Path>, lang: Lang) -> String {
    let mut out = String::new();

    if let Some(path) = path {
        writeln!(out, "[OK] wrote: {}", path.display()).ok();
    }
    writeln!(
        out,
        "system: cpu_avg={}% mem_avg={}% score={}",
        report.system.cpu_avg, report.system.mem_avg, report.system.stress_score
    )
    .ok();
    for alert in &report.system.alerts {
        writeln!(out, "  ! {}", text::system_alert(lang, *alert)).ok();
    }
    writeln!(out, "alerts: {}", report.alerts.len()).ok();
    if let Some(trend) = &report.trend {
        writeln!(out, "{}", render_trend(trend, lang)).ok();
    }
    out
}

/// Top-N table plus every alert with its reasons and suggestion.
pub fn render_details(report: &Report, lang: Lang) -> String {
    let mut out = String::new();

    writeln!(out).ok();
    writeln!(
        out,
        "{:>7} | {:20} | {:12} | {:>7} | {:>7} | {:>7} | {:>7}",
        "pid", "name", "user", "cpu avg", "cpu max", "mem avg", "mem max"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(88)).ok();
    for p in &report.top_processes {
        writeln!(
            out,
            "{:>7} | {:20} | {:12} | {:>7.1} | {:>7.1} | {:>7.1} | {:>7.1}",
            p.pid,
            or_dash(p.name.as_deref()),
            or_dash(p.user.as_deref()),
            p.cpu_avg,
            p.cpu_peak,
            p.mem_avg,
            p.mem_peak
        )
        .ok();
    }

    for alert in &report.alerts {
        let reasons: Vec<&str> = alert.reasons.iter().map(|r| text::reason(lang, *r)).collect();
        writeln!(out).ok();
        writeln!(
            out,
            "[{}] {} ({}): {}",
            alert.pid,
            or_dash(alert.name.as_deref()),
            or_dash(alert.user.as_deref()),
            reasons.join(", ")
        )
        .ok();
        writeln!(
            out,
            "    cpu {:.1}% (max {:.1}%), mem {:.1}% (max {:.1}%), over threshold {}/{}",
            alert.cpu_avg,
            alert.cpu_peak,
            alert.mem_avg,
            alert.mem_peak,
            alert.sustain_count,
            alert.samples
        )
        .ok();
        writeln!(out, "    -> {}", text::suggestion(lang, alert.suggestion)).ok();
    }
    out
}
