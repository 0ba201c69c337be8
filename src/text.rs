//! Display text for report categories.
//!
//! Reports store stable codes; everything a human reads is looked up here.

use std::fmt;
use std::str::FromStr;

use crate::classify::{Reason, Suggestion, SystemAlert};
use crate::trend::{Direction, TrendSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Ja,
}

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ja => "ja",
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Lang::En),
            "ja" => Ok(Lang::Ja),
            other => Err(format!("Unsupported language '{}', expected 'en' or 'ja'", other)),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub fn reason(lang: Lang, reason: Reason) -> &'static str {
    match (lang, reason) {
        (Lang::En, Reason::SustainedCpu) => "sustained high CPU",
        (Lang::En, Reason::MomentaryCpu) => "momentary high CPU (average)",
        (Lang::En, Reason::SustainedMem) => "sustained high memory",
        (Lang::En, Reason::MomentaryMem) => "momentary high memory (average)",
        (Lang::Ja, Reason::SustainedCpu) => "CPU高負荷(継続)",
        (Lang::Ja, Reason::MomentaryCpu) => "CPU高負荷(平均)",
        (Lang::Ja, Reason::SustainedMem) => "メモリ多消費(継続)",
        (Lang::Ja, Reason::MomentaryMem) => "メモリ多消費(平均)",
    }
}

pub fn suggestion(lang: Lang, suggestion: Suggestion) -> &'static str {
    match (lang, suggestion) {
        (Lang::En, Suggestion::InvestigateCpu) => {
            "CPU load is sustained. Investigate the cause or lower its priority manually (no automatic action)."
        }
        (Lang::En, Suggestion::RestartOrReconfigure) => {
            "Memory use is sustained. If it persists, consider a restart or a configuration review (no automatic action)."
        }
        (Lang::En, Suggestion::KeepMonitoring) => "Keep monitoring.",
        (Lang::Ja, Suggestion::InvestigateCpu) => {
            "CPU負荷が継続。負荷原因の調査や手動での優先度見直しを検討（自動実行はしない）"
        }
        (Lang::Ja, Suggestion::RestartOrReconfigure) => {
            "メモリ多消費が継続。長時間なら再起動/設定見直しを検討（自動実行はしない）"
        }
        (Lang::Ja, Suggestion::KeepMonitoring) => "監視継続",
    }
}

pub fn system_alert(lang: Lang, alert: SystemAlert) -> &'static str {
    match (lang, alert) {
        (Lang::En, SystemAlert::HighCpu) => "high CPU (system average)",
        (Lang::En, SystemAlert::HighMemory) => "high memory usage (system average)",
        (Lang::Ja, SystemAlert::HighCpu) => "CPU高負荷(システム平均)",
        (Lang::Ja, SystemAlert::HighMemory) => "メモリ高使用率(システム平均)",
    }
}

pub fn trend_summary(lang: Lang, summary: TrendSummary) -> &'static str {
    match (lang, summary) {
        (Lang::En, TrendSummary::Worsened) => "worsened",
        (Lang::En, TrendSummary::Improved) => "improved",
        (Lang::En, TrendSummary::Unchanged) => "unchanged",
        (Lang::Ja, TrendSummary::Worsened) => "悪化",
        (Lang::Ja, TrendSummary::Improved) => "改善",
        (Lang::Ja, TrendSummary::Unchanged) => "変化なし",
    }
}

pub fn direction_arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "↑",
        Direction::Down => "↓",
        Direction::Flat => "→",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_parse() {
        assert_eq!("EN".parse::<Lang>().unwrap(), Lang::En);
        assert_eq!(" ja ".parse::<Lang>().unwrap(), Lang::Ja);
        assert!("de".parse::<Lang>().is_err());
        assert_eq!(Lang::default().to_string(), "en");
    }

    #[test]
    fn test_lookup() {
        assert_eq!(reason(Lang::Ja, Reason::SustainedCpu), "CPU高負荷(継続)");
        assert_eq!(suggestion(Lang::En, Suggestion::KeepMonitoring), "Keep monitoring.");
        assert_eq!(trend_summary(Lang::Ja, TrendSummary::Improved), "改善");
        assert_eq!(system_alert(Lang::En, SystemAlert::HighCpu), "high CPU (system average)");
        assert_eq!(direction_arrow(Direction::Flat), "→");
    }
}
