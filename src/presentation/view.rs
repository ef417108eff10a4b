use crate::application::wizard::{StageStatus, StageView, Wizard};
use crate::domain::model::{Category, IndexColor};
use crate::domain::stage::Stage;
use crate::presentation::theme::Theme;
use chrono::{Local, TimeZone};
use std::fmt::Write;

fn format_time(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::BlueChip => "BlueChip",
        Category::Growth => "Growth",
    }
}

/// Format the current stage as text
pub fn format_stage(wizard: &Wizard, theme: &Theme, enable_emoji: bool) -> String {
    let view = wizard.view();
    let mut output = String::new();

    let status = match (&view.status, enable_emoji) {
        (StageStatus::Empty, true) => "○ [empty]".to_string(),
        (StageStatus::Empty, false) => "[empty]".to_string(),
        (StageStatus::Ready, true) => "● [ready]".to_string(),
        (StageStatus::Ready, false) => "[ready]".to_string(),
        (StageStatus::Busy, true) => "⏳ [running]".to_string(),
        (StageStatus::Busy, false) => "[running]".to_string(),
        (StageStatus::Failed(_), true) => "⚠️  [failed]".to_string(),
        (StageStatus::Failed(_), false) => "[failed]".to_string(),
    };

    let heading = match (&view.subject, view.stage.is_global()) {
        (Some(subject), false) => format!("{} · {}", view.stage.label(), subject),
        _ => view.stage.label().to_string(),
    };
    writeln!(output, "{} {}", (theme.title)(&heading), (theme.label)(&status)).ok();
    writeln!(output, "  {}", (theme.line)(&"─".repeat(40))).ok();

    match &view.status {
        StageStatus::Failed(message) => {
            writeln!(output, "  {}", (theme.warn)(message)).ok();
            writeln!(output, "  {}", (theme.dim)("Retry with --run.")).ok();
        }
        StageStatus::Empty if !view.stage.is_global() && view.subject.is_none() => {
            writeln!(output, "  {}", (theme.dim)("Pick a subject first.")).ok();
        }
        StageStatus::Empty => {
            writeln!(output, "  {}", (theme.dim)("No result yet. Run this stage with --run.")).ok();
        }
        _ => {}
    }

    if wizard.has_result(view.stage) {
        write_body(&mut output, wizard, view.stage, theme);
    }

    write_footer(&mut output, &view, theme);
    output
}

fn write_body(output: &mut String, wizard: &Wizard, stage: Stage, theme: &Theme) {
    let record = wizard.record();
    match stage {
        Stage::MarketScan => {
            let Some(scan) = wizard.market_scan() else {
                return;
            };
            writeln!(
                output,
                "  {} {}  {} {}/100",
                (theme.label)("Status"),
                (theme.body)(&scan.market_status),
                (theme.label)("Timing"),
                scan.timing_score
            )
            .ok();
            for index in &scan.indices {
                let change = match index.color {
                    IndexColor::Red => (theme.warn)(&index.change),
                    IndexColor::Blue => (theme.good)(&index.change),
                    IndexColor::Gray => (theme.dim)(&index.change),
                };
                writeln!(output, "  {:<10} {:>12} {}", index.name, index.value, change).ok();
            }
            if !scan.leading_sectors.is_empty() {
                writeln!(
                    output,
                    "  {} {}",
                    (theme.label)("Sectors"),
                    scan.leading_sectors.join(", ")
                )
                .ok();
            }
            write_text(output, &scan.summary, theme);
            writeln!(output, "  {}", (theme.line)(&"─".repeat(40))).ok();
            for (i, pick) in scan.recommendations.iter().enumerate() {
                writeln!(
                    output,
                    "  {}. {} {} [{}] {} · {}",
                    i + 1,
                    (theme.good)(&pick.ticker),
                    pick.name,
                    category_label(pick.category),
                    pick.sector,
                    pick.current_price
                )
                .ok();
                if !pick.reason.is_empty() {
                    writeln!(output, "     {}", (theme.dim)(&pick.reason)).ok();
                }
            }
        }
        Stage::DayTradingScan => {
            let Some(result) = wizard.day_trading() else {
                return;
            };
            write_text(output, &result.summary, theme);
            for (i, stock) in result.recommendations.iter().enumerate() {
                let setup = &stock.larry_williams;
                writeln!(
                    output,
                    "  {}. {} {} [{}] {} → {} (stop {})",
                    i + 1,
                    (theme.good)(&stock.ticker),
                    stock.name,
                    category_label(stock.category),
                    stock.current_price,
                    stock.target_price,
                    stock.stop_loss
                )
                .ok();
                writeln!(
                    output,
                    "     {} {} (k={:.2}) {}",
                    (theme.label)("Breakout"),
                    setup.breakout_price,
                    setup.k_value,
                    (theme.warn)(&setup.status)
                )
                .ok();
                let filters = &stock.fake_breakout_filters;
                writeln!(
                    output,
                    "     {} noise {:.2} · ma {} · volume {} · {} · pin bar {}",
                    (theme.label)("Filters"),
                    filters.noise_ratio,
                    filters.ma_trend,
                    filters.volume_spike,
                    filters.disparity,
                    filters.pin_bar_warning
                )
                .ok();
            }
        }
        Stage::Financials => write_text(output, &record.financial_analysis, theme),
        Stage::Sentiment => {
            writeln!(
                output,
                "  {} {}/100",
                (theme.label)("Score"),
                record.sentiment_score
            )
            .ok();
            write_text(output, &record.sentiment_analysis, theme);
        }
        Stage::PeerScreen => write_text(output, &record.peer_comparison, theme),
        Stage::LegendPanel => {
            let scores = &record.legend_scores;
            writeln!(
                output,
                "  {} Buffett {} · Lynch {} · O'Neil {} · {} {}",
                (theme.label)("Scores"),
                scores.buffett,
                scores.lynch,
                scores.oneil,
                (theme.label)("Total"),
                (theme.good)(&scores.total.to_string())
            )
            .ok();
            write_text(output, &record.legend_analysis, theme);
            if !record.insider_summary.is_empty() {
                writeln!(output, "  {}", (theme.label)("Insider activity")).ok();
                write_text(output, &record.insider_summary, theme);
            }
        }
        Stage::Strategy => write_text(output, &record.final_strategy, theme),
    }
}

fn write_text(output: &mut String, text: &str, theme: &Theme) {
    for line in text.lines() {
        writeln!(output, "  {}", (theme.body)(line)).ok();
    }
}

fn write_footer(output: &mut String, view: &StageView, theme: &Theme) {
    writeln!(output).ok();
    if let Some(at) = view.cached_at {
        let mut line = format!("Updated {}", format_time(at));
        if let Some(expires) = view.expires_at {
            write!(line, " · expires {}", format_time(expires)).ok();
        }
        writeln!(output, "  {}", (theme.dim)(&line)).ok();
    }
    if let Some(next) = view.stage.next().filter(|_| view.can_advance) {
        writeln!(
            output,
            "  {}",
            (theme.dim)(&format!("Next: {} (--advance)", next.label()))
        )
        .ok();
    }
}
