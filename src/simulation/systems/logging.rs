//! Colorized daily RGO pulse logging for quick CLI scanning.

use bevy_ecs::prelude::*;
use colored::{Color, Colorize};
use tracing::info;

use crate::simulation::{DailySummary, MapInstance, RgoLedger};

fn badge(label: &str, color: Color) -> String {
    format!("[{}]", label).color(color).to_string()
}

fn trend_color(today: f64, yesterday: Option<f64>) -> Color {
    match yesterday {
        Some(previous) if today > previous => Color::BrightGreen,
        Some(previous) if today < previous => Color::BrightRed,
        _ => Color::White,
    }
}

pub fn format_number_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

fn format_summary_line(summary: &DailySummary, yesterday_revenue: Option<f64>) -> String {
    let revenue = format!("{:.2}", summary.revenue)
        .color(trend_color(summary.revenue, yesterday_revenue))
        .bold()
        .to_string();
    let destroyed = summary.destroyed();
    let mut line = format!(
        "{} {} {} revenue {} | output {:.2} | owners {:.2} | workers {:.2} | employed {} ({} paid)",
        badge("RGO", Color::BrightWhite),
        badge(&format!("Day {}", summary.day), Color::BrightBlack),
        badge(&format!("{} active", summary.active_rgos), Color::BrightCyan),
        revenue,
        summary.output,
        summary.owner_income,
        summary.worker_income,
        format_number_commas(summary.employed.max(0) as u64),
        format_number_commas(summary.paid_employed.max(0) as u64),
    );
    if destroyed > 0.005 {
        line.push_str(&format!(
            " | {}",
            format!("unpaid {:.2}", destroyed).color(Color::Yellow)
        ));
    }
    line
}

fn format_leader_line(map: &MapInstance) -> Option<String> {
    let (province, rgo) = map
        .provinces()
        .iter()
        .filter_map(|province| Some((province, province.rgo()?)))
        .max_by_key(|(_, rgo)| rgo.revenue_yesterday())?;
    let good = province
        .rgo_good()
        .map(|good| good.identifier.as_str())
        .unwrap_or("idle");
    Some(format!(
        "{} {} {} earns {}",
        badge("Top", Color::BrightYellow),
        badge(good, Color::BrightGreen),
        province.identifier().bold(),
        format!("{:.2}", rgo.revenue_yesterday().to_f64()).color(Color::BrightYellow),
    ))
}

pub fn logging_system(map: Res<MapInstance>, ledger: Res<RgoLedger>) {
    let history = &ledger.revenue_history;
    let yesterday_revenue = history.len().checked_sub(2).map(|index| history[index]);
    let mut lines = vec![format_summary_line(&ledger.latest, yesterday_revenue)];
    if let Some(leader) = format_leader_line(&map) {
        lines.push(leader);
    }
    info!("\n{}", lines.join("\n"));
}
