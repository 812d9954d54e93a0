use clap::Subcommand;
use lazycat_core::format::{format_hours, format_hours_minutes};
use lazycat_core::Statistics;
use serde_json::json;

use crate::session;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's and this week's work time
    Show,
    /// Zero today's total (week is kept)
    ResetToday,
    /// Zero this week's total (today is kept)
    ResetWeek,
}

fn render(stats: &Statistics) -> serde_json::Value {
    json!({
        "today_secs": stats.today_secs,
        "week_secs": stats.week_secs,
        "today": format_hours(stats.today_secs),
        "week": format_hours(stats.week_secs),
        "today_detail": format_hours_minutes(stats.today_secs),
        "week_detail": format_hours_minutes(stats.week_secs),
    })
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = session::open_settings()?;
    let mut stats = settings.load_statistics();

    match action {
        StatsAction::Show => {}
        StatsAction::ResetToday => {
            stats.reset_today();
            settings.save_statistics(&stats)?;
        }
        StatsAction::ResetWeek => {
            stats.reset_week();
            settings.save_statistics(&stats)?;
        }
    }
    println!("{}", serde_json::to_string_pretty(&render(&stats))?);
    Ok(())
}
