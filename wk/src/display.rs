//! Terminal rendering of itineraries

use colored::Colorize;

use crate::domain::{Activity, Itinerary, SavedPlan};

/// Print a full itinerary, numbering days and activities from 1
pub fn print_itinerary(plan: &Itinerary) {
    println!();
    println!("{}", plan.title.bright_cyan().bold());
    println!("Estimated total: {}", plan.total_estimated_cost.yellow());

    for (d, day) in plan.itinerary.iter().enumerate() {
        println!();
        println!("{} {}  {}", format!("[{}]", d + 1).dimmed(), day.day.bold(), day.theme.italic());
        for (a, activity) in day.activities.iter().enumerate() {
            print_activity(a + 1, activity);
        }
    }

    if !plan.sources.is_empty() {
        println!();
        println!("{}", "Sources:".bright_cyan());
        for source in &plan.sources {
            let label = if source.title.is_empty() { &source.uri } else { &source.title };
            println!("  {} {}", label, source.uri.dimmed());
        }
    }
    println!();
}

fn print_activity(position: usize, activity: &Activity) {
    let marker = if activity.is_special_event { "★".bright_yellow() } else { " ".normal() };
    println!(
        "  {:>2}. {} {} {}",
        position,
        activity.time.green(),
        activity.title.bold(),
        marker
    );
    let place = match &activity.location.name {
        Some(name) if !name.is_empty() => format!("{}, {}", name, activity.location.address),
        _ => activity.location.address.clone(),
    };
    println!("      {} | {} | {}", activity.category, place.dimmed(), activity.estimated_cost.yellow());
    if let Some(travel) = &activity.travel_info {
        let from = travel.from.as_deref().map(|f| format!(" from {}", f)).unwrap_or_default();
        println!("      {} {} ({}){}", "→".dimmed(), travel.mode, travel.duration, from);
    }
}

/// One-line summary of a saved plan
pub fn print_summary(saved: &SavedPlan) {
    println!(
        "{}  {}  {}  {}",
        saved.id.cyan(),
        saved.created_at.format("%Y-%m-%d %H:%M"),
        saved.plan.title.bold(),
        saved.plan.total_estimated_cost.yellow()
    );
}
