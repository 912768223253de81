//! Terminal tables for the advisor commands

use colored::Colorize;
use std::collections::BTreeMap;

use gameweek_planner::TransferPlan;
use points_engine::{FinalLineup, PointsBreakdown};
use squad_model::{
    Gameweek, LineupSlot, PlayerCatalogue, PlayerId, Position, Transfer, TransferCost,
};
use squad_optimizer::Selection;

fn name_of(catalogue: &PlayerCatalogue, id: PlayerId) -> String {
    catalogue.get(id).map(|p| p.name.clone()).unwrap_or_else(|| id.to_string())
}

fn signed(points: i32) -> String {
    let text = format!("{points:+}");
    if points > 0 {
        text.green().to_string()
    } else if points < 0 {
        text.red().to_string()
    } else {
        text.dimmed().to_string()
    }
}

pub fn breakdown(position: Position, breakdown: &PointsBreakdown) {
    println!("{}", format!("📊 Points breakdown ({position})").cyan().bold());
    let rows = [
        ("Appearance", breakdown.appearance),
        ("Goals", breakdown.goals),
        ("Assists", breakdown.assists),
        ("Clean sheet", breakdown.clean_sheet),
        ("Saves", breakdown.saves),
        ("Penalties saved", breakdown.penalties_saved),
        ("Penalties missed", breakdown.penalties_missed),
        ("Defensive contribution", breakdown.defensive_contribution),
        ("Goals conceded", breakdown.goals_conceded),
        ("Cards", breakdown.cards),
        ("Own goals", breakdown.own_goals),
        ("Bonus", breakdown.bonus),
    ];
    for (label, points) in rows.iter().filter(|(_, p)| *p != 0) {
        println!("  {label:<24} {}", signed(*points));
    }
    println!("  {:<24} {}", "Total".bold(), breakdown.total().to_string().bold());
}

fn slot_line(catalogue: &PlayerCatalogue, slot: &LineupSlot, points: Option<i32>) -> String {
    let points = points.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
    format!(
        "  {:<4} {:<28} {:>4}",
        slot.position.short_name(),
        name_of(catalogue, slot.player_id),
        points
    )
}

pub fn final_lineup(
    catalogue: &PlayerCatalogue,
    lineup: &FinalLineup,
    points: &BTreeMap<PlayerId, i32>,
    total: i32,
) {
    println!("{}", "🏟️  Final lineup".cyan().bold());
    for slot in &lineup.starters {
        let mut line = slot_line(catalogue, slot, points.get(&slot.player_id).copied());
        if lineup.captain == Some(slot.player_id) {
            line.push_str(&" (C)".yellow().bold().to_string());
        }
        println!("{line}");
    }
    println!("  {}", "Bench".dimmed());
    for slot in &lineup.bench {
        println!("{}", slot_line(catalogue, slot, points.get(&slot.player_id).copied()).dimmed());
    }
    if !lineup.substitutions.is_empty() {
        println!("  {}", "Substitutions".dimmed());
        for sub in &lineup.substitutions {
            println!(
                "    {} {} {}",
                name_of(catalogue, sub.out.player_id).red(),
                "→".dimmed(),
                name_of(catalogue, sub.incoming.player_id).green()
            );
        }
    }
    if lineup.vice_captain_promoted {
        println!("  {}", "Vice-captain took the armband".yellow());
    }
    println!("  {:<33} {}", "Total".bold(), total.to_string().bold());
}

fn transfer_line(catalogue: &PlayerCatalogue, transfer: &Transfer) -> String {
    let cost = match transfer.cost {
        TransferCost::Free => "free".green().to_string(),
        TransferCost::Hit { points } => format!("-{points}").red().to_string(),
    };
    format!(
        "    {} → {} ({cost})",
        name_of(catalogue, transfer.player_out).red(),
        name_of(catalogue, transfer.player_in).green()
    )
}

pub fn selection(catalogue: &PlayerCatalogue, selection: &Selection, gameweek: Gameweek) {
    println!("{}", format!("🧮 Squad for gameweek {gameweek}").cyan().bold());
    let mut members: Vec<_> =
        selection.squad.player_ids().filter_map(|id| catalogue.get(id)).collect();
    members.sort_by_key(|p| (p.position, std::cmp::Reverse(p.price), p.id));
    for player in members {
        let mut line = format!(
            "  {:<4} {:<28} {:>8}",
            player.position.short_name(),
            player.name,
            player.price.to_string()
        );
        if player.id == selection.lineup.captain {
            line.push_str(&" (C)".yellow().bold().to_string());
        } else if player.id == selection.lineup.vice_captain {
            line.push_str(&" (V)".yellow().to_string());
        } else if !selection.lineup.is_starter(player.id) {
            line = line.dimmed().to_string();
        }
        println!("{line}");
    }
    println!("  Bank: {}", selection.squad.bank());

    if !selection.transfers.is_empty() {
        println!("  {}", "Transfers".bold());
        for transfer in &selection.transfers {
            println!("{}", transfer_line(catalogue, transfer));
        }
    }
    println!(
        "  Projected {:.2}, hits -{}, net {}",
        selection.projected_points,
        selection.hit_points,
        format!("{:.2}", selection.net_points()).bold()
    );
}

pub fn plan(catalogue: &PlayerCatalogue, plan: &TransferPlan) {
    println!("{}", "🗓️  Transfer plan".cyan().bold());
    for step in &plan.steps {
        let chip = step
            .chip
            .map(|c| format!(" [{c}]").magenta().bold().to_string())
            .unwrap_or_default();
        println!(
            "  {}{chip}  FT {}  captain {}  net {:.2}",
            format!("GW{}", step.gameweek).bold(),
            step.free_transfers,
            name_of(catalogue, step.captain),
            step.net_points
        );
        if step.transfers.is_empty() {
            println!("    {}", "hold".dimmed());
        }
        for transfer in &step.transfers {
            println!("{}", transfer_line(catalogue, transfer));
        }
    }
    println!(
        "  Total projected {:.2}, hits -{}, net {}",
        plan.projected_points,
        plan.hit_points,
        format!("{:.2}", plan.net_points).bold()
    );
    if plan.truncated {
        println!(
            "{}",
            format!("⚠️  Search stopped early after {} expansions", plan.expansions).yellow()
        );
    }
}
