//! Text formatting shared by the sidebar, popups and status line.

use crate::types::Listing;

/// Formats an amount as Indian rupees without decimals, using Indian digit grouping
/// (`150000` becomes `₹1,50,000`). Non-finite amounts are treated as zero.
pub fn format_inr(value: f64) -> String {
    let value = if value.is_finite() { value.round() } else { 0.0 };
    let grouped = group_indian(&format!("{}", value.abs() as u64));

    if value < 0.0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

/// `₹8,500/mo`
pub fn format_monthly(value: f64) -> String {
    format!("{}/mo", format_inr(value))
}

/// `3/4 occupied · 1 open`
pub fn format_capacity(listing: &Listing) -> String {
    format!(
        "{}/{} occupied · {} open",
        listing.capacity_occupied.unwrap_or(0),
        listing.capacity_total.unwrap_or(0),
        listing.open_slots()
    )
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::with_capacity(head.len() / 2 + 1);
    while head.len() > 2 {
        let (rest, group) = head.split_at(head.len() - 2);
        groups.push(group);
        head = rest;
    }
    if !head.is_empty() {
        groups.push(head);
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
