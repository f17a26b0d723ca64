//! Display helpers for clip overlays and the category bar.

use chrono::{DateTime, Utc};

/// A feed tab. `category: None` shows every ready clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTab {
    pub key: &'static str,
    pub label: &'static str,
    pub category: Option<&'static str>,
    pub accent: &'static str,
}

pub const CATEGORY_TABS: [CategoryTab; 9] = [
    CategoryTab { key: "for-you", label: "For You", category: None, accent: "text-white" },
    // Ranking is upstream's business; trending shows the unfiltered feed.
    CategoryTab { key: "trending", label: "Trending", category: None, accent: "text-orange-400" },
    CategoryTab { key: "civic_education", label: "Learn", category: Some("civic_education"), accent: "text-blue-400" },
    CategoryTab { key: "promise_update", label: "Promises", category: Some("promise_update"), accent: "text-green-400" },
    CategoryTab { key: "project_showcase", label: "Projects", category: Some("project_showcase"), accent: "text-purple-400" },
    CategoryTab { key: "explainer", label: "Explainers", category: Some("explainer"), accent: "text-yellow-400" },
    CategoryTab { key: "community_report", label: "Reports", category: Some("community_report"), accent: "text-orange-400" },
    CategoryTab { key: "accountability", label: "Watchdog", category: Some("accountability"), accent: "text-red-400" },
    CategoryTab { key: "discussion", label: "Discuss", category: Some("discussion"), accent: "text-cyan-400" },
];

pub fn tab_for_key(key: &str) -> CategoryTab {
    CATEGORY_TABS
        .iter()
        .copied()
        .find(|tab| tab.key == key)
        .unwrap_or(CATEGORY_TABS[0])
}

/// `promise_update` -> `Promise Update`
pub fn format_category(category: &str) -> String {
    category
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn category_badge_class(category: &str) -> &'static str {
    match category {
        "civic_education" => "badge-blue",
        "promise_update" => "badge-green",
        "project_showcase" => "badge-purple",
        "explainer" => "badge-yellow",
        "community_report" => "badge-orange",
        "accountability" => "badge-red",
        "discussion" => "badge-cyan",
        _ => "badge-gray",
    }
}

/// Overlay badges derived from the accountability fields, in display order.
pub fn accountability_badges(
    fact_check_status: Option<&str>,
    official_response_status: Option<&str>,
    has_sources: bool,
) -> Vec<(&'static str, &'static str)> {
    let mut badges = Vec::new();
    match fact_check_status {
        Some("verified") => badges.push(("Verified", "badge-green")),
        Some("disputed") => badges.push(("Disputed", "badge-red")),
        Some("pending") => badges.push(("Checking", "badge-yellow")),
        _ => {}
    }
    match official_response_status {
        Some("responded") => badges.push(("Official Response", "badge-blue")),
        Some("awaiting") => badges.push(("Awaiting Response", "badge-orange")),
        _ => {}
    }
    if has_sources {
        badges.push(("Sources Cited", "badge-gray"));
    }
    badges
}

/// Compact counter: 950, 1.2K, 3.4M.
pub fn format_count(count: u32) -> String {
    match count {
        0..=999 => count.to_string(),
        1_000..=999_999 => trim_decimal(count as f64 / 1_000.0, "K"),
        _ => trim_decimal(count as f64 / 1_000_000.0, "M"),
    }
}

fn trim_decimal(value: f64, suffix: &str) -> String {
    let rounded = (value * 10.0).floor() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{suffix}", rounded as u64)
    } else {
        format!("{rounded:.1}{suffix}")
    }
}

/// Short relative age for an RFC 3339 timestamp: `now`, `5m`, `3h`, `2d`, `6w`.
pub fn time_ago(created_at: &str, now: DateTime<Utc>) -> Option<String> {
    let created = DateTime::parse_from_rfc3339(created_at).ok()?;
    let seconds = (now - created.with_timezone(&Utc)).num_seconds().max(0);
    Some(match seconds {
        0..=59 => "now".to_string(),
        60..=3_599 => format!("{}m", seconds / 60),
        3_600..=86_399 => format!("{}h", seconds / 3_600),
        86_400..=604_799 => format!("{}d", seconds / 86_400),
        _ => format!("{}w", seconds / 604_800),
    })
}
