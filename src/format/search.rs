//! Search result lines and the search embed

use super::taxon::{format_name, NameOptions};
use super::{format_count, Embed};
use crate::models::{
    escape_markdown, Observation, Place, Project, SearchResult, Taxon, User, WWW_BASE_URL,
};

/// Results shown in one search embed.
pub const SEARCH_PAGE_SIZE: usize = 10;

pub fn taxon_result_line(taxon: &Taxon) -> String {
    format!(
        ":green_circle: [{}]({})",
        format_name(taxon, NameOptions::with_term()),
        taxon.url()
    )
}

/// A site search result, or `None` for record types we don't show.
pub fn search_result_line(result: &SearchResult) -> Option<String> {
    let record = result.record.clone();
    match result.kind.as_str() {
        "Taxon" => serde_json::from_value::<Taxon>(record)
            .ok()
            .map(|taxon| taxon_result_line(&taxon)),
        "Place" => serde_json::from_value::<Place>(record)
            .ok()
            .map(|place| format!(":round_pushpin: [{}]({})", place.display_name, place.url())),
        "Project" => serde_json::from_value::<Project>(record)
            .ok()
            .map(|project| format!(":briefcase: [{}]({})", project.title, project.url())),
        "User" => serde_json::from_value::<User>(record)
            .ok()
            .map(|user| format!(":bust_in_silhouette: {}", user.profile_link())),
        _ => None,
    }
}

/// `[Name](url) by login on date`
pub fn obs_result_line(obs: &Observation) -> String {
    let name = match &obs.taxon {
        Some(taxon) => format_name(taxon, NameOptions::with_term()),
        None => "Unknown".to_string(),
    };
    let mut line = format!("[{name}]({})", obs.url());
    if let Some(user) = &obs.user {
        line.push_str(&format!(" by {}", escape_markdown(&user.login)));
    }
    if let Some(observed) = obs.observed_on.as_deref().or(obs.observed_on_string.as_deref()) {
        line.push_str(&format!(" on {observed}"));
    }
    line
}

/// Website search URL for `query`, optionally narrowed to one source.
pub fn site_search_url(query: &str, source: Option<&str>) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    params.append_pair("q", query);
    if let Some(source) = source {
        params.append_pair("sources", source);
    }
    format!("{WWW_BASE_URL}/search?{}", params.finish())
}

pub fn inactive_search_url(query: &str) -> String {
    let params = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query)
        .append_pair("is_active", "any")
        .append_pair("sources", "inactive")
        .finish();
    format!("{WWW_BASE_URL}/taxa/search?{params}")
}

/// The first page of results. The footer says how many more there are.
pub fn search_embed(title: &str, url: &str, lines: &[String], total: u64) -> Embed {
    let shown = &lines[..lines.len().min(SEARCH_PAGE_SIZE)];
    let embed = Embed::new(format!("Search: {title}"))
        .url(url)
        .description(shown.join("\n"));
    if total > shown.len() as u64 {
        embed.footer(format!(
            "Showing {} of {} results",
            shown.len(),
            format_count(total)
        ))
    } else {
        embed
    }
}
