//! Observation, user, place and project displays

use super::taxon::{format_name, NameOptions};
use super::{format_count, obs_url, truncate, Embed};
use crate::models::{Observation, Place, Project, User, WWW_BASE_URL};

const MAX_OBS_DESCRIPTION_LEN: usize = 500;

pub fn obs_embed(obs: &Observation, lang: Option<&str>) -> Embed {
    let title = match &obs.taxon {
        Some(taxon) => format_name(
            taxon,
            NameOptions {
                lang,
                ..NameOptions::default()
            },
        ),
        None => "Unknown".to_string(),
    };

    let mut summary = Vec::new();
    if let Some(user) = &obs.user {
        summary.push(format!("by {}", user.profile_link()));
    }
    if let Some(observed) = obs.observed_on_string.as_deref().or(obs.observed_on.as_deref()) {
        summary.push(format!("observed on {observed}"));
    }
    if let Some(place) = obs.place_guess.as_deref().filter(|p| !p.is_empty()) {
        summary.push(format!("at {place}"));
    }
    let mut description = format!("Observation {}", summary.join(" "));

    let grade = obs.quality_grade_label();
    if !grade.is_empty() {
        description.push_str(&format!("\n:white_check_mark: {grade}"));
    }
    let mut stats = Vec::new();
    if obs.identifications_count > 0 {
        stats.push(format!(":speech_left: {}", obs.identifications_count));
    }
    if obs.comments_count > 0 {
        stats.push(format!(":speech_balloon: {}", obs.comments_count));
    }
    if obs.faves_count > 0 {
        stats.push(format!(":star: {}", obs.faves_count));
    }
    if !stats.is_empty() {
        description.push_str(&format!("\n{}", stats.join(" ")));
    }
    if let Some(notes) = obs.description.as_deref().filter(|d| !d.trim().is_empty()) {
        description.push_str("\n> ");
        description.push_str(&truncate(notes.trim(), MAX_OBS_DESCRIPTION_LEN));
    }
    if obs.photos.is_empty() {
        description.push_str("\n*This observation has no images.*");
    }

    Embed::new(title)
        .url(obs.url())
        .description(description)
        .image(obs.image())
}

pub fn missing_obs_embed(obs_id: u64) -> Embed {
    Embed::new(format!("No observation found for id: {obs_id} (deleted?)"))
        .url(format!("{WWW_BASE_URL}/observations/{obs_id}"))
}

/// User profile summary.
pub fn user_embed(user: &User, mention: Option<&str>) -> Embed {
    let description = match mention {
        Some(mention) => format!("{mention} is {}", user.profile_link()),
        None => user.profile_link(),
    };
    let observations = vec![
        ("user_id".to_string(), user.id.to_string()),
        ("verifiable".to_string(), "any".to_string()),
    ];
    Embed::new(user.display_name())
        .url(user.profile_url())
        .description(description)
        .field(
            "Obs",
            format!("[{}]({})", format_count(user.observations_count), obs_url(&observations)),
            true,
        )
        .field(
            "Ids",
            format!(
                "[{}]({WWW_BASE_URL}/identifications?user_id={})",
                format_count(user.identifications_count),
                user.id
            ),
            true,
        )
}

pub fn place_embed(place: &Place, abbrev: Option<&str>) -> Embed {
    let embed = Embed::new(place.display_name.clone()).url(place.url());
    match abbrev {
        Some(abbrev) => embed.footer(format!("Place abbreviation: {abbrev}")),
        None => embed,
    }
}

pub fn project_embed(project: &Project, abbrev: Option<&str>) -> Embed {
    let mut embed = Embed::new(project.title.clone()).url(project.url());
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        embed = embed.description(truncate(description, MAX_OBS_DESCRIPTION_LEN));
    }
    embed.thumbnail = project.icon.clone();
    match abbrev {
        Some(abbrev) => embed.footer(format!("Project abbreviation: {abbrev}")),
        None => embed,
    }
}
