//! Chat-ready rendering of API records.
//!
//! Output is Discord-flavored markdown. Embeds are plain data here; the bot
//! binary maps them onto serenity's builders and the HTTP API serializes them.

pub mod ebird;
pub mod map;
pub mod obs;
pub mod search;
pub mod taxon;

pub use taxon::{format_name, format_taxon_names, NameOptions};

use serde::{Deserialize, Serialize};

use crate::models::WWW_BASE_URL;

/// Discord rejects embed descriptions longer than this.
pub const MAX_EMBED_DESCRIPTION_LEN: usize = 4096;
/// Discord rejects plain messages longer than this.
pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn thumbnail(mut self, url: Option<&str>) -> Self {
        self.thumbnail = url.map(str::to_string);
        self
    }

    pub fn image(mut self, url: Option<String>) -> Self {
        self.image = url;
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// `1234567` → `1,234,567`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Website observation search URL for API parameters.
pub fn obs_url(params: &[(String, String)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().filter(|(k, _)| k != "per_page"))
        .finish();
    if query.is_empty() {
        format!("{WWW_BASE_URL}/observations")
    } else {
        format!("{WWW_BASE_URL}/observations?{query}")
    }
}

/// Truncate to at most `max_len` characters, marking the cut with `…`.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_len.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Pack lines into as few messages as possible, each at most `max_len`
/// characters. A single overlong line is truncated.
pub fn paginate_lines(lines: &[String], max_len: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = String::new();
    for line in lines {
        let line = truncate(line, max_len);
        if !page.is_empty() && page.chars().count() + 1 + line.chars().count() > max_len {
            pages.push(std::mem::take(&mut page));
        }
        if !page.is_empty() {
            page.push('\n');
        }
        page.push_str(&line);
    }
    if !page.is_empty() {
        pages.push(page);
    }
    pages
}
