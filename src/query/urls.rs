//! Recognizers for iNaturalist network URLs

use once_cell::sync::Lazy;
use regex::Regex;

/// Any iNaturalist network site. Each partner domain follows one of four
/// schemes: `<partner>.inaturalist.org`, `inaturalist.<partner>.<tld>`,
/// `[www.]inaturalist.<tld>` or `[www.]<partner>.<tld>`.
const WWW_URL_PAT: &str = concat!(
    r"https?://(",
    r"((www|colombia|costarica|panama|ecuador|israel|greece|uk|guatemala|taiwan)\.)?inaturalist\.org",
    r"|inaturalist\.(ala\.org\.au|laji\.fi|mma\.gob\.cl)",
    r"|(www\.)?(",
    r"inaturalist\.(ca|lu|nz|se)",
    r"|naturalista\.(mx|uy)",
    r"|biodiversity4all\.org",
    r"|argentinat\.org",
    r"))"
);

fn compile(path: &str) -> Regex {
    let pattern = format!(r"(?i)\b(?P<url>{WWW_URL_PAT}{path})\b");
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid url pattern {pattern}: {e}"))
}

static TAXON_LINK: Lazy<Regex> = Lazy::new(|| compile(r"/taxa/(?P<taxon_id>\d+)"));
static OBS_LINK: Lazy<Regex> = Lazy::new(|| compile(r"/observations/(?P<obs_id>\d+)"));
static PLACE_LINK: Lazy<Regex> = Lazy::new(|| {
    compile(r"/places/((?P<place_id>\d+)|(?P<place_slug>[a-z][-_a-z0-9]{2,39}))")
});
static PROJECT_LINK: Lazy<Regex> = Lazy::new(|| {
    compile(r"/projects/((?P<project_id>\d+)|(?P<project_slug>[a-z][-_a-z0-9]{2,39}))")
});
static USER_LINK: Lazy<Regex> = Lazy::new(|| {
    compile(r"/(people|users)/((?P<user_id>\d+)|(?P<login>[a-z][-_a-z0-9]{2,39}))")
});

/// A link to an entity by id or by slug/login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Id(u64),
    Slug(String),
}

impl EntityRef {
    /// The path segment used to fetch the entity.
    pub fn as_path(&self) -> String {
        match self {
            EntityRef::Id(id) => id.to_string(),
            EntityRef::Slug(slug) => slug.clone(),
        }
    }
}

/// An observation link found in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsLink {
    pub obs_id: u64,
    pub url: String,
}

pub fn taxon_id_from_url(text: &str) -> Option<u64> {
    TAXON_LINK
        .captures(text)
        .and_then(|caps| caps.name("taxon_id"))
        .and_then(|m| m.as_str().parse().ok())
}

/// First observation link in `text`.
pub fn find_obs_link(text: &str) -> Option<ObsLink> {
    let caps = OBS_LINK.captures(text)?;
    Some(ObsLink {
        obs_id: caps.name("obs_id")?.as_str().parse().ok()?,
        url: caps.name("url")?.as_str().to_string(),
    })
}

fn entity_ref(re: &Regex, text: &str, id_group: &str, slug_group: &str) -> Option<EntityRef> {
    let caps = re.captures(text)?;
    if let Some(id) = caps.name(id_group) {
        return id.as_str().parse().ok().map(EntityRef::Id);
    }
    caps.name(slug_group)
        .map(|slug| EntityRef::Slug(slug.as_str().to_string()))
}

pub fn place_from_url(text: &str) -> Option<EntityRef> {
    entity_ref(&PLACE_LINK, text, "place_id", "place_slug")
}

pub fn project_from_url(text: &str) -> Option<EntityRef> {
    entity_ref(&PROJECT_LINK, text, "project_id", "project_slug")
}

pub fn user_from_url(text: &str) -> Option<EntityRef> {
    entity_ref(&USER_LINK, text, "user_id", "login")
}
