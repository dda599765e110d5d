//! Query data model.
//!
//! A query is made of "who", "what", "when" and "where" clauses:
//!
//! - who: `by`, `not by`, `id by`, `except by`
//! - what: the main taxon (`of`), an ancestor taxon (`in`), controlled terms
//!   (`with`) and the `per` grouping
//! - when: `since`, `until`, `on`, each optionally qualified by `added`
//! - where: `from` (place) and `in prj` (project)
//!
//! `opt` passes miscellaneous `key=value` options straight through to the API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A taxon query composed of terms and/or phrases, a code or a taxon id,
/// filtered by ranks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonQuery {
    pub taxon_id: Option<u64>,
    pub terms: Vec<String>,
    pub phrases: Vec<Vec<String>>,
    pub ranks: Vec<String>,
    pub code: Option<String>,
}

impl TaxonQuery {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_id(taxon_id: u64) -> Self {
        Self {
            taxon_id: Some(taxon_id),
            ..Self::default()
        }
    }

    pub fn with_ranks<I, S>(mut self, ranks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ranks = ranks.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.taxon_id.is_none() && self.terms.is_empty() && self.ranks.is_empty() && self.code.is_none()
    }

    /// Terms joined for the API `q` parameter.
    pub fn search_text(&self) -> String {
        self.terms.join(" ")
    }
}

impl fmt::Display for TaxonQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(id) = self.taxon_id {
            parts.push(id.to_string());
        }
        if !self.terms.is_empty() {
            parts.push(self.terms.join(" "));
        }
        if !self.ranks.is_empty() {
            parts.push(self.ranks.join(" "));
        }
        if self.terms.is_empty() {
            if let Some(code) = &self.code {
                parts.push(code.clone());
            }
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// A date argument: either a concrete date or `any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateArg {
    Any,
    On(NaiveDate),
}

impl DateArg {
    /// Value for an iNat API date parameter.
    pub fn api_value(&self) -> String {
        match self {
            DateArg::Any => "any".to_string(),
            DateArg::On(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for DateArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_value())
    }
}

/// A controlled term and its value, e.g. `sex` / `female`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlledTermQuery {
    pub term: String,
    pub value: String,
}

impl fmt::Display for ControlledTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.term)
        } else {
            write!(f, "{} {}", self.term, self.value)
        }
    }
}

/// Naturalist information system query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub main: Option<TaxonQuery>,
    pub ancestor: Option<TaxonQuery>,
    pub user: Option<String>,
    pub place: Option<String>,
    pub project: Option<String>,
    pub controlled_term: Option<ControlledTermQuery>,
    pub unobserved_by: Option<String>,
    pub except_by: Option<String>,
    pub id_by: Option<String>,
    pub per: Option<String>,
    pub options: Vec<String>,
    pub obs_d1: Option<DateArg>,
    pub obs_d2: Option<DateArg>,
    pub obs_on: Option<DateArg>,
    pub added_d1: Option<DateArg>,
    pub added_d2: Option<DateArg>,
    pub added_on: Option<DateArg>,
}

impl Query {
    pub fn of(main: TaxonQuery) -> Self {
        Self {
            main: Some(main),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when the query filters by user or place, i.e. asks for counts
    /// rather than a plain taxon display.
    pub fn has_filters(&self) -> bool {
        self.user.is_some()
            || self.place.is_some()
            || self.project.is_some()
            || self.unobserved_by.is_some()
            || self.id_by.is_some()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses: Vec<String> = Vec::new();
        let mut add = |prefix: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                if prefix.is_empty() {
                    clauses.push(value);
                } else {
                    clauses.push(format!("{prefix} {value}"));
                }
            }
        };
        add("", self.main.as_ref().map(ToString::to_string));
        add("in", self.ancestor.as_ref().map(ToString::to_string));
        add("from", self.place.clone());
        add("in prj", self.project.clone());
        add("by", self.user.clone());
        add("id by", self.id_by.clone());
        add("not by", self.unobserved_by.clone());
        add("except by", self.except_by.clone());
        add("with", self.controlled_term.as_ref().map(ToString::to_string));
        add("per", self.per.clone());
        add(
            "opt",
            (!self.options.is_empty()).then(|| self.options.join(" ")),
        );
        add("since", self.obs_d1.map(|d| d.to_string()));
        add("until", self.obs_d2.map(|d| d.to_string()));
        add("on", self.obs_on.map(|d| d.to_string()));
        add("added since", self.added_d1.map(|d| d.to_string()));
        add("added until", self.added_d2.map(|d| d.to_string()));
        add("added on", self.added_on.map(|d| d.to_string()));
        write!(f, "{}", clauses.join(" "))
    }
}
