//! Profile and company records
//!
//! Records are value objects built from the JSON returned by the
//! extraction scripts in `automation::selectors`.

use serde::{Deserialize, Serialize};
use url::Url;

/// A person on the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Canonical key: the path segment following `/in/`
    pub id: String,
    pub link: String,
    pub name: String,
    pub title: String,
    pub location: String,

    /// Label of the primary action button at extraction time
    pub current_state_label: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experiences: Vec<Experience>,
}

impl ProfileRecord {
    /// A record known only by id, e.g. taken from the command line
    pub fn from_id(id: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link: link.into(),
            name: String::new(),
            title: String::new(),
            location: String::new(),
            current_state_label: None,
            experiences: Vec::new(),
        }
    }

    /// Name if known, id otherwise
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub period: String,
}

/// Organization page administered by the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    pub follower_count: u64,
    pub logo_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub link: String,
}

/// Extracts the canonical profile id from a profile link
///
/// `https://www.linkedin.com/in/jane-doe-42/?trk=x` yields `jane-doe-42`.
pub fn profile_id_from_link(link: &str) -> Option<String> {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments.find(|s| *s == "in")?;
    segments
        .next()
        .map(|id| id.to_string())
        .filter(|id| !id.is_empty())
}

/// Profile as returned by the extraction scripts
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawProfile {
    id: Option<String>,
    link: String,
    name: String,
    title: String,
    location: String,
    button_text: Option<String>,
    experiences: Vec<Experience>,
}

impl RawProfile {
    /// Builds a record, or `None` when no id can be derived
    pub(crate) fn into_record(self) -> Option<ProfileRecord> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .map(|id| id.trim().trim_end_matches('/').to_string())
            .or_else(|| profile_id_from_link(&self.link))?;

        Some(ProfileRecord {
            id,
            link: self.link,
            name: self.name,
            title: self.title,
            location: self.location,
            current_state_label: self
                .button_text
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty()),
            experiences: self.experiences,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawCompany {
    name: String,
    follower_count: u64,
    logo_url: Option<String>,
    cover_image_url: Option<String>,
}

impl RawCompany {
    pub(crate) fn into_record(self, id: &str, link: String) -> CompanyRecord {
        CompanyRecord {
            id: id.to_string(),
            name: self.name,
            follower_count: self.follower_count,
            logo_url: self.logo_url.filter(|u| !u.is_empty()),
            cover_image_url: self.cover_image_url.filter(|u| !u.is_empty()),
            link,
        }
    }
}
