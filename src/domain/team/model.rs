use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Team Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub name_abbr: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub home_stadium: String,
    #[serde(default)]
    pub logo_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to register a team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub name_abbr: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub home_stadium: String,
    #[serde(default)]
    pub logo_url: String,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            ..Default::default()
        }
    }

    pub fn abbr(mut self, name_abbr: impl Into<String>) -> Self {
        self.name_abbr = name_abbr.into();
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn stadium(mut self, home_stadium: impl Into<String>) -> Self {
        self.home_stadium = home_stadium.into();
        self
    }

    pub fn logo(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = logo_url.into();
        self
    }

    pub(crate) fn into_team(self, id: String, now: DateTime<Utc>) -> Team {
        Team {
            id,
            name: self.name,
            short_name: self.short_name,
            name_abbr: self.name_abbr,
            city: self.city,
            home_stadium: self.home_stadium,
            logo_url: self.logo_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial edit; absent fields keep the stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub name_abbr: Option<String>,
    pub city: Option<String>,
    pub home_stadium: Option<String>,
    pub logo_url: Option<String>,
}

impl TeamUpdate {
    /// Overlay this edit onto `team`; identity and `created_at` are untouched
    pub fn apply(self, mut team: Team) -> Team {
        if let Some(name) = self.name {
            team.name = name;
        }
        if let Some(short_name) = self.short_name {
            team.short_name = short_name;
        }
        if let Some(name_abbr) = self.name_abbr {
            team.name_abbr = name_abbr;
        }
        if let Some(city) = self.city {
            team.city = city;
        }
        if let Some(home_stadium) = self.home_stadium {
            team.home_stadium = home_stadium;
        }
        if let Some(logo_url) = self.logo_url {
            team.logo_url = logo_url;
        }
        team
    }
}
