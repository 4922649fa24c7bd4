use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A movie as served by `/movies/`. Older backend builds used the compact
/// field names (`posterurl`, `lengthmin`, ...), accepted here as aliases.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Movie {
    pub eidr: String,
    pub title: String,
    #[serde(default, alias = "posterurl")]
    pub poster_url: Option<String>,
    #[serde(default, alias = "trailerurl")]
    pub trailer_url: Option<String>,
    #[serde(default, alias = "lengthmin")]
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default, alias = "releasedate")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub review_count: u32,
}

/// Create/update body for `/movies/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MovieInput {
    pub eidr: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub duration_min: Option<u32>,
    pub rating: Option<String>,
    pub release_date: Option<String>,
    pub language: String,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genre_ids: Vec<i64>,
    pub cast: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewGenre {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Review {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub movie_eidr: Option<String>,
    pub user_id: UserId,
    pub rating: f64,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewReview {
    pub rating: f64,
    pub review_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryFeed {
    #[serde(rename = "now-showing")]
    NowShowing,
    #[serde(rename = "this-week")]
    ThisWeek,
    #[serde(rename = "coming-soon")]
    ComingSoon,
}

impl DiscoveryFeed {
    pub const ALL: [DiscoveryFeed; 3] = [
        DiscoveryFeed::NowShowing,
        DiscoveryFeed::ThisWeek,
        DiscoveryFeed::ComingSoon,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            DiscoveryFeed::NowShowing => "now-showing",
            DiscoveryFeed::ThisWeek => "this-week",
            DiscoveryFeed::ComingSoon => "coming-soon",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            DiscoveryFeed::NowShowing => "Now Showing",
            DiscoveryFeed::ThisWeek => "This Week",
            DiscoveryFeed::ComingSoon => "Coming Soon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Title,
    ReleaseDate,
    Rating,
    Duration,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Title,
        SortKey::ReleaseDate,
        SortKey::Rating,
        SortKey::Duration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::ReleaseDate => "release_date",
            SortKey::Rating => "rating",
            SortKey::Duration => "duration",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Title => "Title",
            SortKey::ReleaseDate => "Release Date",
            SortKey::Rating => "Rating",
            SortKey::Duration => "Duration",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        SortKey::ALL.into_iter().find(|k| k.as_str() == input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Query for `GET /movies/`. Unset fields are left out of the query string.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub genres: Vec<String>,
    pub languages: Option<String>,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub age_rating: Option<String>,
    pub sort_by: Option<SortKey>,
    pub order: Option<SortOrder>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

/// Role picked on the login form. The backend decides the real role from
/// the credentials; this one only labels the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginRole {
    Buyer,
    Owner,
    Superadmin,
}

impl LoginRole {
    pub const ALL: [LoginRole; 3] = [LoginRole::Buyer, LoginRole::Owner, LoginRole::Superadmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoginRole::Buyer => "buyer",
            LoginRole::Owner => "owner",
            LoginRole::Superadmin => "superadmin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoginRole::Buyer => "Buyer",
            LoginRole::Owner => "Theatre Owner",
            LoginRole::Superadmin => "Superadmin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterRole {
    Buyer,
    #[serde(rename = "theatreowner")]
    TheatreOwner,
}

impl RegisterRole {
    pub fn path_segment(&self) -> &'static str {
        match self {
            RegisterRole::Buyer => "buyer",
            RegisterRole::TheatreOwner => "theatreowner",
        }
    }
}

/// Role-tagged body for `POST /auth/register/{role}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub role: RegisterRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub businessname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licensenumber: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisteredUser {
    pub email: String,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
