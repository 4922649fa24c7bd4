//! Query-string assembly for GET requests.
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Query parameters in sorted key order. Null, missing and empty values are
/// never stored, so they never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from a serializable payload. Non-object payloads
    /// produce no parameters.
    pub fn from_serializable<T: Serialize>(payload: &T) -> anyhow::Result<Self> {
        let value = serde_json::to_value(payload)?;
        Ok(Self::from_payload(&value))
    }

    pub fn from_payload(payload: &Value) -> Self {
        let mut params = Self::new();
        if let Some(map) = payload.as_object() {
            for (key, value) in map {
                params.insert_value(key, value);
            }
        }
        params
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.pairs.insert(key.to_string(), value);
    }

    fn insert_value(&mut self, key: &str, value: &Value) {
        if let Some(text) = scalar_text(value) {
            self.insert(key, text);
            return;
        }
        if let Value::Array(items) = value {
            let joined = items
                .iter()
                .filter_map(scalar_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(",");
            self.insert(key, joined);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query_string(&self) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.iter() {
            ser.append_pair(k, v);
        }
        ser.finish()
    }

    pub fn append_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        for (k, v) in self.iter() {
            pairs.append_pair(k, v);
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieFilter, SortKey, SortOrder};
    use serde_json::json;

    #[test]
    fn skips_null_and_empty_values() {
        let params = QueryParams::from_payload(&json!({
            "title": "",
            "languages": null,
            "limit": 20,
            "skip": 0,
            "age_rating": "PG"
        }));
        assert_eq!(params.get("title"), None);
        assert_eq!(params.get("languages"), None);
        assert_eq!(params.get("skip"), Some("0"));
        assert_eq!(params.to_query_string(), "age_rating=PG&limit=20&skip=0");
    }

    #[test]
    fn no_filter_combination_emits_blank_parameters() {
        let titles = [None, Some(String::new()), Some("Dune".to_string())];
        let genre_sets = [vec![], vec!["Action".to_string()], vec!["Action".to_string(), "Drama".to_string()]];
        let languages = [None, Some(String::new()), Some("French".to_string())];
        let durations = [None, Some(90)];
        let ratings = [None, Some(String::new()), Some("R".to_string())];
        let sorts = [None, Some(SortKey::Rating)];
        let orders = [None, Some(SortOrder::Desc)];

        for title in &titles {
            for genres in &genre_sets {
                for lang in &languages {
                    for min in durations {
                        for max in durations {
                            for rating in &ratings {
                                for sort in sorts {
                                    for order in orders {
                                        let filter = MovieFilter {
                                            title: title.clone(),
                                            genres: genres.clone(),
                                            languages: lang.clone(),
                                            min_duration: min,
                                            max_duration: max,
                                            age_rating: rating.clone(),
                                            sort_by: sort,
                                            order,
                                            skip: Some(0),
                                            limit: Some(20),
                                        };
                                        let params = QueryParams::from_serializable(&filter)
                                            .expect("filter serializes");
                                        for (k, v) in params.iter() {
                                            assert!(!v.is_empty(), "blank value for {}", k);
                                        }
                                        assert_eq!(params.get("title").is_some(), title.as_deref().is_some_and(|t| !t.is_empty()));
                                        assert_eq!(params.get("genres").is_some(), !genres.is_empty());
                                        assert_eq!(params.get("min_duration").is_some(), min.is_some());
                                        assert_eq!(params.get("sort_by").is_some(), sort.is_some());
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn joins_genre_sets_with_commas() {
        let filter = MovieFilter {
            genres: vec!["Action".to_string(), "Sci-Fi".to_string()],
            sort_by: Some(SortKey::ReleaseDate),
            order: Some(SortOrder::Desc),
            ..MovieFilter::default()
        };
        let params = QueryParams::from_serializable(&filter).expect("serialize");
        assert_eq!(params.get("genres"), Some("Action,Sci-Fi"));
        assert_eq!(params.get("sort_by"), Some("release_date"));
        assert_eq!(params.get("order"), Some("desc"));
    }

    #[test]
    fn query_string_ignores_insertion_order() {
        let mut a = QueryParams::new();
        a.insert("title", "Alien");
        a.insert("limit", "20");
        a.insert("genres", "Horror,Sci-Fi");
        let mut b = QueryParams::new();
        b.insert("genres", "Horror,Sci-Fi");
        b.insert("title", "Alien");
        b.insert("limit", "20");
        assert_eq!(a.to_query_string(), b.to_query_string());
        assert_eq!(a.to_query_string(), "genres=Horror%2CSci-Fi&limit=20&title=Alien");
    }

    #[test]
    fn appends_to_url_only_when_non_empty() {
        let mut url = Url::parse("http://localhost:8000/api/v1/movies/genres").expect("url");
        QueryParams::new().append_to(&mut url);
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/movies/genres");

        let mut params = QueryParams::new();
        params.insert("limit", "6");
        params.append_to(&mut url);
        assert_eq!(url.query(), Some("limit=6"));
    }
}
