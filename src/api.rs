use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    DiscoveryFeed, Genre, Movie, MovieFilter, MovieInput, NewGenre, NewReview, RegisteredUser,
    Registration, Review, ReviewUpdate, Token,
};
use crate::query::QueryParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Operations the CineBook backend exposes to the frontend.
#[async_trait]
pub trait CineBookApi: Send + Sync {
    /// Same backend, carrying `token` on authorized calls.
    fn authorized(&self, token: Option<String>) -> Arc<dyn CineBookApi>;
    fn has_token(&self) -> bool;

    async fn list_genres(&self) -> Result<Vec<Genre>>;
    async fn create_genre(&self, genre: &NewGenre) -> Result<Genre>;

    async fn list_movies(&self, filter: &MovieFilter) -> Result<Vec<Movie>>;
    async fn get_movie(&self, eidr: &str) -> Result<Movie>;
    async fn create_movie(&self, movie: &MovieInput) -> Result<Movie>;
    async fn update_movie(&self, eidr: &str, movie: &MovieInput) -> Result<Movie>;
    async fn delete_movie(&self, eidr: &str) -> Result<()>;
    async fn discovery(&self, feed: DiscoveryFeed, limit: u32) -> Result<Vec<Movie>>;

    async fn list_reviews(&self, eidr: &str, skip: u32, limit: u32) -> Result<Vec<Review>>;
    async fn create_review(&self, eidr: &str, review: &NewReview) -> Result<Review>;
    async fn update_review(&self, review_id: i64, review: &ReviewUpdate) -> Result<Review>;
    async fn delete_review(&self, review_id: i64) -> Result<()>;

    async fn register(&self, registration: &Registration) -> Result<RegisteredUser>;
    async fn login(&self, email: &str, password: &str) -> Result<Token>;
}

#[derive(Debug, Clone)]
pub struct CineBookClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl CineBookClient {
    pub fn new(config: &Config) -> Result<Self> {
        let user_agent = format!("cinebook/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build CineBook HTTP client")?;
        Ok(Self {
            client,
            base_url: config.api_base_url(),
            token: None,
        })
    }

    /// Client against an explicit base URL (origin plus prefix).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build CineBook HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).with_context(|| format!("invalid request URL: {}", raw))
    }

    /// Sends one request and normalizes the response.
    ///
    /// GET payloads become query parameters; any other method sends the
    /// payload as the JSON body. Returns `None` for 204 and non-JSON bodies.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        auth: bool,
    ) -> Result<Option<Value>> {
        let mut url = self.endpoint(path)?;
        if method == Method::GET {
            if let Some(p) = payload {
                QueryParams::from_payload(p).append_to(&mut url);
            }
        }

        debug!(method = %method, url = %url, auth = auth && self.token.is_some(), "CineBook API request");

        let mut req = self
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if auth {
            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }
        }
        if method != Method::GET {
            if let Some(p) = payload {
                req = req.json(p);
            }
        }

        let res = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Network error: {}", e)))?;
        read_response(res).await
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        auth: bool,
    ) -> Result<T> {
        let value = self
            .request(method, path, payload, auth)
            .await?
            .ok_or_else(|| ApiError::Decode(format!("Empty response from {}", path)))?;
        let parsed = serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("Unexpected response from {}: {}", path, e)))?;
        Ok(parsed)
    }
}

async fn read_response(res: Response) -> Result<Option<Value>> {
    let status = res.status();
    if !status.is_success() {
        let body = res.bytes().await.unwrap_or_default();
        return Err(ApiError::from_error_body(status.as_u16(), &body).into());
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let is_json = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Ok(None);
    }
    let body = res
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(format!("Network error: {}", e)))?;
    if body.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Decode(format!("Invalid JSON response: {}", e)))?;
    Ok(Some(value))
}

fn to_payload<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize request payload")
}

/// Percent-encodes each segment of an EIDR and keeps its slashes; the
/// backend matches movie routes on the full path.
pub fn encode_eidr(eidr: &str) -> String {
    eidr.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn movie_path(eidr: &str) -> String {
    format!("/movies/{}", encode_eidr(eidr))
}

#[async_trait]
impl CineBookApi for CineBookClient {
    fn authorized(&self, token: Option<String>) -> Arc<dyn CineBookApi> {
        Arc::new(self.with_token(token))
    }

    fn has_token(&self) -> bool {
        self.token.is_some()
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        self.request_json(Method::GET, "/movies/genres", None, false)
            .await
    }

    async fn create_genre(&self, genre: &NewGenre) -> Result<Genre> {
        let body = to_payload(genre)?;
        self.request_json(Method::POST, "/movies/genres", Some(&body), true)
            .await
    }

    async fn list_movies(&self, filter: &MovieFilter) -> Result<Vec<Movie>> {
        let params = to_payload(filter)?;
        self.request_json(Method::GET, "/movies/", Some(&params), false)
            .await
    }

    async fn get_movie(&self, eidr: &str) -> Result<Movie> {
        self.request_json(Method::GET, &movie_path(eidr), None, false)
            .await
    }

    async fn create_movie(&self, movie: &MovieInput) -> Result<Movie> {
        let body = to_payload(movie)?;
        self.request_json(Method::POST, "/movies/", Some(&body), true)
            .await
    }

    async fn update_movie(&self, eidr: &str, movie: &MovieInput) -> Result<Movie> {
        let body = to_payload(movie)?;
        self.request_json(Method::PUT, &movie_path(eidr), Some(&body), true)
            .await
    }

    async fn delete_movie(&self, eidr: &str) -> Result<()> {
        self.request(Method::DELETE, &movie_path(eidr), None, true)
            .await?;
        Ok(())
    }

    async fn discovery(&self, feed: DiscoveryFeed, limit: u32) -> Result<Vec<Movie>> {
        let path = format!("/movies/discovery/{}", feed.slug());
        let params = json!({ "limit": limit });
        self.request_json(Method::GET, &path, Some(&params), false)
            .await
    }

    async fn list_reviews(&self, eidr: &str, skip: u32, limit: u32) -> Result<Vec<Review>> {
        let path = format!("{}/reviews", movie_path(eidr));
        let params = json!({ "skip": skip, "limit": limit });
        self.request_json(Method::GET, &path, Some(&params), false)
            .await
    }

    async fn create_review(&self, eidr: &str, review: &NewReview) -> Result<Review> {
        let path = format!("{}/reviews", movie_path(eidr));
        let body = json!({
            "rating": review.rating,
            "review_text": review.review_text,
            "movie_eidr": eidr,
        });
        self.request_json(Method::POST, &path, Some(&body), true)
            .await
    }

    async fn update_review(&self, review_id: i64, review: &ReviewUpdate) -> Result<Review> {
        let path = format!("/movies/reviews/{}", review_id);
        let body = to_payload(review)?;
        self.request_json(Method::PUT, &path, Some(&body), true)
            .await
    }

    async fn delete_review(&self, review_id: i64) -> Result<()> {
        let path = format!("/movies/reviews/{}", review_id);
        self.request(Method::DELETE, &path, None, true).await?;
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> Result<RegisteredUser> {
        let path = format!("/auth/register/{}", registration.role.path_segment());
        let body = to_payload(registration)?;
        self.request_json(Method::POST, &path, Some(&body), false)
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Token> {
        // OAuth2 password flow: form fields, with the email as `username`.
        let url = self.endpoint("/auth/token")?;
        debug!(url = %url, "CineBook login request");
        let res = self
            .client
            .post(url)
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Network error: {}", e)))?;
        let value = read_response(res)
            .await?
            .ok_or_else(|| ApiError::Decode("Empty login response".to_string()))?;
        let token: Token = serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("Unexpected login response: {}", e)))?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_eidr_slashes_and_encodes_segments() {
        assert_eq!(
            encode_eidr("10.5240/7B2F-ED2B-8A1C"),
            "10.5240/7B2F-ED2B-8A1C"
        );
        assert_eq!(encode_eidr("a b/c#d"), "a%20b/c%23d");
    }

    #[test]
    fn joins_base_url_and_path_verbatim() {
        let client = CineBookClient::with_base_url("http://localhost:8000/api/v1/").expect("client");
        let url = client.endpoint("/movies/").expect("url");
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/movies/");
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }

    #[test]
    fn empty_token_is_treated_as_absent() {
        let client = CineBookClient::with_base_url("http://localhost:8000/api/v1").expect("client");
        assert!(!client.with_token(Some(String::new())).has_token());
        assert!(client.with_token(Some("abc".to_string())).has_token());
        assert!(!client.has_token());
    }
}
