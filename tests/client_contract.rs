use cinebook::api::{CineBookApi, CineBookClient};
use cinebook::error::{user_message, ApiError};
use cinebook::models::{
    DiscoveryFeed, MovieFilter, MovieInput, NewGenre, NewReview, ReviewUpdate, SortKey, SortOrder,
};
use cinebook::pages::admin::{self, MovieForm};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CineBookClient {
    CineBookClient::with_base_url(&format!("{}/api/v1", server.uri())).expect("client")
}

fn movie_json(eidr: &str, title: &str) -> serde_json::Value {
    json!({
        "eidr": eidr,
        "title": title,
        "poster_url": null,
        "duration_min": 120,
        "genres": [{"id": 1, "name": "Drama"}],
        "average_rating": 4.5,
        "review_count": 2
    })
}

#[tokio::test]
async fn list_movies_sends_only_set_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movies/"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([movie_json("E1", "Heat")])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = MovieFilter {
        title: Some(String::new()),
        genres: vec!["Crime".to_string(), "Drama".to_string()],
        languages: None,
        min_duration: Some(90),
        sort_by: Some(SortKey::Rating),
        order: Some(SortOrder::Desc),
        skip: Some(0),
        limit: Some(20),
        ..MovieFilter::default()
    };
    let movies = client(&server).list_movies(&filter).await.expect("movies");
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].duration_min, Some(120));

    let requests = server.received_requests().await.expect("recorded");
    assert_eq!(
        requests[0].url.query(),
        Some("genres=Crime%2CDrama&limit=20&min_duration=90&order=desc&skip=0&sort_by=rating")
    );
}

#[tokio::test]
async fn discovery_passes_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movies/discovery/now-showing"))
        .and(query_param("limit", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let movies = client(&server)
        .discovery(DiscoveryFeed::NowShowing, 6)
        .await
        .expect("feed");
    assert!(movies.is_empty());
}

#[tokio::test]
async fn bearer_token_only_on_authorized_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movies/genres"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Drama"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/movies/genres"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(json!({"name": "Noir"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2, "name": "Noir"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server).with_token(Some("tok-1".to_string()));
    api.list_genres().await.expect("genres");
    let created = api
        .create_genre(&NewGenre {
            name: "Noir".to_string(),
            description: None,
        })
        .await
        .expect("genre");
    assert_eq!(created.id, 2);

    let requests = server.received_requests().await.expect("recorded");
    let get = requests
        .iter()
        .find(|r| r.method.as_str() == "GET")
        .expect("get request");
    assert!(get.headers.get("authorization").is_none());
}

#[tokio::test]
async fn update_forbidden_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/movies/10.5240/AAAA"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not authorized"})))
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server).with_token(Some("t".to_string()));
    let input = MovieInput {
        eidr: "10.5240/AAAA".to_string(),
        title: "Arrival".to_string(),
        language: "English".to_string(),
        ..MovieInput::default()
    };
    let err = api
        .update_movie("10.5240/AAAA", &input)
        .await
        .expect_err("forbidden");
    assert_eq!(err.downcast_ref::<ApiError>().and_then(ApiError::status), Some(403));
    assert_eq!(user_message(&err), "Not authorized");

    let form = MovieForm {
        editing: "10.5240/AAAA".to_string(),
        eidr: "10.5240/AAAA".to_string(),
        title: "Arrival".to_string(),
        ..MovieForm::default()
    };
    let (_, notice) = admin::save_movie(&api, &form).await;
    assert_eq!(notice, "Error: Not authorized");
}

#[tokio::test]
async fn error_bodies_map_to_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movies/validation"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["query", "limit"], "msg": "ensure this value is less than 100"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movies/nodetail"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movies/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Internal Server Error</html>"))
        .mount(&server)
        .await;

    let api = client(&server);
    let message = |res: anyhow::Result<_>| match res {
        Ok(_) => panic!("expected an error"),
        Err(e) => user_message(&e),
    };
    assert_eq!(
        message(api.get_movie("validation").await),
        "ensure this value is less than 100"
    );
    assert_eq!(message(api.get_movie("nodetail").await), "HTTP error! status: 404");
    let broken = message(api.get_movie("broken").await);
    assert_eq!(broken, "An error occurred");
    assert!(!broken.contains("html"));
}

#[tokio::test]
async fn no_content_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/movies/reviews/7"))
        .and(header("authorization", "Bearer t"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server).with_token(Some("t".to_string()));
    let raw = api
        .request(Method::DELETE, "/movies/reviews/7", None, true)
        .await
        .expect("204");
    assert_eq!(raw, None);
    api.delete_review(7).await.expect("delete");
}

#[tokio::test]
async fn non_json_success_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let raw = client(&server)
        .request(Method::GET, "/ping", None, false)
        .await
        .expect("ping");
    assert_eq!(raw, None);
}

#[tokio::test]
async fn eidr_segments_are_encoded_and_slashes_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movies/10.5240/AB%20CD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_json("10.5240/AB CD", "Spaced")))
        .expect(1)
        .mount(&server)
        .await;

    let movie = client(&server).get_movie("10.5240/AB CD").await.expect("movie");
    assert_eq!(movie.title, "Spaced");
}

#[tokio::test]
async fn review_body_carries_movie_eidr() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/movies/E1/reviews"))
        .and(body_json(json!({"rating": 5.0, "review_text": "Loved it", "movie_eidr": "E1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3, "movie_eidr": "E1", "user_id": 9, "rating": 5.0,
            "review_text": "Loved it", "created_at": "2024-05-01T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let review = client(&server)
        .with_token(Some("t".to_string()))
        .create_review(
            "E1",
            &NewReview {
                rating: 5.0,
                review_text: Some("Loved it".to_string()),
            },
        )
        .await
        .expect("review");
    assert_eq!(review.id, Some(3));
}

#[tokio::test]
async fn review_update_sends_only_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/movies/reviews/12"))
        .and(header("authorization", "Bearer tok-9"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"rating": 2.5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12, "movie_eidr": "E1", "user_id": 9, "rating": 2.5,
            "review_text": "Fine", "created_at": "2024-05-01T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let review = client(&server)
        .with_token(Some("tok-9".to_string()))
        .update_review(
            12,
            &ReviewUpdate {
                rating: Some(2.5),
                review_text: None,
            },
        )
        .await
        .expect("updated review");
    assert_eq!(review.id, Some(12));
    assert_eq!(review.rating, 2.5);

    let requests = server.received_requests().await.expect("recorded");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert!(body.get("review_text").is_none());
}

#[tokio::test]
async fn login_posts_oauth_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=ann%40cine.test"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "jwt-abc", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = client(&server)
        .login("ann@cine.test", "s3cret")
        .await
        .expect("token");
    assert_eq!(token.access_token, "jwt-abc");
}

#[tokio::test]
async fn transport_failure_is_an_error() {
    let api = CineBookClient::with_base_url("http://127.0.0.1:1/api/v1").expect("client");
    let err = api.list_genres().await.expect_err("no server");
    assert!(user_message(&err).starts_with("Network error"));
}
