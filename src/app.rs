use crate::api::{CineBookApi, CineBookClient};
use crate::auth::{self, LoginForm, LoginOutcome, RegisterForm, TOKEN_COOKIE};
use crate::config::Config;
use crate::pages::admin::{self, AdminQuery, DeleteForm, GenreForm, ModalRequest, MovieForm};
use crate::pages::catalogue::{self, CatalogueQuery, CatalogueState};
use crate::pages::details::{self, DetailsQuery, ReviewForm, ReviewOutcome};
use crate::pages::home;
use crate::render::AlertKind;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 64 * 1024;
const ADMIN_LOGIN_REDIRECT: &str = "/login?notice=admin";

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn CineBookApi>,
}

impl AppState {
    /// Backend handle carrying the caller's token, if the cookie holds one.
    fn api_for(&self, jar: &CookieJar) -> Arc<dyn CineBookApi> {
        self.api.authorized(token_from(jar))
    }

    fn admin_api(&self, jar: &CookieJar) -> Result<Arc<dyn CineBookApi>, Redirect> {
        let api = self.api_for(jar);
        if api.has_token() {
            Ok(api)
        } else {
            info!("Admin page requested without a token");
            Err(Redirect::to(ADMIN_LOGIN_REDIRECT))
        }
    }
}

pub fn token_from(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

pub async fn run_server(config: Config) -> Result<()> {
    let client = CineBookClient::new(&config)?;
    info!("Using CineBook backend at {}", client.base_url());
    let state = AppState {
        api: Arc::new(client),
    };

    let app = build_router(state);

    info!("Listening on {}", config.listen);
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/search", get(search))
        .route("/movies", get(catalogue_page))
        .route("/movie", get(details_page))
        .route("/movie/reviews", post(submit_review))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/register", get(register_page).post(register))
        .route("/admin/movies", get(admin_page).post(save_movie))
        .route("/admin/movies/delete", post(delete_movie))
        .route("/admin/genres", post(create_genre))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn home_page(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let api = state.api_for(&jar);
    let page = home::load(api.as_ref()).await;
    Html(home::render(&page, api.has_token()))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(Query(query): Query<SearchQuery>) -> Redirect {
    match home::search_href(&query.q) {
        Some(href) => Redirect::to(&href),
        None => Redirect::to("/movies"),
    }
}

async fn catalogue_page(
    State(state): State<AppState>,
    jar: CookieJar,
    axum_extra::extract::Query(query): axum_extra::extract::Query<CatalogueQuery>,
) -> Html<String> {
    let api = state.api_for(&jar);
    let page = catalogue::load(api.as_ref(), CatalogueState::from_query(&query)).await;
    Html(catalogue::render(&page, api.has_token()))
}

async fn details_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DetailsQuery>,
) -> Html<String> {
    let api = state.api_for(&jar);
    let page = details::load(api.as_ref(), query.eidr.as_deref(), query.more.unwrap_or(0)).await;
    Html(details::render(&page, api.has_token()))
}

async fn submit_review(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ReviewForm>,
) -> Response {
    let api = state.api_for(&jar);
    let notice = match details::submit_review(api.as_ref(), &form).await {
        ReviewOutcome::LoginRequired => return Redirect::to("/login").into_response(),
        ReviewOutcome::Rejected(msg) => (AlertKind::Error, msg),
        ReviewOutcome::Submitted => (AlertKind::Success, details::REVIEW_SUBMITTED.to_string()),
    };
    let page = details::load(api.as_ref(), Some(form.eidr.as_str()), 0)
        .await
        .with_notice(notice.0, notice.1);
    Html(details::render(&page, true)).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct LoginQuery {
    #[serde(default)]
    notice: Option<String>,
}

async fn login_page(jar: CookieJar, Query(query): Query<LoginQuery>) -> Html<String> {
    let notice = (query.notice.as_deref() == Some("admin"))
        .then_some((AlertKind::Error, admin::ACCESS_REQUIRED));
    Html(auth::render_login(notice, "", token_from(&jar).is_some()))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> (CookieJar, Html<String>) {
    match auth::login(state.api.as_ref(), &form).await {
        LoginOutcome::Success { token, message } => {
            let cookie = Cookie::build((TOKEN_COOKIE, token))
                .path("/")
                .http_only(true);
            let html = auth::render_login(Some((AlertKind::Success, &message)), &form.email, true);
            (jar.add(cookie), Html(html))
        }
        LoginOutcome::Invalid(msg) | LoginOutcome::Failed(msg) => {
            let logged_in = token_from(&jar).is_some();
            let html = auth::render_login(Some((AlertKind::Error, &msg)), &form.email, logged_in);
            (jar, Html(html))
        }
    }
}

async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (jar, Redirect::to("/login"))
}

async fn register_page(jar: CookieJar) -> Html<String> {
    Html(auth::render_register(
        None,
        &RegisterForm::default(),
        token_from(&jar).is_some(),
    ))
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut form): Form<RegisterForm>,
) -> Html<String> {
    let (kind, message) = auth::register(state.api.as_ref(), &form).await;
    form.password.clear();
    if kind == AlertKind::Success {
        form = RegisterForm::default();
    }
    Html(auth::render_register(
        Some((kind, &message)),
        &form,
        token_from(&jar).is_some(),
    ))
}

async fn admin_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<AdminQuery>,
) -> Response {
    let api = match state.admin_api(&jar) {
        Ok(api) => api,
        Err(redirect) => return redirect.into_response(),
    };
    let page = admin::load(api.as_ref(), query.modal()).await;
    Html(admin::render(&page)).into_response()
}

async fn save_movie(
    State(state): State<AppState>,
    jar: CookieJar,
    axum_extra::extract::Form(form): axum_extra::extract::Form<MovieForm>,
) -> Response {
    let api = match state.admin_api(&jar) {
        Ok(api) => api,
        Err(redirect) => return redirect.into_response(),
    };
    let notice = admin::save_movie(api.as_ref(), &form).await;
    let page = admin::load(api.as_ref(), ModalRequest::None)
        .await
        .with_notice(notice);
    Html(admin::render(&page)).into_response()
}

async fn delete_movie(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> Response {
    let api = match state.admin_api(&jar) {
        Ok(api) => api,
        Err(redirect) => return redirect.into_response(),
    };
    let page = if form.confirmed() {
        let notice = admin::delete_movie(api.as_ref(), &form.eidr).await;
        admin::load(api.as_ref(), ModalRequest::None)
            .await
            .with_notice(notice)
    } else {
        admin::load(api.as_ref(), ModalRequest::None)
            .await
            .with_pending_delete(form)
    };
    Html(admin::render(&page)).into_response()
}

async fn create_genre(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<GenreForm>,
) -> Response {
    let api = match state.admin_api(&jar) {
        Ok(api) => api,
        Err(redirect) => return redirect.into_response(),
    };
    let notice = admin::create_genre(api.as_ref(), &form).await;
    let page = admin::load(api.as_ref(), ModalRequest::None)
        .await
        .with_notice(notice);
    Html(admin::render(&page)).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
