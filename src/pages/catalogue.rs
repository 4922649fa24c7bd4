use super::Region;
use crate::api::CineBookApi;
use crate::models::{Genre, Movie, MovieFilter, SortKey, SortOrder};
use crate::render::{self, escape_html};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt::Write;
use tracing::debug;

pub const PAGE_SIZE: u32 = 20;
pub const NO_MOVIES: &str = "No movies found";
pub const LOAD_FAILED: &str = "Failed to load movies";

const AGE_RATINGS: [&str; 5] = ["G", "PG", "PG-13", "R", "NC-17"];

/// Catalogue URL parameters as submitted by the filter form. Numbers stay
/// strings here so a blank or mistyped field is ignored instead of
/// rejecting the whole request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogueQuery {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub min_duration: Option<String>,
    #[serde(default)]
    pub max_duration: Option<String>,
    #[serde(default)]
    pub age_rating: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogueFilters {
    pub title: String,
    pub genres: BTreeSet<String>,
    pub language: String,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub age_rating: String,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

/// In-memory catalogue state: current page plus the active filter set.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueState {
    pub page: u32,
    pub filters: CatalogueFilters,
}

impl Default for CatalogueState {
    fn default() -> Self {
        Self {
            page: 1,
            filters: CatalogueFilters::default(),
        }
    }
}

fn non_blank(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn parse_number(value: &Option<String>) -> Option<u32> {
    value.as_deref().and_then(|v| v.trim().parse::<u32>().ok())
}

impl CatalogueState {
    pub fn from_query(query: &CatalogueQuery) -> Self {
        let filters = CatalogueFilters {
            title: non_blank(&query.title),
            genres: query
                .genres
                .iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            language: non_blank(&query.language),
            min_duration: parse_number(&query.min_duration),
            max_duration: parse_number(&query.max_duration),
            age_rating: non_blank(&query.age_rating),
            sort_by: query
                .sort_by
                .as_deref()
                .and_then(SortKey::parse)
                .unwrap_or_default(),
            order: query
                .order
                .as_deref()
                .and_then(SortOrder::parse)
                .unwrap_or_default(),
        };
        let mut state = Self::default();
        state.apply(filters);
        if let Some(page) = parse_number(&query.page) {
            state.go_to_page(page);
        }
        state
    }

    /// Replaces the filter set and starts over at page 1.
    pub fn apply(&mut self, filters: CatalogueFilters) {
        self.filters = filters;
        self.page = 1;
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn clear(&mut self) {
        *self = CatalogueState::default();
    }

    pub fn skip(&self) -> u32 {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }

    /// Backend query for the current state, rebuilt from scratch each time.
    pub fn movie_filter(&self) -> MovieFilter {
        let f = &self.filters;
        let text = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        MovieFilter {
            title: text(&f.title),
            genres: f.genres.iter().cloned().collect(),
            languages: text(&f.language),
            min_duration: f.min_duration.filter(|d| *d > 0),
            max_duration: f.max_duration.filter(|d| *d > 0),
            age_rating: text(&f.age_rating),
            sort_by: Some(f.sort_by),
            order: Some(f.order),
            skip: Some(self.skip()),
            limit: Some(PAGE_SIZE),
        }
    }

    /// Catalogue link for `page` with the current filters.
    pub fn href_for_page(&self, page: u32) -> String {
        let mut target = self.clone();
        target.go_to_page(page);
        target.href()
    }

    /// Link that drops every filter and returns to page 1.
    pub fn cleared_href(&self) -> String {
        let mut target = self.clone();
        target.clear();
        target.href()
    }

    fn href(&self) -> String {
        let f = &self.filters;
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        if !f.title.is_empty() {
            ser.append_pair("title", &f.title);
        }
        for genre in &f.genres {
            ser.append_pair("genres", genre);
        }
        if !f.language.is_empty() {
            ser.append_pair("language", &f.language);
        }
        if let Some(d) = f.min_duration {
            ser.append_pair("min_duration", &d.to_string());
        }
        if let Some(d) = f.max_duration {
            ser.append_pair("max_duration", &d.to_string());
        }
        if !f.age_rating.is_empty() {
            ser.append_pair("age_rating", &f.age_rating);
        }
        ser.append_pair("sort_by", f.sort_by.as_str());
        ser.append_pair("order", f.order.as_str());
        ser.append_pair("page", &self.page.to_string());
        format!("/movies?{}", ser.finish())
    }
}

#[derive(Debug, Clone)]
pub struct CataloguePage {
    pub state: CatalogueState,
    pub genres: Region<Vec<Genre>>,
    pub movies: Region<Vec<Movie>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl CataloguePage {
    pub fn result_count(&self) -> Option<usize> {
        match &self.movies {
            Region::Ready(m) => Some(m.len()),
            Region::Empty => Some(0),
            Region::Failed(_) => None,
        }
    }

    /// Next is offered only when the current page came back full.
    pub fn pagination(&self) -> Pagination {
        let full = self
            .movies
            .ready()
            .map(|m| m.len() as u32 >= PAGE_SIZE)
            .unwrap_or(false);
        Pagination {
            page: self.state.page,
            has_prev: self.state.page > 1,
            has_next: full && self.state.page < u32::MAX,
        }
    }
}

pub async fn load(api: &dyn CineBookApi, state: CatalogueState) -> CataloguePage {
    let filter = state.movie_filter();
    debug!(page = state.page, "Loading catalogue");
    let (genres, movies) = tokio::join!(api.list_genres(), api.list_movies(&filter));
    CataloguePage {
        state,
        genres: Region::from_list("genres", genres),
        movies: Region::from_list("movies", movies),
    }
}

/// Genre checkboxes for the filter sidebar. A failed genre load leaves the
/// list empty.
pub fn render_genre_filter(genres: &Region<Vec<Genre>>, selected: &BTreeSet<String>) -> String {
    let mut out = String::from(r#"<div id="genreFilter">"#);
    if let Region::Ready(list) = genres {
        for g in list {
            let checked = if selected.contains(&g.name) { " checked" } else { "" };
            let _ = write!(
                out,
                r#"<div class="checkbox-item"><input type="checkbox" id="g-{id}" name="genres" value="{name}"{checked}><label for="g-{id}">{name}</label></div>"#,
                id = g.id,
                name = escape_html(&g.name),
                checked = checked,
            );
        }
    }
    out.push_str("</div>");
    out
}

fn select_options<'a>(options: impl Iterator<Item = (&'a str, &'a str)>, current: &str) -> String {
    let mut out = String::new();
    for (value, label) in options {
        let selected = if value == current { " selected" } else { "" };
        let _ = write!(
            out,
            r#"<option value="{}"{}>{}</option>"#,
            escape_html(value),
            selected,
            escape_html(label)
        );
    }
    out
}

fn render_filters(page: &CataloguePage) -> String {
    let f = &page.state.filters;
    let ratings = std::iter::once(("", "Any")).chain(AGE_RATINGS.iter().map(|r| (*r, *r)));
    let sorts = SortKey::ALL.iter().map(|k| (k.as_str(), k.label()));
    let orders = [("asc", "Ascending"), ("desc", "Descending")];
    format!(
        r#"<form class="filters form-card" method="get" action="/movies">
<label>Title <input id="titleFilter" name="title" value="{title}"></label>
<h4>Genres</h4>{genres}
<label>Language <input id="languageFilter" name="language" value="{language}"></label>
<label>Min duration <input id="minDuration" name="min_duration" type="number" min="0" value="{min}"></label>
<label>Max duration <input id="maxDuration" name="max_duration" type="number" min="0" value="{max}"></label>
<label>Age rating <select id="ratingFilter" name="age_rating">{ratings}</select></label>
<label>Sort by <select id="sortBy" name="sort_by">{sorts}</select></label>
<label>Order <select id="sortOrder" name="order">{orders}</select></label>
<button class="btn btn-primary" type="submit">Apply Filters</button> <a class="btn" href="{cleared}">Clear Filters</a>
</form>"#,
        title = escape_html(&f.title),
        cleared = escape_html(&page.state.cleared_href()),
        genres = render_genre_filter(&page.genres, &f.genres),
        language = escape_html(&f.language),
        min = f.min_duration.map(|d| d.to_string()).unwrap_or_default(),
        max = f.max_duration.map(|d| d.to_string()).unwrap_or_default(),
        ratings = select_options(ratings, &f.age_rating),
        sorts = select_options(sorts, f.sort_by.as_str()),
        orders = select_options(orders.into_iter(), f.order.as_str()),
    )
}

fn render_pagination(page: &CataloguePage) -> String {
    let p = page.pagination();
    if !p.has_prev && !p.has_next {
        return r#"<div id="pagination" class="pagination"></div>"#.to_string();
    }
    let mut out = String::from(r#"<div id="pagination" class="pagination">"#);
    if p.has_prev {
        let _ = write!(
            out,
            r#"<a class="btn" href="{}">Prev</a>"#,
            escape_html(&page.state.href_for_page(p.page - 1))
        );
    }
    let _ = write!(out, r#"<span class="active">{}</span>"#, p.page);
    if p.has_next {
        let _ = write!(
            out,
            r#"<a class="btn" href="{}">Next</a>"#,
            escape_html(&page.state.href_for_page(p.page.saturating_add(1)))
        );
    }
    out.push_str("</div>");
    out
}

pub fn render_results(movies: &Region<Vec<Movie>>) -> String {
    match movies {
        Region::Ready(list) => render::movie_grid(list),
        Region::Empty => render::placeholder("no-results", NO_MOVIES),
        Region::Failed(_) => render::placeholder("error", LOAD_FAILED),
    }
}

pub fn render(page: &CataloguePage, logged_in: bool) -> String {
    let count = page
        .result_count()
        .map(|n| format!(r#"<p id="resultsCount">{} movies found</p>"#, n))
        .unwrap_or_default();
    let body = format!(
        r#"<h1>Movies</h1><div class="catalogue">{filters}<section id="moviesGrid">{count}{results}{pagination}</section></div>"#,
        filters = render_filters(page),
        count = count,
        results = render_results(&page.movies),
        pagination = render_pagination(page),
    );
    render::page("Movies", logged_in, &body)
}
