use super::Region;
use crate::api::CineBookApi;
use crate::error::user_message;
use crate::models::{Genre, Movie, MovieFilter, MovieInput, NewGenre};
use crate::render::{self, escape_html, AlertKind};
use crate::theme;
use serde::Deserialize;
use std::fmt::Write;
use tracing::{info, warn};

pub const LIST_LIMIT: u32 = 100;
pub const ACCESS_REQUIRED: &str = "Admin access required";
pub const LIST_FAILED: &str = "Failed to load movies";
pub const GENRES_FAILED: &str = "Failed to load genres";
pub const MOVIE_FAILED: &str = "Failed to load movie";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub edit: Option<String>,
    #[serde(default)]
    pub create: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalRequest {
    None,
    Create,
    Edit(String),
}

impl AdminQuery {
    pub fn modal(&self) -> ModalRequest {
        match (&self.edit, &self.create) {
            (Some(eidr), _) if !eidr.trim().is_empty() => ModalRequest::Edit(eidr.trim().to_string()),
            (_, Some(_)) => ModalRequest::Create,
            _ => ModalRequest::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Closed,
    Create,
    Edit(Movie),
}

/// Submitted movie form. `editing` carries the EIDR of the movie being
/// edited and is blank when creating.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieForm {
    #[serde(default)]
    pub editing: String,
    #[serde(default)]
    pub eidr: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub trailer_url: String,
    #[serde(default)]
    pub duration_min: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub cast: String,
    #[serde(default)]
    pub genre_ids: Vec<String>,
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl MovieForm {
    pub fn editing_eidr(&self) -> Option<&str> {
        Some(self.editing.trim()).filter(|e| !e.is_empty())
    }

    pub fn to_input(&self) -> MovieInput {
        MovieInput {
            eidr: self.eidr.trim().to_string(),
            title: self.title.trim().to_string(),
            poster_url: optional(&self.poster_url),
            trailer_url: optional(&self.trailer_url),
            duration_min: self
                .duration_min
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|d| *d > 0),
            rating: optional(&self.rating),
            release_date: optional(&self.release_date),
            language: optional(&self.language).unwrap_or_else(|| "English".to_string()),
            description: optional(&self.description),
            director: optional(&self.director),
            genre_ids: self
                .genre_ids
                .iter()
                .filter_map(|id| id.trim().parse::<i64>().ok())
                .collect(),
            cast: self
                .cast
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteForm {
    pub eidr: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub confirm: Option<String>,
}

impl DeleteForm {
    pub fn confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("yes")
    }

    pub fn prompt(&self) -> String {
        format!("Delete \"{}\" permanently?", self.title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct AdminPage {
    pub movies: Region<Vec<Movie>>,
    pub genres: Region<Vec<Genre>>,
    pub modal: Modal,
    pub notice: Option<(AlertKind, String)>,
    pub pending_delete: Option<DeleteForm>,
}

impl AdminPage {
    pub fn with_notice(mut self, notice: (AlertKind, String)) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn with_pending_delete(mut self, form: DeleteForm) -> Self {
        self.pending_delete = Some(form);
        self
    }
}

pub async fn load(api: &dyn CineBookApi, request: ModalRequest) -> AdminPage {
    let filter = MovieFilter {
        limit: Some(LIST_LIMIT),
        ..MovieFilter::default()
    };
    let (genres, movies) = tokio::join!(api.list_genres(), api.list_movies(&filter));
    let genres = Region::from_list("genres", genres);
    let mut notice = genres
        .is_failed()
        .then(|| (AlertKind::Error, GENRES_FAILED.to_string()));

    let modal = match request {
        ModalRequest::None => Modal::Closed,
        ModalRequest::Create => Modal::Create,
        ModalRequest::Edit(eidr) => match api.get_movie(&eidr).await {
            Ok(movie) => Modal::Edit(movie),
            Err(e) => {
                warn!("Failed to load movie {} for editing: {:#}", eidr, e);
                notice = Some((AlertKind::Error, MOVIE_FAILED.to_string()));
                Modal::Closed
            }
        },
    };

    AdminPage {
        movies: Region::from_list("admin movies", movies),
        genres,
        modal,
        notice,
        pending_delete: None,
    }
}

fn error_notice(e: &anyhow::Error) -> (AlertKind, String) {
    (AlertKind::Error, format!("Error: {}", user_message(e)))
}

/// Creates or updates a movie depending on whether the form was editing one.
pub async fn save_movie(api: &dyn CineBookApi, form: &MovieForm) -> (AlertKind, String) {
    let input = form.to_input();
    if input.eidr.is_empty() || input.title.is_empty() {
        return (AlertKind::Error, "Error: EIDR and title are required".to_string());
    }
    let result = match form.editing_eidr() {
        Some(eidr) => api
            .update_movie(eidr, &input)
            .await
            .map(|_| "Movie updated!"),
        None => api.create_movie(&input).await.map(|_| "Movie created!"),
    };
    match result {
        Ok(msg) => {
            info!(eidr = %input.eidr, "{}", msg);
            (AlertKind::Success, msg.to_string())
        }
        Err(e) => {
            warn!("Saving movie {} failed: {:#}", input.eidr, e);
            error_notice(&e)
        }
    }
}

pub async fn delete_movie(api: &dyn CineBookApi, eidr: &str) -> (AlertKind, String) {
    match api.delete_movie(eidr).await {
        Ok(()) => {
            info!(eidr = %eidr, "Movie deleted");
            (AlertKind::Success, "Movie deleted".to_string())
        }
        Err(e) => {
            warn!("Deleting movie {} failed: {:#}", eidr, e);
            error_notice(&e)
        }
    }
}

pub async fn create_genre(api: &dyn CineBookApi, form: &GenreForm) -> (AlertKind, String) {
    let name = form.name.trim();
    if name.is_empty() {
        return (AlertKind::Error, "Error: Genre name is required".to_string());
    }
    let genre = NewGenre {
        name: name.to_string(),
        description: optional(&form.description),
    };
    match api.create_genre(&genre).await {
        Ok(created) => (AlertKind::Success, format!("Genre \"{}\" created!", created.name)),
        Err(e) => error_notice(&e),
    }
}

pub fn render_movie_list(movies: &Region<Vec<Movie>>) -> String {
    let list = match movies {
        Region::Ready(list) => list,
        Region::Empty => return render::placeholder("no-results", "No movies yet"),
        Region::Failed(_) => return render::placeholder("error", LIST_FAILED),
    };
    let mut out = String::from(r#"<div class="grid">"#);
    for m in list {
        let poster = m
            .poster_url
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(theme::POSTER_PLACEHOLDER);
        let released = m
            .release_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("TBA");
        let _ = write!(
            out,
            r#"<div class="admin-movie-card">
<img class="movie-poster" src="{poster}" alt="{title}">
<div class="admin-card-info"><h3>{title}</h3><p><strong>EIDR:</strong> {eidr}</p><p><strong>Released:</strong> {released}</p></div>
<div class="admin-card-actions"><a class="btn btn-primary" href="/admin/movies?edit={edit}">Edit</a>
<form method="post" action="/admin/movies/delete" style="display:inline"><input type="hidden" name="eidr" value="{eidr}"><input type="hidden" name="title" value="{title}"><button class="btn btn-outline" type="submit">Delete</button></form></div>
</div>"#,
            poster = escape_html(poster),
            title = escape_html(&m.title),
            eidr = escape_html(&m.eidr),
            released = escape_html(released),
            edit = escape_html(&urlencoding::encode(&m.eidr)),
        );
    }
    out.push_str("</div>");
    out
}

fn render_genre_checkboxes(genres: &Region<Vec<Genre>>, selected: &[i64]) -> String {
    let mut out = String::from(r#"<div id="genreCheckboxes">"#);
    if let Region::Ready(list) = genres {
        for g in list {
            let checked = if selected.contains(&g.id) { " checked" } else { "" };
            let _ = write!(
                out,
                r#"<label><input type="checkbox" name="genre_ids" value="{}"{}> {}</label>"#,
                g.id,
                checked,
                escape_html(&g.name)
            );
        }
    }
    out.push_str("</div>");
    out
}

fn text_field(name: &str, label: &str, value: &str, extra: &str) -> String {
    format!(
        r#"<label>{label} <input id="{name}" name="{name}" value="{value}"{extra}></label>"#,
        label = label,
        name = name,
        value = escape_html(value),
        extra = extra,
    )
}

pub fn render_modal(modal: &Modal, genres: &Region<Vec<Genre>>) -> String {
    let blank = Movie::default();
    let (heading, movie, editing) = match modal {
        Modal::Closed => return String::new(),
        Modal::Create => ("Add New Movie", &blank, false),
        Modal::Edit(m) => ("Edit Movie", m, true),
    };
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    let selected: Vec<i64> = movie.genres.iter().map(|g| g.id).collect();
    let language = if editing {
        movie.language.clone().filter(|l| !l.is_empty()).unwrap_or_else(|| "English".to_string())
    } else {
        String::new()
    };
    let mut fields = String::new();
    fields.push_str(&text_field(
        "eidr",
        "EIDR",
        &movie.eidr,
        if editing { " readonly" } else { " required" },
    ));
    fields.push_str(&text_field("title", "Title", &movie.title, " required"));
    fields.push_str(&text_field("poster_url", "Poster URL", &opt(&movie.poster_url), ""));
    fields.push_str(&text_field("trailer_url", "Trailer URL", &opt(&movie.trailer_url), ""));
    fields.push_str(&text_field(
        "duration_min",
        "Duration (min)",
        &movie.duration_min.map(|d| d.to_string()).unwrap_or_default(),
        r#" type="number" min="1""#,
    ));
    fields.push_str(&text_field("rating", "Age rating", &opt(&movie.rating), ""));
    fields.push_str(&text_field("release_date", "Release date", &opt(&movie.release_date), r#" type="date""#));
    fields.push_str(&text_field("language", "Language", &language, r#" placeholder="English""#));
    fields.push_str(&text_field("director", "Director", &opt(&movie.director), ""));
    fields.push_str(&text_field("cast", "Cast (comma separated)", &movie.cast.join(", "), ""));
    format!(
        r#"<div id="movieModal" class="form-card"><h2 id="modalTitle">{heading}</h2>
<form id="movieForm" method="post" action="/admin/movies">
<input type="hidden" name="editing" value="{editing}">
{fields}
<label>Description <textarea id="description" name="description" rows="4">{description}</textarea></label>
<h4>Genres</h4>{genres}
<button class="btn btn-primary" type="submit">Save</button> <a class="btn" href="/admin/movies">Cancel</a>
</form></div>"#,
        heading = heading,
        editing = if editing { escape_html(&movie.eidr) } else { String::new() },
        fields = fields,
        description = escape_html(&opt(&movie.description)),
        genres = render_genre_checkboxes(genres, &selected),
    )
}

fn render_delete_prompt(form: &DeleteForm) -> String {
    format!(
        r#"<div class="form-card" id="confirmDelete"><p>{prompt}</p>
<form method="post" action="/admin/movies/delete"><input type="hidden" name="eidr" value="{eidr}"><input type="hidden" name="title" value="{title}"><input type="hidden" name="confirm" value="yes">
<button class="btn btn-primary" type="submit">Delete</button> <a class="btn" href="/admin/movies">Cancel</a></form></div>"#,
        prompt = escape_html(&form.prompt()),
        eidr = escape_html(&form.eidr),
        title = escape_html(&form.title),
    )
}

const GENRE_FORM: &str = r#"<form class="form-card" id="genreForm" method="post" action="/admin/genres"><h3>Add Genre</h3>
<label>Name <input name="name" required></label> <label>Description <input name="description"></label>
<button class="btn" type="submit">Create Genre</button></form>"#;

pub fn render(page: &AdminPage) -> String {
    let notice = page
        .notice
        .as_ref()
        .map(|(kind, text)| render::alert(*kind, text))
        .unwrap_or_default();
    let confirm = page
        .pending_delete
        .as_ref()
        .map(render_delete_prompt)
        .unwrap_or_default();
    let body = format!(
        r#"<h1>Manage Movies</h1>{notice}{confirm}
<a class="btn btn-primary" href="/admin/movies?create=1">Add New Movie</a>
{modal}
<section id="adminMoviesGrid">{movies}</section>
{genre_form}"#,
        notice = notice,
        confirm = confirm,
        modal = render_modal(&page.modal, &page.genres),
        movies = render_movie_list(&page.movies),
        genre_form = GENRE_FORM,
    );
    render::page("Admin", true, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_becomes_movie_input() {
        let form = MovieForm {
            eidr: "  10.5240/AAAA ".to_string(),
            title: " Arrival ".to_string(),
            poster_url: "".to_string(),
            duration_min: "abc".to_string(),
            language: "  ".to_string(),
            cast: "Amy Adams, , Jeremy Renner ,".to_string(),
            genre_ids: vec!["3".to_string(), "x".to_string(), "5".to_string()],
            ..MovieForm::default()
        };
        let input = form.to_input();
        assert_eq!(input.eidr, "10.5240/AAAA");
        assert_eq!(input.title, "Arrival");
        assert_eq!(input.poster_url, None);
        assert_eq!(input.duration_min, None);
        assert_eq!(input.language, "English");
        assert_eq!(input.cast, vec!["Amy Adams".to_string(), "Jeremy Renner".to_string()]);
        assert_eq!(input.genre_ids, vec![3, 5]);
        assert_eq!(form.editing_eidr(), None);
    }

    #[test]
    fn duration_parses_integers() {
        let form = MovieForm {
            duration_min: " 116 ".to_string(),
            ..MovieForm::default()
        };
        assert_eq!(form.to_input().duration_min, Some(116));
    }

    #[test]
    fn modal_request_prefers_edit() {
        let q = AdminQuery {
            edit: Some("10.5240/AAAA".to_string()),
            create: Some("1".to_string()),
        };
        assert_eq!(q.modal(), ModalRequest::Edit("10.5240/AAAA".to_string()));
        assert_eq!(AdminQuery::default().modal(), ModalRequest::None);
    }

    #[test]
    fn delete_prompt_quotes_title() {
        let form = DeleteForm {
            eidr: "e".to_string(),
            title: "Heat".to_string(),
            confirm: None,
        };
        assert_eq!(form.prompt(), "Delete \"Heat\" permanently?");
        assert!(!form.confirmed());
    }

    #[test]
    fn edit_modal_locks_eidr_and_checks_genres() {
        let movie = Movie {
            eidr: "10.5240/AAAA".to_string(),
            title: "Arrival".to_string(),
            genres: vec![Genre { id: 2, name: "Sci-Fi".to_string(), description: None }],
            ..Movie::default()
        };
        let genres = Region::Ready(vec![
            Genre { id: 1, name: "Drama".to_string(), description: None },
            Genre { id: 2, name: "Sci-Fi".to_string(), description: None },
        ]);
        let html = render_modal(&Modal::Edit(movie), &genres);
        assert!(html.contains("Edit Movie"));
        assert!(html.contains(r#"value="10.5240/AAAA" readonly"#));
        assert!(html.contains(r#"value="2" checked"#));
        assert!(!html.contains(r#"value="1" checked"#));
        assert!(html.contains(r#"value="English""#));
    }

    #[test]
    fn list_shows_tba_for_unreleased() {
        let html = render_movie_list(&Region::Ready(vec![Movie {
            eidr: "10.5240/BBBB".to_string(),
            title: "Soon".to_string(),
            ..Movie::default()
        }]));
        assert!(html.contains("<strong>Released:</strong> TBA"));
        assert!(html.contains("/admin/movies?edit=10.5240%2FBBBB"));
    }
}
