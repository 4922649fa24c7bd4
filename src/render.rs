//! HTML building blocks shared by the page modules.
use crate::models::Movie;
use crate::theme;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::Write;

/// Escapes text for use in element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn page(title: &str, logged_in: bool, body: &str) -> String {
    let session_link = if logged_in {
        r#"<form method="post" action="/logout" style="margin:0"><button class="btn" type="submit">Logout</button></form>"#
            .to_string()
    } else {
        r#"<a href="/login">Login</a> <a href="/register">Register</a>"#.to_string()
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - CineBook</title>
<style>{css}</style>
</head>
<body>
<nav><a class="brand" href="/">CineBook</a><a href="/movies">Movies</a><a href="/admin/movies">Admin</a><span style="margin-left:auto">{session}</span></nav>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        css = theme::stylesheet(),
        session = session_link,
        body = body,
    )
}

pub fn placeholder(class: &str, text: &str) -> String {
    format!(r#"<div class="{}">{}</div>"#, class, escape_html(text))
}

pub fn alert(kind: AlertKind, text: &str) -> String {
    let class = match kind {
        AlertKind::Error => "alert-error",
        AlertKind::Success => "alert-success",
    };
    format!(r#"<div class="{}" role="alert">{}</div>"#, class, escape_html(text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Error,
    Success,
}

pub fn details_href(eidr: &str) -> String {
    format!("/movie?eidr={}", urlencoding::encode(eidr))
}

pub fn booking_href(eidr: &str) -> String {
    format!("/screenings?movie={}", urlencoding::encode(eidr))
}

/// Average rating with one decimal, or `fallback` when unrated.
pub fn format_average(average: f64, fallback: &str) -> String {
    if average > 0.0 {
        format!("{:.1}", average)
    } else {
        fallback.to_string()
    }
}

pub fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// `2024-05-01T10:00:00` -> `May 1, 2024`. Unparsable input is returned as is.
pub fn format_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
    match date {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn genre_tags<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for name in names {
        let _ = write!(out, r#"<span class="genre-tag">{}</span>"#, escape_html(name));
    }
    out
}

pub fn movie_card(movie: &Movie) -> String {
    let poster = movie
        .poster_url
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(theme::POSTER_PLACEHOLDER);
    let duration = movie
        .duration_min
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".to_string());
    let language = movie
        .language
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or("English");
    let genres = genre_tags(movie.genres.iter().take(2).map(|g| g.name.as_str()));
    let href = details_href(&movie.eidr);
    format!(
        r#"<div class="movie-card">
<a href="{href}"><img src="{poster}" alt="{title}" class="movie-poster"></a>
<div class="movie-info">
<h3 class="movie-title">{title}</h3>
<div class="movie-meta"><span class="movie-rating">{rating}</span><span class="movie-duration">{duration} min</span></div>
<div class="movie-genres">{genres}</div>
<p class="movie-language">{language}</p>
<div class="movie-actions"><a class="btn btn-primary" href="{booking}">Book</a> <a class="btn btn-outline" href="{href}">Details</a></div>
</div>
</div>"#,
        href = escape_html(&href),
        booking = escape_html(&booking_href(&movie.eidr)),
        poster = escape_html(poster),
        title = escape_html(&movie.title),
        rating = format_average(movie.average_rating, "N/A"),
        duration = duration,
        genres = genres,
        language = escape_html(language),
    )
}

pub fn movie_grid(movies: &[Movie]) -> String {
    let cards: String = movies.iter().map(movie_card).collect();
    format!(r#"<div class="grid">{}</div>"#, cards)
}
