use super::Region;
use crate::api::CineBookApi;
use crate::error::{user_message, ApiError};
use crate::models::{Movie, NewReview, Review};
use crate::render::{self, escape_html, AlertKind};
use crate::theme;
use anyhow::Result;
use serde::Deserialize;
use std::fmt::Write;
use tracing::{debug, warn};

pub const REVIEWS_LIMIT: u32 = 5;
/// Upper bound on "load more" rounds replayed from the URL.
pub const MAX_EXTRA_PAGES: u32 = 40;

pub const LOAD_FAILED: &str = "Failed to load movie";
pub const NO_REVIEWS: &str = "No reviews yet. Be the first!";
pub const RATING_REQUIRED: &str = "Please select a rating";
pub const REVIEW_SUBMITTED: &str = "Thank you! Your review has been submitted.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsQuery {
    #[serde(default)]
    pub eidr: Option<String>,
    #[serde(default)]
    pub more: Option<u32>,
}

/// Reviews fetched so far for one movie, in batches of [`REVIEWS_LIMIT`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFeed {
    pub reviews: Vec<Review>,
    pub skip: u32,
    pub has_more: bool,
}

impl ReviewFeed {
    /// Fetches the next batch and appends it. More is offered only when the
    /// batch came back full.
    pub async fn load_next(&mut self, api: &dyn CineBookApi, eidr: &str) -> Result<usize> {
        let batch = api.list_reviews(eidr, self.skip, REVIEWS_LIMIT).await?;
        let count = batch.len();
        self.skip += count as u32;
        self.has_more = count as u32 == REVIEWS_LIMIT;
        self.reviews.extend(batch);
        Ok(count)
    }
}

#[derive(Debug, Clone)]
pub struct DetailsPage {
    pub eidr: String,
    pub movie: Region<Movie>,
    pub reviews: Region<ReviewFeed>,
    /// Extra review batches loaded beyond the first.
    pub extra_pages: u32,
    pub notice: Option<(AlertKind, String)>,
}

impl DetailsPage {
    pub fn with_notice(mut self, kind: AlertKind, text: impl Into<String>) -> Self {
        self.notice = Some((kind, text.into()));
        self
    }
}

/// Loads the movie, then its reviews. `extra_pages` replays "load more".
pub async fn load(api: &dyn CineBookApi, eidr: Option<&str>, extra_pages: u32) -> DetailsPage {
    let eidr = eidr.map(str::trim).unwrap_or_default().to_string();
    let mut page = DetailsPage {
        eidr: eidr.clone(),
        movie: Region::Failed(LOAD_FAILED.to_string()),
        reviews: Region::Empty,
        extra_pages: 0,
        notice: None,
    };
    if eidr.is_empty() {
        return page;
    }

    match api.get_movie(&eidr).await {
        Ok(movie) => page.movie = Region::Ready(movie),
        Err(e) => {
            warn!("Failed to load movie {}: {:#}", eidr, e);
            page.movie = Region::Failed(user_message(&e));
            return page;
        }
    }

    let mut feed = ReviewFeed::default();
    if let Err(e) = feed.load_next(api, &eidr).await {
        warn!("Failed to load reviews for {}: {:#}", eidr, e);
        page.reviews = Region::Failed(user_message(&e));
        return page;
    }
    for _ in 0..extra_pages.min(MAX_EXTRA_PAGES) {
        if !feed.has_more {
            break;
        }
        match feed.load_next(api, &eidr).await {
            Ok(_) => page.extra_pages += 1,
            Err(e) => {
                warn!("Failed to load more reviews for {}: {:#}", eidr, e);
                feed.has_more = false;
                break;
            }
        }
    }
    if page.extra_pages >= MAX_EXTRA_PAGES {
        feed.has_more = false;
    }
    debug!(eidr = %eidr, reviews = feed.reviews.len(), "Loaded movie details");
    page.reviews = Region::Ready(feed);
    page
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    pub eidr: String,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub review_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    LoginRequired,
    Rejected(String),
    Submitted,
}

pub fn validate_review(form: &ReviewForm) -> Result<NewReview, ApiError> {
    let rating = form
        .rating
        .as_deref()
        .and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|r| (1.0..=5.0).contains(r))
        .ok_or_else(|| ApiError::Validation(RATING_REQUIRED.to_string()))?;
    let review_text = form
        .review_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string());
    Ok(NewReview {
        rating,
        review_text,
    })
}

pub async fn submit_review(api: &dyn CineBookApi, form: &ReviewForm) -> ReviewOutcome {
    if !api.has_token() {
        return ReviewOutcome::LoginRequired;
    }
    let review = match validate_review(form) {
        Ok(r) => r,
        Err(e) => return ReviewOutcome::Rejected(e.to_string()),
    };
    match api.create_review(form.eidr.trim(), &review).await {
        Ok(_) => ReviewOutcome::Submitted,
        Err(e) => {
            warn!("Review submission for {} failed: {:#}", form.eidr, e);
            ReviewOutcome::Rejected(format!("Error: {}", user_message(&e)))
        }
    }
}

fn or_fallback<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

pub fn render_movie(movie: &Movie) -> String {
    let poster = or_fallback(movie.poster_url.as_deref(), theme::POSTER_PLACEHOLDER);
    let duration = movie
        .duration_min
        .filter(|d| *d > 0)
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".to_string());
    let release = movie
        .release_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(render::format_date)
        .unwrap_or_else(|| "TBA".to_string());
    let cast = if movie.cast.is_empty() {
        "Not available".to_string()
    } else {
        movie.cast.join(", ")
    };
    let trailer = movie
        .trailer_url
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| {
            format!(
                r#" <a class="btn" id="trailerBtn" href="{}" target="_blank" rel="noopener">Watch Trailer</a>"#,
                escape_html(t)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div id="movieContent" class="movie-details">
<img id="moviePoster" class="movie-poster" src="{poster}" alt="{title}">
<div>
<h1 id="movieTitle">{title}</h1>
<div id="movieMeta" class="movie-meta"><span>{rating}</span><span>{duration} min</span><span>{language}</span><span>{release}</span></div>
<div id="movieGenres">{genres}</div>
<p><span id="avgRating">{average}</span> <span id="reviewCount">({count} reviews)</span></p>
<p id="movieDesc">{description}</p>
<p><strong>Director:</strong> <span id="director">{director}</span></p>
<p><strong>Cast:</strong> <span id="cast">{cast}</span></p>
<a class="btn btn-primary" href="{booking}">Book Tickets</a>{trailer}
</div>
</div>"#,
        poster = escape_html(poster),
        title = escape_html(&movie.title),
        rating = escape_html(or_fallback(movie.rating.as_deref(), "Not Rated")),
        duration = duration,
        language = escape_html(or_fallback(movie.language.as_deref(), "English")),
        release = escape_html(&release),
        genres = render::genre_tags(movie.genres.iter().map(|g| g.name.as_str())),
        average = render::format_average(movie.average_rating, "0.0"),
        count = movie.review_count,
        description = escape_html(or_fallback(movie.description.as_deref(), "No description available.")),
        director = escape_html(or_fallback(movie.director.as_deref(), "Unknown")),
        cast = escape_html(&cast),
        booking = escape_html(&render::booking_href(&movie.eidr)),
        trailer = trailer,
    )
}

pub fn render_review(review: &Review) -> String {
    let text = review
        .review_text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!(r#"<p class="review-text">{}</p>"#, escape_html(t)))
        .unwrap_or_default();
    format!(
        r#"<div class="review-card"><div class="review-header"><span class="review-user">User #{user}</span><span class="review-stars">{stars}</span></div><div class="review-date">{date}</div>{text}</div>"#,
        user = escape_html(&review.user_id.to_string()),
        stars = render::stars(review.rating),
        date = escape_html(&render::format_date(&review.created_at)),
        text = text,
    )
}

fn more_href(eidr: &str, extra_pages: u32) -> String {
    format!("{}&more={}#reviews", render::details_href(eidr), extra_pages + 1)
}

pub fn render_reviews(page: &DetailsPage) -> String {
    let mut out = String::from(r#"<div id="reviewsList">"#);
    match &page.reviews {
        Region::Ready(feed) if feed.reviews.is_empty() => {
            out.push_str(&render::placeholder("no-reviews", NO_REVIEWS));
        }
        Region::Ready(feed) => {
            for review in &feed.reviews {
                out.push_str(&render_review(review));
            }
            if feed.has_more {
                let _ = write!(
                    out,
                    r#"<a id="loadMoreBtn" class="btn" href="{}">Load More Reviews</a>"#,
                    escape_html(&more_href(&page.eidr, page.extra_pages))
                );
            }
        }
        Region::Empty => out.push_str(&render::placeholder("no-reviews", NO_REVIEWS)),
        Region::Failed(_) => {}
    }
    out.push_str("</div>");
    out
}

fn render_review_form(eidr: &str, logged_in: bool) -> String {
    if !logged_in {
        return r#"<div id="loginPrompt"><a href="/login">Login</a> to write a review.</div>"#
            .to_string();
    }
    let mut stars = String::new();
    for value in (1..=5).rev() {
        let _ = write!(
            stars,
            r#"<label><input type="radio" name="rating" value="{v}"> {v}</label>"#,
            v = value
        );
    }
    format!(
        r#"<form id="reviewForm" class="form-card" method="post" action="/movie/reviews">
<input type="hidden" name="eidr" value="{eidr}">
<div class="rating-input">{stars}</div>
<textarea id="reviewText" name="review_text" rows="4" placeholder="Share your thoughts..."></textarea>
<button class="btn btn-primary" type="submit">Submit Review</button>
</form>"#,
        eidr = escape_html(eidr),
        stars = stars,
    )
}

pub fn render(page: &DetailsPage, logged_in: bool) -> String {
    let movie = match &page.movie {
        Region::Ready(movie) => movie,
        _ => {
            let body = format!(r#"<div id="error">{}</div>"#, render::placeholder("error", LOAD_FAILED));
            return render::page("Movie", logged_in, &body);
        }
    };
    let notice = page
        .notice
        .as_ref()
        .map(|(kind, text)| render::alert(*kind, text))
        .unwrap_or_default();
    let body = format!(
        r#"{movie}
<section id="reviews"><h2>Reviews</h2>{notice}{reviews}
<div id="reviewFormSection"><h3>Write a Review</h3>{form}</div>
</section>"#,
        movie = render_movie(movie),
        notice = notice,
        reviews = render_reviews(page),
        form = render_review_form(&page.eidr, logged_in),
    );
    render::page(&movie.title, logged_in, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    fn review(id: i64) -> Review {
        Review {
            id: Some(id),
            movie_eidr: None,
            user_id: UserId::Number(id),
            rating: 4.0,
            review_text: None,
            created_at: "2024-05-01T10:00:00".to_string(),
        }
    }

    #[test]
    fn rating_is_required_and_bounded() {
        let mut form = ReviewForm {
            eidr: "10.5240/AAAA".to_string(),
            ..ReviewForm::default()
        };
        assert_eq!(
            validate_review(&form),
            Err(ApiError::Validation(RATING_REQUIRED.to_string()))
        );
        form.rating = Some("9".to_string());
        assert_eq!(
            validate_review(&form),
            Err(ApiError::Validation(RATING_REQUIRED.to_string()))
        );
        form.rating = Some("4".to_string());
        form.review_text = Some("   ".to_string());
        let review = validate_review(&form).expect("valid review");
        assert_eq!(review.rating, 4.0);
        assert_eq!(review.review_text, None);
    }

    #[test]
    fn movie_fallbacks() {
        let movie = Movie {
            eidr: "10.5240/AAAA".to_string(),
            title: "Untitled".to_string(),
            ..Movie::default()
        };
        let html = render_movie(&movie);
        for expected in [
            "Not Rated",
            "? min",
            "English",
            "TBA",
            "No description available.",
            "Unknown",
            "Not available",
            ">0.0<",
            "(0 reviews)",
        ] {
            assert!(html.contains(expected), "missing {}", expected);
        }
        assert!(!html.contains("trailerBtn"));
    }

    #[test]
    fn review_card_shows_user_stars_and_date() {
        let mut r = review(7);
        r.review_text = Some("Great <fun>".to_string());
        let html = render_review(&r);
        assert!(html.contains("User #7"));
        assert!(html.contains("★★★★☆"));
        assert!(html.contains("May 1, 2024"));
        assert!(html.contains("Great &lt;fun&gt;"));
    }

    #[test]
    fn load_more_link_only_for_full_batches() {
        let page = |reviews: Vec<Review>, has_more: bool| DetailsPage {
            eidr: "10.5240/AAAA".to_string(),
            movie: Region::Ready(Movie::default()),
            reviews: Region::Ready(ReviewFeed {
                skip: reviews.len() as u32,
                reviews,
                has_more,
            }),
            extra_pages: 0,
            notice: None,
        };
        let empty = render_reviews(&page(vec![], false));
        assert!(empty.contains(NO_REVIEWS));
        let full = render_reviews(&page((1..=5).map(review).collect(), true));
        assert!(full.contains("loadMoreBtn"));
        assert!(full.contains("more=1#reviews"));
        let partial = render_reviews(&page(vec![review(1)], false));
        assert!(!partial.contains("loadMoreBtn"));
    }
}
