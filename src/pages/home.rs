use super::Region;
use crate::api::CineBookApi;
use crate::models::{DiscoveryFeed, Movie};
use crate::render;

pub const FEED_LIMIT: u32 = 6;
pub const NO_MOVIES: &str = "No movies available";
pub const LOAD_FAILED: &str = "Failed to load movies";

#[derive(Debug, Clone)]
pub struct HomePage {
    pub feeds: Vec<(DiscoveryFeed, Region<Vec<Movie>>)>,
}

/// Loads the three discovery feeds concurrently; each settles on its own.
pub async fn load(api: &dyn CineBookApi) -> HomePage {
    let (now_showing, this_week, coming_soon) = tokio::join!(
        api.discovery(DiscoveryFeed::NowShowing, FEED_LIMIT),
        api.discovery(DiscoveryFeed::ThisWeek, FEED_LIMIT),
        api.discovery(DiscoveryFeed::ComingSoon, FEED_LIMIT),
    );
    HomePage {
        feeds: vec![
            (
                DiscoveryFeed::NowShowing,
                Region::from_list("now-showing movies", now_showing),
            ),
            (
                DiscoveryFeed::ThisWeek,
                Region::from_list("this-week movies", this_week),
            ),
            (
                DiscoveryFeed::ComingSoon,
                Region::from_list("coming-soon movies", coming_soon),
            ),
        ],
    }
}

/// Catalogue link for a search term; `None` for a blank term.
pub fn search_href(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    Some(format!("/movies?title={}", urlencoding::encode(term)))
}

pub fn render_feed(region: &Region<Vec<Movie>>) -> String {
    match region {
        Region::Ready(movies) => render::movie_grid(movies),
        Region::Empty => render::placeholder("no-results", NO_MOVIES),
        Region::Failed(_) => render::placeholder("error", LOAD_FAILED),
    }
}

pub fn render(page: &HomePage, logged_in: bool) -> String {
    let mut body = String::from(
        r#"<section class="hero"><h1>Book your next movie</h1>
<form method="get" action="/search"><input id="searchInput" name="q" type="search" placeholder="Search movies..."> <button class="btn btn-primary" type="submit">Search</button></form>
</section>"#,
    );
    for (feed, region) in &page.feeds {
        body.push_str(&format!(
            r#"<section id="{slug}"><h2>{heading}</h2>{grid}</section>"#,
            slug = feed.slug(),
            heading = feed.heading(),
            grid = render_feed(region),
        ));
    }
    render::page("Home", logged_in, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_href_trims_and_encodes() {
        assert_eq!(search_href("  "), None);
        assert_eq!(
            search_href(" The Matrix "),
            Some("/movies?title=The%20Matrix".to_string())
        );
    }

    #[test]
    fn empty_feed_is_not_an_error() {
        let html = render_feed(&Region::Empty);
        assert!(html.contains(NO_MOVIES));
        assert!(!html.contains(LOAD_FAILED));
        let failed = render_feed(&Region::Failed("Network error".to_string()));
        assert!(failed.contains(LOAD_FAILED));
    }
}
