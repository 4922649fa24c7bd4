//! CineBook red-and-black palette and the shared stylesheet built from it.

pub const PRIMARY: &str = "#E50914";
pub const SECONDARY: &str = "#B80010";
pub const BACKGROUND: &str = "#0A0A0A";
pub const SURFACE: &str = "#1C1C1C";
pub const TEXT: &str = "#FFFFFF";
pub const TEXT_SECONDARY: &str = "#AAAAAA";

pub const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/300x450/333/fff?text=No+Poster";

pub fn stylesheet() -> String {
    format!(
        r#"
body {{ margin: 0; font-family: sans-serif; background: {bg}; color: {text}; }}
a {{ color: {text}; }}
nav {{ display: flex; gap: 1rem; align-items: center; padding: 1rem 2rem; background: {surface}; }}
nav .brand {{ color: {primary}; font-weight: 800; font-size: 1.4rem; text-decoration: none; }}
main {{ padding: 2rem; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1.5rem; }}
.movie-card, .admin-movie-card, .review-card, .form-card {{ background: {surface}; border-radius: 12px; padding: 1rem; }}
.movie-poster {{ width: 100%; border-radius: 8px; }}
.movie-meta, .review-header {{ display: flex; justify-content: space-between; color: {muted}; }}
.genre-tag {{ display: inline-block; margin: 0 .25rem .25rem 0; padding: .1rem .5rem; border-radius: 999px; background: {secondary}; font-size: .8rem; }}
.btn {{ display: inline-block; padding: .5rem 1rem; border-radius: 8px; border: 1px solid {primary}; color: {text}; text-decoration: none; background: transparent; cursor: pointer; }}
.btn-primary {{ background: {primary}; }}
.btn-primary:hover {{ background: {secondary}; }}
.error, .alert-error {{ color: #fecaca; background: #7f1d1d; padding: .75rem; border-radius: 8px; }}
.success, .alert-success {{ color: #dcfce7; background: #166534; padding: .75rem; border-radius: 8px; }}
.no-results, .no-reviews, .loading {{ color: {muted}; padding: 1rem; }}
.pagination button, .pagination a {{ margin-right: .25rem; }}
.review-stars {{ color: {primary}; }}
input, select, textarea {{ background: #262626; color: {text}; border: 1px solid #404040; border-radius: 6px; padding: .4rem; }}
"#,
        bg = BACKGROUND,
        text = TEXT,
        surface = SURFACE,
        primary = PRIMARY,
        secondary = SECONDARY,
        muted = TEXT_SECONDARY,
    )
}
