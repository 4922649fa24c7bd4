//! Query a running CineBook backend and print what the frontend would see.
//! Usage:
//!   cargo run --bin api_probe -- genres
//!   cargo run --bin api_probe -- movies [title]
//!   cargo run --bin api_probe -- movie <eidr>
//!   cargo run --bin api_probe -- feed <now-showing|this-week|coming-soon>
//! Reads CINEBOOK_API_URL / CINEBOOK_API_PREFIX from the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use cinebook::api::{CineBookApi, CineBookClient};
use cinebook::config::Config;
use cinebook::error::user_message;
use cinebook::models::{DiscoveryFeed, MovieFilter};
use cinebook::query::QueryParams;
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::str::FromStr;

const PROBE_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
enum Probe {
    Genres,
    Movies(Option<String>),
    Movie(String),
    Feed(DiscoveryFeed),
}

impl FromStr for Probe {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(2, ' ');
        let kind = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
        match kind.as_str() {
            "genres" => Ok(Probe::Genres),
            "movies" => Ok(Probe::Movies(arg)),
            "movie" => arg
                .map(Probe::Movie)
                .ok_or_else(|| anyhow!("movie needs an EIDR")),
            "feed" => {
                let slug = arg.ok_or_else(|| anyhow!("feed needs a name"))?;
                DiscoveryFeed::ALL
                    .into_iter()
                    .find(|f| f.slug() == slug)
                    .map(Probe::Feed)
                    .ok_or_else(|| anyhow!("unknown feed '{}'", slug))
            }
            _ => Err(anyhow!("probe must be genres, movies, movie or feed")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: cargo run --bin api_probe -- genres");
        eprintln!("       cargo run --bin api_probe -- movies [title]");
        eprintln!("       cargo run --bin api_probe -- movie <eidr>");
        eprintln!("       cargo run --bin api_probe -- feed <now-showing|this-week|coming-soon>");
        std::process::exit(1);
    }
    let probe = Probe::from_str(&args.join(" "))?;

    let config = Config::from_env().context("invalid CineBook configuration")?;
    let client = CineBookClient::new(&config)?;
    println!("# backend: {}", client.base_url());

    if let Err(e) = run(&client, probe).await {
        // Print the message a page would show, then the full chain.
        eprintln!("error: {}", user_message(&e));
        return Err(e);
    }
    Ok(())
}

async fn run(api: &CineBookClient, probe: Probe) -> Result<()> {
    let output = match probe {
        Probe::Genres => serde_json::to_value(api.list_genres().await?)?,
        Probe::Movies(title) => {
            let filter = MovieFilter {
                title,
                skip: Some(0),
                limit: Some(PROBE_LIMIT),
                ..MovieFilter::default()
            };
            println!(
                "# query: {}",
                QueryParams::from_serializable(&filter)?.to_query_string()
            );
            serde_json::to_value(api.list_movies(&filter).await?)?
        }
        Probe::Movie(eidr) => {
            let movie = api.get_movie(&eidr).await?;
            let reviews = api.list_reviews(&eidr, 0, PROBE_LIMIT).await?;
            json!({ "movie": movie, "reviews": reviews })
        }
        Probe::Feed(feed) => serde_json::to_value(api.discovery(feed, PROBE_LIMIT).await?)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
