use super::{fail, App};
use crate::output::Output;
use cinestack_core::{keys, CineError, FeedQuery, FeedStream, FetchOutcome};
use cinestack_models::{CatalogItem, MediaType, MovieRecord};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::time::Duration;

pub async fn run_search(query: String, media_type: MediaType, pages: u32, output: &Output) -> Result<()> {
    if query.trim().is_empty() {
        output.warn("Nothing to search for");
        return Ok(());
    }
    let app = App::load()?;
    let title = format!("Results for \"{}\"", query.trim());
    load_stream(&app, keys::SEARCH, FeedQuery::search(query, media_type), pages, &title, output).await
}

pub async fn run_popular(media_type: MediaType, pages: u32, output: &Output) -> Result<()> {
    let app = App::load()?;
    let key = match media_type {
        MediaType::Movie => keys::POPULAR_MOVIES,
        MediaType::Series => keys::POPULAR_SERIES,
    };
    let title = format!("Popular {}", plural(media_type));
    load_stream(&app, key, FeedQuery::Popular { media_type }, pages, &title, output).await
}

pub async fn run_resolve(external_id: u64, media_type: MediaType, output: &Output) -> Result<()> {
    let app = App::load()?;
    let record = app
        .resolver
        .resolve(external_id, media_type)
        .await
        .map_err(|e| fail(e, output))?;
    app.save_records().await;

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Id"), Cell::new(record.id)]);
    table.add_row(vec![Cell::new("Catalog id"), Cell::new(format!("{} ({})", record.external_id, record.media_type))]);
    table.add_row(vec![Cell::new("Title"), Cell::new(&record.title)]);
    table.add_row(vec![Cell::new("Year"), Cell::new(year_cell(record.release_year))]);
    table.add_row(vec![Cell::new("Rating"), Cell::new(rating_cell(record.rating))]);
    if let Some(trailer) = &record.trailer_url {
        table.add_row(vec![Cell::new("Trailer"), Cell::new(trailer)]);
    }
    output.table(table);
    output.json(&record_json(&record));
    Ok(())
}

fn plural(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "movies",
        MediaType::Series => "series",
    }
}

/// Reset `key` and page through it until `pages` (capped by config) are in or the stream runs dry
async fn load_stream(
    app: &App,
    key: &str,
    query: FeedQuery,
    pages: u32,
    title: &str,
    output: &Output,
) -> Result<()> {
    let wanted = pages.clamp(1, app.config.feeds.page_limit);
    if pages > wanted {
        output.warn(format!("Limiting to {} pages (feeds.page_limit)", wanted));
    }

    app.feeds.reset_stream(key, query).await;

    let spinner = spinner(output);
    for _ in 0..wanted {
        let next = app.feeds.snapshot(key).await.map(|s| s.page).unwrap_or(1);
        spinner.set_message(format!("Loading page {}...", next));

        match app.feeds.fetch_next(key).await {
            FetchOutcome::Loaded { page, count } => {
                tracing::debug!(key, page, count, "page loaded");
            }
            FetchOutcome::Skipped | FetchOutcome::Discarded => break,
            FetchOutcome::Failed(err) => {
                spinner.finish_and_clear();
                return stream_failed(app, key, err, title, output).await;
            }
        }
    }
    spinner.finish_and_clear();

    let stream = app
        .feeds
        .snapshot(key)
        .await
        .ok_or_else(|| eyre!("Stream {} disappeared", key))?;
    render_stream(app, &stream, title, output);
    Ok(())
}

/// Keep whatever pages arrived before the failure; only an empty stream or a dead session is fatal
async fn stream_failed(app: &App, key: &str, err: CineError, title: &str, output: &Output) -> Result<()> {
    let stream = match app.feeds.snapshot(key).await {
        Some(stream) if !stream.items.is_empty() && !err.requires_reauth() => stream,
        _ => return Err(fail(err, output)),
    };
    output.warn(format!("Stopped after page {}: {}", stream.page.saturating_sub(1), err));
    render_stream(app, &stream, title, output);
    Ok(())
}

fn spinner(output: &Output) -> ProgressBar {
    if !output.is_human() || output.is_quiet() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn render_stream(app: &App, stream: &FeedStream, title: &str, output: &Output) {
    if stream.items.is_empty() {
        output.info("No titles found");
    } else {
        output.info(format!("{} ({} of {})", title, stream.items.len(), stream.total_results));
        let mut table = Table::new();
        table.set_header(vec!["Catalog id", "Title", "Year", "Rating"]);
        for item in &stream.items {
            table.add_row(vec![
                Cell::new(item.external_id),
                Cell::new(&item.title),
                Cell::new(year_cell(item.release_year())),
                Cell::new(rating_cell(item.vote_average)),
            ]);
        }
        output.table(table);
        if stream.has_more {
            output.info("More results available, use --pages to load them");
        }
    }

    let images = &app.config.images;
    let items: Vec<_> = stream
        .items
        .iter()
        .map(|item| item_json(item, &images.base_url, &images.poster_size))
        .collect();
    output.json(&json!({
        "stream": stream.key,
        "items": items,
        "next_page": stream.page,
        "has_more": stream.has_more,
        "total_results": stream.total_results,
    }));
}

fn item_json(item: &CatalogItem, image_base: &str, poster_size: &str) -> serde_json::Value {
    json!({
        "external_id": item.external_id,
        "media_type": item.media_type,
        "title": item.title,
        "year": item.release_year(),
        "rating": item.vote_average,
        "poster_url": item.poster_url(image_base, poster_size),
    })
}

pub(crate) fn record_json(record: &MovieRecord) -> serde_json::Value {
    serde_json::to_value(record).unwrap_or_else(|_| json!({"id": record.id, "title": record.title}))
}

pub(crate) fn year_cell(year: Option<u32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn rating_cell(rating: Option<f64>) -> String {
    rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string())
}
