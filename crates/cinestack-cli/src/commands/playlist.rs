use super::catalog::{rating_cell, record_json, year_cell};
use super::prompts::prompt_yes_no;
use super::{fail, App};
use crate::output::Output;
use crate::PlaylistCommands;
use cinestack_core::{season_episodes, CineError};
use cinestack_models::{MediaType, MovieRecord, PlaylistRecord, WatchStatus};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_playlist(cmd: PlaylistCommands, output: &Output) -> Result<()> {
    let app = App::load()?;
    match cmd {
        PlaylistCommands::List => list(&app, output).await,
        PlaylistCommands::Show { id } => show(&app, id, output).await,
        PlaylistCommands::Create { title, description } => create(&app, &title, &description, output).await,
        PlaylistCommands::Delete { id, yes } => delete(&app, id, yes, output).await,
        PlaylistCommands::Add {
            playlist,
            external_id,
            media_type,
            status,
        } => add(&app, playlist, external_id, media_type, status, output).await,
        PlaylistCommands::Status { playlist, movie, status } => {
            let record = app
                .playlists
                .update_status_str(playlist, movie, &status)
                .await
                .map_err(|e| fail(e, output))?;
            output.success(format!("Movie {} is now {}", movie, status.trim()));
            print_counts(&record, output);
            output.json(&playlist_json(&record));
            Ok(())
        }
        PlaylistCommands::Remove { playlist, movie } => {
            let record = app
                .playlists
                .remove_item(playlist, movie)
                .await
                .map_err(|e| fail(e, output))?;
            output.success(format!("Removed movie {} from '{}'", movie, record.title));
            print_counts(&record, output);
            output.json(&playlist_json(&record));
            Ok(())
        }
        PlaylistCommands::Episodes { playlist, movie, season } => episodes(&app, playlist, movie, season, output).await,
    }
}

async fn list(app: &App, output: &Output) -> Result<()> {
    let playlists = app.playlists.refresh().await.map_err(|e| fail(e, output))?;
    if playlists.is_empty() {
        output.info("No playlists yet. Create one with `cinestack playlist create <title>`");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Id", "Title", "Movies", "Watched", "Progress"]);
        for playlist in &playlists {
            table.add_row(vec![
                Cell::new(playlist.id),
                Cell::new(&playlist.title),
                Cell::new(playlist.movie_count),
                Cell::new(playlist.watched_count),
                Cell::new(format!("{}%", playlist.progress())),
            ]);
        }
        output.table(table);
    }

    let data: Vec<_> = playlists.iter().map(playlist_json).collect();
    output.json(&json!({ "playlists": data }));
    Ok(())
}

async fn show(app: &App, id: u64, output: &Output) -> Result<()> {
    let detail = app.playlists.detail(id).await.map_err(|e| fail(e, output))?;
    let record = &detail.record;

    if output.is_human() && !output.is_quiet() {
        println!("{} {}", record.title.bold(), format!("#{}", record.id).dimmed());
        if !record.description.is_empty() {
            println!("{}", record.description);
        }
    }
    print_counts(record, output);

    if detail.items.is_empty() {
        output.info("This playlist is empty");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Movie id", "Title", "Year", "Rating", "Status", "Added"]);
        for item in &detail.items {
            let movie = item.movie.as_ref();
            table.add_row(vec![
                Cell::new(item.movie_id),
                Cell::new(item.title().unwrap_or("-")),
                Cell::new(year_cell(movie.and_then(|m| m.release_year))),
                Cell::new(rating_cell(movie.and_then(|m| m.rating))),
                Cell::new(item.status.label()),
                Cell::new(item.added_at.format("%Y-%m-%d")),
            ]);
        }
        output.table(table);
    }

    let items: Vec<_> = detail
        .items
        .iter()
        .map(|item| {
            json!({
                "movie_id": item.movie_id,
                "title": item.title(),
                "status": item.status,
                "added_at": item.added_at,
            })
        })
        .collect();
    let mut data = playlist_json(record);
    data["items"] = json!(items);
    output.json(&data);
    Ok(())
}

async fn create(app: &App, title: &str, description: &str, output: &Output) -> Result<()> {
    let record = app
        .playlists
        .create_playlist(title, description)
        .await
        .map_err(|e| fail(e, output))?;
    output.success(format!("Created playlist '{}' (id {})", record.title, record.id));
    output.json(&playlist_json(&record));
    Ok(())
}

async fn delete(app: &App, id: u64, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        let name = app
            .playlists
            .detail(id)
            .await
            .map(|d| format!("'{}' ({} movies)", d.record.title, d.record.movie_count))
            .map_err(|e| fail(e, output))?;
        if !prompt_yes_no(&format!("Delete playlist {}?", name), false)? {
            output.info("Cancelled");
            return Ok(());
        }
    }

    app.playlists.delete_playlist(id).await.map_err(|e| fail(e, output))?;
    output.success(format!("Deleted playlist {}", id));
    output.json(&json!({"deleted": id}));
    Ok(())
}

async fn add(
    app: &App,
    playlist: u64,
    external_id: u64,
    media_type: MediaType,
    status: WatchStatus,
    output: &Output,
) -> Result<()> {
    let movie = app
        .resolver
        .resolve(external_id, media_type)
        .await
        .map_err(|e| fail(e, output))?;
    app.save_records().await;

    match app.playlists.add_movie(playlist, &movie, status).await {
        Ok(record) => {
            output.success(format!("Added '{}' to '{}' as {}", movie.title, record.title, status.label()));
            print_counts(&record, output);
            output.json(&json!({"added": true, "movie": record_json(&movie), "playlist": playlist_json(&record)}));
            Ok(())
        }
        Err(CineError::DuplicateItem(_)) => {
            output.info(format!("'{}' is already in playlist {}", movie.title, playlist));
            output.json(&json!({"added": false, "movie": record_json(&movie)}));
            Ok(())
        }
        Err(e) => Err(fail(e, output)),
    }
}

async fn episodes(app: &App, playlist: u64, movie: u64, season: Option<u32>, output: &Output) -> Result<()> {
    let series = playlist_movie(app, playlist, movie).await.map_err(|e| fail(e, output))?;
    if series.media_type != MediaType::Series {
        let err = CineError::ValidationError(format!("'{}' is a movie and has no episodes", series.title));
        return Err(fail(err, output));
    }

    let detail = season_episodes(app.catalog.as_ref(), series.external_id, season)
        .await
        .map_err(|e| fail(e, output))?;

    let heading = if detail.name.is_empty() { format!("Season {}", detail.season_number) } else { detail.name.clone() };
    output.info(format!("{}: {} ({} episodes)", series.title, heading, detail.episodes.len()));
    if detail.episodes.is_empty() {
        output.info("No episodes listed for this season yet");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["#", "Title", "Air date", "Runtime"]);
        for episode in &detail.episodes {
            table.add_row(vec![
                Cell::new(episode.episode_number),
                Cell::new(episode.display_name()),
                Cell::new(episode.air_date.as_deref().unwrap_or("TBA")),
                Cell::new(episode.runtime.map(|m| format!("{}m", m)).unwrap_or_else(|| "-".to_string())),
            ]);
        }
        output.table(table);
    }

    output.json(&json!({
        "movie": record_json(&series),
        "season": serde_json::to_value(&detail).unwrap_or_default(),
    }));
    Ok(())
}

/// The record behind `movie_id` in a playlist, from the item itself or the resolved records
async fn playlist_movie(app: &App, playlist: u64, movie_id: u64) -> Result<MovieRecord, CineError> {
    let detail = app.playlists.detail(playlist).await?;
    let item = detail
        .items
        .into_iter()
        .find(|item| item.movie_id == movie_id)
        .ok_or_else(|| CineError::NotFound(format!("movie {} in playlist {}", movie_id, playlist)))?;
    if let Some(movie) = item.movie {
        return Ok(movie);
    }
    app.resolver
        .records()
        .await
        .into_iter()
        .find(|record| record.id == movie_id)
        .ok_or_else(|| CineError::NotFound(format!("details of movie {}", movie_id)))
}

fn print_counts(record: &PlaylistRecord, output: &Output) {
    output.info(format!(
        "{} of {} watched ({}%), {} remaining",
        record.watched_count,
        record.movie_count,
        record.progress(),
        record.remaining()
    ));
}

fn playlist_json(record: &PlaylistRecord) -> serde_json::Value {
    json!({
        "id": record.id,
        "title": record.title,
        "description": record.description,
        "movie_count": record.movie_count,
        "watched_count": record.watched_count,
        "progress": record.progress(),
    })
}
