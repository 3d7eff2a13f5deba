use futures::future::BoxFuture;
use serde_json::Value as JsonValue;

use fieldline_engine::{
    context::ExecutionContext,
    query::Arguments,
    resolvers::{ResolveError, ResolverResult, ResolverTable},
    schema::SchemaError,
    source::SourceError,
};

/// Binds the catalog resolvers. Scalar fields carried verbatim on fetched
/// records (title, thumbnail, numberOfViews, ...) are left to the default
/// resolver.
pub fn catalog_resolvers() -> Result<ResolverTable, SchemaError> {
    let mut table = ResolverTable::new();
    table.bind("Query", "tracksForHome", tracks_for_home)?;
    table.bind("Query", "track", track)?;
    table.bind_with_message(
        "Mutation",
        "incrementTrackViews",
        increment_track_views,
        |args| {
            format!(
                "Successfully incremented number of views for track {}",
                argument_str(args, "id").unwrap_or("unknown")
            )
        },
    )?;
    table.bind("Track", "author", track_author)?;
    table.bind("Track", "modules", track_modules)?;
    Ok(table)
}

fn argument_str<'a>(args: &'a Arguments, name: &str) -> Option<&'a str> {
    args.get(name).and_then(|value| value.as_str())
}

fn require_argument<'a>(
    args: &'a Arguments,
    name: &str,
    field: &str,
) -> Result<&'a str, ResolveError> {
    argument_str(args, name)
        .ok_or_else(|| ResolveError::MissingArgument(name.to_string(), field.to_string()))
}

fn record_str<'a>(record: &'a JsonValue, key: &str) -> Option<&'a str> {
    record.get(key).and_then(|value| value.as_str())
}

/// Tracks for the homepage grid.
fn tracks_for_home<'a>(
    _parent: &'a JsonValue,
    _args: &'a Arguments,
    ctx: &'a ExecutionContext,
) -> BoxFuture<'a, ResolverResult> {
    Box::pin(async move {
        let tracks = ctx.sources().fetch_home_collection().await?;
        Ok(JsonValue::Array(tracks))
    })
}

/// A single track by id, for the track page.
fn track<'a>(
    _parent: &'a JsonValue,
    args: &'a Arguments,
    ctx: &'a ExecutionContext,
) -> BoxFuture<'a, ResolverResult> {
    Box::pin(async move {
        let id = require_argument(args, "id", "track")?;
        Ok(ctx.sources().fetch_by_id("track", id).await?)
    })
}

fn increment_track_views<'a>(
    _parent: &'a JsonValue,
    args: &'a Arguments,
    ctx: &'a ExecutionContext,
) -> BoxFuture<'a, ResolverResult> {
    Box::pin(async move {
        let id = require_argument(args, "id", "incrementTrackViews")?;
        Ok(ctx
            .sources()
            .mutate_counter_field("track", id, "numberOfViews")
            .await?)
    })
}

/// The parent track record carries the author id, not the author record.
fn track_author<'a>(
    parent: &'a JsonValue,
    _args: &'a Arguments,
    ctx: &'a ExecutionContext,
) -> BoxFuture<'a, ResolverResult> {
    Box::pin(async move {
        let author_id = record_str(parent, "authorId")
            .ok_or_else(|| SourceError::Decode("track record is missing \"authorId\"".to_string()))?;
        Ok(ctx.sources().fetch_by_id("author", author_id).await?)
    })
}

fn track_modules<'a>(
    parent: &'a JsonValue,
    _args: &'a Arguments,
    ctx: &'a ExecutionContext,
) -> BoxFuture<'a, ResolverResult> {
    Box::pin(async move {
        let track_id = record_str(parent, "id")
            .ok_or_else(|| SourceError::Decode("track record is missing \"id\"".to_string()))?;
        let modules = ctx.sources().fetch_related("track", track_id).await?;
        Ok(JsonValue::Array(modules))
    })
}
