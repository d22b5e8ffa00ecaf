use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use epl_fixtures::api::Api;
use epl_fixtures::config::Config;
use epl_fixtures::domain::epl_schema;
use epl_fixtures::domain::fixture::{FixtureStore, FixtureUpdate, NewFixture};
use epl_fixtures::domain::team::{Team, TeamStore, TeamUpdate};
use epl_fixtures::domain::{Lookup, SearchAggregator};
use epl_fixtures::metrics::{self, Metrics};
use epl_fixtures::seed;
use epl_fixtures::store::{DocumentStore, InstrumentedStore, MemoryStore, OpContext, RedisStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,epl_fixtures=debug")),
        )
        .init();

    tracing::info!("🚀 Starting EPL fixtures demo");

    let config = Config::load()?;
    tracing::info!(?config, "Configuration loaded");

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // Start metrics HTTP server in background thread
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime error: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 2. Select the document store backend ===
    let store: Arc<dyn DocumentStore> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Connecting to Redis...");
            let redis = RedisStore::connect(url, &config.key_prefix, epl_schema())
                .await
                .context("failed to connect to Redis")?;
            Arc::new(InstrumentedStore::new(redis, metrics.clone()))
        }
        None => {
            tracing::info!("Using in-memory document store");
            Arc::new(InstrumentedStore::new(
                MemoryStore::new(epl_schema()),
                metrics.clone(),
            ))
        }
    };

    // === 3. Wire the domain ===
    let teams = Arc::new(TeamStore::new(store.clone()).with_metrics(metrics.clone()));
    let fixtures = Arc::new(
        FixtureStore::new(store.clone(), teams.clone()).with_metrics(metrics.clone()),
    );
    let search =
        SearchAggregator::new(teams.clone(), fixtures.clone()).with_metrics(metrics.clone());
    let api = Api::new(teams.clone(), fixtures.clone(), search, config.store_timeout);

    // === 4. Seed ===
    if config.seed_demo {
        let ctx = api.request_context();
        seed::seed_teams(&ctx, &teams).await?;
        let all = teams.list(&ctx).await?;
        seed::seed_fixtures(&ctx, &fixtures, &all, Utc::now()).await?;
    }

    // === 5. Demonstrate the fixture lifecycle ===
    tracing::info!("📝 Demonstrating fixture lifecycle");
    let ctx = api.request_context();

    let liverpool = find_team(&api, &ctx, "Liverpool").await?;
    let city = find_team(&api, &ctx, "Manchester City").await?;

    let created = api
        .create_fixture(
            &ctx,
            NewFixture::new(&liverpool.id, &city.id, Utc::now() + Duration::hours(1)),
        )
        .await?;
    let fixture_id = created.data.id.clone();
    tracing::info!(fixture_id = %fixture_id, message = %created.message, "✅ Fixture created");

    let pending = api.list_fixtures(&ctx, "pending").await?;
    let completed = api.list_fixtures(&ctx, "completed").await?;
    tracing::info!(
        pending = pending.data.len(),
        completed = completed.data.len(),
        "Fixtures by status"
    );

    let rejected = api
        .create_fixture(&ctx, NewFixture::new(&liverpool.id, &liverpool.id, Utc::now()))
        .await;
    if let Err(e) = rejected {
        tracing::info!(error = %e, "Same-team fixture rejected as expected");
    }

    let updated = api
        .update_fixture(
            &ctx,
            &fixture_id,
            FixtureUpdate {
                match_date: Some(Utc::now() + Duration::days(2)),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!(match_date = %updated.data.match_date, "✅ Fixture rescheduled");

    let results = api.search_all(&ctx, "manchester united").await?;
    tracing::info!(
        teams = results.data.teams.len(),
        fixtures = results.data.fixtures.len(),
        "{}",
        results.message
    );

    // Renaming a team leaves the fixture's stored name copy behind
    let old_name = city.name.clone();
    api.update_team(
        &ctx,
        &city.id,
        TeamUpdate {
            name: Some("Sky Blues".to_string()),
            ..Default::default()
        },
    )
    .await?;
    let by_old_name = fixtures.search(&ctx, &old_name).await?;
    let by_new_name = fixtures.search(&ctx, "Sky Blues").await?;
    tracing::info!(
        old_name_hits = by_old_name.len(),
        new_name_hits = by_new_name.len(),
        "🔎 Denormalized names after rename"
    );
    api.update_team(
        &ctx,
        &city.id,
        TeamUpdate {
            name: Some(old_name),
            ..Default::default()
        },
    )
    .await?;

    api.delete_fixture(&ctx, &fixture_id).await?;
    if let Lookup::NotFound = fixtures.by_id(&ctx, &fixture_id).await? {
        tracing::info!(fixture_id = %fixture_id, "✅ Fixture deleted");
    }
    if let Lookup::Found(team) = teams.by_id(&ctx, &liverpool.id).await? {
        tracing::info!(team = %team.name, "Teams are untouched by fixture deletes");
    }

    tracing::info!("🎉 Demo complete! Serving metrics until Ctrl+C");
    tokio::signal::ctrl_c().await?;
    tracing::info!("👋 Shutting down");

    Ok(())
}

async fn find_team(
    api: &Api,
    ctx: &OpContext,
    name: &str,
) -> anyhow::Result<Team> {
    let teams = api.list_teams(ctx).await?.data;
    teams
        .into_iter()
        .find(|team| team.name == name)
        .with_context(|| format!("team {} is not seeded; set SEED_DEMO=true", name))
}
