use crate::cli::Args;
use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use tracing::log::info;

pub mod cli;
pub mod engine;
pub mod model;
pub mod payloads;
pub mod response;
pub mod schema;

mod api;
mod errors;

pub fn init_router(args: &Args) -> anyhow::Result<Router> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.connection_str, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    info!("Initializing router...");
    Ok(init_router_internal(pool))
}

pub fn init_test_router(pool: Pool) -> Router {
    init_router_internal(pool)
}

fn init_router_internal(pool: Pool) -> Router {
    Router::new()
        .nest("/participant", participant_routes())
        .nest("/admin", admin_routes())
        .nest("/batch", batch_routes())
        .with_state(pool)
}

fn init_pool(conn_str: &str, max_size: u32) -> anyhow::Result<Pool> {
    let manager = Manager::new(conn_str, Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(max_size as usize).build()?;
    Ok(pool)
}

fn participant_routes() -> Router<Pool> {
    Router::new()
        .route(
            "/get_available_challenges",
            get(api::participant::get_available_challenges),
        )
        .route("/get_my_challenges", get(api::participant::get_my_challenges))
        .route("/join_challenge", post(api::participant::join_challenge))
        .route("/leave_challenge", post(api::participant::leave_challenge))
        .route(
            "/complete_challenge",
            post(api::participant::complete_challenge),
        )
        .route("/hide_challenge", post(api::participant::hide_challenge))
        .route("/retake_challenge", post(api::participant::retake_challenge))
        .route("/toggle_activity", post(api::participant::toggle_activity))
        .route("/get_week_access", get(api::participant::get_week_access))
        .route(
            "/volunteer_team_lead",
            post(api::participant::volunteer_team_lead),
        )
}

fn admin_routes() -> Router<Pool> {
    Router::new()
        .route("/create_challenge", post(api::admin::create_challenge))
        .route("/modify_challenge", post(api::admin::modify_challenge))
        .route("/set_week_unlock", post(api::admin::set_week_unlock))
        .route("/create_team", post(api::admin::create_team))
        .route("/set_team_leaders", post(api::admin::set_team_leaders))
        .route("/add_team_member", post(api::admin::add_team_member))
        .route("/assign_team_leader", post(api::admin::assign_team_leader))
        .route("/lookup_class", get(api::admin::lookup_class))
        .route(
            "/enqueue_missing_classes",
            post(api::admin::enqueue_missing_classes),
        )
}

fn batch_routes() -> Router<Pool> {
    Router::new().route(
        "/recompute_leaderboards",
        post(api::batch::recompute_leaderboards),
    )
}
