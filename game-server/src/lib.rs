use std::sync::Arc;
use warp::Filter;

use crate::registry::SessionRegistry;
use crate::websocket::ConnectionManager;

pub mod broadcast;
pub mod config;
pub mod registry;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<SessionRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Clone for filters
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // WebSocket route
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(registry_filter.clone())
        .map(
            |ws: warp::ws::Ws, conn_mgr: Arc<ConnectionManager>, registry: Arc<SessionRegistry>| {
                ws.on_upgrade(move |socket| {
                    websocket::handle_connection(socket, conn_mgr, registry)
                })
            },
        );

    // Health check
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Games waiting for players
    let games = warp::path("games")
        .and(warp::path::end())
        .and(warp::get())
        .and(registry_filter)
        .map(|registry: Arc<SessionRegistry>| warp::reply::json(&registry.lobby_games()));

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(games)
        .with(cors)
        .with(warp::log("word_capture"))
}
