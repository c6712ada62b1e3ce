// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! axum router assembly (spec §4.I, §6): one module per resource,
//! grounded on `hi-youichi-loom/serve`'s `AppState`-in-`Arc` + router
//! pattern, organized per-resource the way the lineage daemon's
//! `listener/query_*.rs` modules split by query kind.

mod agent_tools;
mod artifacts;
mod chats;
mod events_ws;
mod projects;
mod settings;
mod state;
mod terminal_ws;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub fn router(app_state: AppState, frontend_dir: Option<&std::path::Path>) -> Router {
    let api = Router::new()
        .route("/state", get(state::get_state))
        .route("/settings/auth", get(settings::get_auth))
        .route("/settings/auth/openai/connect", post(settings::connect_openai))
        .route("/settings/auth/openai/disconnect", post(settings::disconnect_openai))
        .route("/settings/auth/github/connect", post(settings::connect_github))
        .route("/settings/auth/openai/account/start", post(settings::start_openai_account))
        .route("/settings/auth/openai/account/cancel", post(settings::cancel_openai_account))
        .route("/settings/auth/openai/account/callback", get(settings::openai_account_callback))
        .route("/projects", post(projects::create_project))
        .route("/projects/:id", patch(projects::patch_project).delete(projects::delete_project))
        .route("/projects/:id/build-logs", get(projects::build_logs))
        .route("/projects/:id/chats/start", post(projects::start_chat_for_project))
        .route("/chats", post(chats::create_chat))
        .route("/chats/:id/start", post(chats::start_chat))
        .route("/chats/:id/close", post(chats::close_chat))
        .route("/chats/:id", patch(chats::patch_chat).delete(chats::delete_chat))
        .route("/chats/:id/logs", get(chats::chat_logs))
        .route("/chats/:id/title-prompt", post(chats::submit_title_prompt))
        .route("/chats/:id/artifacts", get(artifacts::list_artifacts))
        .route("/chats/:id/artifacts/publish", post(artifacts::publish_artifact))
        .route("/chats/:id/artifacts/:artifact_id/download", get(artifacts::download_artifact))
        .route("/chats/:id/credentials", get(agent_tools::get_credentials))
        .route("/chats/:id/credentials/resolve", post(agent_tools::resolve_credential))
        .route("/chats/:id/project-binding", post(agent_tools::project_binding))
        .route("/chats/:id/ack", post(agent_tools::ack))
        .route("/events", get(events_ws::events_ws))
        .route("/chats/:id/terminal", get(terminal_ws::terminal_ws))
        .with_state(app_state);

    let mut app = Router::new().nest("/api", api).layer(TraceLayer::new_for_http());

    app = match frontend_dir {
        Some(dir) if dir.is_dir() => {
            let index = dir.join("index.html");
            app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        _ => app.fallback(|| async { "agent hub: frontend not built" }),
    };

    app
}
