// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared axum handler state (grounded on `hi-youichi-loom/serve`'s
//! `AppState`): one `Arc<Hub>` clone per handler, plus the hub base URL
//! the routes need to build absolute download links.

use std::sync::Arc;

use agent_hub_engine::Hub;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub hub_base_url: String,
    pub no_frontend_build: bool,
}
