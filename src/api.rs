use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::classifier::{LinkEvent, LINK_CLICKED_ACTION};

#[derive(Clone, Default)]
pub struct AppState {
    pub events: Arc<Mutex<Vec<ReceivedEvent>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedEvent {
    pub id: String,
    pub received_at: String,
    #[serde(flatten)]
    pub event: LinkEvent,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectResponse {
    pub success: bool,
    pub message: String,
}

/// Registers the collector routes; `endpoint` is the path the tracker posts to
pub fn configure(endpoint: String) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.route(&endpoint, web::post().to(collect_handler))
            .route("/api/health", web::get().to(health_check))
            .route("/api/events", web::get().to(get_events))
            .route("/api/events", web::delete().to(clear_events));
    }
}

pub async fn health_check() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "link-tracker"
    })))
}

pub async fn collect_handler(
    state: web::Data<AppState>,
    form: web::Form<LinkEvent>,
) -> Result<HttpResponse> {
    let event = form.into_inner();

    if event.action != LINK_CLICKED_ACTION {
        log::warn!("Rejected event with unknown action: {}", event.action);
        return Ok(HttpResponse::BadRequest().json(CollectResponse {
            success: false,
            message: format!("Unknown action: {}", event.action),
        }));
    }

    log::info!(
        "Collected click: {} [{}] \"{}\"",
        event.url,
        event.location,
        event.anchor_text
    );

    let received = ReceivedEvent {
        id: Uuid::new_v4().to_string(),
        received_at: chrono::Local::now().to_rfc3339(),
        event,
    };
    state
        .events
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("event store poisoned"))?
        .push(received);

    Ok(HttpResponse::Ok().json(CollectResponse {
        success: true,
        message: "Event recorded".to_string(),
    }))
}

pub async fn get_events(state: web::Data<AppState>) -> Result<HttpResponse> {
    let events = state
        .events
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("event store poisoned"))?;
    Ok(HttpResponse::Ok().json(&*events))
}

pub async fn clear_events(state: web::Data<AppState>) -> Result<HttpResponse> {
    state
        .events
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("event store poisoned"))?
        .clear();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "All events cleared"
    })))
}
