use super::{
    components,
    components::Component,
    htmx,
    models::{AppState, Toast},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Form,
};
use serde::Deserialize;

const TITLE: &str = "Notes";

/// Whatever the main swap target is, toasts tag along out-of-band.
fn with_toast(html: String, toast: Option<Toast>) -> String {
    match toast {
        Some(toast) => {
            let toasts = [toast];
            html + &components::OobToasts { toasts: &toasts }.render()
        }
        None => html,
    }
}

pub async fn root(
    State(AppState { notes }): State<AppState>,
) -> impl IntoResponse {
    let notes = notes.lock().await;
    // Bound so the render borrow of the guard ends before the guard drops.
    let html = components::Page {
        title: TITLE,
        children: Box::new(components::NoteApp {
            input: notes.input(),
            notes: None,
        }),
    }
    .render();

    html
}

pub async fn pong() -> impl IntoResponse {
    "pong"
}

pub async fn list_notes(
    State(AppState { notes }): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let mut notes = notes.lock().await;
    notes.list().await;

    let html = if htmx::is_htmx_request(&headers) {
        components::NoteList {
            notes: notes.notes(),
        }
        .render()
    } else {
        components::Page {
            title: TITLE,
            children: Box::new(components::NoteApp {
                input: notes.input(),
                notes: Some(notes.notes()),
            }),
        }
        .render()
    };

    html
}

#[derive(Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    text: String,
}

pub async fn add_note(
    State(AppState { notes }): State<AppState>,
    headers: HeaderMap,
    Form(NoteForm { text }): Form<NoteForm>,
) -> impl IntoResponse {
    let mut notes = notes.lock().await;
    let toast = notes.add(&text).await;

    let app = htmx::fragment_or_page(
        &headers,
        TITLE,
        Box::new(components::NoteApp {
            input: notes.input(),
            notes: Some(notes.notes()),
        }),
    );
    with_toast(app, toast)
}

pub async fn get_note(
    State(AppState { notes }): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let mut notes = notes.lock().await;
    notes.refresh(&id).await;

    match notes.find(&id) {
        Some(note) => (
            StatusCode::OK,
            htmx::fragment_or_page(
                &headers,
                TITLE,
                Box::new(components::NoteItem { note }),
            ),
        ),
        None => (StatusCode::NOT_FOUND, "".to_string()),
    }
}

/// Submitting the edit form saves the text and, once the store has it, drops
/// the note back into viewing mode.
pub async fn save_note(
    State(AppState { notes }): State<AppState>,
    Path(id): Path<String>,
    Form(NoteForm { text }): Form<NoteForm>,
) -> impl IntoResponse {
    let mut notes = notes.lock().await;
    let toast = notes.update(&id, &text).await;
    if toast.is_some() && notes.find(&id).is_some_and(|n| n.is_editing) {
        notes.toggle_edit(&id);
    }

    match notes.find(&id) {
        Some(note) => (
            StatusCode::OK,
            with_toast(components::NoteItem { note }.render(), toast),
        ),
        None => (StatusCode::NOT_FOUND, "".to_string()),
    }
}

pub async fn delete_note(
    State(AppState { notes }): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut notes = notes.lock().await;
    let toast = notes.delete(&id).await;
    if toast.is_some() {
        // The empty body swaps the note out of the page.
        return (StatusCode::OK, with_toast("".to_string(), toast));
    }

    match notes.find(&id) {
        Some(note) => (StatusCode::OK, components::NoteItem { note }.render()),
        None => (StatusCode::NOT_FOUND, "".to_string()),
    }
}

pub async fn toggle_edit(
    State(AppState { notes }): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut notes = notes.lock().await;
    if !notes.toggle_edit(&id) {
        return (StatusCode::NOT_FOUND, "".to_string());
    }

    match notes.find(&id) {
        Some(note) => (StatusCode::OK, components::NoteItem { note }.render()),
        None => (StatusCode::NOT_FOUND, "".to_string()),
    }
}
