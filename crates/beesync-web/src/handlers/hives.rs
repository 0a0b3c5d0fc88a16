//! Hive management: list, create, edit and delete hives.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use beesync_common::entities::Hive;
use beesync_common::validation::{validate_hive_form, HiveForm, ValidationErrors};
use tracing::warn;

use crate::handlers::layout::{alert_box, app_page, escape, fmt_timestamp};
use crate::state::SharedState;

const LIST_PATH: &str = "/hive-management";

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn hives_page(State(state): State<SharedState>) -> Html<String> {
    let hives = load_hives(&state).await;
    render(&state, &hives, &FormView::create(HiveForm::default(), ValidationErrors::default())).await
}

pub async fn hive_create(State(state): State<SharedState>, Form(form): Form<HiveForm>) -> Response {
    match validate_hive_form(&form) {
        Ok(input) => {
            if let Err(e) = state.clients.monitoring.create_hive(&input).await {
                warn!(error = %e, "Failed to create hive");
            }
            Redirect::to(LIST_PATH).into_response()
        }
        Err(errors) => {
            let hives = load_hives(&state).await;
            render(&state, &hives, &FormView::create(form, errors)).await.into_response()
        }
    }
}

pub async fn hive_edit(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    let hives = load_hives(&state).await;
    let Some(hive) = hives.iter().find(|h| h.id == id) else {
        return Redirect::to(LIST_PATH).into_response();
    };
    let form = HiveForm {
        name: hive.name.clone(),
        location_lat: hive.location_lat.to_string(),
        location_lng: hive.location_lng.to_string(),
    };
    render(&state, &hives, &FormView::edit(id, form, ValidationErrors::default())).await.into_response()
}

pub async fn hive_update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<HiveForm>,
) -> Response {
    match validate_hive_form(&form) {
        Ok(input) => {
            if let Err(e) = state.clients.monitoring.update_hive(id, &input).await {
                warn!(id, error = %e, "Failed to update hive");
            }
            Redirect::to(LIST_PATH).into_response()
        }
        Err(errors) => {
            let hives = load_hives(&state).await;
            render(&state, &hives, &FormView::edit(id, form, errors)).await.into_response()
        }
    }
}

pub async fn hive_delete(State(state): State<SharedState>, Path(id): Path<i64>) -> Redirect {
    if let Err(e) = state.clients.monitoring.delete_hive(id).await {
        warn!(id, error = %e, "Failed to delete hive");
    }
    Redirect::to(LIST_PATH)
}

async fn load_hives(state: &SharedState) -> Vec<Hive> {
    state.clients.monitoring.list_hives().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch hives");
        Vec::new()
    })
}

// ── Rendering ─────────────────────────────────────────────────────────────────

struct FormView {
    editing: Option<i64>,
    form: HiveForm,
    errors: ValidationErrors,
}

impl FormView {
    fn create(form: HiveForm, errors: ValidationErrors) -> Self {
        Self { editing: None, form, errors }
    }

    fn edit(id: i64, form: HiveForm, errors: ValidationErrors) -> Self {
        Self { editing: Some(id), form, errors }
    }
}

async fn render(state: &SharedState, hives: &[Hive], view: &FormView) -> Html<String> {
    let rows = if hives.is_empty() {
        r#"<tr><td colspan="6" class="text-center text-muted">No hives yet. Add your first hive above.</td></tr>"#.to_string()
    } else {
        hives.iter().map(hive_row).collect()
    };

    let (heading, action, submit, cancel) = match view.editing {
        Some(id) => (
            "Edit Hive",
            format!("/hive-management/{id}"),
            "Update Hive",
            format!(r#"<a href="{LIST_PATH}" class="btn btn-outline">Cancel</a>"#),
        ),
        None => ("Add New Hive", LIST_PATH.to_string(), "Add Hive", String::new()),
    };

    let summary = (!view.errors.is_empty()).then_some("Please fix the highlighted fields.");
    let field = |name: &'static str, label: &str, kind: &str, value: &str| {
        let error = view
            .errors
            .get(name)
            .map(|e| format!(r#"<span class="field-error">{}</span>"#, escape(e)))
            .unwrap_or_default();
        let step = if kind == "number" { r#" step="any""# } else { "" };
        format!(r#"
            <div class="form-group">
                <label for="{name}">{label}</label>
                <input id="{name}" name="{name}" type="{kind}"{step} value="{}" required>
                {error}
            </div>"#, escape(value))
    };

    let body = format!(r#"
    <div class="page-header">
        <div>
            <h1 class="page-title">🏠 Hive Management</h1>
            <p class="text-muted">Register hives and keep their locations up to date</p>
        </div>
    </div>

    <div class="card">
        <div class="card-header">{heading}</div>
        {}
        <form method="POST" action="{action}" class="inline-form">
            {}{}{}
            <div class="form-actions">
                <button type="submit" class="btn btn-primary">{submit}</button>
                {cancel}
            </div>
        </form>
    </div>

    <div class="card">
        <div class="card-header">Hives</div>
        <div class="table-container">
            <table class="table" id="hive-table">
                <thead>
                    <tr><th>ID</th><th>Name</th><th>Latitude</th><th>Longitude</th><th>Created</th><th>Actions</th></tr>
                </thead>
                <tbody>
                    {rows}
                </tbody>
            </table>
        </div>
    </div>"#,
        alert_box("danger", summary),
        field("name", "Name", "text", &view.form.name),
        field("location_lat", "Latitude", "number", &view.form.location_lat),
        field("location_lng", "Longitude", "number", &view.form.location_lng),
    );

    app_page(state, "Hive Management", "hive-management", &body, "", "").await
}

fn hive_row(hive: &Hive) -> String {
    let created = hive
        .created_at
        .as_deref()
        .map(fmt_timestamp)
        .unwrap_or_else(|| "—".to_string());
    format!(r#"
                    <tr>
                        <td>{id}</td>
                        <td>{name}</td>
                        <td>{lat}</td>
                        <td>{lng}</td>
                        <td>{created}</td>
                        <td class="row-actions">
                            <a href="/hive-management/{id}/edit" class="btn btn-outline btn-sm">Edit</a>
                            <form method="POST" action="/hive-management/{id}/delete" onsubmit="return confirm('Delete this hive?');">
                                <button type="submit" class="btn btn-danger btn-sm">Delete</button>
                            </form>
                        </td>
                    </tr>"#,
        id = hive.id,
        name = escape(&hive.name),
        lat = hive.location_lat,
        lng = hive.location_lng,
    )
}
