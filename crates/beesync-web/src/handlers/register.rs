//! Packages and hive registration.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use beesync_common::entities::{find_package, Package, PACKAGES, PACKAGE_FEATURES};
use beesync_common::validation::{validate_registration, RegistrationForm, ValidationErrors, COUNTRIES};
use serde::Deserialize;
use tracing::warn;

use crate::handlers::layout::{alert_box, escape, landing_page};
use crate::state::SharedState;

const RETRY_MESSAGE: &str = "Please try again.";

#[derive(Debug, Default, Deserialize)]
pub struct PackageQuery {
    pub package: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSubmission {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(flatten)]
    pub form: RegistrationForm,
}

pub async fn packages_page() -> Html<String> {
    let features: String = PACKAGE_FEATURES
        .iter()
        .map(|f| format!("<li>✓ {f}</li>"))
        .collect();
    let cards: String = PACKAGES
        .iter()
        .map(|p| format!(r#"
        <div class="package-card">
            <h3>{title}</h3>
            <div class="package-price">{price}<span>/month</span></div>
            <p class="text-muted">{billing}</p>
            <p class="package-per-hive">{per_hive}</p>
            <ul class="package-features">{features}</ul>
            <a href="/register-hive?package={query}" class="btn btn-primary">Get started</a>
        </div>"#,
            title = p.title,
            price = p.price,
            billing = p.billing,
            per_hive = p.per_hive,
            query = query_escape(p.title),
        ))
        .collect();

    let body = format!(r#"
    <section class="hero">
        <h1>Simple, Transparent Pricing</h1>
        <p class="hero-subtitle">Pick the package that matches the size of your apiary.</p>
    </section>
    <section class="package-grid">{cards}</section>"#);

    landing_page("Packages", "packages", &body)
}

pub async fn register_page(Query(q): Query<PackageQuery>) -> Response {
    match q.package.as_deref().and_then(find_package) {
        Some(package) => render(package, &RegistrationForm::default(), &ValidationErrors::default(), None).into_response(),
        None => Redirect::to("/packages").into_response(),
    }
}

pub async fn register_submit(State(state): State<SharedState>, Form(sub): Form<RegisterSubmission>) -> Response {
    let Some(package) = sub.package.as_deref().and_then(find_package) else {
        return Redirect::to("/packages").into_response();
    };

    let registration = match validate_registration(&sub.form, package) {
        Ok(registration) => registration,
        Err(errors) => return render(package, &sub.form, &errors, None).into_response(),
    };

    let outcome = match state.clients.services.register(&registration).await {
        Ok(resp) if resp.success => Outcome::Registered,
        Ok(resp) => Outcome::Rejected(resp.message.unwrap_or_else(|| RETRY_MESSAGE.to_string())),
        Err(e) => {
            warn!(error = %e, "registration request failed");
            Outcome::Rejected(RETRY_MESSAGE.to_string())
        }
    };

    match outcome {
        Outcome::Registered => landing_page("Registration", "packages", &success_body(package, &registration.display_name)).into_response(),
        Outcome::Rejected(msg) => render(package, &sub.form, &ValidationErrors::default(), Some(&msg)).into_response(),
    }
}

enum Outcome {
    Registered,
    Rejected(String),
}

fn success_body(package: &Package, display_name: &str) -> String {
    format!(r#"
    <section class="hero">
        <h1>🎉 Welcome to BeeSync, {}!</h1>
        <p class="hero-subtitle">Your {} package is active. Head to the dashboard to add your first hive.</p>
        <a href="/hive-management" class="btn btn-primary">Add a Hive</a>
    </section>"#, escape(display_name), package.title)
}

fn render(package: &Package, form: &RegistrationForm, errors: &ValidationErrors, error: Option<&str>) -> Html<String> {
    let progress = form.progress();
    let field = |name: &'static str, label: &str, kind: &str, value: &str, required: bool| {
        let msg = errors
            .get(name)
            .map(|e| format!(r#"<span class="field-error">{}</span>"#, escape(e)))
            .unwrap_or_default();
        let req = if required { " required" } else { "" };
        // Passwords are never echoed back.
        let value = if kind == "password" { String::new() } else { escape(value) };
        format!(r#"
            <div class="form-group">
                <label for="{name}">{label}</label>
                <input id="{name}" name="{name}" type="{kind}" value="{value}"{req}>
                {msg}
            </div>"#)
    };

    let countries: String = COUNTRIES
        .iter()
        .map(|c| {
            let sel = if *c == form.country { " selected" } else { "" };
            format!(r#"<option value="{c}"{sel}>{c}</option>"#)
        })
        .collect();
    let country_error = errors
        .get("country")
        .map(|e| format!(r#"<span class="field-error">{}</span>"#, escape(e)))
        .unwrap_or_default();

    let body = format!(r#"
    <section class="register-layout">
        <div class="card package-summary">
            <h2>{title}</h2>
            <div class="package-price">{price}<span>/month</span></div>
            <p class="text-muted">{billing}</p>
            <a href="/packages" class="btn btn-outline btn-sm">Change package</a>
        </div>
        <div class="card register-card">
            <h1>Register Your Hives</h1>
            <div class="progress-track"><div class="progress-bar" style="width:{progress:.0}%"></div></div>
            <p class="text-muted">{progress:.0}% complete</p>
            {error}
            <form method="POST" action="/register-hive" class="stacked-form">
                <input type="hidden" name="package" value="{title}">
                {full_name}{display_name}{phone}{email}{password}{confirm}{company}
                <div class="form-group">
                    <label for="country">Country</label>
                    <select id="country" name="country" required>
                        <option value="">Select a country</option>
                        {countries}
                    </select>
                    {country_error}
                </div>
                <button type="submit" class="btn btn-primary">Complete Registration</button>
            </form>
        </div>
    </section>"#,
        title = package.title,
        price = package.price,
        billing = package.billing,
        error = alert_box("danger", error),
        full_name = field("full_name", "Full Name", "text", &form.full_name, true),
        display_name = field("display_name", "Display Name", "text", &form.display_name, true),
        phone = field("phone_number", "Phone Number", "tel", &form.phone_number, true),
        email = field("email", "Email", "email", &form.email, true),
        password = field("password", "Password", "password", &form.password, true),
        confirm = field("confirm_password", "Confirm Password", "password", &form.confirm_password, true),
        company = field("company", "Company (optional)", "text", &form.company, false),
    );

    landing_page("Register", "packages", &body)
}

/// Package titles contain spaces; nothing else needs escaping.
fn query_escape(raw: &str) -> String {
    raw.replace(' ', "%20")
}
