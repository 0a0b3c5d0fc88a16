//! Server-side form validation.
//!
//! Each `validate_*` function turns the raw strings of a submitted HTML form
//! into the typed request body for the backend, or a set of per-field
//! messages. A form that fails validation never reaches the backend.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entities::{HiveInput, Package, Registration, ThreatReading};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"\S+@\S+\.\S+").expect("valid email regex");
}

pub const COUNTRIES: [&str; 16] = [
    "United Kingdom", "United States", "Canada", "Australia", "Germany",
    "France", "Netherlands", "Belgium", "Switzerland", "Austria",
    "Ireland", "Denmark", "Sweden", "Norway", "Finland", "Other",
];

pub const MIN_PASSWORD_LEN: usize = 6;

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors(pub BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Parse a numeric form field. Blank → "required", garbage → "must be a number".
fn parse_number(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field is required");
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            errors.add(field, "Must be a number");
            0.0
        }
    }
}

// ── Hive form ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HiveForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location_lat: String,
    #[serde(default)]
    pub location_lng: String,
}

impl HiveForm {
    pub fn from_input(input: &HiveInput) -> Self {
        Self {
            name: input.name.clone(),
            location_lat: input.location_lat.to_string(),
            location_lng: input.location_lng.to_string(),
        }
    }
}

pub fn validate_hive_form(form: &HiveForm) -> Result<HiveInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let name = form.name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "Name is required");
    }
    let location_lat = parse_number(&mut errors, "location_lat", &form.location_lat);
    let location_lng = parse_number(&mut errors, "location_lng", &form.location_lng);
    errors.into_result(|| HiveInput { name, location_lat, location_lng })
}

// ── Threat form ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ThreatForm {
    #[serde(default)]
    pub weather_temp_c: String,
    #[serde(default)]
    pub weather_humidity_pct: String,
    #[serde(default)]
    pub hive_sound_db: String,
    #[serde(default)]
    pub hive_sound_peak_freq: String,
    #[serde(default)]
    pub vibration_hz: String,
    #[serde(default)]
    pub vibration_var: String,
}

impl ThreatForm {
    /// Field names in display order, paired with their current values.
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("weather_temp_c", self.weather_temp_c.as_str()),
            ("weather_humidity_pct", self.weather_humidity_pct.as_str()),
            ("hive_sound_db", self.hive_sound_db.as_str()),
            ("hive_sound_peak_freq", self.hive_sound_peak_freq.as_str()),
            ("vibration_hz", self.vibration_hz.as_str()),
            ("vibration_var", self.vibration_var.as_str()),
        ]
    }
}

pub fn validate_threat_form(form: &ThreatForm, timestamp: String) -> Result<ThreatReading, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let weather_temp_c = parse_number(&mut errors, "weather_temp_c", &form.weather_temp_c);
    let weather_humidity_pct = parse_number(&mut errors, "weather_humidity_pct", &form.weather_humidity_pct);
    let hive_sound_db = parse_number(&mut errors, "hive_sound_db", &form.hive_sound_db);
    let hive_sound_peak_freq = parse_number(&mut errors, "hive_sound_peak_freq", &form.hive_sound_peak_freq);
    let vibration_hz = parse_number(&mut errors, "vibration_hz", &form.vibration_hz);
    let vibration_var = parse_number(&mut errors, "vibration_var", &form.vibration_var);
    errors.into_result(|| ThreatReading {
        weather_temp_c,
        weather_humidity_pct,
        hive_sound_db,
        hive_sound_peak_freq,
        vibration_hz,
        vibration_var,
        timestamp,
    })
}

// ── Registration form ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub country: String,
}

impl RegistrationForm {
    fn required_fields(&self) -> [&str; 7] {
        [
            self.full_name.as_str(),
            self.display_name.as_str(),
            self.phone_number.as_str(),
            self.email.as_str(),
            self.password.as_str(),
            self.confirm_password.as_str(),
            self.country.as_str(),
        ]
    }

    /// Completion percentage over the seven required fields.
    pub fn progress(&self) -> f64 {
        let fields = self.required_fields();
        let done = fields.iter().filter(|f| !f.trim().is_empty()).count();
        done as f64 / fields.len() as f64 * 100.0
    }
}

pub fn validate_registration(form: &RegistrationForm, package: &Package) -> Result<Registration, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if form.full_name.trim().is_empty() {
        errors.add("full_name", "Full name is required");
    }
    if form.display_name.trim().is_empty() {
        errors.add("display_name", "Display name is required");
    }
    if form.phone_number.trim().is_empty() {
        errors.add("phone_number", "Phone number is required");
    }

    if form.email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL_RE.is_match(&form.email) {
        errors.add("email", "Email is invalid");
    }

    if form.password.is_empty() {
        errors.add("password", "Password is required");
    } else if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }

    if form.confirm_password.is_empty() {
        errors.add("confirm_password", "Please confirm your password");
    } else if form.password != form.confirm_password {
        errors.add("confirm_password", "Passwords do not match");
    }

    if form.country.is_empty() || !COUNTRIES.contains(&form.country.as_str()) {
        errors.add("country", "Please select a country");
    }

    errors.into_result(|| Registration {
        full_name: form.full_name.clone(),
        display_name: form.display_name.clone(),
        phone_number: form.phone_number.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        company: form.company.clone(),
        country: form.country.clone(),
        package_title: package.title.to_string(),
        package_price: package.price.to_string(),
    })
}

// ── Image upload ─────────────────────────────────────────────────────────────

pub fn validate_image_upload(
    content_type: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if size == 0 {
        errors.add("file", "Please select an image first");
    } else if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        errors.add("file", "Please select a valid image file");
    } else if size > max_bytes {
        errors.add("file", format!("File size must be less than {}MB", max_bytes / (1024 * 1024)));
    }
    errors.into_result(|| ())
}
