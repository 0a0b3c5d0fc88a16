//! Public pages: landing, about and contact.

use axum::{response::Html, Form};
use serde::Deserialize;
use tracing::info;

use crate::handlers::layout::{escape, landing_page};

const FEATURES: [(&str, &str, &str); 6] = [
    ("🛡️", "AI Threat Detection", "Machine learning models flag diseases, parasites and environmental threats before they become critical."),
    ("📈", "Performance Prediction", "Predict hive productivity and health trends from weather patterns and historical sensor data."),
    ("🗺️", "Optimal Placement", "Find the best hive locations from environmental factors, nearby resources and predicted honey yield."),
    ("📡", "IoT Monitoring", "Round-the-clock temperature, humidity, sound and weight monitoring with instant alerts."),
    ("🌤️", "Weather Integration", "Weather data synchronized with every sensor reading to show how conditions affect your hives."),
    ("📊", "Real-Time Dashboard", "Live gauges, charts and health metrics for every hive in one place."),
];

pub async fn home() -> Html<String> {
    let features: String = FEATURES.iter().map(|(icon, title, text)| format!(r#"
        <div class="feature-card">
            <div class="feature-icon">{icon}</div>
            <h3>{title}</h3>
            <p>{text}</p>
        </div>"#)).collect();

    let body = format!(r#"
    <section class="hero">
        <h1>Smart Beekeeping <span class="text-gradient">Made Simple</span></h1>
        <p class="hero-subtitle">Monitor hive temperature, humidity, sound and weight in real time, and let AI warn you before problems spread.</p>
        <div class="hero-actions">
            <a href="/packages" class="btn btn-primary">Get Started</a>
            <a href="/dashboard" class="btn btn-outline">Open Dashboard</a>
        </div>
    </section>
    <section class="features">
        <h2>Powerful Features</h2>
        <div class="feature-grid">{features}</div>
    </section>
    <section class="how-it-works">
        <h2>How It Works</h2>
        <p class="text-muted">Simple setup, powerful results</p>
        <ol class="steps">
            <li><h3>Install Sensors</h3><p>Fit IoT sensors in your hives to track temperature, humidity, sound and weight.</p></li>
            <li><h3>Connect to Platform</h3><p>Sensors sync through the cloud to the BeeSync monitoring service.</p></li>
            <li><h3>Get Insights</h3><p>Predictions, alerts and recommendations arrive on your dashboard.</p></li>
        </ol>
    </section>
    <section class="cta">
        <h2>Ready to Transform Your Beekeeping?</h2>
        <a href="/packages" class="btn btn-primary">View Packages</a>
    </section>"#);

    landing_page("Home", "home", &body)
}

pub async fn about() -> Html<String> {
    let body = r#"
    <section class="hero">
        <h1>About BeeSync</h1>
        <p class="hero-subtitle">Beekeeping with sensors, weather data and machine learning.</p>
    </section>
    <section class="about-grid">
        <div class="card">
            <h2>Our Mission</h2>
            <p>Give every beekeeper early warning of colony problems, so fewer hives are lost to disease, predators and bad weather.</p>
        </div>
        <div class="card">
            <h2>Our Vision</h2>
            <p>To become the standard for intelligent beekeeping management.</p>
        </div>
    </section>
    <section class="features">
        <h2>Technology</h2>
        <div class="feature-grid">
            <div class="feature-card"><h3>Machine Learning</h3><p>Models trained on historical readings predict hive performance and classify threats.</p></div>
            <div class="feature-card"><h3>IoT Integration</h3><p>Hive sensors report continuously and are synchronized with local weather.</p></div>
            <div class="feature-card"><h3>Image Diagnostics</h3><p>Photos of bees are checked for Varroa mites, wax moth damage and other signs of disease.</p></div>
        </div>
    </section>
    <section class="values">
        <h2>What We Stand For</h2>
        <ul>
            <li><strong>🐝 Bee Welfare First.</strong> Every feature starts from the health of the colony.</li>
            <li><strong>📊 Data-Driven Decisions.</strong> Accurate real-time data over guesswork.</li>
            <li><strong>🌱 Sustainability.</strong> Practices that benefit beekeepers and the environment.</li>
        </ul>
    </section>"#;

    landing_page("About", "about", body)
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

const SUBJECTS: [(&str, &str); 5] = [
    ("general", "General Inquiry"),
    ("support", "Technical Support"),
    ("sales", "Sales Question"),
    ("feature", "Feature Request"),
    ("other", "Other"),
];

pub async fn contact_page() -> Html<String> {
    landing_page("Contact", "contact", &render_contact(None))
}

/// Contact messages are only logged; there is no backend for them.
pub async fn contact_submit(Form(form): Form<ContactForm>) -> Html<String> {
    info!(
        name = %form.name,
        email = %form.email,
        subject = %form.subject,
        message_len = form.message.len(),
        "contact form submitted"
    );
    let thanks = format!("Thank you for your message, {}! We will get back to you soon.", form.name.trim());
    landing_page("Contact", "contact", &render_contact(Some(&thanks)))
}

fn render_contact(banner: Option<&str>) -> String {
    let banner = banner
        .map(|b| format!(r#"<div class="alert alert-success">{}</div>"#, escape(b)))
        .unwrap_or_default();
    let options: String = SUBJECTS
        .iter()
        .map(|(value, label)| format!(r#"<option value="{value}">{label}</option>"#))
        .collect();

    format!(r#"
    <section class="hero">
        <h1>Get in Touch</h1>
        <p class="hero-subtitle">We'd love to hear from you. Send us a message and we'll respond as soon as possible.</p>
    </section>
    <section class="card contact-card">
        {banner}
        <form method="POST" action="/contact" class="stacked-form">
            <label for="name">Name</label>
            <input id="name" name="name" type="text" required>
            <label for="email">Email</label>
            <input id="email" name="email" type="email" required>
            <label for="subject">Subject</label>
            <select id="subject" name="subject" required>
                <option value="">Select a subject</option>
                {options}
            </select>
            <label for="message">Message</label>
            <textarea id="message" name="message" rows="5" required></textarea>
            <button type="submit" class="btn btn-primary">Send Message</button>
        </form>
    </section>"#)
}
