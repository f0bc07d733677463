//! Shared domain types and configuration for the placescout workspace.
//!
//! The scraping core ([`placescout-scraper`]) produces [`PlaceRecord`]s;
//! the output writer consumes [`OutputRecord`]s, whose serde field order
//! is the writer's column order.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod app_config;
mod config;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};

/// A business listing extracted from the target, after email refinement.
///
/// Immutable once admitted by the deduplicator. Every field except `name`
/// and `scraped_at` is optional: absence of data is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: Option<String>,
    /// Distinct validated email candidates. Ordered so the joined output
    /// form is deterministic.
    pub emails: BTreeSet<String>,
    pub website: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub hours: Option<String>,
    pub price_level: Option<String>,
    pub business_status: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl PlaceRecord {
    /// Converts into the writer-facing row, collapsing the email set into
    /// its comma-joined ascending form (`None` when no emails were found).
    #[must_use]
    pub fn into_output(self) -> OutputRecord {
        let email = if self.emails.is_empty() {
            None
        } else {
            Some(
                self.emails
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };
        OutputRecord {
            name: self.name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            phone: self.phone,
            email,
            website: self.website,
            category: self.category,
            rating: self.rating,
            hours: self.hours,
            price_level: self.price_level,
            business_status: self.business_status,
            scraped_at: self.scraped_at,
        }
    }
}

/// One row handed to the output writer. Field declaration order is the
/// writer's column order; do not reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub hours: Option<String>,
    pub price_level: Option<String>,
    pub business_status: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

/// Errors produced while loading application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
