// src/notify.rs
//
// Fire-and-forget webhook notifications for domain events. Each event
// category posts to its own endpoint URL; unset URLs disable the category.
// Failures are logged and swallowed, never retried, and never block the
// operation that triggered them.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::models::{Booking, Package, Payment, UserAccount};

const COLOR_GREEN: u32 = 0x2ECC71;
const COLOR_BLUE: u32 = 0x3498DB;
const COLOR_ORANGE: u32 = 0xE67E22;
const COLOR_RED: u32 = 0xE74C3C;

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

impl Embed {
    fn new(title: &str, description: String, color: u32) -> Self {
        Self {
            title: title.to_string(),
            description,
            color,
            fields: Vec::new(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.to_string(),
            value: value.into(),
            inline: true,
        });
        self
    }
}

/// Wire payload: `{content, embeds: [...]}`.
pub fn build_payload(content: &str, embed: Embed) -> Value {
    serde_json::json!({
        "content": content,
        "embeds": [embed],
    })
}

#[derive(Clone, Default)]
pub struct Notifier {
    client: reqwest::Client,
    pub agencies_url: Option<String>,
    pub packages_url: Option<String>,
    pub payments_url: Option<String>,
}

impl Notifier {
    pub fn new(
        agencies_url: Option<String>,
        packages_url: Option<String>,
        payments_url: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            agencies_url,
            packages_url,
            payments_url,
        }
    }

    fn dispatch(&self, url: Option<&String>, content: &str, embed: Embed) {
        let Some(url) = url else {
            return;
        };
        let url = url.clone();
        let client = self.client.clone();
        let payload = build_payload(content, embed);

        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    log::warn!("notification webhook returned {}", resp.status());
                }
                Ok(_) => {}
                Err(e) => log::warn!("notification webhook error: {e}"),
            }
        });
    }

    pub fn agency_registered(&self, agency: &UserAccount) {
        let embed = Embed::new(
            "Agency registered",
            "A new agency signed up and awaits verification".to_string(),
            COLOR_BLUE,
        )
        .field("Agency", agency.agency_name.clone().unwrap_or_default())
        .field("Email", agency.email.clone())
        .field(
            "City",
            agency.city_of_operation.clone().unwrap_or_default(),
        );
        self.dispatch(self.agencies_url.as_ref(), "Agency registered", embed);
    }

    pub fn agency_verified(&self, agency: &UserAccount, verified: bool) {
        let (title, color) = if verified {
            ("Agency verified", COLOR_GREEN)
        } else {
            ("Agency unverified", COLOR_ORANGE)
        };
        let embed = Embed::new(
            title,
            format!("verified = {verified}"),
            color,
        )
        .field("Agency", agency.agency_name.clone().unwrap_or_default())
        .field("Email", agency.email.clone());
        self.dispatch(self.agencies_url.as_ref(), title, embed);
    }

    pub fn agency_deleted(&self, agency_name: &str, packages_archived: u64, bookings_cancelled: u64) {
        let embed = Embed::new(
            "Agency deleted",
            "Account removed; owned packages archived, open bookings cancelled".to_string(),
            COLOR_RED,
        )
        .field("Agency", agency_name)
        .field("Packages archived", packages_archived.to_string())
        .field("Bookings cancelled", bookings_cancelled.to_string());
        self.dispatch(self.agencies_url.as_ref(), "Agency deleted", embed);
    }

    pub fn package_event(&self, action: &str, package: &Package) {
        let embed = Embed::new(
            &format!("Package {action}"),
            package.title.clone(),
            COLOR_BLUE,
        )
        .field("Package ID", package.id.to_string())
        .field(
            "Owner",
            if package.agency_id.is_some() {
                package.agency_name.clone()
            } else {
                "Platform".to_string()
            },
        )
        .field("Price", package.price.to_string())
        .field("Status", package.status.as_str());
        self.dispatch(
            self.packages_url.as_ref(),
            &format!("Package {action}"),
            embed,
        );
    }

    pub fn booking_created(&self, booking: &Booking) {
        let embed = Embed::new(
            "Booking created",
            booking.package_title.clone(),
            COLOR_GREEN,
        )
        .field("Booking ID", booking.id.to_string())
        .field("Pilgrim", booking.user_name.clone())
        .field("Total", booking.total_price.to_string())
        .field("Paid", booking.amount_paid.to_string())
        .field("Status", booking.status.as_str())
        .field("Payment", booking.payment_status.as_str());
        self.dispatch(self.payments_url.as_ref(), "Booking created", embed);
    }

    pub fn payment_confirmed(&self, payment: &Payment, booking: &Booking) {
        let embed = Embed::new(
            "Payment confirmed",
            format!("Reference {}", payment.reference),
            COLOR_GREEN,
        )
        .field("Booking ID", booking.id.to_string())
        .field("Amount", payment.amount.to_string())
        .field("Pilgrim", payment.pilgrim_name.clone());
        self.dispatch(self.payments_url.as_ref(), "Payment confirmed", embed);
    }
}
