// src/mailer.rs
//
// Transactional email: POST {to, subject, text, html} to the configured
// sending endpoint. Best-effort, not retried, failures only logged.

use serde_json::json;

use crate::models::Booking;

#[derive(Clone, Default)]
pub struct Mailer {
    client: reqwest::Client,
    pub endpoint: Option<String>,
}

impl Mailer {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    fn send(&self, to: String, subject: String, text: String, html: String) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let client = self.client.clone();

        tokio::spawn(async move {
            let payload = json!({
                "to": to,
                "subject": subject,
                "text": text,
                "html": html,
            });
            match client.post(&endpoint).json(&payload).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    log::warn!("email endpoint returned {}", resp.status());
                }
                Ok(_) => {}
                Err(e) => log::warn!("email send error: {e}"),
            }
        });
    }

    pub fn booking_confirmation(&self, booking: &Booking) {
        let subject = format!("Booking #{} received", booking.id);
        let text = format!(
            "Dear {},\n\nYour booking for \"{}\" has been recorded.\n\
             Status: {}\nPayment: {}\nAmount paid: {} of {}\n\nThank you.",
            booking.user_name,
            booking.package_title,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.amount_paid,
            booking.total_price,
        );
        let html = format!(
            "<p>Dear {},</p><p>Your booking for <b>{}</b> has been recorded.</p>\
             <ul><li>Status: {}</li><li>Payment: {}</li>\
             <li>Amount paid: {} of {}</li></ul><p>Thank you.</p>",
            booking.user_name,
            booking.package_title,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.amount_paid,
            booking.total_price,
        );
        self.send(booking.user_email.clone(), subject, text, html);
    }
}
