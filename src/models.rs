// src/models.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pilgrim,
    Agency,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pilgrim => "pilgrim",
            Role::Agency => "agency",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "pilgrim" => Some(Role::Pilgrim),
            "agency" => Some(Role::Agency),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Draft,
    Active,
    Archived,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Draft => "draft",
            PackageStatus::Active => "active",
            PackageStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<PackageStatus> {
        match s {
            "draft" => Some(PackageStatus::Draft),
            "active" => Some(PackageStatus::Active),
            "archived" => Some(PackageStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// `completed` and `cancelled` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Legal forward edges only:
    /// pending -> confirmed | cancelled, confirmed -> completed | cancelled.
    pub fn can_transition(&self, to: BookingStatus) -> bool {
        matches!(
            (self, to),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "unpaid")]
    Unpaid,
    #[serde(rename = "partial payment")]
    PartialPayment,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "complete")]
    Complete,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PartialPayment => "partial payment",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "partial payment" => Some(PaymentStatus::PartialPayment),
            "paid" => Some(PaymentStatus::Paid),
            "complete" => Some(PaymentStatus::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOption {
    Full,
    Deposit,
}

impl PaymentOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOption::Full => "full",
            PaymentOption::Deposit => "deposit",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentOption> {
        match s {
            "full" => Some(PaymentOption::Full),
            "deposit" => Some(PaymentOption::Deposit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItineraryDay {
    pub day_range: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

/// Traveler record inside a group booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pilgrim {
    pub full_name: String,
    #[serde(default)]
    pub passport_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupMember {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub duration_days: i32,
    pub group_size: i32,
    /// None means the package is platform-owned (an "admin package").
    pub agency_id: Option<i32>,
    pub agency_name: String,
    pub status: PackageStatus,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub itinerary: Vec<ItineraryDay>,
    pub min_payment_percent: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: i32,
    pub package_id: Option<i32>,
    pub package_title: String,
    pub agency_id: Option<i32>,
    pub agency_name: String,
    pub user_id: i32,
    pub user_email: String,
    pub user_name: String,
    pub passport_number: Option<String>,
    pub total_price: i64,
    pub amount_paid: i64,
    pub deposit_amount: Option<i64>,
    pub is_deposit: bool,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub pilgrims: Vec<Pilgrim>,
    pub group_members: Vec<GroupMember>,
    pub selected_services: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Standalone audit record for a captured payment, separate from
/// `Booking.amount_paid`.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i32,
    pub reference: String,
    pub booking_id: i32,
    pub amount: i64,
    pub status: String, // pending | confirmed
    pub method: Option<String>,
    pub pilgrim_name: String,
    pub pilgrim_email: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Durable record written before the gateway is invoked, so a captured
/// payment can always be reconciled even if the booking write fails.
/// `amount` and `total_price` are frozen at initiation; the booking is
/// priced from this snapshot, not from the package as it looks later.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub id: i32,
    pub reference: String,
    pub package_id: i32,
    pub user_id: i32,
    pub email: String,
    pub amount: i64,
    pub total_price: i64,
    pub payment_option: PaymentOption,
    pub status: String, // pending | succeeded | cancelled
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub agency_name: Option<String>,
    pub phone_number: Option<String>,
    pub city_of_operation: Option<String>,
    pub country_of_operation: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}
