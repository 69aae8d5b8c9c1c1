// src/booking.rs
//
// Booking & payment workflow: turns a pilgrim's intent-to-book into a durable
// booking whose payment state reflects what the gateway actually captured.
// A booking claiming payment is only ever written after the gateway confirms
// the capture, and a durable payment intent is written before the gateway is
// invoked so a capture can always be reconciled.

use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::db;
use crate::gateway::{self, GatewayError, InitializeRequest, PaymentGateway};
use crate::mailer::Mailer;
use crate::models::{
    Booking, BookingStatus, GroupMember, Package, PaymentOption, PaymentStatus, Pilgrim,
    UserAccount,
};
use crate::notify::Notifier;

#[derive(Debug)]
pub enum WorkflowError {
    /// Malformed or missing input; nothing was persisted.
    Validation(String),
    /// The gateway could not be reached or rejected the call.
    PaymentInfrastructure(String),
    /// Payment captured externally but the booking write failed. The pending
    /// intent row remains for reconciliation.
    BookingPersistence(sqlx::Error),
    NotFound(&'static str),
    /// A booking already exists for this gateway reference.
    DuplicateReference,
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// Lost a conditional write race; safe to retry.
    Conflict(&'static str),
    Db(sqlx::Error),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::Validation(msg) => write!(f, "validation error: {msg}"),
            WorkflowError::PaymentInfrastructure(msg) => {
                write!(f, "payment infrastructure error: {msg}")
            }
            WorkflowError::BookingPersistence(e) => {
                write!(f, "booking persistence error after capture: {e}")
            }
            WorkflowError::NotFound(what) => write!(f, "{what} not found"),
            WorkflowError::DuplicateReference => {
                write!(f, "a booking already exists for this payment reference")
            }
            WorkflowError::InvalidTransition { from, to } => {
                write!(
                    f,
                    "illegal booking status transition {} -> {}",
                    from.as_str(),
                    to.as_str()
                )
            }
            WorkflowError::Conflict(what) => write!(f, "conflicting concurrent update: {what}"),
            WorkflowError::Db(e) => write!(f, "database error: {e}"),
        }
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(value: sqlx::Error) -> Self {
        Self::Db(value)
    }
}

impl From<GatewayError> for WorkflowError {
    fn from(value: GatewayError) -> Self {
        Self::PaymentInfrastructure(value.to_string())
    }
}

/// Deposit = round-half-up(price * percent / 100), integer arithmetic only.
/// Frozen into the booking at payment time; later package edits never touch it.
pub fn deposit_amount(price: i64, percent: i32) -> i64 {
    (price * percent as i64 + 50) / 100
}

/// Minimal sanity check shared by registration and payment initiation.
pub fn valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}

/// Status pair a successful capture produces: full payment confirms the
/// booking outright, a deposit leaves it pending with a partial payment.
pub fn payment_outcome(option: PaymentOption) -> (BookingStatus, PaymentStatus) {
    match option {
        PaymentOption::Full => (BookingStatus::Confirmed, PaymentStatus::Paid),
        PaymentOption::Deposit => (BookingStatus::Pending, PaymentStatus::PartialPayment),
    }
}

/// Amount to charge for a package under the chosen option.
pub fn charge_amount(package: &Package, option: PaymentOption) -> Result<i64, WorkflowError> {
    match option {
        PaymentOption::Full => Ok(package.price),
        PaymentOption::Deposit => {
            let percent = package.min_payment_percent.ok_or_else(|| {
                WorkflowError::Validation("package does not allow deposit payments".to_string())
            })?;
            if !(1..=100).contains(&percent) {
                return Err(WorkflowError::Validation(
                    "package has an invalid deposit percentage".to_string(),
                ));
            }
            Ok(deposit_amount(package.price, percent))
        }
    }
}

pub struct InitiatedPayment {
    pub reference: String,
    pub checkout_url: String,
    pub amount: i64,
}

/// Step one: validate, persist a pending intent, then ask the gateway for a
/// checkout URL. No booking exists yet. A gateway failure leaves only the
/// harmless pending intent behind.
pub async fn initiate_payment(
    pool: &PgPool,
    gw: &PaymentGateway,
    user: &UserAccount,
    package_id: i32,
    option: PaymentOption,
) -> Result<InitiatedPayment, WorkflowError> {
    let package = db::get_package(pool, package_id)
        .await?
        .ok_or(WorkflowError::NotFound("package"))?;

    if package.status != crate::models::PackageStatus::Active {
        return Err(WorkflowError::Validation(
            "package is not open for booking".to_string(),
        ));
    }

    let email = user.email.trim();
    if !valid_email(email) {
        return Err(WorkflowError::Validation("invalid payer email".to_string()));
    }

    let amount = charge_amount(&package, option)?;
    if amount <= 0 {
        return Err(WorkflowError::Validation(
            "charge amount must be positive".to_string(),
        ));
    }

    let reference = format!("MNSK-{}", Uuid::new_v4());

    db::insert_intent(
        pool,
        &db::NewIntent {
            reference: &reference,
            package_id: package.id,
            user_id: user.id,
            email,
            amount,
            total_price: package.price,
            payment_option: option,
        },
    )
    .await?;

    let init = gw
        .initialize(&InitializeRequest {
            email: email.to_string(),
            amount: gateway::to_minor_units(amount),
            currency: gw.currency.clone(),
            reference: reference.clone(),
            metadata: json!({
                "package_id": package.id,
                "user_id": user.id,
                "payment_option": option.as_str(),
            }),
        })
        .await?;

    log::info!(
        "payment initiated reference={} package_id={} user_id={} amount={}",
        init.reference,
        package.id,
        user.id,
        amount
    );

    Ok(InitiatedPayment {
        reference: init.reference,
        checkout_url: init.authorization_url,
        amount,
    })
}

/// Traveler details collected by the booking form, attached when the payment
/// completes.
#[derive(Default)]
pub struct TravelDetails {
    pub passport_number: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub pilgrims: Vec<Pilgrim>,
    pub group_members: Vec<GroupMember>,
}

/// Step two: the pilgrim returns from checkout. Verify the capture with the
/// gateway, then record the booking. Never trusts the client for amounts.
pub async fn complete_payment(
    pool: &PgPool,
    gw: &PaymentGateway,
    notifier: &Notifier,
    mailer: &Mailer,
    reference: &str,
    details: &TravelDetails,
) -> Result<Booking, WorkflowError> {
    let intent = db::get_intent(pool, reference)
        .await?
        .ok_or(WorkflowError::NotFound("payment intent"))?;

    let verified = gw.verify(reference).await?;
    if verified.status != "success" {
        return Err(WorkflowError::PaymentInfrastructure(format!(
            "gateway reports capture status '{}'",
            verified.status
        )));
    }
    if verified.amount != gateway::to_minor_units(intent.amount) {
        return Err(WorkflowError::Validation(format!(
            "captured amount {} does not match expected {}",
            verified.amount,
            gateway::to_minor_units(intent.amount)
        )));
    }

    let booking =
        record_verified_payment(pool, reference, verified.channel.as_deref(), details).await?;

    notifier.booking_created(&booking);
    mailer.booking_confirmation(&booking);

    Ok(booking)
}

/// Persistence half of `complete_payment`, after the capture has been
/// verified. The intent flip and the booking insert share one transaction:
/// whoever flips `pending -> succeeded` writes the booking, every other
/// caller gets `DuplicateReference` and no second booking can exist.
/// All money fields come from the intent snapshot; package edits made
/// between initiation and completion never reach the booking.
pub async fn record_verified_payment(
    pool: &PgPool,
    reference: &str,
    method: Option<&str>,
    details: &TravelDetails,
) -> Result<Booking, WorkflowError> {
    let intent = db::get_intent(pool, reference)
        .await?
        .ok_or(WorkflowError::NotFound("payment intent"))?;

    let package = db::get_package(pool, intent.package_id)
        .await?
        .ok_or(WorkflowError::NotFound("package"))?;

    let user = db::get_user(pool, intent.user_id)
        .await?
        .ok_or(WorkflowError::NotFound("user"))?;

    let (status, payment_status) = payment_outcome(intent.payment_option);
    let is_deposit = intent.payment_option == PaymentOption::Deposit;
    let user_name = user
        .full_name
        .clone()
        .unwrap_or_else(|| user.email.clone());

    let mut tx = pool.begin().await.map_err(WorkflowError::Db)?;

    let flipped = db::mark_intent(&mut *tx, reference, "pending", "succeeded")
        .await
        .map_err(WorkflowError::Db)?;
    if !flipped {
        // Someone else already resolved this reference.
        return match intent.status.as_str() {
            "succeeded" => Err(WorkflowError::DuplicateReference),
            "cancelled" => Err(WorkflowError::Validation(
                "payment was cancelled".to_string(),
            )),
            _ => Err(WorkflowError::DuplicateReference),
        };
    }

    let new_booking = db::NewBooking {
        package_id: Some(package.id),
        package_title: &package.title,
        agency_id: package.agency_id,
        agency_name: &package.agency_name,
        user_id: user.id,
        user_email: &user.email,
        user_name: &user_name,
        passport_number: details.passport_number.as_deref(),
        total_price: intent.total_price,
        amount_paid: intent.amount,
        deposit_amount: is_deposit.then_some(intent.amount),
        is_deposit,
        status,
        payment_status,
        payment_reference: Some(reference),
        travel_date: details.travel_date,
        return_date: details.return_date,
        pilgrims: &details.pilgrims,
        group_members: &details.group_members,
        selected_services: json!({}),
    };

    let booking = db::insert_booking(&mut *tx, &new_booking)
        .await
        .map_err(WorkflowError::BookingPersistence)?;

    db::insert_payment(
        &mut *tx,
        &db::NewPayment {
            reference,
            booking_id: booking.id,
            amount: intent.amount,
            method,
            pilgrim_name: &user_name,
            pilgrim_email: &user.email,
        },
    )
    .await
    .map_err(WorkflowError::BookingPersistence)?;

    tx.commit().await.map_err(WorkflowError::BookingPersistence)?;

    log::info!(
        "booking {} recorded for reference={} amount_paid={} status={}",
        booking.id,
        reference,
        booking.amount_paid,
        booking.status.as_str()
    );

    Ok(booking)
}

/// The pilgrim closed the checkout before paying. Terminal for this attempt,
/// idempotent, and guarantees no booking is ever built from the reference.
pub async fn cancel_payment(pool: &PgPool, reference: &str) -> Result<(), WorkflowError> {
    db::get_intent(pool, reference)
        .await?
        .ok_or(WorkflowError::NotFound("payment intent"))?;

    db::mark_intent(pool, reference, "pending", "cancelled").await?;
    Ok(())
}

pub struct UnpaidBookingRequest {
    pub package_id: Option<i32>,
    pub selected_services: serde_json::Value,
    pub passport_number: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub pilgrims: Vec<Pilgrim>,
    pub group_members: Vec<GroupMember>,
}

/// Custom-services intake: the booking is created immediately in
/// pending/unpaid with a zero price, to be quoted by a human agent later.
/// No gateway involvement.
pub async fn create_unpaid_booking(
    pool: &PgPool,
    notifier: &Notifier,
    mailer: &Mailer,
    user: &UserAccount,
    req: &UnpaidBookingRequest,
) -> Result<Booking, WorkflowError> {
    let package = match req.package_id {
        Some(id) => db::get_package(pool, id)
            .await?
            .map(Some)
            .ok_or(WorkflowError::NotFound("package"))?,
        None => None,
    };

    let user_name = user
        .full_name
        .clone()
        .unwrap_or_else(|| user.email.clone());

    let new_booking = db::NewBooking {
        package_id: package.as_ref().map(|p| p.id),
        package_title: package
            .as_ref()
            .map(|p| p.title.as_str())
            .unwrap_or("Custom services"),
        agency_id: package.as_ref().and_then(|p| p.agency_id),
        agency_name: package.as_ref().map(|p| p.agency_name.as_str()).unwrap_or(""),
        user_id: user.id,
        user_email: &user.email,
        user_name: &user_name,
        passport_number: req.passport_number.as_deref(),
        total_price: 0,
        amount_paid: 0,
        deposit_amount: None,
        is_deposit: false,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        payment_reference: None,
        travel_date: req.travel_date,
        return_date: req.return_date,
        pilgrims: &req.pilgrims,
        group_members: &req.group_members,
        selected_services: req.selected_services.clone(),
    };

    let booking = db::insert_booking(pool, &new_booking)
        .await
        .map_err(WorkflowError::BookingPersistence)?;

    notifier.booking_created(&booking);
    mailer.booking_confirmation(&booking);

    Ok(booking)
}

pub struct ConfirmOutcome {
    pub booking: Booking,
    /// True when the payment was already confirmed and nothing changed.
    pub already_confirmed: bool,
}

/// Admin settlement of a standalone payment record: one-way
/// `pending -> confirmed` on the payment plus `payment_status = paid` on the
/// linked booking. Calling it twice is a no-op.
pub async fn confirm_payment(
    pool: &PgPool,
    notifier: &Notifier,
    payment_id: i32,
    booking_id: i32,
) -> Result<ConfirmOutcome, WorkflowError> {
    let payment = db::get_payment(pool, payment_id)
        .await?
        .ok_or(WorkflowError::NotFound("payment"))?;

    if payment.booking_id != booking_id {
        return Err(WorkflowError::Validation(
            "payment does not belong to this booking".to_string(),
        ));
    }

    let booking = db::get_booking(pool, booking_id)
        .await?
        .ok_or(WorkflowError::NotFound("booking"))?;

    let mut tx = pool.begin().await?;

    let confirmed_now = db::confirm_payment_record(&mut *tx, payment_id).await?;
    if !confirmed_now {
        return Ok(ConfirmOutcome {
            booking,
            already_confirmed: true,
        });
    }

    db::settle_booking_paid(&mut *tx, booking_id).await?;
    tx.commit().await?;

    let booking = db::get_booking(pool, booking_id)
        .await?
        .ok_or(WorkflowError::NotFound("booking"))?;

    notifier.payment_confirmed(&payment, &booking);

    Ok(ConfirmOutcome {
        booking,
        already_confirmed: false,
    })
}

/// Status write guarded by the transition table; illegal moves are rejected
/// instead of written.
pub async fn change_booking_status(
    pool: &PgPool,
    booking_id: i32,
    to: BookingStatus,
) -> Result<Booking, WorkflowError> {
    let booking = db::get_booking(pool, booking_id)
        .await?
        .ok_or(WorkflowError::NotFound("booking"))?;

    if !booking.status.can_transition(to) {
        return Err(WorkflowError::InvalidTransition {
            from: booking.status,
            to,
        });
    }

    let updated = db::update_booking_status(pool, booking_id, booking.status, to).await?;
    if !updated {
        return Err(WorkflowError::Conflict("booking status"));
    }

    db::get_booking(pool, booking_id)
        .await?
        .ok_or(WorkflowError::NotFound("booking"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_rounds_half_up() {
        assert_eq!(deposit_amount(500_000, 20), 100_000);
        assert_eq!(deposit_amount(333, 10), 33); // 33.3 rounds down
        assert_eq!(deposit_amount(335, 10), 34); // 33.5 tie rounds up
        assert_eq!(deposit_amount(50, 25), 13); // 12.5 tie rounds up
        assert_eq!(deposit_amount(0, 50), 0);
    }

    #[test]
    fn email_sanity_check() {
        assert!(valid_email("fatima@example.com"));
        assert!(!valid_email("fatima@example"));
        assert!(!valid_email("fatima.example.com"));
        assert!(!valid_email(""));
    }

    #[test]
    fn payment_outcome_by_option() {
        assert_eq!(
            payment_outcome(PaymentOption::Full),
            (BookingStatus::Confirmed, PaymentStatus::Paid)
        );
        assert_eq!(
            payment_outcome(PaymentOption::Deposit),
            (BookingStatus::Pending, PaymentStatus::PartialPayment)
        );
    }

    #[test]
    fn transition_table_accepts_only_forward_edges() {
        use BookingStatus::*;
        let legal = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Completed),
            (Confirmed, Cancelled),
        ];
        for from in [Pending, Confirmed, Completed, Cancelled] {
            for to in [Pending, Confirmed, Completed, Cancelled] {
                assert_eq!(
                    from.can_transition(to),
                    legal.contains(&(from, to)),
                    "{} -> {}",
                    from.as_str(),
                    to.as_str()
                );
            }
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
    }
}
