mod support;

use manasik::booking::{
    self, deposit_amount, TravelDetails, UnpaidBookingRequest, WorkflowError,
};
use manasik::db;
use manasik::mailer::Mailer;
use manasik::models::{BookingStatus, PaymentOption, PaymentStatus};
use manasik::notify::Notifier;

fn quiet_sinks() -> (Notifier, Mailer) {
    (Notifier::default(), Mailer::default())
}

async fn seed_intent(
    pool: &sqlx::PgPool,
    reference: &str,
    package: &manasik::models::Package,
    pilgrim: &manasik::models::UserAccount,
    amount: i64,
    option: PaymentOption,
) {
    db::insert_intent(
        pool,
        &db::NewIntent {
            reference,
            package_id: package.id,
            user_id: pilgrim.id,
            email: &pilgrim.email,
            amount,
            total_price: package.price,
            payment_option: option,
        },
    )
    .await
    .expect("seed intent");
}

#[tokio::test]
async fn deposit_booking_records_partial_payment() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;

    let agency = support::create_agency(pool, "agency@alnoor.example", "Al-Noor Travel").await;
    let package =
        support::create_active_package(pool, Some(&agency), "Umrah Deluxe", 500_000, Some(20))
            .await;
    let pilgrim = support::create_pilgrim(pool, "fatima@example.com", "Fatima Khan").await;

    let amount = deposit_amount(package.price, 20);
    assert_eq!(amount, 100_000);

    seed_intent(pool, "MNSK-dep-1", &package, &pilgrim, amount, PaymentOption::Deposit).await;

    let booking =
        booking::record_verified_payment(pool, "MNSK-dep-1", Some("card"), &TravelDetails::default())
            .await
            .expect("booking created");

    assert_eq!(booking.amount_paid, 100_000);
    assert_eq!(booking.total_price, 500_000);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::PartialPayment);
    assert!(booking.is_deposit);
    assert_eq!(booking.deposit_amount, Some(100_000));
    assert!(booking.amount_paid <= booking.total_price);
    assert_eq!(booking.payment_reference.as_deref(), Some("MNSK-dep-1"));
    assert_eq!(booking.package_title, "Umrah Deluxe");
    assert_eq!(booking.agency_id, Some(agency.id));
}

#[tokio::test]
async fn full_payment_confirms_booking_at_creation() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;

    let agency = support::create_agency(pool, "agency@safa.example", "Safa Tours").await;
    let package =
        support::create_active_package(pool, Some(&agency), "Hajj Standard", 300_000, None).await;
    let pilgrim = support::create_pilgrim(pool, "yusuf@example.com", "Yusuf Ali").await;

    seed_intent(pool, "MNSK-full-1", &package, &pilgrim, package.price, PaymentOption::Full).await;

    let booking =
        booking::record_verified_payment(pool, "MNSK-full-1", Some("card"), &TravelDetails::default())
            .await
            .expect("booking created");

    assert_eq!(booking.amount_paid, 300_000);
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert!(!booking.is_deposit);
    assert_eq!(booking.deposit_amount, None);
}

#[tokio::test]
async fn duplicate_reference_creates_only_one_booking() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;

    let agency = support::create_agency(pool, "agency@dup.example", "Dup Travel").await;
    let package =
        support::create_active_package(pool, Some(&agency), "Umrah Basic", 200_000, None).await;
    let pilgrim = support::create_pilgrim(pool, "dup@example.com", "Dup User").await;

    seed_intent(pool, "MNSK-dup-1", &package, &pilgrim, package.price, PaymentOption::Full).await;

    let first =
        booking::record_verified_payment(pool, "MNSK-dup-1", None, &TravelDetails::default())
            .await
            .expect("first booking");

    let second =
        booking::record_verified_payment(pool, "MNSK-dup-1", None, &TravelDetails::default()).await;
    assert!(matches!(second, Err(WorkflowError::DuplicateReference)));

    let found = db::get_booking_by_reference(pool, "MNSK-dup-1")
        .await
        .unwrap()
        .expect("booking exists");
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn cancelled_checkout_never_creates_a_booking() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;

    let agency = support::create_agency(pool, "agency@cancel.example", "Cancel Travel").await;
    let package =
        support::create_active_package(pool, Some(&agency), "Umrah Lite", 150_000, None).await;
    let pilgrim = support::create_pilgrim(pool, "cancel@example.com", "Cancel User").await;

    seed_intent(pool, "MNSK-cxl-1", &package, &pilgrim, package.price, PaymentOption::Full).await;

    booking::cancel_payment(pool, "MNSK-cxl-1").await.unwrap();
    // cancelling again is a no-op
    booking::cancel_payment(pool, "MNSK-cxl-1").await.unwrap();

    let result =
        booking::record_verified_payment(pool, "MNSK-cxl-1", None, &TravelDetails::default()).await;
    assert!(matches!(result, Err(WorkflowError::Validation(_))));

    assert!(db::get_booking_by_reference(pool, "MNSK-cxl-1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn price_edits_after_initiation_never_reach_the_booking() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;

    let agency = support::create_agency(pool, "agency@reprice.example", "Reprice Travel").await;
    let package =
        support::create_active_package(pool, Some(&agency), "Umrah Classic", 500_000, Some(20))
            .await;
    let pilgrim = support::create_pilgrim(pool, "reprice@example.com", "Reprice User").await;

    let amount = deposit_amount(package.price, 20);
    seed_intent(pool, "MNSK-rpr-1", &package, &pilgrim, amount, PaymentOption::Deposit).await;

    // the agency slashes the price while the pilgrim is at checkout
    db::update_package(
        pool,
        package.id,
        &db::PackagePatch {
            price: Some(80_000),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let booking =
        booking::record_verified_payment(pool, "MNSK-rpr-1", Some("card"), &TravelDetails::default())
            .await
            .expect("booking created");

    // priced from the intent snapshot, not the edited package
    assert_eq!(booking.total_price, 500_000);
    assert_eq!(booking.amount_paid, 100_000);
    assert_eq!(booking.deposit_amount, Some(100_000));
    assert!(booking.amount_paid <= booking.total_price);
    assert_eq!(
        booking.amount_paid,
        deposit_amount(booking.total_price, 20)
    );
}

#[tokio::test]
async fn confirm_payment_is_idempotent() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;
    let (notifier, _mailer) = quiet_sinks();

    let agency = support::create_agency(pool, "agency@confirm.example", "Confirm Travel").await;
    let package =
        support::create_active_package(pool, Some(&agency), "Umrah Plus", 400_000, Some(25)).await;
    let pilgrim = support::create_pilgrim(pool, "confirm@example.com", "Confirm User").await;

    let amount = deposit_amount(package.price, 25);
    seed_intent(pool, "MNSK-cfm-1", &package, &pilgrim, amount, PaymentOption::Deposit).await;

    let created =
        booking::record_verified_payment(pool, "MNSK-cfm-1", Some("card"), &TravelDetails::default())
            .await
            .unwrap();

    let payments = db::list_payments(pool).await.unwrap();
    let payment = payments
        .iter()
        .find(|p| p.booking_id == created.id)
        .expect("audit payment row");
    assert_eq!(payment.status, "pending");

    let outcome = booking::confirm_payment(pool, &notifier, payment.id, created.id)
        .await
        .unwrap();
    assert!(!outcome.already_confirmed);
    assert_eq!(outcome.booking.payment_status, PaymentStatus::Paid);
    assert_eq!(outcome.booking.amount_paid, outcome.booking.total_price);

    // second confirmation changes nothing
    let again = booking::confirm_payment(pool, &notifier, payment.id, created.id)
        .await
        .unwrap();
    assert!(again.already_confirmed);
    assert_eq!(again.booking.amount_paid, outcome.booking.amount_paid);

    let refreshed = db::get_payment(pool, payment.id).await.unwrap().unwrap();
    assert_eq!(refreshed.status, "confirmed");
}

#[tokio::test]
async fn custom_services_booking_is_unpaid_and_pending() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;
    let (notifier, mailer) = quiet_sinks();

    let pilgrim = support::create_pilgrim(pool, "custom@example.com", "Custom User").await;

    let booking = booking::create_unpaid_booking(
        pool,
        &notifier,
        &mailer,
        &pilgrim,
        &UnpaidBookingRequest {
            package_id: None,
            selected_services: serde_json::json!({"accommodation": "5-star", "transport": "vip"}),
            passport_number: Some("AB1234567".to_string()),
            travel_date: None,
            return_date: None,
            pilgrims: vec![],
            group_members: vec![],
        },
    )
    .await
    .expect("unpaid booking");

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
    assert_eq!(booking.total_price, 0);
    assert_eq!(booking.amount_paid, 0);
    assert!(booking.payment_reference.is_none());
    assert_eq!(booking.selected_services["transport"], "vip");
}

#[tokio::test]
async fn status_transitions_follow_the_table() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    let pool = &db.pool;

    let agency = support::create_agency(pool, "agency@status.example", "Status Travel").await;
    let package =
        support::create_active_package(pool, Some(&agency), "Umrah Flex", 250_000, Some(40)).await;
    let pilgrim = support::create_pilgrim(pool, "status@example.com", "Status User").await;

    seed_intent(
        pool,
        "MNSK-st-1",
        &package,
        &pilgrim,
        deposit_amount(package.price, 40),
        PaymentOption::Deposit,
    )
    .await;

    let created =
        booking::record_verified_payment(pool, "MNSK-st-1", None, &TravelDetails::default())
            .await
            .unwrap();
    assert_eq!(created.status, BookingStatus::Pending);

    // pending -> completed skips a state and must be rejected
    let skip = booking::change_booking_status(pool, created.id, BookingStatus::Completed).await;
    assert!(matches!(skip, Err(WorkflowError::InvalidTransition { .. })));

    let confirmed = booking::change_booking_status(pool, created.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let completed = booking::change_booking_status(pool, created.id, BookingStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    // no transition out of completed
    let out = booking::change_booking_status(pool, created.id, BookingStatus::Cancelled).await;
    assert!(matches!(out, Err(WorkflowError::InvalidTransition { .. })));
}
