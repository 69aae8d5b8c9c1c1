// src/db.rs
//
// Storage gateway: every read/write against Postgres lives here. Queries are
// runtime-checked, rows are mapped by hand. Filtering and sorting happen
// query-side, not over fetched lists.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::models::{
    Booking, BookingStatus, GroupMember, ItineraryDay, Package, PackageStatus, Payment,
    PaymentIntent, PaymentOption, PaymentStatus, Pilgrim, Role, UserAccount,
};

// ---------------------------------------------------------------------------
// users / agencies

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub full_name: Option<&'a str>,
    pub agency_name: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub city_of_operation: Option<&'a str>,
    pub country_of_operation: Option<&'a str>,
    pub address: Option<&'a str>,
    pub description: Option<&'a str>,
}

pub async fn insert_user(pool: &PgPool, user: &NewUser<'_>) -> Result<i32, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO users
               (email, password_hash, role, full_name, agency_name, phone_number,
                city_of_operation, country_of_operation, address, description)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
           RETURNING id"#,
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role.as_str())
    .bind(user.full_name)
    .bind(user.agency_name)
    .bind(user.phone_number)
    .bind(user.city_of_operation)
    .bind(user.country_of_operation)
    .bind(user.address)
    .bind(user.description)
    .fetch_one(pool)
    .await?;

    Ok(row.get("id"))
}

pub async fn get_user_credentials(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(i32, String, Role)>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT id, password_hash, role FROM users WHERE email = $1"#)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| {
        let role: String = r.get("role");
        (
            r.get("id"),
            r.get("password_hash"),
            Role::parse(&role).unwrap_or(Role::Pilgrim),
        )
    }))
}

fn user_from_row(r: &PgRow) -> UserAccount {
    let role: String = r.get("role");
    UserAccount {
        id: r.get("id"),
        email: r.get("email"),
        role: Role::parse(&role).unwrap_or(Role::Pilgrim),
        full_name: r.get("full_name"),
        agency_name: r.get("agency_name"),
        phone_number: r.get("phone_number"),
        city_of_operation: r.get("city_of_operation"),
        country_of_operation: r.get("country_of_operation"),
        address: r.get("address"),
        description: r.get("description"),
        verified: r.get("verified"),
        created_at: r.get("created_at"),
    }
}

const USER_COLUMNS: &str = "id, email, role, full_name, agency_name, phone_number, \
     city_of_operation, country_of_operation, address, description, verified, created_at";

pub async fn get_user(pool: &PgPool, id: i32) -> Result<Option<UserAccount>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| user_from_row(&r)))
}

pub async fn list_agencies(pool: &PgPool) -> Result<Vec<UserAccount>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = 'agency' ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

/// Flips the admin-controlled `verified` bit. Returns false when the id does
/// not resolve to an agency account.
pub async fn set_agency_verified(
    pool: &PgPool,
    agency_id: i32,
    verified: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE users SET verified = $1 WHERE id = $2 AND role = 'agency'"#,
    )
    .bind(verified)
    .bind(agency_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub struct CascadeOutcome {
    pub agency_name: String,
    pub packages_archived: u64,
    pub bookings_cancelled: u64,
}

/// Terminal agency deletion. Archives the agency's packages, cancels its
/// not-yet-terminal bookings and removes the user row in a single
/// transaction, so a crash can never leave the cascade half-applied.
pub async fn delete_agency_cascade(
    pool: &PgPool,
    agency_id: i32,
) -> Result<Option<CascadeOutcome>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(r#"SELECT agency_name FROM users WHERE id = $1 AND role = 'agency'"#)
        .bind(agency_id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let agency_name: Option<String> = row.get("agency_name");

    let packages_archived = sqlx::query(
        r#"UPDATE packages
           SET status = 'archived', updated_at = NOW()
           WHERE agency_id = $1 AND status <> 'archived'"#,
    )
    .bind(agency_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let bookings_cancelled = sqlx::query(
        r#"UPDATE bookings
           SET status = 'cancelled', updated_at = NOW()
           WHERE agency_id = $1 AND status NOT IN ('completed', 'cancelled')"#,
    )
    .bind(agency_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
        .bind(agency_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Some(CascadeOutcome {
        agency_name: agency_name.unwrap_or_default(),
        packages_archived,
        bookings_cancelled,
    }))
}

// ---------------------------------------------------------------------------
// packages

const PACKAGE_COLUMNS: &str = "id, title, description, price, duration_days, group_size, \
     agency_id, agency_name, status, inclusions, exclusions, itinerary, \
     min_payment_percent, image_url, created_at, updated_at";

fn package_from_row(r: &PgRow) -> Package {
    let status: String = r.get("status");
    Package {
        id: r.get("id"),
        title: r.get("title"),
        description: r.get("description"),
        price: r.get("price"),
        duration_days: r.get("duration_days"),
        group_size: r.get("group_size"),
        agency_id: r.get("agency_id"),
        agency_name: r.get("agency_name"),
        status: PackageStatus::parse(&status).unwrap_or(PackageStatus::Draft),
        inclusions: r.get("inclusions"),
        exclusions: r.get("exclusions"),
        itinerary: r.get::<Json<Vec<ItineraryDay>>, _>("itinerary").0,
        min_payment_percent: r.get("min_payment_percent"),
        image_url: r.get("image_url"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

pub struct NewPackage<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub price: i64,
    pub duration_days: i32,
    pub group_size: i32,
    pub agency_id: Option<i32>,
    pub agency_name: &'a str,
    pub inclusions: &'a [String],
    pub exclusions: &'a [String],
    pub itinerary: &'a [ItineraryDay],
    pub min_payment_percent: Option<i32>,
    pub image_url: Option<&'a str>,
}

pub async fn insert_package(pool: &PgPool, pkg: &NewPackage<'_>) -> Result<Package, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"INSERT INTO packages
               (title, description, price, duration_days, group_size, agency_id,
                agency_name, status, inclusions, exclusions, itinerary,
                min_payment_percent, image_url)
           VALUES ($1, $2, $3, $4, $5, $6, $7, 'draft', $8, $9, $10, $11, $12)
           RETURNING {PACKAGE_COLUMNS}"#
    ))
    .bind(pkg.title)
    .bind(pkg.description)
    .bind(pkg.price)
    .bind(pkg.duration_days)
    .bind(pkg.group_size)
    .bind(pkg.agency_id)
    .bind(pkg.agency_name)
    .bind(pkg.inclusions)
    .bind(pkg.exclusions)
    .bind(Json(pkg.itinerary))
    .bind(pkg.min_payment_percent)
    .bind(pkg.image_url)
    .fetch_one(pool)
    .await?;

    Ok(package_from_row(&row))
}

pub async fn get_package(pool: &PgPool, id: i32) -> Result<Option<Package>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| package_from_row(&r)))
}

#[derive(Default)]
pub struct PackagePatch<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<i64>,
    pub duration_days: Option<i32>,
    pub group_size: Option<i32>,
    pub inclusions: Option<&'a [String]>,
    pub exclusions: Option<&'a [String]>,
    pub itinerary: Option<&'a [ItineraryDay]>,
    pub min_payment_percent: Option<i32>,
    pub image_url: Option<&'a str>,
}

pub async fn update_package(
    pool: &PgPool,
    id: i32,
    patch: &PackagePatch<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE packages SET
               title = COALESCE($2, title),
               description = COALESCE($3, description),
               price = COALESCE($4, price),
               duration_days = COALESCE($5, duration_days),
               group_size = COALESCE($6, group_size),
               inclusions = COALESCE($7, inclusions),
               exclusions = COALESCE($8, exclusions),
               itinerary = COALESCE($9, itinerary),
               min_payment_percent = COALESCE($10, min_payment_percent),
               image_url = COALESCE($11, image_url),
               updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(id)
    .bind(patch.title)
    .bind(patch.description)
    .bind(patch.price)
    .bind(patch.duration_days)
    .bind(patch.group_size)
    .bind(patch.inclusions)
    .bind(patch.exclusions)
    .bind(patch.itinerary.map(Json))
    .bind(patch.min_payment_percent)
    .bind(patch.image_url)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_package(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM packages WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_package_status(
    pool: &PgPool,
    id: i32,
    status: PackageStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE packages SET status = $1, updated_at = NOW() WHERE id = $2"#,
    )
    .bind(status.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Default)]
pub struct PackageFilter<'a> {
    pub status: Option<PackageStatus>,
    pub agency_id: Option<i32>,
    /// Restrict to platform-owned packages (agency_id IS NULL).
    pub platform_only: bool,
    pub search: Option<&'a str>,
}

pub async fn list_packages(
    pool: &PgPool,
    filter: &PackageFilter<'_>,
) -> Result<Vec<Package>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE 1 = 1"));

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(agency_id) = filter.agency_id {
        qb.push(" AND agency_id = ").push_bind(agency_id);
    }
    if filter.platform_only {
        qb.push(" AND agency_id IS NULL");
    }
    if let Some(search) = filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build().fetch_all(pool).await?;
    Ok(rows.iter().map(package_from_row).collect())
}

// ---------------------------------------------------------------------------
// bookings

const BOOKING_COLUMNS: &str = "id, package_id, package_title, agency_id, agency_name, user_id, \
     user_email, user_name, passport_number, total_price, amount_paid, deposit_amount, \
     is_deposit, status, payment_status, payment_reference, travel_date, return_date, \
     pilgrims, group_members, selected_services, created_at, updated_at";

fn booking_from_row(r: &PgRow) -> Booking {
    let status: String = r.get("status");
    let payment_status: String = r.get("payment_status");
    Booking {
        id: r.get("id"),
        package_id: r.get("package_id"),
        package_title: r.get("package_title"),
        agency_id: r.get("agency_id"),
        agency_name: r.get("agency_name"),
        user_id: r.get("user_id"),
        user_email: r.get("user_email"),
        user_name: r.get("user_name"),
        passport_number: r.get("passport_number"),
        total_price: r.get("total_price"),
        amount_paid: r.get("amount_paid"),
        deposit_amount: r.get("deposit_amount"),
        is_deposit: r.get("is_deposit"),
        status: BookingStatus::parse(&status).unwrap_or(BookingStatus::Pending),
        payment_status: PaymentStatus::parse(&payment_status).unwrap_or(PaymentStatus::Unpaid),
        payment_reference: r.get("payment_reference"),
        travel_date: r.get("travel_date"),
        return_date: r.get("return_date"),
        pilgrims: r.get::<Json<Vec<Pilgrim>>, _>("pilgrims").0,
        group_members: r.get::<Json<Vec<GroupMember>>, _>("group_members").0,
        selected_services: r.get("selected_services"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

pub struct NewBooking<'a> {
    pub package_id: Option<i32>,
    pub package_title: &'a str,
    pub agency_id: Option<i32>,
    pub agency_name: &'a str,
    pub user_id: i32,
    pub user_email: &'a str,
    pub user_name: &'a str,
    pub passport_number: Option<&'a str>,
    pub total_price: i64,
    pub amount_paid: i64,
    pub deposit_amount: Option<i64>,
    pub is_deposit: bool,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<&'a str>,
    pub travel_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub pilgrims: &'a [Pilgrim],
    pub group_members: &'a [GroupMember],
    pub selected_services: serde_json::Value,
}

pub async fn insert_booking<'e, E>(executor: E, b: &NewBooking<'_>) -> Result<Booking, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(&format!(
        r#"INSERT INTO bookings
               (package_id, package_title, agency_id, agency_name, user_id, user_email,
                user_name, passport_number, total_price, amount_paid, deposit_amount,
                is_deposit, status, payment_status, payment_reference, travel_date,
                return_date, pilgrims, group_members, selected_services)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                   $16, $17, $18, $19, $20)
           RETURNING {BOOKING_COLUMNS}"#
    ))
    .bind(b.package_id)
    .bind(b.package_title)
    .bind(b.agency_id)
    .bind(b.agency_name)
    .bind(b.user_id)
    .bind(b.user_email)
    .bind(b.user_name)
    .bind(b.passport_number)
    .bind(b.total_price)
    .bind(b.amount_paid)
    .bind(b.deposit_amount)
    .bind(b.is_deposit)
    .bind(b.status.as_str())
    .bind(b.payment_status.as_str())
    .bind(b.payment_reference)
    .bind(b.travel_date)
    .bind(b.return_date)
    .bind(Json(b.pilgrims))
    .bind(Json(b.group_members))
    .bind(&b.selected_services)
    .fetch_one(executor)
    .await?;

    Ok(booking_from_row(&row))
}

pub async fn get_booking(pool: &PgPool, id: i32) -> Result<Option<Booking>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| booking_from_row(&r)))
}

pub async fn get_booking_by_reference(
    pool: &PgPool,
    reference: &str,
) -> Result<Option<Booking>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE payment_reference = $1"
    ))
    .bind(reference)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| booking_from_row(&r)))
}

pub enum BookingScope {
    All,
    ForAgency(i32),
    ForUser(i32),
}

pub async fn list_bookings(
    pool: &PgPool,
    scope: &BookingScope,
) -> Result<Vec<Booking>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE 1 = 1"));

    match scope {
        BookingScope::All => {}
        BookingScope::ForAgency(agency_id) => {
            qb.push(" AND agency_id = ").push_bind(*agency_id);
        }
        BookingScope::ForUser(user_id) => {
            qb.push(" AND user_id = ").push_bind(*user_id);
        }
    }
    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build().fetch_all(pool).await?;
    Ok(rows.iter().map(booking_from_row).collect())
}

/// Conditional status write: only succeeds while the row is still in
/// `from`, so two admins racing on the same booking cannot both win.
pub async fn update_booking_status(
    pool: &PgPool,
    id: i32,
    from: BookingStatus,
    to: BookingStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE bookings
           SET status = $1, updated_at = NOW()
           WHERE id = $2 AND status = $3"#,
    )
    .bind(to.as_str())
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_booking(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM bookings WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// payments

fn payment_from_row(r: &PgRow) -> Payment {
    Payment {
        id: r.get("id"),
        reference: r.get("reference"),
        booking_id: r.get("booking_id"),
        amount: r.get("amount"),
        status: r.get("status"),
        method: r.get("method"),
        pilgrim_name: r.get("pilgrim_name"),
        pilgrim_email: r.get("pilgrim_email"),
        paid_at: r.get("paid_at"),
        created_at: r.get("created_at"),
    }
}

const PAYMENT_COLUMNS: &str = "id, reference, booking_id, amount, status, method, \
     pilgrim_name, pilgrim_email, paid_at, created_at";

pub struct NewPayment<'a> {
    pub reference: &'a str,
    pub booking_id: i32,
    pub amount: i64,
    pub method: Option<&'a str>,
    pub pilgrim_name: &'a str,
    pub pilgrim_email: &'a str,
}

pub async fn insert_payment<'e, E>(executor: E, p: &NewPayment<'_>) -> Result<i32, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(
        r#"INSERT INTO payments
               (reference, booking_id, amount, status, method, pilgrim_name, pilgrim_email)
           VALUES ($1, $2, $3, 'pending', $4, $5, $6)
           RETURNING id"#,
    )
    .bind(p.reference)
    .bind(p.booking_id)
    .bind(p.amount)
    .bind(p.method)
    .bind(p.pilgrim_name)
    .bind(p.pilgrim_email)
    .fetch_one(executor)
    .await?;

    Ok(row.get("id"))
}

pub async fn get_payment(pool: &PgPool, id: i32) -> Result<Option<Payment>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| payment_from_row(&r)))
}

pub async fn list_payments(pool: &PgPool) -> Result<Vec<Payment>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(payment_from_row).collect())
}

/// One-way `pending -> confirmed`. Returns false when the payment was
/// already confirmed, which makes re-confirmation a no-op.
pub async fn confirm_payment_record<'e, E>(executor: E, id: i32) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"UPDATE payments
           SET status = 'confirmed', paid_at = NOW()
           WHERE id = $1 AND status = 'pending'"#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn settle_booking_paid<'e, E>(executor: E, booking_id: i32) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"UPDATE bookings
           SET payment_status = 'paid', amount_paid = total_price, updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(booking_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// payment intents

fn intent_from_row(r: &PgRow) -> PaymentIntent {
    let option: String = r.get("payment_option");
    PaymentIntent {
        id: r.get("id"),
        reference: r.get("reference"),
        package_id: r.get("package_id"),
        user_id: r.get("user_id"),
        email: r.get("email"),
        amount: r.get("amount"),
        total_price: r.get("total_price"),
        payment_option: PaymentOption::parse(&option).unwrap_or(PaymentOption::Full),
        status: r.get("status"),
        created_at: r.get("created_at"),
    }
}

pub struct NewIntent<'a> {
    pub reference: &'a str,
    pub package_id: i32,
    pub user_id: i32,
    pub email: &'a str,
    /// Amount to capture, frozen at initiation.
    pub amount: i64,
    /// Package price at initiation; the booking is priced from this.
    pub total_price: i64,
    pub payment_option: PaymentOption,
}

pub async fn insert_intent(pool: &PgPool, intent: &NewIntent<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO payment_intents
               (reference, package_id, user_id, email, amount, total_price,
                payment_option, status)
           VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')"#,
    )
    .bind(intent.reference)
    .bind(intent.package_id)
    .bind(intent.user_id)
    .bind(intent.email)
    .bind(intent.amount)
    .bind(intent.total_price)
    .bind(intent.payment_option.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_intent(
    pool: &PgPool,
    reference: &str,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, reference, package_id, user_id, email, amount, total_price,
                  payment_option, status, created_at
           FROM payment_intents
           WHERE reference = $1"#,
    )
    .bind(reference)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| intent_from_row(&r)))
}

/// Conditional intent transition. Rows affected == 0 means the intent was
/// not in `from` anymore; callers use that as the idempotency signal.
pub async fn mark_intent<'e, E>(
    executor: E,
    reference: &str,
    from: &str,
    to: &str,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"UPDATE payment_intents SET status = $1 WHERE reference = $2 AND status = $3"#,
    )
    .bind(to)
    .bind(reference)
    .bind(from)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// dashboard aggregation (read-only)

#[derive(Debug, serde::Serialize)]
pub struct MonthlyCount {
    pub month: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct MonthlyAmount {
    pub month: DateTime<Utc>,
    pub total: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

pub async fn monthly_booking_counts(pool: &PgPool) -> Result<Vec<MonthlyCount>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT date_trunc('month', created_at) AS month, COUNT(*) AS count
           FROM bookings
           GROUP BY 1
           ORDER BY 1"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| MonthlyCount {
            month: r.get("month"),
            count: r.get("count"),
        })
        .collect())
}

pub async fn booking_status_counts(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT status, COUNT(*) AS count FROM bookings GROUP BY status ORDER BY status"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| StatusCount {
            status: r.get("status"),
            count: r.get("count"),
        })
        .collect())
}

pub async fn monthly_confirmed_revenue(pool: &PgPool) -> Result<Vec<MonthlyAmount>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT date_trunc('month', paid_at) AS month, COALESCE(SUM(amount), 0)::bigint AS total
           FROM payments
           WHERE status = 'confirmed' AND paid_at IS NOT NULL
           GROUP BY 1
           ORDER BY 1"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| MonthlyAmount {
            month: r.get("month"),
            total: r.get("total"),
        })
        .collect())
}

pub struct Totals {
    pub packages: i64,
    pub active_packages: i64,
    pub agencies: i64,
    pub bookings: i64,
}

pub async fn collection_totals(pool: &PgPool) -> Result<Totals, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT
               (SELECT COUNT(*) FROM packages) AS packages,
               (SELECT COUNT(*) FROM packages WHERE status = 'active') AS active_packages,
               (SELECT COUNT(*) FROM users WHERE role = 'agency') AS agencies,
               (SELECT COUNT(*) FROM bookings) AS bookings"#,
    )
    .fetch_one(pool)
    .await?;

    Ok(Totals {
        packages: row.get("packages"),
        active_packages: row.get("active_packages"),
        agencies: row.get("agencies"),
        bookings: row.get("bookings"),
    })
}
