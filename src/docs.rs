use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::register_agency,
        crate::api::auth::login,
        crate::api::packages::list_catalog,
        crate::api::bookings::initiate,
        crate::api::bookings::complete
    ),
    components(
        schemas(
            crate::api::auth::RegisterRequest,
            crate::api::auth::RegisterAgencyRequest,
            crate::api::auth::LoginRequest,
            crate::api::auth::AuthResponse,
            crate::api::bookings::InitiatePaymentRequest,
            crate::api::bookings::InitiatePaymentResponse,
            crate::api::bookings::CompletePaymentRequest
        )
    ),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "catalog", description = "Public package catalog"),
        (name = "bookings", description = "Booking and payment workflow")
    )
)]
pub struct ApiDoc;
