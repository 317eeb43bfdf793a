use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::responses::*;

/// OpenAPI specification for the JSON endpoints
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Market Cap Server",
        version = "0.1.0",
        description = "Static pages plus a periodically refreshed stock market cap file"
    ),
    paths(
        handlers::health_check,
        handlers::get_market_cap_status,
        handlers::get_stocks_json,
    ),
    components(
        schemas(
            MarketCapStatusResponse,
            HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Status", description = "Refresh job status"),
        (name = "Data", description = "Stock data"),
    )
)]
pub struct ApiDoc;
