//! Error templates raised by the HTTP components.

use prism_core::ErrorTemplate;

// Routing
pub const NO_PATH_MATCHED_ERROR: ErrorTemplate = ErrorTemplate::new(
    "NO_PATH_MATCHED_ERROR",
    "Route not resolved, no path matched",
    404,
);
pub const NO_SERVER_MATCHED_ERROR: ErrorTemplate = ErrorTemplate::new(
    "NO_SERVER_MATCHED_ERROR",
    "Route not resolved, no server matched",
    404,
);
pub const NO_BASE_URL_ERROR: ErrorTemplate = ErrorTemplate::new(
    "NO_BASE_URL_ERROR",
    "Route not resolved, no base url found",
    404,
);

// Mocking
pub const UNPROCESSABLE_ENTITY: ErrorTemplate =
    ErrorTemplate::new("UNPROCESSABLE_ENTITY", "Invalid request", 422);
pub const UNAUTHORIZED: ErrorTemplate =
    ErrorTemplate::new("UNAUTHORIZED", "Invalid security scheme used", 401);
pub const FORBIDDEN: ErrorTemplate =
    ErrorTemplate::new("FORBIDDEN", "Invalid credentials used", 403);
pub const NOT_ACCEPTABLE: ErrorTemplate = ErrorTemplate::new(
    "NOT_ACCEPTABLE",
    "The server cannot produce a representation for your accept header",
    406,
);
pub const NOT_FOUND: ErrorTemplate = ErrorTemplate::new(
    "NOT_FOUND",
    "The server cannot find the requested content",
    404,
);
pub const NO_RESPONSE_DEFINED: ErrorTemplate = ErrorTemplate::new(
    "NO_RESPONSE_DEFINED",
    "No response defined for the selected operation",
    500,
);
pub const GENERATION_ERROR: ErrorTemplate = ErrorTemplate::new(
    "GENERATION_ERROR",
    "Unable to generate a payload from the schema",
    500,
);

// Forwarding
pub const FORWARDING_ERROR: ErrorTemplate = ErrorTemplate::new(
    "FORWARDING_ERROR",
    "Unable to forward the request to the upstream server",
    502,
);
