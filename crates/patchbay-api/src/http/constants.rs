//! Constants shared across the HTTP layer.

/// Session cookie name.
pub const SESSION_COOKIE: &str = "SID";

/// Request-id header propagated through the middleware stack.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Upper bound on buffered form bodies when authenticating by form field.
pub const FORM_BODY_LIMIT: usize = 64 * 1024;

/// Problem type for unexpected internal failures.
pub const PROBLEM_INTERNAL: &str = "https://patchbay.dev/problems/internal";

/// Problem type for missing or invalid credentials.
pub const PROBLEM_UNAUTHORIZED: &str = "https://patchbay.dev/problems/unauthorized";

/// Problem type for malformed or unprocessable requests.
pub const PROBLEM_BAD_REQUEST: &str = "https://patchbay.dev/problems/bad-request";

/// Problem type for missing resources.
pub const PROBLEM_NOT_FOUND: &str = "https://patchbay.dev/problems/not-found";

/// Problem type for uniqueness conflicts.
pub const PROBLEM_CONFLICT: &str = "https://patchbay.dev/problems/conflict";

/// Problem type for dependencies that are temporarily unavailable.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "https://patchbay.dev/problems/service-unavailable";
