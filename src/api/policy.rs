//! Endpoint policy for credential attachment.

/// Endpoints that must never carry a credential: authentication entry
/// points and the health probe.
const PUBLIC_PATHS: &[&str] = &["/auth/login", "/auth/register", "/health"];

/// True when `path` is a public endpoint.
///
/// Matching tolerates a mount prefix (`/api/v1/auth/login`) and a query
/// string, but not lookalike segments (`/auth/login-history` stays
/// protected).
pub fn is_public_path(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    PUBLIC_PATHS
        .iter()
        .any(|public| path == *public || path.ends_with(public))
}
