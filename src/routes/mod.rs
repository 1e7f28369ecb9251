/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// so access control is applied explicitly at the module level (via Axum
/// layers) instead of per handler.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible without a session: health, login, and the legacy exports
/// (an explicit public-data contract for the external consumer).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated user session; both roles are accepted.
pub mod authenticated;

/// Routes restricted to users with the 'ADMIN' role.
/// The role check happens inside the handlers after authentication.
pub mod admin;
