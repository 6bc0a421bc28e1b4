/// Router Module Index
///
/// Splits the portal's routes by how the access guard treats them.

/// Unguarded service endpoints (health checks).
pub mod public;

/// JSON API consumed by the front end. Outside the page guard; handlers read
/// the session themselves where it matters.
pub mod api;

/// Page routes. Every request passes the access guard before reaching them.
pub mod pages;
