/// Authentication utilities for Taskdeck
///
/// Credential verification itself is delegated to the external identity
/// provider (see [`crate::idp`]); this module holds what remains on our
/// side of that boundary.
///
/// # Modules
///
/// - `throttle`: Per-email login-attempt throttling with timed lockout

pub mod throttle;
