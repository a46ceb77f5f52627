/// Router Module Index
///
/// Routes are split by access requirement so the bearer check is applied once, at the
/// module boundary, instead of per handler.

/// Routes reachable anonymously: health probe and the access gate's register/login.
pub mod public;

/// Resource routes guarded by the bearer-token `route_layer`.
pub mod authenticated;
