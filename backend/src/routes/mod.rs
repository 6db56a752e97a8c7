/// Router Module Index
///
/// Routes are split by access level, and the authentication layer is applied to a whole
/// group in `create_router`, so a protected handler can't be exposed by accident.

/// Routes open to anonymous clients: health, login/logout, session probe, front-page reads.
pub mod public;

/// Back-office CRUD routes. Every request must carry a live session cookie.
pub mod authenticated;
