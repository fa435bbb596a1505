//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000002_create_users_and_sessions.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_CUSTOMER: &str = "customer";

/// Whether the role may use back-office endpoints.
pub fn is_back_office(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_STAFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_office_roles() {
        assert!(is_back_office(ROLE_ADMIN));
        assert!(is_back_office(ROLE_STAFF));
        assert!(!is_back_office(ROLE_CUSTOMER));
        assert!(!is_back_office("guest"));
    }
}
