#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Customer,
}

impl UserRole {
    pub fn from_claim(role: Option<&str>) -> Self {
        match role {
            Some("admin") => UserRole::Admin,
            _ => UserRole::Customer,
        }
    }
}
