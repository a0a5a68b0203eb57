use homeroom_types::{Role, User};

use crate::EngineError;

/// Authorization capability injected into each service entry point
pub trait Authorizer: Send + Sync {
    fn has_role(&self, user: &User, role: Role) -> bool;
}

/// Default authorizer: a user holds exactly the role on their account
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn has_role(&self, user: &User, role: Role) -> bool {
        user.role == role
    }
}

/// Gate an operation to one role
pub fn require_role(
    authorizer: &dyn Authorizer,
    user: &User,
    role: Role,
) -> Result<(), EngineError> {
    match authorizer.has_role(user, role) {
        true => Ok(()),
        false => Err(EngineError::Unauthorized),
    }
}
