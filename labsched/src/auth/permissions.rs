//! Role to permission table and permission guards.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::{Permission, PermissionSet},
};

/// Permissions granted by one role
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::SystemAdministrator => &[
            Permission::FullSchedulingControl,
            Permission::ApprovalOversight,
            Permission::ViewSchedules,
            Permission::SystemManagement,
        ],
        Role::AcademicCoordinator => &[Permission::FullSchedulingControl, Permission::ViewSchedules],
        Role::Dean => &[Permission::ApprovalOversight, Permission::ViewSchedules],
        Role::FacultyStaff | Role::Student => &[Permission::ViewSchedules],
    }
}

/// Union of the permissions of every role held
pub fn permissions_for(roles: &[Role]) -> PermissionSet {
    roles.iter().flat_map(|role| role_permissions(*role).iter().copied()).collect()
}

/// Fails with [`Error::InsufficientPermissions`] unless `user` holds `permission`
pub fn require(user: &CurrentUser, permission: Permission, resource: &str) -> Result<()> {
    if user.permissions.contains(permission) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Some(permission),
            resource: resource.to_string(),
        })
    }
}

/// Type-level names for permissions, for use with [`RequiresPermission`].
pub mod permission {
    use crate::types::Permission;

    pub trait PermissionMarker: Send + Sync + 'static {
        const PERMISSION: Permission;
    }

    pub struct FullSchedulingControl;
    pub struct SystemManagement;

    impl PermissionMarker for FullSchedulingControl {
        const PERMISSION: Permission = Permission::FullSchedulingControl;
    }

    impl PermissionMarker for SystemManagement {
        const PERMISSION: Permission = Permission::SystemManagement;
    }
}

/// Extractor that resolves the current user and rejects them with 403 unless they hold `P`.
pub struct RequiresPermission<P: permission::PermissionMarker> {
    pub user: CurrentUser,
    _permission: PhantomData<P>,
}

impl<P: permission::PermissionMarker> FromRequestParts<AppState> for RequiresPermission<P> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require(&user, P::PERMISSION, parts.uri.path())?;
        Ok(Self {
            user,
            _permission: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Role::SystemAdministrator, Permission::SystemManagement, true)]
    #[case(Role::SystemAdministrator, Permission::FullSchedulingControl, true)]
    #[case(Role::AcademicCoordinator, Permission::FullSchedulingControl, true)]
    #[case(Role::AcademicCoordinator, Permission::SystemManagement, false)]
    #[case(Role::Dean, Permission::ApprovalOversight, true)]
    #[case(Role::Dean, Permission::FullSchedulingControl, false)]
    #[case(Role::FacultyStaff, Permission::ViewSchedules, true)]
    #[case(Role::FacultyStaff, Permission::FullSchedulingControl, false)]
    #[case(Role::Student, Permission::ViewSchedules, true)]
    #[case(Role::Student, Permission::ApprovalOversight, false)]
    fn test_role_table(#[case] role: Role, #[case] permission: Permission, #[case] granted: bool) {
        assert_eq!(role_permissions(role).contains(&permission), granted);
    }

    #[test]
    fn test_permissions_are_the_union_of_roles() {
        let set = permissions_for(&[Role::Dean, Role::AcademicCoordinator]);
        assert!(set.contains(Permission::FullSchedulingControl));
        assert!(set.contains(Permission::ApprovalOversight));
        assert!(!set.contains(Permission::SystemManagement));

        assert!(permissions_for(&[]).is_empty());
    }
}
