//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (ScheduleId, UserId, etc.)
//! - The [`DayOfWeek`] a weekly slot falls on
//! - Permission types and the resolved [`Actor`] handed to the scheduling core
//!
//! # ID Types
//!
//! All entity IDs are store-assigned `BIGSERIAL` values wrapped in type aliases:
//!
//! - [`ScheduleId`], [`SemesterId`], [`CourseId`], [`SectionId`], [`LabRoomId`]
//! - [`UserId`]: user accounts, also used for instructors and schedule creators
//! - [`NotificationId`]
//!
//! # Permission System
//!
//! Actors carry a [`PermissionSet`] derived from their roles. Checks always name a
//! [`Permission`], never a role, so the role table can change without touching handlers.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};
use utoipa::ToSchema;

// Type aliases for IDs
pub type ScheduleId = i64;
pub type SemesterId = i64;
pub type CourseId = i64;
pub type SectionId = i64;
pub type LabRoomId = i64;
pub type UserId = i64;
pub type NotificationId = i64;

/// Day a weekly slot is held on. Ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "day_of_week")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Zero-based position in the week, Monday = 0
    pub fn index(self) -> i64 {
        match self {
            DayOfWeek::Monday => 0,
            DayOfWeek::Tuesday => 1,
            DayOfWeek::Wednesday => 2,
            DayOfWeek::Thursday => 3,
            DayOfWeek::Friday => 4,
            DayOfWeek::Saturday => 5,
            DayOfWeek::Sunday => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDay(pub String);

impl fmt::Display for UnknownDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a day of the week", self.0)
    }
}

impl std::error::Error for UnknownDay {}

impl FromStr for DayOfWeek {
    type Err = UnknownDay;

    /// Day names are matched case-insensitively ("monday", "Monday", "MONDAY")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownDay(s.to_string()))
    }
}

/// Capabilities an actor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Create, edit and delete schedules and the catalog they reference
    FullSchedulingControl,
    ApprovalOversight,
    ViewSchedules,
    /// Manage user accounts
    SystemManagement,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::FullSchedulingControl => "full_scheduling_control",
            Permission::ApprovalOversight => "approval_oversight",
            Permission::ViewSchedules => "view_schedules",
            Permission::SystemManagement => "system_management",
        };
        f.write_str(name)
    }
}

/// The union of permissions granted by an actor's roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Vec<Permission>)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An authenticated caller as seen by the scheduling core: who they are and what they may do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub permissions: PermissionSet,
}

impl Actor {
    pub fn new(id: UserId, permissions: PermissionSet) -> Self {
        Self { id, permissions }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_parsing_ignores_case() {
        assert_eq!("monday".parse::<DayOfWeek>(), Ok(DayOfWeek::Monday));
        assert_eq!("SUNDAY".parse::<DayOfWeek>(), Ok(DayOfWeek::Sunday));
        assert_eq!(" Friday ".parse::<DayOfWeek>(), Ok(DayOfWeek::Friday));
        assert!("Funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_day_order_and_index_agree() {
        for window in DayOfWeek::ALL.windows(2) {
            assert!(window[0] < window[1]);
            assert_eq!(window[0].index() + 1, window[1].index());
        }
    }

    #[test]
    fn test_permission_set_union() {
        let set: PermissionSet = [Permission::ViewSchedules, Permission::ViewSchedules, Permission::ApprovalOversight]
            .into_iter()
            .collect();
        assert!(set.contains(Permission::ViewSchedules));
        assert!(set.contains(Permission::ApprovalOversight));
        assert!(!set.contains(Permission::FullSchedulingControl));
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_permission_set_schema_is_a_list_of_permissions() {
        let schema = serde_json::to_value(<PermissionSet as utoipa::PartialSchema>::schema()).unwrap();
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["items"]["$ref"], "#/components/schemas/Permission");
    }
}
