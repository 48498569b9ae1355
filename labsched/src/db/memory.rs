//! In-memory backend.
//!
//! All tables live behind one async mutex. A unit of work takes the lock, works on a staged copy
//! of the tables, and swaps the copy in on commit; dropping the store discards the copy. Units of
//! work are therefore fully serialized, which also makes partition locks unnecessary here.
//!
//! The referential rules of the PostgreSQL schema are emulated (unique codes, names and emails,
//! restricted deletes of referenced rows, cascading user deletes) with the same constraint names.
//! The schedule overlap exclusion constraints are not: with every unit of work serialized, the
//! service's conflict check is the only guard this backend needs. Data is lost on restart; this
//! backend is meant for tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::errors::{DbError, Result};
use crate::db::handlers::{
    CourseFilter, CourseRepository, LabRoomFilter, LabRoomRepository, NotificationCounts, NotificationFilter, NotificationRepository,
    Repository, ScheduleFilter, ScheduleRepository, SectionFilter, SectionRepository, SemesterFilter, SemesterRepository, UserFilter,
    UserRepository,
};
use crate::db::models::{
    courses::{CourseCreateDBRequest, CourseDBResponse, CourseUpdateDBRequest},
    lab_rooms::{LabRoomCreateDBRequest, LabRoomDBResponse, LabRoomUpdateDBRequest},
    notifications::{NotificationCreateDBRequest, NotificationDBResponse, NotificationUpdateDBRequest},
    schedules::{ScheduleCreateDBRequest, ScheduleDBResponse, ScheduleUpdateDBRequest},
    sections::{SectionCreateDBRequest, SectionDBResponse, SectionUpdateDBRequest},
    semesters::{SemesterCreateDBRequest, SemesterDBResponse, SemesterUpdateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::db::{Database, Store};
use crate::types::{CourseId, DayOfWeek, LabRoomId, NotificationId, ScheduleId, SectionId, SemesterId, UserId};

#[derive(Debug, Clone)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Table<UserDBResponse>,
    semesters: Table<SemesterDBResponse>,
    courses: Table<CourseDBResponse>,
    sections: Table<SectionDBResponse>,
    lab_rooms: Table<LabRoomDBResponse>,
    schedules: Table<ScheduleDBResponse>,
    notifications: Table<NotificationDBResponse>,
}

fn unique_violation(table: &str, constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

fn foreign_key_violation(table: &str, constraint: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("violates foreign key constraint \"{constraint}\""),
    }
}

impl Tables {
    fn check_schedule_references(&self, schedule: &ScheduleDBResponse) -> Result<()> {
        if !self.semesters.contains(schedule.semester_id) {
            return Err(foreign_key_violation("schedules", "schedules_semester_id_fkey"));
        }
        if !self.courses.contains(schedule.course_id) {
            return Err(foreign_key_violation("schedules", "schedules_course_id_fkey"));
        }
        if !self.sections.contains(schedule.section_id) {
            return Err(foreign_key_violation("schedules", "schedules_section_id_fkey"));
        }
        if !self.lab_rooms.contains(schedule.lab_room_id) {
            return Err(foreign_key_violation("schedules", "schedules_lab_room_id_fkey"));
        }
        if !self.users.contains(schedule.instructor_id) {
            return Err(foreign_key_violation("schedules", "schedules_instructor_id_fkey"));
        }
        if !self.users.contains(schedule.created_by) {
            return Err(foreign_key_violation("schedules", "schedules_created_by_fkey"));
        }
        Ok(())
    }

    /// Fails when any schedule still points at the row being deleted
    fn restrict_delete(&self, referenced_by: impl Fn(&ScheduleDBResponse) -> bool, constraint: &str) -> Result<()> {
        if self.schedules.rows.values().any(referenced_by) {
            return Err(foreign_key_violation("schedules", constraint));
        }
        Ok(())
    }
}

/// Shared-state [`Database`] kept entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn Store>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryStore { guard, staged }))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// A unit of work over a staged copy of the tables
pub struct MemoryStore {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl Store for MemoryStore {
    fn schedules(&mut self) -> Box<dyn ScheduleRepository + '_> {
        Box::new(MemSchedules { tables: &mut self.staged })
    }

    fn semesters(&mut self) -> Box<dyn SemesterRepository + '_> {
        Box::new(MemSemesters { tables: &mut self.staged })
    }

    fn courses(&mut self) -> Box<dyn CourseRepository + '_> {
        Box::new(MemCourses { tables: &mut self.staged })
    }

    fn sections(&mut self) -> Box<dyn SectionRepository + '_> {
        Box::new(MemSections { tables: &mut self.staged })
    }

    fn lab_rooms(&mut self) -> Box<dyn LabRoomRepository + '_> {
        Box::new(MemLabRooms { tables: &mut self.staged })
    }

    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(MemUsers { tables: &mut self.staged })
    }

    fn notifications(&mut self) -> Box<dyn NotificationRepository + '_> {
        Box::new(MemNotifications { tables: &mut self.staged })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryStore { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

struct MemSchedules<'a> {
    tables: &'a mut Tables,
}

#[async_trait]
impl Repository for MemSchedules<'_> {
    type CreateRequest = ScheduleCreateDBRequest;
    type UpdateRequest = ScheduleUpdateDBRequest;
    type Response = ScheduleDBResponse;
    type Id = ScheduleId;
    type Filter = ScheduleFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let schedule = ScheduleDBResponse {
            id: 0,
            semester_id: request.semester_id,
            course_id: request.course_id,
            section_id: request.section_id,
            lab_room_id: request.lab_room_id,
            instructor_id: request.instructor_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            is_lab: request.is_lab,
            created_by: request.created_by,
            created_at: now,
            updated_at: now,
        };
        self.tables.check_schedule_references(&schedule)?;

        let id = self.tables.schedules.next_id();
        let schedule = ScheduleDBResponse { id, ..schedule };
        self.tables.schedules.rows.insert(id, schedule.clone());
        Ok(schedule)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.schedules.get(id))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut schedules: Vec<_> = self.tables.schedules.rows.values().filter(|s| filter.matches(s)).cloned().collect();
        schedules.sort_by_key(|s| (s.day_of_week, s.start_time, s.id));
        Ok(schedules)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.tables.schedules.rows.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let current = self.tables.schedules.get(id).ok_or(DbError::NotFound)?;
        let updated = ScheduleDBResponse {
            updated_at: Utc::now(),
            ..current.with_update(request)
        };
        self.tables.check_schedule_references(&updated)?;
        self.tables.schedules.rows.insert(id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl ScheduleRepository for MemSchedules<'_> {
    async fn lock_partition(&mut self, _semester_id: SemesterId, _day_of_week: DayOfWeek) -> Result<()> {
        // The unit of work already holds the store-wide lock
        Ok(())
    }

    async fn get_for_update(&mut self, id: ScheduleId) -> Result<Option<ScheduleDBResponse>> {
        Ok(self.tables.schedules.get(id))
    }
}

struct MemSemesters<'a> {
    tables: &'a mut Tables,
}

#[async_trait]
impl Repository for MemSemesters<'_> {
    type CreateRequest = SemesterCreateDBRequest;
    type UpdateRequest = SemesterUpdateDBRequest;
    type Response = SemesterDBResponse;
    type Id = SemesterId;
    type Filter = SemesterFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if request.start_date >= request.end_date {
            return Err(DbError::CheckViolation {
                constraint: Some("semesters_date_range".to_string()),
                table: Some("semesters".to_string()),
                message: "new row violates check constraint \"semesters_date_range\"".to_string(),
            });
        }
        let now = Utc::now();
        let id = self.tables.semesters.next_id();
        let semester = SemesterDBResponse {
            id,
            name: request.name.clone(),
            school_year: request.school_year.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        self.tables.semesters.rows.insert(id, semester.clone());
        Ok(semester)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.semesters.get(id))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut semesters: Vec<_> = self.tables.semesters.rows.values().filter(|s| filter.matches(s)).cloned().collect();
        semesters.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(semesters)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        self.tables.restrict_delete(|s| s.semester_id == id, "schedules_semester_id_fkey")?;
        Ok(self.tables.semesters.rows.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let semester = self.tables.semesters.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            semester.name = name.clone();
        }
        if let Some(school_year) = &request.school_year {
            semester.school_year = school_year.clone();
        }
        if let Some(is_active) = request.is_active {
            semester.is_active = is_active;
        }
        semester.updated_at = Utc::now();
        Ok(semester.clone())
    }
}

impl SemesterRepository for MemSemesters<'_> {}

struct MemCourses<'a> {
    tables: &'a mut Tables,
}

#[async_trait]
impl Repository for MemCourses<'_> {
    type CreateRequest = CourseCreateDBRequest;
    type UpdateRequest = CourseUpdateDBRequest;
    type Response = CourseDBResponse;
    type Id = CourseId;
    type Filter = CourseFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if self.tables.courses.rows.values().any(|c| c.code == request.code) {
            return Err(unique_violation("courses", "courses_code_key"));
        }
        let id = self.tables.courses.next_id();
        let course = CourseDBResponse {
            id,
            code: request.code.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            units: request.units,
        };
        self.tables.courses.rows.insert(id, course.clone());
        Ok(course)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.courses.get(id))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut courses: Vec<_> = self.tables.courses.rows.values().filter(|c| filter.matches(c)).cloned().collect();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(courses)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        self.tables.restrict_delete(|s| s.course_id == id, "schedules_course_id_fkey")?;
        Ok(self.tables.courses.rows.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let course = self.tables.courses.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            course.name = name.clone();
        }
        if let Some(description) = &request.description {
            course.description = description.clone();
        }
        if let Some(units) = request.units {
            course.units = units;
        }
        Ok(course.clone())
    }
}

impl CourseRepository for MemCourses<'_> {}

struct MemSections<'a> {
    tables: &'a mut Tables,
}

#[async_trait]
impl Repository for MemSections<'_> {
    type CreateRequest = SectionCreateDBRequest;
    type UpdateRequest = SectionUpdateDBRequest;
    type Response = SectionDBResponse;
    type Id = SectionId;
    type Filter = SectionFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = self.tables.sections.next_id();
        let section = SectionDBResponse {
            id,
            name: request.name.clone(),
            program: request.program.clone(),
            year_level: request.year_level,
        };
        self.tables.sections.rows.insert(id, section.clone());
        Ok(section)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.sections.get(id))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut sections: Vec<_> = self.tables.sections.rows.values().filter(|s| filter.matches(s)).cloned().collect();
        sections.sort_by(|a, b| {
            (a.program.as_str(), a.year_level, a.name.as_str(), a.id).cmp(&(b.program.as_str(), b.year_level, b.name.as_str(), b.id))
        });
        Ok(sections)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        self.tables.restrict_delete(|s| s.section_id == id, "schedules_section_id_fkey")?;
        Ok(self.tables.sections.rows.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let section = self.tables.sections.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            section.name = name.clone();
        }
        if let Some(program) = &request.program {
            section.program = program.clone();
        }
        if let Some(year_level) = request.year_level {
            section.year_level = year_level;
        }
        Ok(section.clone())
    }
}

impl SectionRepository for MemSections<'_> {}

struct MemLabRooms<'a> {
    tables: &'a mut Tables,
}

#[async_trait]
impl Repository for MemLabRooms<'_> {
    type CreateRequest = LabRoomCreateDBRequest;
    type UpdateRequest = LabRoomUpdateDBRequest;
    type Response = LabRoomDBResponse;
    type Id = LabRoomId;
    type Filter = LabRoomFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if self.tables.lab_rooms.rows.values().any(|r| r.name == request.name) {
            return Err(unique_violation("lab_rooms", "lab_rooms_name_key"));
        }
        let id = self.tables.lab_rooms.next_id();
        let room = LabRoomDBResponse {
            id,
            name: request.name.clone(),
            capacity: request.capacity,
            description: request.description.clone(),
            is_active: request.is_active,
        };
        self.tables.lab_rooms.rows.insert(id, room.clone());
        Ok(room)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.lab_rooms.get(id))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut rooms: Vec<_> = self.tables.lab_rooms.rows.values().filter(|r| filter.matches(r)).cloned().collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        self.tables.restrict_delete(|s| s.lab_room_id == id, "schedules_lab_room_id_fkey")?;
        Ok(self.tables.lab_rooms.rows.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let room = self.tables.lab_rooms.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(capacity) = request.capacity {
            room.capacity = capacity;
        }
        if let Some(description) = &request.description {
            room.description = description.clone();
        }
        if let Some(is_active) = request.is_active {
            room.is_active = is_active;
        }
        Ok(room.clone())
    }
}

impl LabRoomRepository for MemLabRooms<'_> {}

struct MemUsers<'a> {
    tables: &'a mut Tables,
}

fn normalized_roles(roles: &[crate::api::models::users::Role]) -> Vec<crate::api::models::users::Role> {
    let mut roles = roles.to_vec();
    roles.sort();
    roles.dedup();
    roles
}

#[async_trait]
impl Repository for MemUsers<'_> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if self.tables.users.rows.values().any(|u| u.email == request.email) {
            return Err(unique_violation("users", "users_email_key"));
        }
        let now = Utc::now();
        let id = self.tables.users.next_id();
        let user = UserDBResponse {
            id,
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            student_id: request.student_id.clone(),
            classification: request.classification.clone(),
            is_active: true,
            roles: normalized_roles(&request.roles),
            created_at: now,
            updated_at: now,
        };
        self.tables.users.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.users.get(id))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        Ok(self
            .tables
            .users
            .rows
            .values()
            .skip(usize::try_from(filter.skip).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        self.tables.restrict_delete(|s| s.instructor_id == id, "schedules_instructor_id_fkey")?;
        self.tables.restrict_delete(|s| s.created_by == id, "schedules_created_by_fkey")?;
        self.tables.notifications.rows.retain(|_, n| n.user_id != id);
        Ok(self.tables.users.rows.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = self.tables.users.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(first_name) = &request.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &request.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(classification) = &request.classification {
            user.classification = Some(classification.clone());
        }
        if let Some(is_active) = request.is_active {
            user.is_active = is_active;
        }
        if let Some(roles) = &request.roles {
            user.roles = normalized_roles(roles);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for MemUsers<'_> {
    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let email = email.trim().to_lowercase();
        Ok(self.tables.users.rows.values().find(|u| u.email == email).cloned())
    }
}

struct MemNotifications<'a> {
    tables: &'a mut Tables,
}

#[async_trait]
impl Repository for MemNotifications<'_> {
    type CreateRequest = NotificationCreateDBRequest;
    type UpdateRequest = NotificationUpdateDBRequest;
    type Response = NotificationDBResponse;
    type Id = NotificationId;
    type Filter = NotificationFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if !self.tables.users.contains(request.user_id) {
            return Err(foreign_key_violation("notifications", "notifications_user_id_fkey"));
        }
        let id = self.tables.notifications.next_id();
        let notification = NotificationDBResponse {
            id,
            user_id: request.user_id,
            title: request.title.clone(),
            message: request.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        self.tables.notifications.rows.insert(id, notification.clone());
        Ok(notification)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.notifications.get(id))
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut notifications: Vec<_> = self.tables.notifications.rows.values().filter(|n| filter.matches(n)).cloned().collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications
            .into_iter()
            .skip(usize::try_from(filter.skip).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.tables.notifications.rows.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let notification = self.tables.notifications.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(is_read) = request.is_read {
            notification.is_read = is_read;
        }
        Ok(notification.clone())
    }
}

#[async_trait]
impl NotificationRepository for MemNotifications<'_> {
    async fn counts(&mut self, user_id: UserId) -> Result<NotificationCounts> {
        let (unread_count, total_count) = self
            .tables
            .notifications
            .rows
            .values()
            .filter(|n| n.user_id == user_id)
            .fold((0, 0), |(unread, total), n| (unread + i64::from(!n.is_read), total + 1));
        Ok(NotificationCounts { unread_count, total_count })
    }

    async fn mark_all_read(&mut self, user_id: UserId) -> Result<u64> {
        let mut changed = 0;
        for notification in self.tables.notifications.rows.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_all(&mut self, user_id: UserId) -> Result<u64> {
        let before = self.tables.notifications.rows.len();
        self.tables.notifications.rows.retain(|_, n| n.user_id != user_id);
        Ok((before - self.tables.notifications.rows.len()) as u64)
    }
}
