//! Shared fixtures for unit and HTTP tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum_test::TestServer;
use chrono::{NaiveDate, NaiveTime};

pub use crate::types::DayOfWeek;
use crate::{
    AppState, Application,
    api::models::{schedules::ScheduleCreate, users::Role},
    auth::permissions::permissions_for,
    config::{Config, DatabaseConfig},
    db::{
        Database, MemoryDatabase,
        handlers::{NotificationFilter, Repository},
        models::{
            courses::CourseCreateDBRequest,
            lab_rooms::{LabRoomCreateDBRequest, LabRoomUpdateDBRequest},
            notifications::NotificationDBResponse,
            schedules::{ScheduleCreateDBRequest, ScheduleDBResponse},
            sections::SectionCreateDBRequest,
            semesters::SemesterCreateDBRequest,
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::{Actor, CourseId, LabRoomId, SectionId, SemesterId, UserId},
};

static NEXT_USER: AtomicU64 = AtomicU64::new(1);

/// `HH:MM` to a time, for test literals
pub fn hm(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig::Memory,
        ..Default::default()
    }
}

/// An application on the in-memory store with its notifier running
pub async fn test_app() -> (TestServer, AppState) {
    Application::new(test_config())
        .await
        .expect("Failed to create application")
        .into_test_server()
}

async fn insert_user(db: &dyn Database, roles: Vec<Role>, first_name: &str) -> UserDBResponse {
    let n = NEXT_USER.fetch_add(1, Ordering::Relaxed);
    let mut store = db.begin().await.unwrap();
    let user = store
        .users()
        .create(&UserCreateDBRequest {
            email: format!("{}.{n}@test.example.edu", first_name.to_lowercase()),
            first_name: first_name.to_string(),
            last_name: format!("Tester{n}"),
            student_id: None,
            classification: None,
            roles,
        })
        .await
        .unwrap();
    store.commit().await.unwrap();
    user
}

pub async fn create_test_user(state: &AppState, role: Role) -> UserDBResponse {
    insert_user(state.db.as_ref(), vec![role], "User").await
}

/// Header carrying the caller's identity under the default configuration
pub fn add_auth_headers(user_id: UserId) -> (String, String) {
    ("x-labsched-user".to_string(), user_id.to_string())
}

/// Polls the inbox until `expected` notifications have arrived; the notifier writes asynchronously.
pub async fn wait_for_inbox(db: &dyn Database, user_id: UserId, expected: usize) -> Vec<NotificationDBResponse> {
    let mut inbox = Vec::new();
    for _ in 0..50 {
        let mut store = db.begin().await.unwrap();
        inbox = store.notifications().list(&NotificationFilter::for_user(user_id)).await.unwrap();
        drop(store);
        if inbox.len() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    inbox
}

/// A seeded catalog: one active semester, course IT101, sections BSIT-1A and BSIT-1B,
/// rooms L201 and L202, and one user per role.
pub struct Fixture {
    pub db: Arc<dyn Database>,
    pub admin_id: UserId,
    pub coordinator_id: UserId,
    pub instructor_id: UserId,
    pub other_instructor_id: UserId,
    pub student_id: UserId,
    pub semester_id: SemesterId,
    pub course_id: CourseId,
    pub section_id: SectionId,
    pub other_section_id: SectionId,
    pub room_id: LabRoomId,
    pub other_room_id: LabRoomId,
}

impl Fixture {
    /// Seeds a fresh in-memory store
    pub async fn seeded() -> Self {
        Self::seed(Arc::new(MemoryDatabase::new())).await
    }

    pub async fn seed(db: Arc<dyn Database>) -> Self {
        let admin_id = insert_user(db.as_ref(), vec![Role::SystemAdministrator], "Admin").await.id;
        let coordinator_id = insert_user(db.as_ref(), vec![Role::AcademicCoordinator], "Coordinator").await.id;
        let instructor_id = insert_user(db.as_ref(), vec![Role::FacultyStaff], "Instructor").await.id;
        let other_instructor_id = insert_user(db.as_ref(), vec![Role::FacultyStaff], "Lecturer").await.id;
        let student_id = insert_user(db.as_ref(), vec![Role::Student], "Student").await.id;

        let mut store = db.begin().await.unwrap();
        let semester_id = store
            .semesters()
            .create(&SemesterCreateDBRequest {
                name: "First Semester".to_string(),
                school_year: "2025-2026".to_string(),
                start_date: NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
                is_active: true,
            })
            .await
            .unwrap()
            .id;
        let course_id = store
            .courses()
            .create(&CourseCreateDBRequest {
                code: "IT101".to_string(),
                name: "Introduction to Computing".to_string(),
                description: String::new(),
                units: 3,
            })
            .await
            .unwrap()
            .id;

        let section = |name: &str| SectionCreateDBRequest {
            name: name.to_string(),
            program: "BSIT".to_string(),
            year_level: 1,
        };
        let section_id = store.sections().create(&section("1A")).await.unwrap().id;
        let other_section_id = store.sections().create(&section("1B")).await.unwrap().id;

        let room = |name: &str| LabRoomCreateDBRequest {
            name: name.to_string(),
            capacity: 40,
            description: String::new(),
            is_active: true,
        };
        let room_id = store.lab_rooms().create(&room("L201")).await.unwrap().id;
        let other_room_id = store.lab_rooms().create(&room("L202")).await.unwrap().id;
        store.commit().await.unwrap();

        Self {
            db,
            admin_id,
            coordinator_id,
            instructor_id,
            other_instructor_id,
            student_id,
            semester_id,
            course_id,
            section_id,
            other_section_id,
            room_id,
            other_room_id,
        }
    }

    pub fn coordinator(&self) -> Actor {
        Actor::new(self.coordinator_id, permissions_for(&[Role::AcademicCoordinator]))
    }

    pub fn student(&self) -> Actor {
        Actor::new(self.student_id, permissions_for(&[Role::Student]))
    }

    /// Inserts a booking of IT101 / BSIT-1A / L201 / instructor straight into the store,
    /// bypassing the conflict check
    pub async fn schedule(&self, day: DayOfWeek, start: &str, end: &str) -> ScheduleDBResponse {
        let mut store = self.db.begin().await.unwrap();
        let created = store
            .schedules()
            .create(&ScheduleCreateDBRequest {
                semester_id: self.semester_id,
                course_id: self.course_id,
                section_id: self.section_id,
                lab_room_id: self.room_id,
                instructor_id: self.instructor_id,
                day_of_week: day,
                start_time: hm(start),
                end_time: hm(end),
                is_lab: true,
                created_by: self.coordinator_id,
            })
            .await
            .unwrap();
        store.commit().await.unwrap();
        created
    }

    /// A complete create request for the default section, room and instructor
    pub fn create_request(&self, day: &str, start: &str, end: &str) -> ScheduleCreate {
        ScheduleCreate {
            semester_id: Some(self.semester_id),
            course_id: Some(self.course_id),
            section_id: Some(self.section_id),
            lab_room_id: Some(self.room_id),
            instructor_id: Some(self.instructor_id),
            day_of_week: Some(day.to_string()),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            is_lab: Some(true),
        }
    }

    pub async fn deactivate_room(&self, id: LabRoomId) {
        let mut store = self.db.begin().await.unwrap();
        store
            .lab_rooms()
            .update(
                id,
                &LabRoomUpdateDBRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store.commit().await.unwrap();
    }
}
