//! PostgreSQL backend.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::PoolSettings;
use crate::db::errors::Result;
use crate::db::handlers::{
    CourseRepository, Courses, LabRoomRepository, LabRooms, NotificationRepository, Notifications, ScheduleRepository, Schedules,
    SectionRepository, Sections, SemesterRepository, Semesters, UserRepository, Users,
};
use crate::db::{Database, Store};

/// Pool-backed [`Database`]; every unit of work is one transaction.
#[derive(Clone, Debug)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the configured pool settings and run pending migrations
    pub async fn connect(url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout);
        if settings.idle_timeout > Duration::ZERO {
            options = options.idle_timeout(settings.idle_timeout);
        }
        if settings.max_lifetime > Duration::ZERO {
            options = options.max_lifetime(settings.max_lifetime);
        }

        let pool = options.connect(url).await?;
        crate::migrator().run(&pool).await?;
        info!(max_connections = settings.max_connections, "Connected to PostgreSQL and applied migrations");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn Store>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStore { tx }))
    }

    #[instrument(skip(self), err)]
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connections...");
        self.pool.close().await;
    }
}

/// A unit of work over one PostgreSQL transaction. Dropping it rolls back.
pub struct PgStore {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Store for PgStore {
    fn schedules(&mut self) -> Box<dyn ScheduleRepository + '_> {
        Box::new(Schedules::new(&mut self.tx))
    }

    fn semesters(&mut self) -> Box<dyn SemesterRepository + '_> {
        Box::new(Semesters::new(&mut self.tx))
    }

    fn courses(&mut self) -> Box<dyn CourseRepository + '_> {
        Box::new(Courses::new(&mut self.tx))
    }

    fn sections(&mut self) -> Box<dyn SectionRepository + '_> {
        Box::new(Sections::new(&mut self.tx))
    }

    fn lab_rooms(&mut self) -> Box<dyn LabRoomRepository + '_> {
        Box::new(LabRooms::new(&mut self.tx))
    }

    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(Users::new(&mut self.tx))
    }

    fn notifications(&mut self) -> Box<dyn NotificationRepository + '_> {
        Box::new(Notifications::new(&mut self.tx))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
