use db::DBService;

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    db: DBService,
}

impl AppState {
    pub async fn new() -> Result<Self, db::DbErr> {
        Ok(Self {
            db: DBService::new().await?,
        })
    }

    pub fn with_db(db: DBService) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }
}
