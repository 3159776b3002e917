//! Process start-up: open the one storage gateway and bring the schema up to date.

use log::info;
use std::sync::Arc;

use crate::orm::{self, Db};
use crate::settings::Settings;

/// Connect once and run model plus file migrations. The returned handle is
/// cloned into every repository; call `Db::close` on it at shutdown.
pub async fn init(settings: &Settings) -> Result<Arc<Db>, sqlx::Error> {
    let db = Arc::new(Db::connect_with(&settings.database).await?);
    orm::auto_migrate(db.clone()).await?;
    if let Some(dir) = &settings.database.migrations_dir {
        let applied = orm::apply_migration_files(db.clone(), dir).await?;
        info!("Applied {} migration files from {}", applied, dir);
    }
    Ok(db)
}
