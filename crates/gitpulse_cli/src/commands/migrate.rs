//! Database migration commands.

use gitpulse::migration::{Migrator, MigratorTrait};

use crate::MigrateAction;

pub async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = gitpulse::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            Migrator::up(&db, None).await?;
            println!("Migrations applied");
        }
        MigrateAction::Down => {
            Migrator::down(&db, Some(1)).await?;
            println!("Rolled back last migration");
        }
        MigrateAction::Status => {
            Migrator::status(&db).await?;
        }
        MigrateAction::Fresh => {
            Migrator::fresh(&db).await?;
            println!("Database recreated from scratch");
        }
    }

    Ok(())
}
