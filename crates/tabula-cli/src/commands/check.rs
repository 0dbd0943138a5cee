use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use tabula_http::RoutePaths;

use crate::config::SchemaConfig;

#[derive(Args)]
pub struct CheckCommand {
    /// YAML file declaring the tables to serve
    #[arg(long, env = "TABULA_SCHEMA")]
    pub schema: PathBuf,
}

impl CheckCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = SchemaConfig::load(&self.schema)?;
        let routers = config.routers()?;

        println!(
            "{} {} ({} tables)",
            "✓".bright_green(),
            self.schema.display(),
            routers.len()
        );

        for router in &routers {
            let table = router.table();
            let operations = router
                .guard()
                .operations()
                .iter()
                .map(|op| op.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let paths = RoutePaths::for_router(router);

            println!();
            println!("{} [{}]", table.name().bright_white().bold(), operations.dimmed());
            println!("  {}  GET POST OPTIONS", paths.collection.cyan());
            println!("  {}  GET PUT DELETE", paths.item.cyan());
            if let Some(scoped) = &paths.scoped {
                println!("  {}  GET POST PUT", scoped.cyan());
            }
        }

        Ok(())
    }
}
