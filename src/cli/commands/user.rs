use clap::Subcommand;
use serde_json::json;
use validator::Validate;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::models::CreateUser;
use crate::database::DatabaseManager;
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account, e.g. the first administrator")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Password (min 8 characters)")]
        password: String,
        #[arg(long, help = "Role, defaults to user")]
        role: Option<String>,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            name,
            email,
            password,
            role,
        } => {
            let input = CreateUser {
                name,
                email,
                password,
                role,
            };
            input.validate()?;

            let store = DatabaseManager::connect_and_migrate(config).await?;
            let user = UserService::new(store).create(input).await?;
            output_success(
                &output_format,
                &format!("Created user {} with role {}", user.email, user.role),
                Some(json!({ "record": user })),
            )
        }
    }
}
