use clap::{Parser, Subcommand};
use fake::faker::address::en::CityName;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use rookery::{
    auth::Actor,
    config::{SeedConfig, Settings},
    domain::{ChessLevel, Club, CreateClubRequest, CreateUserRequest, Role, User},
    repository,
    service::ServiceContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "seed", about = "Populate or clear the chess club database")]
struct Cli {
    /// Overrides database.url from the configuration
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create demo users, clubs and memberships
    Seed,
    /// Delete every club, membership and user
    Unseed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });
    if let Some(url) = cli.database_url {
        settings.database.url = url;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = repository::connect(&settings.database).await?;
    let ctx = ServiceContext::new(db_pool);

    match cli.command {
        Command::Seed => seed(&ctx, &settings.seed).await?,
        Command::Unseed => unseed(&ctx).await?,
    }

    Ok(())
}

struct Seeder<'a> {
    ctx: &'a ServiceContext,
    config: &'a SeedConfig,
    counter: u32,
}

impl<'a> Seeder<'a> {
    async fn user(&mut self, first_name: &str, last_name: &str, email: String) -> anyhow::Result<User> {
        let level = rand::thread_rng().gen_range(1..=5);
        let user = self
            .ctx
            .user_service
            .create_user(
                CreateUserRequest {
                    email,
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    bio: format!("I live in {}", CityName().fake::<String>()),
                    chess_level: ChessLevel::try_from(level)?,
                    personal_statement: sentence(),
                },
                &self.config.default_password,
            )
            .await?;

        Ok(user)
    }

    async fn fake_user(&mut self, domain: &str) -> anyhow::Result<User> {
        let first_name: String = FirstName().fake();
        let last_name: String = LastName().fake();
        self.counter += 1;
        let email = format!(
            "{}{}{}@{}",
            handle_part(&first_name),
            handle_part(&last_name),
            self.counter,
            domain
        );
        self.user(&first_name, &last_name, email).await
    }

    async fn club(&mut self, owner: &User, name: String) -> anyhow::Result<Club> {
        let club = self
            .ctx
            .club_service
            .create_club(
                &Actor::from(owner.clone()),
                CreateClubRequest {
                    name,
                    location: CityName().fake(),
                    description: sentence(),
                },
            )
            .await?;

        Ok(club)
    }

    async fn membership(&self, user: &User, club: &Club, role: Role) -> anyhow::Result<()> {
        self.ctx.membership_repo.insert(user.id, club.id, role).await?;
        Ok(())
    }
}

async fn seed(ctx: &ServiceContext, config: &SeedConfig) -> anyhow::Result<()> {
    tracing::info!("Seeding database");
    let mut seeder = Seeder { ctx, config, counter: 0 };

    let jebediah = seeder.user("Jebediah", "Kerman", "jeb@example.org".to_string()).await?;
    let valentina = seeder.user("Valentina", "Kerman", "val@example.org".to_string()).await?;
    let billie = seeder.user("Billie", "Kerman", "billie@example.org".to_string()).await?;
    let kerbal_owner = seeder.user("Gemsbok", "Owner", "gemsbok@owners.org".to_string()).await?;

    let kerbal = seeder.club(&kerbal_owner, "Kerbal Chess Club".to_string()).await?;
    for user in [&jebediah, &valentina, &billie] {
        seeder.membership(user, &kerbal, Role::Member).await?;
    }

    for i in 0..config.clubs {
        // Valentina owns the second club; everyone else gets a fresh owner.
        let owner = if i == 1 {
            valentina.clone()
        } else {
            seeder.fake_user("owners.org").await?
        };
        let name = unused_club_name(ctx).await?;
        let club = seeder.club(&owner, name).await?;

        if i == 0 {
            seeder.membership(&jebediah, &club, Role::Officer).await?;
        }
        if i == 2 {
            seeder.membership(&billie, &club, Role::Member).await?;
        }

        for _ in 0..config.applicants_per_club {
            let applicant = seeder.fake_user("applicants.org").await?;
            seeder.membership(&applicant, &club, Role::Applicant).await?;
        }
        for _ in 0..config.members_per_club {
            let member = seeder.fake_user("members.org").await?;
            seeder.membership(&member, &club, Role::Member).await?;
        }
        for _ in 0..config.officers_per_club {
            let officer = seeder.fake_user("officers.org").await?;
            seeder.membership(&officer, &club, Role::Officer).await?;
        }

        tracing::info!(club = %club.name, "Seeded club");
    }

    tracing::info!("Seeded!");
    Ok(())
}

async fn unseed(ctx: &ServiceContext) -> anyhow::Result<()> {
    for club in ctx.club_repo.list().await? {
        ctx.club_repo.delete(club.id).await?;
    }
    for user in ctx.user_repo.list(i64::MAX, 0).await? {
        ctx.user_repo.delete(user.id).await?;
    }

    tracing::info!("Unseeded!");
    Ok(())
}

async fn unused_club_name(ctx: &ServiceContext) -> anyhow::Result<String> {
    loop {
        let name = format!("{} Chess Club", LastName().fake::<String>());
        if ctx.club_repo.find_by_name(&name).await?.is_none() {
            return Ok(name);
        }
    }
}

fn handle_part(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

fn sentence() -> String {
    let words: Vec<String> = Words(2..5).fake();
    let mut text = words.join(" ");
    text.truncate(48);
    format!("{}.", text.trim_end())
}
