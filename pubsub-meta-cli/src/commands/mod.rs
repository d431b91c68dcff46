mod init;

pub use init::run_init;

use pubsub_meta_core::config::Config;
use pubsub_meta_core::directory::ProjectDirectory;
use pubsub_meta_core::projects::ProjectRoster;

/// `pubsub-meta info` - prints the resolved configuration.
pub fn run_info(config: &Config) {
    println!("home:    {}", config.home.display());
    println!(
        "account: {}",
        config.account.as_deref().unwrap_or("(not set)")
    );
    println!("skin:    {}", config.skin.label());
    println!("log:     {}", config.log_file().display());
}

/// `pubsub-meta fetch-projects` - rebuilds the local project roster
/// from the remote directory.
pub async fn run_fetch_projects(
    config: &Config,
    directory: &dyn ProjectDirectory,
) -> anyhow::Result<()> {
    let roster = ProjectRoster::new(config.projects_file());
    let count = roster.fetch(directory).await?;
    println!(
        "Fetched {} project(s) into {}",
        count,
        config.projects_file().display()
    );
    Ok(())
}
