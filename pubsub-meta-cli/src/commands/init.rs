//! `pubsub-meta init` command - provisions the home directory

use std::fs;
use std::io;
use std::path::Path;

use pubsub_meta_core::config::Config;
use pubsub_meta_core::history::ResourceKind;

/// Creates the home directory and every file the dashboard expects:
/// `config.yaml`, the project roster, the log file, and one history
/// file per resource kind. Safe to run again; existing files are left
/// alone.
pub fn run_init(home: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(home)?;
    let history_dir = home.join("history");
    fs::create_dir_all(&history_dir)?;

    let config_path = home.join("config.yaml");
    if !config_path.exists() {
        fs::write(&config_path, Config::default_file_contents())?;
        println!("Created: {}", config_path.display());
    }

    for path in [
        home.join("projects"),
        home.join("output.log"),
        history_dir.join(ResourceKind::Topic.file_name()),
        history_dir.join(ResourceKind::Subscription.file_name()),
    ] {
        if touch(&path)? {
            println!("Created: {}", path.display());
        }
    }

    println!("\nHome directory ready: {}", home.display());
    println!("Next steps:");
    println!("  1. Review and customize {}", config_path.display());
    println!("  2. Run `pubsub-meta fetch-projects` to build the project roster");
    println!("  3. Run `pubsub-meta` to open the dashboard");
    Ok(())
}

/// Creates an empty file if absent. Returns whether it was created.
fn touch(path: &Path) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, "")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_provisions_every_file() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pubsub-meta");

        run_init(&home).unwrap();

        assert!(home.join("config.yaml").is_file());
        assert!(home.join("projects").is_file());
        assert!(home.join("output.log").is_file());
        assert!(home.join("history/topic").is_file());
        assert!(home.join("history/subscription").is_file());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pubsub-meta");
        run_init(&home).unwrap();

        fs::write(home.join("config.yaml"), "account: me@example.com\n").unwrap();
        fs::write(home.join("history/topic"), "projects/p/topics/t\n").unwrap();

        run_init(&home).unwrap();

        let config = fs::read_to_string(home.join("config.yaml")).unwrap();
        assert!(config.contains("me@example.com"));
        let history = fs::read_to_string(home.join("history/topic")).unwrap();
        assert!(history.contains("projects/p/topics/t"));
    }
}
