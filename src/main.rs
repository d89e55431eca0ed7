use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use dialr::storage::{
    BincodeBookStorage, Config, ConfigStorage, TomlConfigStorage, ensure_directories,
};
use dialr::store::SubscriberStore;
use dialr::Subscriber;

#[derive(Parser)]
#[command(name = "dialr")]
#[command(about = "Phone Book Manager", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a subscriber
    Add {
        /// Subscriber name
        name: String,
        /// Phone number
        phone: String,
    },

    /// Edit the subscriber at a list position
    Edit {
        /// Position as shown by `list` (1-based)
        position: usize,
        /// New name
        name: String,
        /// New phone number
        phone: String,
    },

    /// Delete the subscriber at a list position
    Delete {
        /// Position as shown by `list` (1-based)
        position: usize,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Search subscribers by name (case-insensitive substring)
    Search {
        /// Search query
        query: String,
    },

    /// List all subscribers
    List,

    /// Delete all subscribers
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the phone book as pretty-printed JSON
    Export {
        /// Output path (default: export path from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show phone book statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (data_dir, config_dir) = ensure_directories()?;
    let config_storage = TomlConfigStorage::new(config_dir.join("dialr.toml"));
    let config = config_storage.load()?;

    init_logging(&config);

    let storage = BincodeBookStorage::new(config.data_file(&data_dir));
    let mut store = SubscriberStore::open(Box::new(storage));

    match cli.command {
        Commands::Add { name, phone } => cmd_add(&mut store, &name, &phone),
        Commands::Edit {
            position,
            name,
            phone,
        } => cmd_edit(&mut store, position, &name, &phone),
        Commands::Delete { position, yes } => cmd_delete(&mut store, position, yes),
        Commands::Search { query } => cmd_search(&store, &query),
        Commands::List => cmd_list(&store),
        Commands::Clear { yes } => cmd_clear(&mut store, yes),
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| config.export_file(&data_dir));
            cmd_export(&store, &path)
        }
        Commands::Stats => cmd_stats(&store),
    }
}

fn init_logging(config: &Config) {
    let default_level = if config.general.debug_logging {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn cmd_add(store: &mut SubscriberStore, name: &str, phone: &str) -> Result<()> {
    if store.add(name, phone) {
        println!("Subscriber added.");
        print_table(&store.get_all());
    } else {
        println!("Not added: name and phone must be non-empty and the entry must not already exist.");
    }
    Ok(())
}

fn cmd_edit(store: &mut SubscriberStore, position: usize, name: &str, phone: &str) -> Result<()> {
    let Some(index) = position.checked_sub(1) else {
        println!("No subscriber at position {}.", position);
        return Ok(());
    };

    if store.edit(index, name, phone) {
        println!("Subscriber updated.");
        print_table(&store.get_all());
    } else {
        println!("No subscriber at position {}.", position);
    }
    Ok(())
}

fn cmd_delete(store: &mut SubscriberStore, position: usize, yes: bool) -> Result<()> {
    let Some(index) = position.checked_sub(1) else {
        println!("No subscriber at position {}.", position);
        return Ok(());
    };

    let Some(subscriber) = store.get_all().get(index).cloned() else {
        println!("No subscriber at position {}.", position);
        return Ok(());
    };

    if !yes && !confirm(&format!("Delete {} ({})?", subscriber.name, subscriber.phone))? {
        println!("Cancelled.");
        return Ok(());
    }

    if store.delete(index) {
        println!("Subscriber deleted.");
        print_table(&store.get_all());
    } else {
        println!("No subscriber at position {}.", position);
    }
    Ok(())
}

fn cmd_search(store: &SubscriberStore, query: &str) -> Result<()> {
    let matches = store.search(query);
    if matches.is_empty() {
        println!("No matches for '{}'.", query);
    } else {
        print_table(&matches);
    }
    Ok(())
}

fn cmd_list(store: &SubscriberStore) -> Result<()> {
    let all = store.get_all();
    if all.is_empty() {
        println!("(empty - no subscribers yet)");
    } else {
        print_table(&all);
    }
    Ok(())
}

fn cmd_clear(store: &mut SubscriberStore, yes: bool) -> Result<()> {
    if store.is_empty() {
        println!("Phone book is already empty.");
        return Ok(());
    }

    if !yes && !confirm(&format!("Delete all {} subscribers?", store.len()))? {
        println!("Cancelled.");
        return Ok(());
    }

    store.clear();
    println!("Phone book cleared.");
    Ok(())
}

fn cmd_export(store: &SubscriberStore, path: &std::path::Path) -> Result<()> {
    if store.export(path) {
        println!("Exported {} subscribers to {}", store.len(), path.display());
    } else {
        println!("Export to {} failed.", path.display());
    }
    Ok(())
}

fn cmd_stats(store: &SubscriberStore) -> Result<()> {
    println!("Phone Book Statistics");
    println!("=====================");
    println!("Subscribers: {}", store.len());
    println!("Backing file: {}", store.path().display());
    if store.last_load_failed() {
        println!("Warning: the backing file could not be read and was reset.");
    }
    Ok(())
}

fn print_table(subscribers: &[Subscriber]) {
    println!("{:>3}  {:<30} {}", "#", "Name", "Phone");
    println!("{}", "-".repeat(50));
    for (i, subscriber) in subscribers.iter().enumerate() {
        println!("{:>3}  {:<30} {}", i + 1, subscriber.name, subscriber.phone);
    }
}

/// Ask for confirmation on stdin, accepting `y` or `yes`
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
