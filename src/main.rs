use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io::Write;
use std::path::PathBuf;
use todostore::{Backend, Config, KeyValueStore, Task, TaskDraft, TaskList, TaskStore};
use tracing::Level;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "todostore CLI - to-do list backed by versioned local storage")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: <data dir>/config.yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the backend keeps its data in
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(short, long, global = true, value_enum)]
    backend: Option<Backend>,

    /// Print tasks as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Tasks(TaskCommand),

    /// Upgrade a legacy payload to the current envelope
    Migrate,

    /// Show the stored payload shape and task counts
    Status,
}

/// Commands that run against a freshly loaded working set
#[derive(Subcommand)]
enum TaskCommand {
    /// Add a new task
    Add {
        title: String,

        #[arg(short = 'C', long)]
        category: String,

        /// Image URI, local or remote
        #[arg(short, long)]
        image: Option<String>,
    },

    /// Change a task's title, category or image
    Edit {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short = 'C', long)]
        category: Option<String>,

        #[arg(short, long, conflicts_with = "clear_image")]
        image: Option<String>,

        /// Remove the attached image
        #[arg(long)]
        clear_image: bool,
    },

    /// Mark a task done
    Complete { id: i64 },

    /// Delete a task
    Delete { id: i64 },

    /// List active tasks
    List {
        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// List completed tasks
    Done,

    /// List every task
    All,

    /// List categories
    Categories,

    /// Add a category to the category list
    AddCategory { name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let mut store = config.open_store()?;
    run(cli.command, &mut store, &config, cli.json, &mut std::io::stdout().lock())
}

fn run<S: KeyValueStore>(
    command: Commands,
    store: &mut TaskStore<S>,
    config: &Config,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Migrate => {
            writeln!(out, "{}", store.migrate_if_needed()?)?;
        }
        Commands::Status => {
            let list = TaskList::from(store.load());
            writeln!(out, "backend:    {:?}", config.backend)?;
            writeln!(out, "data dir:   {}", config.data_dir.display())?;
            writeln!(out, "key:        {}", store.key())?;
            writeln!(out, "shape:      {}", store.shape())?;
            writeln!(out, "active:     {}", list.active(None).len())?;
            writeln!(out, "completed:  {}", list.completed().len())?;
            writeln!(out, "categories: {}", store.load_categories().len())?;
        }
        Commands::Tasks(command) => {
            // Best effort: failures are logged by the store
            let _ = store.migrate_if_needed();
            run_task_command(command, store, json, out)?;
        }
    }

    Ok(())
}

fn run_task_command<S: KeyValueStore>(
    command: TaskCommand,
    store: &mut TaskStore<S>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut list = TaskList::from(store.load());
    let mut categories = store.load_categories();

    match command {
        TaskCommand::Add { title, category, image } => {
            let mut draft = TaskDraft::new(title, category);
            draft.image = image;
            let task = list.create(draft)?.clone();
            store.save(list.tasks())?;
            if categories.ensure(&task.category) {
                store.save_categories(&categories)?;
            }
            writeln!(out, "Added {}", task.id)?;
            print_tasks(out, &[&task], json)?;
        }
        TaskCommand::Edit {
            id,
            title,
            category,
            image,
            clear_image,
        } => {
            let current = list.get(id).ok_or_else(|| eyre!("Task not found: {}", id))?;
            let draft = TaskDraft {
                title: title.unwrap_or_else(|| current.title.clone()),
                category: category.unwrap_or_else(|| current.category.clone()),
                image,
            };
            list.edit(id, draft)?;
            if clear_image {
                list.clear_image(id)?;
            }
            store.save(list.tasks())?;
            if let Some(task) = list.get(id) {
                if categories.ensure(&task.category) {
                    store.save_categories(&categories)?;
                }
                print_tasks(out, &[task], json)?;
            }
        }
        TaskCommand::Complete { id } => {
            let task = list.complete(id)?.clone();
            store.save(list.tasks())?;
            print_tasks(out, &[&task], json)?;
        }
        TaskCommand::Delete { id } => {
            let task = list.delete(id)?;
            store.save(list.tasks())?;
            if categories.prune(&task.category, &list) {
                store.save_categories(&categories)?;
            }
            writeln!(out, "Deleted {} ({})", task.id, task.title)?;
        }
        TaskCommand::List { category } => {
            let tasks = list.active(category.as_deref());
            if tasks.is_empty() && !json {
                match category {
                    Some(c) => writeln!(out, "No active tasks in category \"{}\"", c)?,
                    None => writeln!(out, "No tasks. Add the first one!")?,
                }
            } else {
                print_tasks(out, &tasks, json)?;
            }
        }
        TaskCommand::Done => {
            let tasks = list.completed();
            if tasks.is_empty() && !json {
                writeln!(out, "No completed tasks")?;
            } else {
                print_tasks(out, &tasks, json)?;
            }
        }
        TaskCommand::All => {
            let tasks: Vec<&Task> = list.tasks().iter().collect();
            print_tasks(out, &tasks, json)?;
        }
        TaskCommand::Categories => {
            let names = categories.merged(&list);
            if json {
                writeln!(out, "{}", serde_json::to_string(&names)?)?;
            } else if names.is_empty() {
                writeln!(out, "No categories")?;
            } else {
                for name in names {
                    writeln!(out, "{}", name.cyan())?;
                }
            }
        }
        TaskCommand::AddCategory { name } => {
            let added = categories.add(&name)?.map(str::to_string);
            match added {
                Some(name) => {
                    store.save_categories(&categories)?;
                    writeln!(out, "Added category {}", name.cyan())?;
                }
                None => writeln!(out, "Category name is blank, nothing added")?,
            }
        }
    }

    Ok(())
}

fn print_tasks(out: &mut impl Write, tasks: &[&Task], json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(tasks)?)?;
        return Ok(());
    }

    for task in tasks {
        let mark = if task.done { "✓".green() } else { "•".yellow() };
        writeln!(
            out,
            "{} {} {} {}",
            mark,
            task.id.to_string().dimmed(),
            task.title.bold(),
            format!("[{}]", task.category).cyan()
        )?;
        if let Some(ref image) = task.image {
            writeln!(out, "    image: {}", image)?;
        }
    }
    Ok(())
}
