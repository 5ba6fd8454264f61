// taskmind - a to-do list that reads over your shoulder
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use anyhow::Context;
use std::env;
use std::sync::Arc;
use taskmind_lib::{
    config::data_dir,
    core::{apply_suggestion, group_by_day, Arbiter, ChangeSet, Recorder, Resolution, Retriever},
    db::{Priority, Task, TaskDraft},
    intelligence::{Scorer, SuggestionEngine},
    Database, EngineConfig, TaskmindError,
};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];

    let result = match command.as_str() {
        "add" => handle_add(&args[2..]).await,
        "list" | "ls" => handle_list(&args[2..]).await,
        "done" => handle_done(&args[2..]).await,
        "delete" | "rm" => handle_delete(&args[2..]).await,
        "analyze" => handle_analyze().await,
        "suggest" => handle_suggest().await,
        "apply" => handle_apply(&args[2..]).await,
        "import" => handle_import(&args[2..]).await,
        "export" => handle_export(&args[2..]).await,
        "status" => handle_status().await,
        "version" | "-v" | "--version" => {
            println!("taskmind v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        match e.downcast_ref::<TaskmindError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

// Logs go to stderr so they never end up in exported JSON
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_add(args: &[String]) -> anyhow::Result<()> {
    let mut text_parts = Vec::new();
    let mut priority = Priority::Medium;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--priority" | "-p" => {
                i += 1;
                if i < args.len() {
                    priority = Priority::parse_lenient(&args[i]);
                }
            }
            arg => text_parts.push(arg.to_string()),
        }
        i += 1;
    }

    let db = Arc::new(get_database().await?);
    let recorder = Recorder::new(db);

    let task = recorder.add(&text_parts.join(" "), priority).await?;
    println!("✓ Added [{}] {}", task.priority, task.text);

    Ok(())
}

async fn handle_list(args: &[String]) -> anyhow::Result<()> {
    let by_day = args.iter().any(|arg| arg == "--by-day");

    let db = get_database().await?;
    let tasks = db.get_tasks().await?;

    if tasks.is_empty() {
        println!("No tasks yet. Add one with: taskmind add <text>");
        return Ok(());
    }

    if by_day {
        // numbering stays tied to list position so `done <n>` still works
        let positions: std::collections::HashMap<&str, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i + 1))
            .collect();

        for bucket in group_by_day(&tasks) {
            println!("\n{} ({})", bucket.key(), bucket.tasks.len());
            println!("{}", "-".repeat(60));
            for task in &bucket.tasks {
                print_task(positions.get(task.id.as_str()).copied().unwrap_or(0), task);
            }
        }
        println!();
    } else {
        println!("\nTasks:");
        println!("{}", "=".repeat(60));
        for (i, task) in tasks.iter().enumerate() {
            print_task(i + 1, task);
        }
        println!("{}", "=".repeat(60));
    }

    Ok(())
}

fn print_task(number: usize, task: &Task) {
    let status = if task.completed { "✓" } else { " " };
    println!("{:3}. [{}] {:<6} {}", number, status, task.priority, task.text);
}

async fn handle_done(args: &[String]) -> anyhow::Result<()> {
    let target = args.first().context("usage: taskmind done <n|id>")?;

    let db = Arc::new(get_database().await?);
    let retriever = Retriever::new(db);
    let id = resolve_id(&retriever, target).await?;

    if retriever.toggle(&id).await? {
        println!("✓ Marked done");
    } else {
        println!("↺ Reopened");
    }

    Ok(())
}

async fn handle_delete(args: &[String]) -> anyhow::Result<()> {
    let target = args.first().context("usage: taskmind delete <n|id>")?;

    let db = Arc::new(get_database().await?);
    let retriever = Retriever::new(db);
    let id = resolve_id(&retriever, target).await?;

    let task = retriever.get(&id).await?;
    retriever.delete(&id).await?;
    println!("✗ Deleted {}", task.text);

    Ok(())
}

// Accepts either a list number as printed by `list` or a raw id
async fn resolve_id(retriever: &Retriever, target: &str) -> taskmind_lib::Result<String> {
    if let Ok(number) = target.parse::<usize>() {
        let tasks = retriever.all().await?;
        if let Some(task) = number.checked_sub(1).and_then(|i| tasks.get(i)) {
            return Ok(task.id.clone());
        }
    }

    Ok(retriever.get(target).await?.id)
}

async fn handle_analyze() -> anyhow::Result<()> {
    let config = load_config()?;
    let db = get_database().await?;
    let tasks = db.get_tasks().await?;

    let engine = SuggestionEngine::new(config);
    let analysis = engine.analyzer().analyze(&tasks);
    let taxonomy = engine.analyzer().categorizer().taxonomy();

    println!("\n{}", "=".repeat(60));
    println!("📊 Task Analysis");
    println!("{}", "=".repeat(60));

    println!(
        "\nTasks: {} active, {} done ({}% complete)",
        analysis.active_count,
        analysis.completed_count,
        Scorer::as_percent(analysis.completion_rate)
    );
    println!(
        "Priority: {} high, {} medium, {} low",
        analysis.priority_counts.high, analysis.priority_counts.medium, analysis.priority_counts.low
    );
    println!("Average length: {:.1} characters", analysis.average_length);
    println!("Urgent: {}", analysis.urgent_count);

    if !analysis.categories.is_empty() {
        println!("\n🗂  Categories:");
        for (tag, count) in &analysis.categories {
            println!("  {:<12} {}", taxonomy.display_name(tag), count);
        }
    }

    if let Some(pair) = analysis.most_similar() {
        println!(
            "\n🔗 Most similar ({}%):\n  {}\n  {}",
            Scorer::as_percent(pair.score),
            pair.first.text,
            pair.second.text
        );
    }

    if !analysis.frequent_patterns.is_empty() {
        println!("\n🔁 Frequent words: {}", analysis.frequent_patterns.join(", "));
    }

    if !analysis.recent_completions.is_empty() {
        println!("\n✅ Recently completed:");
        for task in &analysis.recent_completions {
            println!("  - {}", task.text);
        }
    }

    println!("\n{}", "=".repeat(60));

    Ok(())
}

async fn handle_suggest() -> anyhow::Result<()> {
    let config = load_config()?;
    let db = get_database().await?;
    let tasks = db.get_tasks().await?;

    let suggestions = SuggestionEngine::new(config).generate(&tasks);

    if suggestions.is_empty() {
        println!("No suggestions right now.");
        return Ok(());
    }

    println!("{}", "=".repeat(60));
    println!("💡 Suggestions");
    println!("{}", "=".repeat(60));

    for (i, suggestion) in suggestions.iter().enumerate() {
        let marker = if suggestion.is_actionable() { "*" } else { " " };
        println!(
            "\n{}{}. [{}/{}] {}",
            marker,
            i + 1,
            suggestion.kind,
            suggestion.priority,
            suggestion.text
        );
    }

    println!("\n{}", "=".repeat(60));
    println!("\n* can be applied with: taskmind apply <n>");

    Ok(())
}

async fn handle_apply(args: &[String]) -> anyhow::Result<()> {
    let index: usize = args
        .first()
        .and_then(|s| s.parse().ok())
        .context("usage: taskmind apply <n>")?;

    let config = load_config()?;
    let db = Arc::new(get_database().await?);
    let tasks = db.get_tasks().await?;

    let suggestions = SuggestionEngine::new(config.clone()).generate(&tasks);
    let suggestion = index
        .checked_sub(1)
        .and_then(|i| suggestions.get(i))
        .ok_or(TaskmindError::SuggestionNotFound(index))?;
    let proposed =
        apply_suggestion(suggestion, &tasks).ok_or(TaskmindError::NotApplicable(index))?;

    let arbiter = Arbiter::with_thresholds(Arc::clone(&db), &config.thresholds);
    let deadline = arbiter.begin_pending(tasks, proposed)?;

    println!("\n{}", suggestion.text);
    if let Some(pending) = arbiter.pending() {
        print_changes(&pending.changes());
    }
    println!(
        "\nApply this change? [y/N] (applies automatically at {})",
        deadline.with_timezone(&chrono::Local).format("%H:%M:%S")
    );

    tokio::select! {
        answer = prompt_answer() => match answer.ok().flatten().as_deref() {
            Some("y") | Some("yes") => {
                arbiter.confirm().await?;
            }
            Some(_) => {
                arbiter.cancel();
            }
            // stdin closed, let the countdown decide
            None => {}
        },
        _ = arbiter.settled() => {}
    }

    match arbiter.settled().await {
        Some(Resolution::Confirmed) => println!("✓ Applied"),
        Some(Resolution::TimedOut) => println!("✓ No answer, applied automatically"),
        Some(Resolution::Cancelled) => println!("✗ Discarded"),
        Some(Resolution::Failed) | None => println!("✗ The change could not be saved"),
    }

    Ok(())
}

// Read one line on a plain thread so a blocked stdin never holds up runtime shutdown
fn prompt_answer() -> oneshot::Receiver<Option<String>> {
    let (tx, rx) = oneshot::channel();

    std::thread::spawn(move || {
        let mut line = String::new();
        let answer = match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_lowercase()),
        };
        let _ = tx.send(answer);
    });

    rx
}

fn print_changes(changes: &ChangeSet) {
    if changes.is_empty() {
        println!("  (no visible change)");
        return;
    }

    for change in &changes.modified {
        println!("  ~ {}", change.task.text);
        for field in &change.changes {
            println!("      {}", field);
        }
    }
    for task in &changes.added {
        println!("  + {}", task.text);
    }
    for task in &changes.removed {
        println!("  - {}", task.text);
    }
}

async fn handle_import(args: &[String]) -> anyhow::Result<()> {
    let path = args.first().context("usage: taskmind import <file.json>")?;

    let content =
        std::fs::read_to_string(path).with_context(|| format!("could not read {}", path))?;
    let drafts: Vec<TaskDraft> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a task list", path))?;

    let db = Arc::new(get_database().await?);
    let count = Recorder::new(db).import(drafts).await?;
    println!("✓ Imported {} task(s)", count);

    Ok(())
}

async fn handle_export(args: &[String]) -> anyhow::Result<()> {
    let db = get_database().await?;
    let tasks = db.get_tasks().await?;
    let json = serde_json::to_string_pretty(&tasks)?;

    match args.first() {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("could not write {}", path))?;
            println!("✓ Exported {} task(s) to {}", tasks.len(), path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn handle_status() -> anyhow::Result<()> {
    let db = get_database().await?;
    let stats = db.stats().await?;
    let config_path = EngineConfig::default_path()?;

    println!("\ntaskmind Status");
    println!("{}", "=".repeat(60));

    println!("\nStorage:");
    println!("  Database: {}", db.path().display());
    println!(
        "  Config:   {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (defaults)" }
    );

    println!("\nTasks:");
    println!("  Total:          {}", stats.total_tasks);
    println!("  Completed:      {}", stats.completed_tasks);
    println!("  Active & high:  {}", stats.active_high_priority);

    println!("\nConnections: {} ({} idle)", stats.pool_size, stats.idle_connections);
    println!("{}", "=".repeat(60));

    Ok(())
}

fn load_config() -> taskmind_lib::Result<EngineConfig> {
    EngineConfig::load(&EngineConfig::default_path()?)
}

async fn get_database() -> taskmind_lib::Result<Database> {
    Database::new(data_dir()?.join("tasks.db")).await
}

fn print_usage() {
    println!(
        r#"taskmind v{} - A to-do list that suggests what to do about it

USAGE:
    taskmind <COMMAND> [OPTIONS]

COMMANDS:
    add <text> [-p low|medium|high]   Add a task (default priority: medium)
    list [--by-day]                   Show tasks, optionally grouped by day
    done <n|id>                       Toggle a task done / not done
    delete <n|id>                     Remove a task
    analyze                           Show statistics about the list
    suggest                           Show ranked suggestions
    apply <n>                         Preview and apply suggestion n
    import <file.json>                Replace the list with a JSON snapshot
    export [file.json]                Write the list as JSON
    status                            Show storage status and stats
    version                           Show version
    help                              Show this help

EXAMPLES:
    taskmind add 紧急 修复 登录 bug -p high
    taskmind list --by-day
    taskmind suggest
    taskmind apply 1

DATA:
    Tasks and config.toml live in ~/.taskmind (override with TASKMIND_HOME).
    Set RUST_LOG=debug to see what the engine is doing.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
