use colored::*;
use directories::{ProjectDirs, UserDirs};
use kiosk::api::{
    Attachment, CmdMessage, ConfigAction, KioskApi, KioskPaths, MessageLevel, ModuleStatus,
};
use kiosk::blob::{self, BlobEncoding};
use kiosk::config::KioskConfig;
use kiosk::error::{KioskError, Result};
use kiosk::model::{upload_date_today, ModuleKey};
use kiosk::storage::{Storage, StoragePaths};
use kiosk::workflow::{Decision, PendingConfirmation};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod args;
use args::{
    get_version, AdminCommands, BlobCommands, Cli, Commands, DocCommands, HomepageCommands,
    ModuleCommands, TransferCommands,
};
use clap::Parser;

/// Overrides every platform directory; used for portable installs and tests.
const HOME_ENV: &str = "KIOSK_HOME";
const LOG_ENV: &str = "KIOSK_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: KioskApi,
    assume_yes: bool,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Init) => handle_init(&ctx),
        Some(Commands::Status) | None => handle_status(&ctx),
        Some(Commands::Doc(cmd)) => handle_doc(&ctx, cmd),
        Some(Commands::Blob(cmd)) => handle_blob(&ctx, cmd),
        Some(Commands::Module(cmd)) => handle_module(&ctx, cmd),
        Some(Commands::Homepage(cmd)) => handle_homepage(&ctx, cmd),
        Some(Commands::Export { dest }) => handle_export(&ctx, dest),
        Some(Commands::Import { file }) => handle_import(&ctx, file),
        Some(Commands::Transfer(cmd)) => handle_transfer(&ctx, cmd),
        Some(Commands::Admin(AdminCommands::Clear { secret })) => {
            let result = ctx.api.clear_publish_status(&secret)?;
            print_messages(&result.messages);
            Ok(())
        }
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

struct Dirs {
    config: PathBuf,
    storage: StoragePaths,
    export: PathBuf,
}

fn resolve_dirs() -> Result<Dirs> {
    if let Some(home) = std::env::var_os(HOME_ENV).map(PathBuf::from) {
        return Ok(Dirs {
            config: home.clone(),
            storage: StoragePaths {
                data_dir: home.join("data"),
                web_profile: home.join("web").join("profile.json"),
            },
            export: home.join("exports"),
        });
    }

    let proj_dirs = ProjectDirs::from("com", "kiosk", "kiosk")
        .ok_or_else(|| KioskError::Api("Could not determine config dir".to_string()))?;
    let user_dirs = UserDirs::new();
    let export = user_dirs
        .as_ref()
        .and_then(|u| u.desktop_dir().map(Path::to_path_buf))
        .or_else(|| user_dirs.as_ref().map(|u| u.home_dir().to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    Ok(Dirs {
        config: proj_dirs.config_dir().to_path_buf(),
        storage: StoragePaths {
            data_dir: proj_dirs.data_dir().join("data"),
            web_profile: proj_dirs.data_dir().join("web").join("profile.json"),
        },
        export,
    })
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let dirs = resolve_dirs()?;

    let mut config = KioskConfig::load(&dirs.config).unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config: {}", e);
        KioskConfig::default()
    });
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    let storage = Storage::select(&config, &dirs.storage)?;
    let paths = KioskPaths {
        config_dir: dirs.config,
        default_export_dir: dirs.export,
    };
    let api = KioskApi::new(storage, paths);
    // `init` reports what it creates; `config` never touches data.
    if !matches!(cli.command, Some(Commands::Init) | Some(Commands::Config { .. })) {
        api.ensure_defaults();
    }
    Ok(AppContext {
        api,
        assume_yes: cli.yes,
    })
}

fn confirm(ctx: &AppContext, pending: &PendingConfirmation) -> Result<Decision> {
    ask(ctx, &pending.prompt)
}

/// Ask the operator. `--yes` confirms without asking; end of input cancels.
fn ask(ctx: &AppContext, prompt: &str) -> Result<Decision> {
    if ctx.assume_yes {
        return Ok(Decision::Confirm);
    }
    print!("{} [y/N] ", prompt.bold());
    io::stdout().flush().map_err(KioskError::Io)?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(KioskError::Io)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(Decision::from_bool(answer == "y" || answer == "yes"))
}

fn read_json(inline: Option<String>, file: Option<PathBuf>) -> Result<Value> {
    let text = match (inline, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(KioskError::Io)?,
        (None, None) => {
            return Err(KioskError::Api(
                "Provide a JSON value or --file".to_string(),
            ))
        }
    };
    serde_json::from_str(&text).map_err(KioskError::Serialization)
}

fn handle_init(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.init()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_status(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.status(get_version())?;
    print_messages(&result.messages);
    print_modules(&result.modules);
    Ok(())
}

fn handle_doc(ctx: &AppContext, cmd: DocCommands) -> Result<()> {
    match cmd {
        DocCommands::Get { name } => {
            let result = ctx.api.get_document(&name)?;
            if let Some(doc) = &result.document {
                println!(
                    "{}",
                    serde_json::to_string_pretty(doc).map_err(KioskError::Serialization)?
                );
            }
            print_messages(&result.messages);
        }
        DocCommands::Set { name, json, file } => {
            let value = read_json(json, file)?;
            let result = ctx.api.set_document(&name, value)?;
            print_messages(&result.messages);
        }
    }
    Ok(())
}

fn handle_blob(ctx: &AppContext, cmd: BlobCommands) -> Result<()> {
    let result = match cmd {
        BlobCommands::Save {
            name,
            data,
            file,
            encoding,
        } => match (data, file) {
            (Some(data), _) => ctx.api.save_blob(&name, &data, encoding)?,
            (None, Some(path)) => {
                let bytes = std::fs::read(&path).map_err(KioskError::Io)?;
                let encoded = blob::encode_payload(&bytes, BlobEncoding::Base64)?;
                ctx.api.save_blob(&name, &encoded, BlobEncoding::Base64)?
            }
            (None, None) => return Err(KioskError::Api("Provide --data or --file".to_string())),
        },
        BlobCommands::Read {
            name,
            encoding,
            data_uri,
        } => {
            let result = ctx.api.read_blob(&name, encoding, data_uri)?;
            if let Some(content) = &result.blob {
                println!("{}", content);
            }
            result
        }
        BlobCommands::Exists { name } => ctx.api.blob_exists(&name)?,
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_module(ctx: &AppContext, cmd: ModuleCommands) -> Result<()> {
    match cmd {
        ModuleCommands::List { module } => {
            let result = ctx.api.list_records(module)?;
            print_messages(&result.messages);
            print_records(&result.records);
        }
        ModuleCommands::Add {
            module,
            json,
            file,
            attach,
        } => {
            let input = read_json(json, file)?;
            let attachment = attach.map(|path| read_attachment(&path)).transpose()?;
            let result = ctx.api.add_records(module, input, attachment)?;
            print_messages(&result.messages);
        }
        ModuleCommands::Delete { module, id } => {
            let result = ctx.api.delete_record(module, &id)?;
            print_messages(&result.messages);
        }
        ModuleCommands::Publish { module } => {
            let pending = ctx.api.request_publish(module)?;
            resolve_module(ctx, module, pending)?;
        }
        ModuleCommands::Reset { module } => {
            let pending = ctx.api.request_reset(module)?;
            resolve_module(ctx, module, pending)?;
        }
    }
    Ok(())
}

fn resolve_module(ctx: &AppContext, module: ModuleKey, pending: PendingConfirmation) -> Result<()> {
    let decision = confirm(ctx, &pending)?;
    let result = ctx.api.resolve_module(module, pending, decision)?;
    print_messages(&result.messages);
    Ok(())
}

fn read_attachment(path: &Path) -> Result<Attachment> {
    let bytes = std::fs::read(path).map_err(KioskError::Io)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| KioskError::InvalidName(path.display().to_string()))?;
    Ok(Attachment { file_name, bytes })
}

fn handle_homepage(ctx: &AppContext, cmd: HomepageCommands) -> Result<()> {
    match cmd {
        HomepageCommands::List { board } => {
            let result = ctx.api.list_homepage(board)?;
            print_messages(&result.messages);
            print_records(&result.records);
        }
        HomepageCommands::Add {
            board,
            title,
            date,
            extra,
            attach,
        } => {
            let extra = match extra {
                Some(text) => match serde_json::from_str(&text).map_err(KioskError::Serialization)? {
                    Value::Object(map) => map,
                    _ => return Err(KioskError::Api("--extra must be a JSON object".to_string())),
                },
                None => Map::new(),
            };
            let date = date.unwrap_or_else(upload_date_today);
            let image = attach.map(|path| read_attachment(&path)).transpose()?;
            let result = ctx.api.add_homepage_item(board, &title, &date, extra, image)?;
            print_messages(&result.messages);
        }
        HomepageCommands::Delete { board, id } => {
            let result = ctx.api.delete_homepage_item(board, &id)?;
            print_messages(&result.messages);
        }
        HomepageCommands::Publish => {
            let pending = ctx.api.request_homepage_publish()?;
            let decision = confirm(ctx, &pending)?;
            let result = ctx.api.resolve_homepage_publish(pending, decision)?;
            print_messages(&result.messages);
        }
    }
    Ok(())
}

fn handle_export(ctx: &AppContext, dest: Option<PathBuf>) -> Result<()> {
    let result = ctx.api.export(dest.as_deref())?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_import(ctx: &AppContext, file: Option<PathBuf>) -> Result<()> {
    if let Some(path) = &file {
        let prompt = format!("Replace ALL local data with {}?", path.display());
        if ask(ctx, &prompt)? == Decision::Cancel {
            print_messages(&[CmdMessage::info("Cancelled")]);
            return Ok(());
        }
    }
    let result = ctx.api.import(file.as_deref())?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_transfer(ctx: &AppContext, cmd: TransferCommands) -> Result<()> {
    let result = match cmd {
        TransferCommands::Show => ctx.api.show_transfer()?,
        TransferCommands::Hide => {
            let pending = ctx.api.request_hide_transfer();
            let decision = confirm(ctx, &pending)?;
            ctx.api.resolve_hide_transfer(pending, decision)?
        }
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };

    let result = ctx.api.config(action)?;
    if let (Some(config), true) = (&result.config, result.messages.is_empty()) {
        for key in KioskConfig::KEYS {
            println!("{} = {}", key, config.get(key).unwrap_or_default());
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn print_modules(modules: &[ModuleStatus]) {
    for status in modules {
        let state = if status.published {
            format!("{:>10}", "published").green()
        } else {
            format!("{:>10}", "draft").normal()
        };
        println!(
            "  {:<20} {}  {}  {}",
            status.key.alias(),
            format!("{:<24}", status.key.as_str()).dimmed(),
            state,
            format!("{} record(s)", status.records).dimmed()
        );
    }
}

/// One line per record: id and the first title-like field.
fn print_records(records: &[Value]) {
    if records.is_empty() {
        println!("No records found.");
        return;
    }
    for record in records {
        let id = record.get("id").and_then(Value::as_str).unwrap_or("-");
        let label = ["title", "Soru", "baslik", "fileName"]
            .iter()
            .find_map(|field| record.get(*field).and_then(Value::as_str))
            .unwrap_or("");
        let published = record.get("isPublished").and_then(Value::as_bool) == Some(true);
        let marker = if published { "●".green() } else { " ".normal() };
        println!("  {} {} {}", marker, format!("{:<16}", id).yellow(), label);
    }
}
