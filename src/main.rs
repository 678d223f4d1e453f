//! upiqr - UPI payment QR codes from the command line
//!
//! ## Commands
//!
//! - `upiqr generate --upi alice@bank --name "Alice"` - Encode a payment and show it
//! - `upiqr saved list|add|delete` - Manage saved UPI ids
//! - `upiqr menu` - Run the interactive app on stdin/stdout

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upiqr::app::{App, Button, Event, QrView, Screen};
use upiqr::config::{load_config, Config, DisplayConfig};
use upiqr::raster::{rasterize, DisplayProfile, Layout, TextScreen};
use upiqr::render::{save_svg, SvgStyle};
use upiqr::store::EntryStore;
use upiqr::{EcLevel, PaymentRequest, QrCode, UpiId, Version};

/// Generate UPI payment QR codes
#[derive(Parser)]
#[command(name = "upiqr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to TOML config file
    #[arg(long = "config", global = true)]
    config_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a payment request and print it as the device would show it
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Manage saved UPI ids
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Interactive menu driven by stdin
    Menu,
}

#[derive(Args)]
struct GenerateArgs {
    /// Full UPI id, e.g. alice@ybl
    #[arg(long, conflicts_with_all = ["user", "bank"], required_unless_present = "user")]
    upi: Option<String>,

    /// Username part of the UPI id
    #[arg(long, requires = "bank")]
    user: Option<String>,

    /// Bank handle part of the UPI id
    #[arg(long, requires = "user")]
    bank: Option<String>,

    /// Payee name shown by the paying app
    #[arg(long)]
    name: Option<String>,

    /// QR version (1-40), overrides the config
    #[arg(long)]
    version: Option<u8>,

    /// Error correction level (L, M, Q, H), overrides the config
    #[arg(long)]
    ec: Option<EcLevel>,

    /// Also write an SVG file
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Use the fullscreen layout instead of the preview
    #[arg(long)]
    fullscreen: bool,
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved entries with their index
    List,
    /// Save a new entry
    Add {
        #[arg(long)]
        upi: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Delete the entry at an index
    Delete { index: usize },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let config = load_config(cli.config_path.as_deref());
    debug!(?config, "configuration loaded");

    let result = match cli.command {
        Commands::Generate(args) => generate(&config, args),
        Commands::Saved { action } => saved(&config, action),
        Commands::Menu => menu(config),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn generate(config: &Config, args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    let upi_id = match (args.upi, args.user, args.bank) {
        (Some(upi), _, _) => UpiId::new(upi),
        (None, Some(user), Some(bank)) => UpiId::from_parts(&user, &bank),
        _ => return Err("either --upi or both --user and --bank are required".into()),
    };
    let version = Version::new(args.version.unwrap_or(config.version))?;
    let ec_level = args.ec.unwrap_or(config.ec_level);

    let request = PaymentRequest::new(upi_id.as_str(), args.name.as_deref());
    let code = QrCode::for_payment(&request, version, ec_level)?;
    println!("{}", request.to_uri());

    let profile = if args.fullscreen {
        DisplayProfile::Fullscreen
    } else {
        DisplayProfile::Preview
    };
    let layout = profile.layout(code.size(), &config.display);
    print!("{}", draw_screen(&code, &layout, &config.display));

    if let Some(path) = args.svg {
        save_svg(&code, &path, &SvgStyle::default())?;
        eprintln!("SVG written to {}", path.display());
    }
    Ok(())
}

fn draw_screen(code: &QrCode, layout: &Layout, display: &DisplayConfig) -> String {
    let mut screen = TextScreen::new(display);
    rasterize(code, layout, &mut screen);
    screen.to_text()
}

fn saved(config: &Config, action: SavedAction) -> Result<(), Box<dyn Error>> {
    let mut store = EntryStore::open(&config.store_path, config.max_entries)?;
    match action {
        SavedAction::List => {
            if store.is_empty() {
                println!("No saved entries");
            }
            for (i, entry) in store.entries().iter().enumerate() {
                println!("{i}: {} - {}", entry.name, entry.upi_id);
            }
        }
        SavedAction::Add { upi, name } => {
            let entry = store.add(&name, &upi)?;
            println!("Saved {} - {}", entry.name, entry.upi_id);
        }
        SavedAction::Delete { index } => {
            let entry = store.remove(index)?;
            println!("Deleted {}", entry.name);
        }
    }
    Ok(())
}

/// Reads one command per line: a number selects a list item, `b` goes back,
/// `s` saves, `f` shows fullscreen. In text input scenes the whole line is
/// the input.
fn menu(config: Config) -> Result<(), Box<dyn Error>> {
    let store = EntryStore::open(&config.store_path, config.max_entries)?;
    let display = config.display.clone();
    let mut app = App::new(config, store);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut out = io::stdout().lock();

    while app.is_running() {
        let Some(screen) = app.screen() else { break };
        let text_input = matches!(screen, Screen::TextInput { .. });
        show(&mut out, &screen, &display)?;
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim_end();
        let event = match line {
            "b" | "back" => Event::Back,
            _ if text_input => Event::Text(line.to_string()),
            "s" | "save" => Event::Button(Button::Save),
            "f" | "full" => Event::Button(Button::Fullscreen),
            _ => match line.parse() {
                Ok(index) => Event::Select(index),
                Err(_) => continue,
            },
        };
        app.handle(event)?;
        if let Some(popup) = app.take_popup() {
            writeln!(out, "[{}] {}", popup.header, popup.text.unwrap_or(""))?;
        }
    }
    Ok(())
}

fn show(out: &mut impl Write, screen: &Screen, display: &DisplayConfig) -> io::Result<()> {
    match screen {
        Screen::Menu { header, items } => {
            writeln!(out, "== {header} ==")?;
            for (i, item) in items.iter().enumerate() {
                writeln!(out, "{i}. {item}")?;
            }
        }
        Screen::TextInput { header } => writeln!(out, "{header}")?,
        Screen::Qr { view, buttons } => {
            match view {
                QrView::Ready { code, layout } => {
                    write!(out, "{}", draw_screen(code, layout, display))?
                }
                QrView::Failed(text) => writeln!(out, "{text}")?,
            }
            if let [save, full] = &buttons[..] {
                writeln!(out, "[s] {save}  [f] {full}  [b] Back")?;
            }
        }
    }
    Ok(())
}
