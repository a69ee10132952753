use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use hgrid::app::App;
use hgrid::config::{AppConfig, GeneralConfig, RemoteConfig, TreeConfig};
use hgrid::error::{GridError, Result};
use hgrid::event::{Event, EventHandler};
use hgrid::logging::{self, LogTarget};
use hgrid::tree::{seed, GridState};
use hgrid::tui::{install_panic_hook, Tui};
use hgrid::{handler, print, remote, ui};

/// Browse a project and file listing as a collapsible tree.
#[derive(Parser, Debug)]
#[command(name = "hgrid", version, about)]
struct Cli {
    /// JSON listing to load
    listing: PathBuf,

    /// Config file to use on top of the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the visible rows and exit instead of starting the browser
    #[arg(long)]
    print: bool,

    /// Only show rows whose name contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Expand every container before showing the tree
    #[arg(long)]
    expand_all: bool,

    /// Sort children by this attribute (e.g. name, kind, size)
    #[arg(long)]
    sort: Option<String>,

    /// Sort in descending order (needs --sort)
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Children shown per container before a "load more" row
    #[arg(long)]
    page_size: Option<usize>,

    /// Reject every edit
    #[arg(long)]
    read_only: bool,

    /// Disable mouse support
    #[arg(long)]
    no_mouse: bool,
}

impl Cli {
    /// Flags that were given, as a partial config layered over the files.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                ..Default::default()
            },
            tree: TreeConfig {
                sort_by: self.sort.clone(),
                descending: self.desc.then_some(true),
                page_size: self.page_size,
                ..Default::default()
            },
            remote: RemoteConfig {
                read_only: self.read_only.then_some(true),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let target = if cli.print {
        LogTarget::Stderr
    } else {
        LogTarget::FileOnly
    };
    logging::init(&config, target)?;

    if !cli.listing.exists() {
        return Err(GridError::InvalidPath(format!(
            "{} does not exist",
            cli.listing.display()
        )));
    }
    let tree = seed::load(&cli.listing)?;

    let mut grid = GridState::new(tree).with_page_size(config.page_size());
    if let Some(spec) = config.sort_spec() {
        grid.set_sort(spec);
    }
    if cli.expand_all {
        grid.expand_all();
    }
    if let Some(query) = cli.filter.as_deref() {
        grid.set_filter(query);
    }
    grid.drain_changes();

    if cli.print {
        return print::write_rows(&grid, config.use_icons(), &mut io::stdout().lock());
    }

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let remote = remote::from_config(config.read_only(), config.latency_ms());
    let mut app = App::new(grid, config, remote).with_event_sender(events.sender());

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick | Event::Resize(_, _) => {}
            Event::Confirmed(confirmation) => app.handle_confirmation(confirmation),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
