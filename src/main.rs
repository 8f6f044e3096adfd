#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

mod bus;
mod display;
mod input;
mod poller;
mod settings;

use std::{
    io::{stdout, Stdout},
    path::PathBuf,
    sync::{
        mpsc::{channel, Receiver},
        Arc,
    },
};

use ansi_to_tui::IntoText;
use crossterm::{
    cursor::Show,
    event::{read, Event as TermEvent, KeyEvent},
    execute,
    style::Stylize,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tempbar_core::{Monitor, Sensor};
use tui::{
    backend::CrosstermBackend as TuiBackend,
    layout::Alignment,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};

use crate::{
    bus::{Change, SettingsBus},
    input::Action,
    poller::{Plan, Poller, Reading, SlotReading},
    settings::{Layout, Settings, Unit},
};

type BoxError = Box<dyn std::error::Error>;

macro_rules! exit {
    () => {{
        std::process::exit(0);
    }};
    ($code:literal) => {{
        std::process::exit($code);
    }};
}

struct Options {
    critical: f64,
    no_raw_mode: bool,
    list: bool,
    once: bool,
    save: bool,
    verbose: bool,
    changes: Vec<Change>,
}

fn option_parser() -> getopts::Options {
    let mut opts = getopts::Options::new();

    opts.optflag("h", "help", "print this help menu");
    opts.optflag("v", "version", "print the version");
    opts.optflag("l", "list", "list the sensors this machine exposes, then exit");
    opts.optflag("", "once", "print one reading of the status line, then exit");
    opts.optflag("N", "no-raw-mode", "do not enable raw terminal mode");
    opts.optflag("F", "fahrenheit", "show temperatures in fahrenheit");
    opts.optflag("", "save", "persist the given options to the settings file");
    opts.optflag("V", "verbose", "log SMC traffic to stderr");
    opts.optopt(
        "i",
        "interval",
        "the interval, in seconds, between each data read",
        "SECONDS",
    );
    opts.optopt("", "layout", "how many slots to show", "single|dual");
    opts.optmulti(
        "",
        "slot",
        "assign a sensor key to a slot; an empty key clears it",
        "N=KEY",
    );
    opts.optopt(
        "C",
        "critical",
        "the critical temperature threshold in celsius",
        "CELSIUS",
    );
    opts
}

fn parse_slot(arg: &str) -> Result<Change, BoxError> {
    let (index, key) = arg
        .split_once('=')
        .ok_or_else(|| format!("invalid slot {:?}, expected N=KEY", arg))?;
    let index = index.trim().parse::<usize>()?;
    if index == 0 {
        return Err("slots are numbered from 1".into());
    }

    Ok(Change::Slot {
        index: index - 1,
        key: Some(key.trim()).filter(|k| !k.is_empty()).map(str::to_string),
    })
}

fn parse_options() -> Result<Options, BoxError> {
    let opts = option_parser();
    let matches = opts.parse(std::env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        exit!(2);
    });

    if matches.opt_present("h") {
        println!(
            "{}",
            opts.usage(
                "Usage: tempbar [options]\nRun without options to start tempbar (then press ESC to exit).",
            )
        );
        exit!();
    }

    if matches.opt_present("v") {
        println!("tempbar v{}", env!("CARGO_PKG_VERSION"));
        exit!();
    }

    let mut changes = Vec::new();
    if let Some(layout) = matches.opt_str("layout") {
        changes.push(Change::Layout(layout.parse::<Layout>()?));
    }
    for arg in matches.opt_strs("slot") {
        changes.push(parse_slot(&arg)?);
    }
    if matches.opt_present("F") {
        changes.push(Change::Unit(Unit::Fahrenheit));
    }
    if let Some(interval) = matches.opt_str("i") {
        changes.push(Change::Interval(interval.parse::<f64>()?));
    }

    Ok(Options {
        critical: matches
            .opt_str("C")
            .unwrap_or_else(|| "90.0".to_string())
            .parse::<f64>()?,
        no_raw_mode: matches.opt_present("N"),
        list: matches.opt_present("l"),
        once: matches.opt_present("once"),
        save: matches.opt_present("save"),
        verbose: matches.opt_present("V"),
        changes,
    })
}

type Backend = TuiBackend<Stdout>;

const HEADER: &str = concat!("tempbar v", env!("CARGO_PKG_VERSION"));
const HINTS: &str = "l layout  u unit  1/2 next sensor  esc quit";

macro_rules! key_value_ui {
    ($k:expr, $v:expr) => {{
        format!("{}{} {}\n", $k.bold().white(), ":".bold().white(), $v)
    }};
}

fn format_reading(reading: &Reading, unit: Unit, options: &Options) -> String {
    let text = display::format_value(reading, unit);

    match reading {
        Reading::Value(celsius) if *celsius >= options.critical => {
            format!("{} (CRITICAL)", text.red().bold())
        }
        Reading::Value(celsius) if *celsius >= options.critical - 15.0 => {
            text.yellow().bold().to_string()
        }
        Reading::Value(_) => text.green().bold().to_string(),
        Reading::Failed(err) if !err.is_not_found() => text.red().to_string(),
        _ => text.dark_grey().to_string(),
    }
}

fn render<B: tui::backend::Backend>(
    terminal: &mut Terminal<B>,
    settings: &Settings,
    readings: &[SlotReading],
    options: &Options,
) -> Result<(), BoxError> {
    let mut content = String::new();
    for slot in readings {
        content.push_str(&key_value_ui!(
            display::slot_label(slot),
            format_reading(&slot.reading, settings.unit, options)
        ));
    }
    content.push('\n');
    content.push_str(&HINTS.dark_grey().to_string());

    let text = content.into_text().map_err(|e| format!("{:?}", e))?;

    terminal.draw(|frame| {
        let block = Block::default()
            .title(HEADER)
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let area = frame.size();
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
            area,
        );
    })?;

    Ok(())
}

fn plan_for(settings: &Settings) -> Plan {
    Plan {
        slots: settings.visible_slots(),
        interval: settings.interval(),
    }
}

fn list_sensors(monitor: &Monitor) {
    let sensors = monitor.list_available_sensors();
    if sensors.is_empty() {
        println!("No known sensors answered on this machine.");
        return;
    }

    for sensor in sensors {
        let value = monitor
            .read_key(sensor.key)
            .map_or_else(|_| display::ERROR_GLYPH.to_string(), |v| format!("{:.1}°C", v));
        println!(
            "{}  {:<28} {:>8}  {}",
            sensor.key.to_string().bold().cyan(),
            sensor.name,
            value,
            sensor.icon.unwrap_or("").dark_grey()
        );
    }
}

enum Event {
    Readings(Vec<SlotReading>),
    Input(KeyEvent),
    Quit,
}

fn run(
    monitor: Arc<Monitor>,
    mut settings: Settings,
    mut bus: SettingsBus,
    path: PathBuf,
    options: &Options,
) -> Result<(), BoxError> {
    let available = monitor.list_available_sensors();
    log::info!("{} of {} sensors available", available.len(), monitor.catalog().len());

    let (tx, rx) = channel();
    let poller = Poller::spawn(Arc::clone(&monitor), plan_for(&settings), {
        let tx = tx.clone();
        move |readings| tx.send(Event::Readings(readings)).is_ok()
    });

    let plan = poller.plan();
    let follow_plan = bus.subscribe(move |settings, change| {
        if !matches!(change, Change::Unit(_)) {
            plan.update(|plan| *plan = plan_for(settings));
        }
    });
    bus.subscribe(move |settings, _| {
        if let Err(err) = settings.save_to(&path) {
            log::warn!("could not save settings: {}", err);
        }
    });

    std::thread::spawn(move || loop {
        match read() {
            Ok(TermEvent::Key(key)) => {
                if tx.send(Event::Input(key)).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                log::error!("failed to read terminal input: {}", err);
                let _ = tx.send(Event::Quit);
                break;
            }
        }
    });

    let result = event_loop(
        || setup_terminal(options),
        &rx,
        &mut settings,
        &bus,
        &available,
        options,
    );

    poller.stop();
    bus.unsubscribe(follow_plan);
    monitor.shutdown();

    if let Err(err) = disable_raw_mode() {
        log::warn!("could not disable raw mode: {}", err);
    }
    execute!(stdout(), LeaveAlternateScreen, Show)?;
    result
}

fn setup_terminal(options: &Options) -> Result<Terminal<Backend>, BoxError> {
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    if !options.no_raw_mode {
        enable_raw_mode()?;
    }
    Ok(Terminal::new(TuiBackend::new(out))?)
}

/// Sets the terminal up and handles events until the user quits. Every error, setup included,
/// is returned so the caller can restore the terminal.
fn event_loop<B: tui::backend::Backend>(
    setup: impl FnOnce() -> Result<Terminal<B>, BoxError>,
    rx: &Receiver<Event>,
    settings: &mut Settings,
    bus: &SettingsBus,
    available: &[Sensor],
    options: &Options,
) -> Result<(), BoxError> {
    let mut terminal = setup()?;

    let mut readings = Vec::new();
    loop {
        match rx.recv() {
            Ok(Event::Readings(latest)) => readings = latest,
            Ok(Event::Input(key)) => match input::handle_key(key, settings, available) {
                Action::Quit => return Ok(()),
                Action::Change(change) => {
                    if let Err(err) = bus.apply(settings, change) {
                        log::warn!("rejected settings change: {}", err);
                    }
                }
                Action::None => continue,
            },
            Ok(Event::Quit) | Err(_) => return Ok(()),
        }

        render(&mut terminal, settings, &readings, options)?;
    }
}

fn main() -> Result<(), BoxError> {
    let mut options = parse_options()?;

    let log_level = if options.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let path = Settings::path();
    let mut settings = Settings::load_from(&path)?;
    let bus = SettingsBus::new();
    for change in std::mem::take(&mut options.changes) {
        bus.apply(&mut settings, change)?;
    }
    if options.save {
        settings.save_to(&path)?;
        log::info!("saved settings to {}", path.display());
    }

    let monitor = match Monitor::initialize() {
        Ok(monitor) => Arc::new(monitor),
        Err(err) => {
            eprintln!("error: could not connect to the SMC: {}", err);
            exit!(1);
        }
    };

    if options.list {
        list_sensors(&monitor);
        monitor.shutdown();
        return Ok(());
    }

    if options.once {
        let readings = poller::poll(&monitor, &settings.visible_slots());
        println!("{}", display::status_line(&readings, settings.unit));
        monitor.shutdown();
        return Ok(());
    }

    run(monitor, settings, bus, path, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Duration;
    use tempbar_core::SensorKey;
    use tui::backend::TestBackend;

    fn options() -> Options {
        Options {
            critical: 90.0,
            no_raw_mode: true,
            list: false,
            once: false,
            save: false,
            verbose: false,
            changes: Vec::new(),
        }
    }

    fn press(code: KeyCode) -> Event {
        Event::Input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_parse_slot() {
        assert_eq!(
            parse_slot("2=TG0P").unwrap(),
            Change::Slot {
                index: 1,
                key: Some("TG0P".to_string())
            }
        );
        assert_eq!(
            parse_slot("1=").unwrap(),
            Change::Slot {
                index: 0,
                key: None
            }
        );
        assert!(parse_slot("0=TC0P").is_err());
        assert!(parse_slot("TC0P").is_err());
    }

    #[test]
    fn test_plan_follows_layout() {
        let settings = Settings {
            layout: Layout::Dual,
            interval_secs: 0.25,
            ..Default::default()
        };
        let plan = plan_for(&settings);

        assert_eq!(plan.slots.len(), 2);
        assert_eq!(plan.slots[0], SensorKey::parse("TC0P"));
        assert_eq!(plan.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_setup_failure_is_returned() {
        let (tx, rx) = channel();
        tx.send(press(KeyCode::Char('u'))).unwrap();
        let mut settings = Settings::default();

        let result = event_loop(
            || Err::<Terminal<TestBackend>, BoxError>("no terminal".into()),
            &rx,
            &mut settings,
            &SettingsBus::new(),
            &[],
            &options(),
        );

        assert_eq!(result.unwrap_err().to_string(), "no terminal");
        // nothing was consumed or applied
        assert_eq!(settings.unit, Unit::Celsius);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_event_loop_applies_input_until_quit() {
        let (tx, rx) = channel();
        tx.send(Event::Readings(vec![SlotReading {
            slot: 0,
            key: SensorKey::parse("TC0P"),
            reading: Reading::Value(44.0),
        }]))
        .unwrap();
        tx.send(press(KeyCode::Char('u'))).unwrap();
        tx.send(press(KeyCode::Esc)).unwrap();
        tx.send(press(KeyCode::Char('l'))).unwrap();
        let mut settings = Settings::default();

        event_loop(
            || Ok(Terminal::new(TestBackend::new(60, 8))?),
            &rx,
            &mut settings,
            &SettingsBus::new(),
            &[],
            &options(),
        )
        .unwrap();

        assert_eq!(settings.unit, Unit::Fahrenheit);
        assert_eq!(settings.layout, Layout::Single);
    }
}
