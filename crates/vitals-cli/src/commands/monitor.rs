use vitals_core::{Coordinator, MonitorConfig, collectors};

pub fn run(config: &MonitorConfig, refresh: f64) {
    if !(refresh > 0.0) {
        eprintln!("refresh interval must be positive, got {refresh}");
        std::process::exit(2);
    }
    let coord = Coordinator::spawn(collectors::all_collectors(config));
    let mut app = crate::tui::app::App::new(coord, config, refresh);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
