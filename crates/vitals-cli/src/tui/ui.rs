//! TUI rendering — tabbed dashboard over the newest snapshots.
//!
//! ┌──────────────────────────────────────────────┐
//! │  ♥ vitals    up 00:04:12    5/5 healthy      │
//! ├──────────────────────────────────────────────┤
//! │  [Overview] Processes  Storage  Logs         │
//! ├───────────────────────┬──────────────────────┤
//! │  CPU  total 43.2%     │  Memory              │
//! │  core-0 ▓▓▓▓░░ 38%    │  used  6.2/16 GiB    │
//! │  core-1 ▓▓▓▓▓░ 51%    │  ▓▓▓▓▓▓░░░░ 39%      │
//! │  load 1m 1.82 (45%)   │  swap  0.1/2 GiB     │
//! ├───────────────────────┴──────────────────────┤
//! │  tab: panel   p: pause   s: save   q: quit   │
//! └──────────────────────────────────────────────┘

use ratatui::{prelude::*, widgets::*};

use vitals_core::{
    LogLevel, Severity, Snapshot, SnapshotData,
};

use super::app::{App, Panel};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(1), // tabs
            Constraint::Min(10),   // panel
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_tabs(f, rows[1], app);
    match app.panel {
        Panel::Overview => draw_overview(f, rows[2], app),
        Panel::Processes => draw_processes(f, rows[2], app),
        Panel::Storage => draw_storage(f, rows[2], app),
        Panel::Logs => draw_logs(f, rows[2], app),
    }
    draw_keys(f, rows[3], app);

    if app.show_health {
        draw_health_overlay(f, app);
    }
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let up = app.started.elapsed().as_secs();
    let uptime = format!("{:02}:{:02}:{:02}", up / 3600, (up / 60) % 60, up % 60);
    let health = &app.health;
    let health_style = if health.healthy == health.total {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red).bold()
    };
    let paused = if app.paused { "  ⏸ paused" } else { "" };
    let note = app
        .export_note
        .as_deref()
        .map(|n| format!("  {n}"))
        .unwrap_or_default();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" ♥ vitals ", Style::default().bold().fg(Color::Cyan)),
            Span::raw(format!("  up {uptime}  ")),
            Span::styled(
                format!("{}/{} collectors healthy", health.healthy, health.total),
                health_style,
            ),
            Span::styled(paused, Style::default().fg(Color::Yellow)),
            Span::styled(note, Style::default().fg(Color::DarkGray)),
        ]));
    f.render_widget(block, area);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
    let titles = [
        Panel::Overview,
        Panel::Processes,
        Panel::Storage,
        Panel::Logs,
    ];
    let spans: Vec<Span> = titles
        .iter()
        .flat_map(|p| {
            let style = if *p == app.panel {
                Style::default().bold().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [Span::styled(format!(" {} ", p.label()), style), Span::raw(" ")]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Overview: CPU + memory
// ---------------------------------------------------------------------------

fn draw_overview(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    draw_cpu(f, cols[0], app);
    draw_memory(f, cols[1], app);
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Normal => Style::default().fg(Color::Green),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Critical => Style::default().fg(Color::Red).bold(),
    }
}

fn meter(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "▓".repeat(filled), "░".repeat(width - filled))
}

fn draw_cpu(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" CPU ");
    let Some(snap) = &app.cpu else {
        f.render_widget(waiting("waiting for cpu collector").block(block), area);
        return;
    };
    let SnapshotData::Cpu(cpu) = &snap.data else {
        return;
    };

    let mut lines = Vec::new();
    if let Some(model) = &cpu.model_name {
        lines.push(Line::from(Span::styled(
            format!("{model}  ({} cores)", cpu.core_count),
            Style::default().fg(Color::DarkGray),
        )));
    }

    for metric in &cpu.usage {
        let style = severity_style(metric.severity);
        let label = if metric.entity_id == "total" {
            "total ".to_string()
        } else {
            // "core-3" renders as "  #3  "
            format!("  #{:<3}", metric.entity_id.trim_start_matches("core-"))
        };
        lines.push(Line::from(vec![
            Span::raw(label),
            Span::styled(meter(metric.value, 24), style),
            Span::styled(format!(" {:5.1}%", metric.value), style),
        ]));
    }

    if let (Some(l1), Some(l5), Some(l15)) = (cpu.load_1m, cpu.load_5m, cpu.load_15m) {
        let percent = cpu
            .load_1m_percent
            .map(|p| format!(" ({p:.0}% of cores)"))
            .unwrap_or_default();
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "load  {l1:.2}  {l5:.2}  {l15:.2}{percent}"
        )));
    }
    if let Some(freq) = &cpu.frequency_avg {
        lines.push(Line::from(format!("freq  {:.0} {} avg", freq.value, freq.unit)));
    }
    push_issues(&mut lines, snap);

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_memory(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" Memory ");
    let Some(snap) = &app.memory else {
        f.render_widget(waiting("waiting for memory collector").block(block), area);
        return;
    };
    let SnapshotData::Memory(mem) = &snap.data else {
        return;
    };

    let fmt = crate::commands::format_bytes;
    let mut lines = vec![Line::from(format!(
        "used      {} / {}",
        fmt(mem.used),
        fmt(mem.total)
    ))];
    if let Some(metric) = &mem.used_percent {
        let style = severity_style(metric.severity);
        lines.push(Line::from(vec![
            Span::styled(meter(metric.value, 28), style),
            Span::styled(format!(" {:5.1}%", metric.value), style),
        ]));
    }
    lines.push(Line::from(format!("available {}", fmt(mem.available))));
    lines.push(Line::from(format!(
        "buff/cache {}",
        fmt(mem.buffers + mem.cached)
    )));
    lines.push(Line::from(""));
    if mem.swap_total > 0 {
        lines.push(Line::from(format!(
            "swap      {} / {}",
            fmt(mem.swap_used),
            fmt(mem.swap_total)
        )));
        if let Some(metric) = &mem.swap_used_percent {
            let style = severity_style(metric.severity);
            lines.push(Line::from(vec![
                Span::styled(meter(metric.value, 28), style),
                Span::styled(format!(" {:5.1}%", metric.value), style),
            ]));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "no swap configured",
            Style::default().fg(Color::DarkGray),
        )));
    }
    push_issues(&mut lines, snap);

    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ---------------------------------------------------------------------------
// Processes
// ---------------------------------------------------------------------------

fn draw_processes(f: &mut Frame, area: Rect, app: &App) {
    let Some(snap) = &app.processes else {
        let block = Block::default().borders(Borders::ALL).title(" Processes ");
        f.render_widget(waiting("waiting for process collector").block(block), area);
        return;
    };
    let SnapshotData::Processes(procs) = &snap.data else {
        return;
    };

    let title = format!(
        " Processes — {} total, {} running, {} sleeping, {} stopped (CPU%: 1 core = 100) ",
        procs.total_processes, procs.running, procs.sleeping, procs.stopped
    );

    let rows: Vec<Row> = procs
        .rows
        .iter()
        .map(|p| {
            let cpu = p
                .cpu_percent
                .map(|c| format!("{c:5.1}"))
                .unwrap_or_else(|| "    —".to_string());
            let style = match p.cpu_percent {
                Some(c) if c >= app.cpu_critical => Style::default().fg(Color::Red),
                Some(c) if c >= app.cpu_warning => Style::default().fg(Color::Yellow),
                _ => Style::default(),
            };
            Row::new(vec![
                p.pid.to_string(),
                p.state.to_string(),
                cpu,
                format!("{:5.1}", p.memory_percent),
                crate::commands::format_bytes(p.memory_virtual),
                crate::commands::format_bytes(p.memory_rss),
                p.threads.to_string(),
                if p.cmdline.is_empty() {
                    format!("[{}]", p.name)
                } else {
                    p.cmdline.clone()
                },
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),  // pid
            Constraint::Length(2),  // state
            Constraint::Length(6),  // cpu%
            Constraint::Length(6),  // mem%
            Constraint::Length(10), // virt
            Constraint::Length(10), // rss
            Constraint::Length(5),  // threads
            Constraint::Min(20),    // command
        ],
    )
    .header(
        Row::new(vec!["PID", "S", "CPU%", "MEM%", "VIRT", "RSS", "THR", "COMMAND"])
            .style(Style::default().bold().fg(Color::Cyan)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

fn draw_storage(f: &mut Frame, area: Rect, app: &App) {
    let Some(snap) = &app.storage else {
        let block = Block::default().borders(Borders::ALL).title(" Storage ");
        f.render_widget(waiting("waiting for storage collector").block(block), area);
        return;
    };
    let SnapshotData::Storage(storage) = &snap.data else {
        return;
    };

    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let fmt = crate::commands::format_bytes;
    let fs_rows: Vec<Row> = storage
        .filesystems
        .iter()
        .map(|fs| {
            let style = if fs.used_percent >= 90.0 {
                Style::default().fg(Color::Red)
            } else if fs.used_percent >= 75.0 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                fs.mount_point.clone(),
                fs.fs_type.clone(),
                fmt(fs.total_bytes),
                fmt(fs.used_bytes),
                fmt(fs.avail_bytes),
                format!("{:5.1}%", fs.used_percent),
            ])
            .style(style)
        })
        .collect();
    let fs_table = Table::new(
        fs_rows,
        [
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["MOUNT", "TYPE", "SIZE", "USED", "AVAIL", "USE%"])
            .style(Style::default().bold().fg(Color::Cyan)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Filesystems "));
    f.render_widget(fs_table, halves[0]);

    let none = || "     —".to_string();
    let dev_rows: Vec<Row> = storage
        .devices
        .iter()
        .map(|d| {
            Row::new(vec![
                d.device.clone(),
                d.reads_per_sec.map(|v| format!("{v:6.1}")).unwrap_or_else(none),
                d.writes_per_sec.map(|v| format!("{v:6.1}")).unwrap_or_else(none),
                d.read_bytes_per_sec
                    .map(|v| format!("{}/s", fmt(v as u64)))
                    .unwrap_or_else(none),
                d.write_bytes_per_sec
                    .map(|v| format!("{}/s", fmt(v as u64)))
                    .unwrap_or_else(none),
                d.utilization_percent
                    .map(|v| format!("{v:5.1}%"))
                    .unwrap_or_else(none),
            ])
        })
        .collect();
    let dev_table = Table::new(
        dev_rows,
        [
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["DEVICE", "R/s", "W/s", "READ", "WRITE", "UTIL"])
            .style(Style::default().bold().fg(Color::Cyan)),
    );
    let dev_title = match (&storage.read_bytes_per_sec, &storage.write_bytes_per_sec) {
        (Some(r), Some(w)) => format!(
            " Devices — {}/s read, {}/s write ",
            fmt(r.value as u64),
            fmt(w.value as u64)
        ),
        _ => " Devices ".to_string(),
    };
    let dev_table = dev_table.block(Block::default().borders(Borders::ALL).title(dev_title));
    f.render_widget(dev_table, halves[1]);
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Critical => Style::default().fg(Color::Red).bold(),
        LogLevel::Error => Style::default().fg(Color::Red),
        LogLevel::Warning => Style::default().fg(Color::Yellow),
        LogLevel::Info => Style::default(),
        LogLevel::Debug => Style::default().fg(Color::DarkGray),
    }
}

fn draw_logs(f: &mut Frame, area: Rect, app: &App) {
    let Some(snap) = &app.logs else {
        let block = Block::default().borders(Borders::ALL).title(" Logs ");
        f.render_widget(waiting("waiting for log collector").block(block), area);
        return;
    };
    let SnapshotData::Logs(logs) = &snap.data else {
        return;
    };

    let title = format!(
        " Logs ({}) — {} flagged, {} crit / {} err / {} warn ",
        logs.source, logs.error_count, logs.critical, logs.error, logs.warning
    );

    let items: Vec<ListItem> = logs
        .lines
        .iter()
        .map(|line| {
            let mut spans = vec![Span::styled(
                format!("{:<8} ", line.level.to_string()),
                level_style(line.level),
            )];
            if let Some(ts) = &line.timestamp {
                spans.push(Span::styled(
                    format!("{ts} "),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::raw(line.message.clone()));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list =
        List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

// ---------------------------------------------------------------------------
// Chrome
// ---------------------------------------------------------------------------

fn draw_keys(f: &mut Frame, area: Rect, app: &App) {
    let pause = if app.paused { "p: resume" } else { "p: pause" };
    let bar = Paragraph::new(format!(
        " tab/1-4: panel   {pause}   c: collector health   s: save json   q: quit"
    ))
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

fn draw_health_overlay(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 70, 40);
    f.render_widget(Clear, area);

    let rows: Vec<Row> = app
        .health
        .collectors
        .iter()
        .map(|c| {
            let ok = if c.healthy { "✓" } else { "✗" };
            let style = if c.healthy {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            Row::new(vec![
                c.name.clone(),
                ok.to_string(),
                c.cycles.to_string(),
                c.failures.to_string(),
                c.last_cycle_secs
                    .map(|s| format!("{s:.3}s"))
                    .unwrap_or_else(|| "—".to_string()),
                if c.last_partial { "partial" } else { "" }.to_string(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["NAME", "OK", "CYCLES", "FAIL", "LAST", ""])
            .style(Style::default().bold().fg(Color::Cyan)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Collector health (c to close) "),
    );
    f.render_widget(table, area);
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn waiting(text: &str) -> Paragraph<'_> {
    Paragraph::new(text).style(Style::default().fg(Color::DarkGray))
}

fn push_issues(lines: &mut Vec<Line>, snap: &Snapshot) {
    if snap.partial {
        lines.push(Line::from(""));
        for issue in &snap.issues {
            lines.push(Line::from(Span::styled(
                format!("⚠ {issue}"),
                Style::default().fg(Color::Yellow),
            )));
        }
    }
}
