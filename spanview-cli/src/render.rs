use colored::Colorize;
use spanview_protocol::filter::Input;
use spanview_protocol::span::Timestamp;
use spanview_protocol::timespan::Timespan;
use spanview_screen::{CountLevel, DetailFrame, GraphFrame, HeaderFrame, TableFrame};

const GRAPH_WIDTH: usize = 60;

fn format_time(timestamp: Timestamp) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn print_header(header: &HeaderFrame) {
    let count = match header.count.level {
        CountLevel::Normal => header.count.text.normal(),
        CountLevel::Warning => header.count.text.yellow(),
        CountLevel::Danger => header.count.text.red().bold(),
    };
    let mode = if header.live {
        "LIVE".green().bold()
    } else {
        "pinned".dimmed()
    };
    println!(
        "{} {} → {} [{}] {} spans",
        "▌".cyan(),
        format_time(header.timespan.start()),
        format_time(header.timespan.end()),
        mode,
        count
    );
}

pub fn print_filter_problems(inputs: &[Input]) {
    for input in inputs {
        if let Input::Invalid { text, error } = input {
            eprintln!("{} {}: {}", "✘ invalid predicate".red().bold(), text, error);
        }
    }
}

pub fn print_table(frame: &TableFrame) {
    if !frame.available {
        println!("{}", "no data available".yellow());
        return;
    }

    let widths: Vec<usize> = frame
        .headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            frame
                .rows
                .iter()
                .filter_map(|row| row.cells.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(&frame.headers).bold());
    for row in &frame.rows {
        let text = line(&row.cells);
        if row.selected {
            println!("{}", text.reversed());
        } else {
            println!("{}", text);
        }
    }

    if frame.has_more {
        println!("{}", "… more rows available".dimmed());
    }
}

pub fn print_graph(frame: &GraphFrame) {
    if !frame.available {
        println!("{}", "no data available".yellow());
        return;
    }

    let window = frame.timespan;
    let total = window.duration().num_milliseconds().max(1) as f64;
    let column = |timestamp: Timestamp| -> usize {
        let offset = (timestamp - window.start()).num_milliseconds() as f64 / total;
        (offset.clamp(0.0, 1.0) * (GRAPH_WIDTH - 1) as f64).round() as usize
    };

    for lane in 0..frame.lanes {
        let mut bar = vec![' '; GRAPH_WIDTH];
        for positioned in frame.spans.iter().filter(|p| p.lane == lane) {
            let start = column(positioned.span.created_at);
            let end = positioned
                .span
                .closed_at
                .map(column)
                .unwrap_or(GRAPH_WIDTH - 1);
            let mark = if frame.highlighted == Some(positioned.span.id) {
                '█'
            } else {
                '▬'
            };
            for cell in bar.iter_mut().take(end + 1).skip(start) {
                *cell = mark;
            }
        }
        println!("{:>3} │{}│", lane, bar.into_iter().collect::<String>());
    }
    print_axis(window);
}

fn print_axis(window: Timespan) {
    let start = format!("{:<width$}", format_time(window.start()), width = GRAPH_WIDTH - 17);
    println!("    {}{}", start.dimmed(), format_time(window.end()).dimmed());
}

pub fn print_detail(frame: &DetailFrame) {
    println!(
        "{} {} ({})",
        "●".cyan().bold(),
        frame.span.name.bold(),
        frame.span.id
    );
    if !frame.in_window {
        println!("  {}", "outside the current window".dimmed());
    }
    for field in &frame.fields {
        let marker = if field.in_filter { "✔" } else { " " };
        println!(
            "  {} {:<12} {}  {}",
            marker.green(),
            field.label,
            field.value,
            field.predicate.dimmed()
        );
    }
}

pub fn print_timestamp(label: &str, found: Option<Timestamp>) {
    match found {
        Some(timestamp) => println!("{} {}", label.bold(), timestamp.to_rfc3339()),
        None => println!("{} {}", label.bold(), "unavailable".yellow()),
    }
}
