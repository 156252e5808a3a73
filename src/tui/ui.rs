use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table},
    Frame,
};
use crate::achievements::CATALOG;
use crate::commands::time_left;
use crate::models::Priority;
use crate::scoring::POINTS_PER_LEVEL;
use super::app::{App, InputMode, ViewMode, InputField};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    let into_level = app.rewards.total_points % POINTS_PER_LEVEL;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!("Taskmaster - {}", app.username)))
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(f64::from(into_level) / f64::from(POINTS_PER_LEVEL))
        .label(format!(
            "Level {} | {} pts ({}/{} to next) | {} badges",
            app.rewards.level, app.rewards.total_points, into_level, POINTS_PER_LEVEL, app.rewards.badges_earned
        ));
    f.render_widget(gauge, chunks[0]);

    match app.view_mode {
        ViewMode::Tasks => {
            let today = app.config.zone.today();

            let rows: Vec<Row> = app
                .tasks
                .iter()
                .map(|t| {
                    let style = if t.completed {
                        Style::default().fg(Color::DarkGray)
                    } else if t.date < today {
                        Style::default().fg(Color::Red)
                    } else {
                        match t.priority {
                            Priority::High => Style::default().fg(Color::Yellow),
                            Priority::Medium => Style::default().fg(Color::White),
                            Priority::Low => Style::default().fg(Color::Green),
                        }
                    };
                    let status = match (t.completed, t.completed_on_time) {
                        (true, Some(true)) => "Done",
                        (true, _) => "Late",
                        (false, _) => "Pending",
                    };

                    Row::new(vec![
                        Cell::from(t.id.to_string()),
                        Cell::from(t.title.clone()),
                        Cell::from(t.date.to_string()),
                        Cell::from(time_left(t.date, today)),
                        Cell::from(t.time.format("%H:%M").to_string()),
                        Cell::from(t.priority.to_string()),
                        Cell::from(status),
                        Cell::from(t.points_earned.to_string()),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(4),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Length(6),
            ];

            let title = if app.show_completed { "Tasks (all)" } else { "Tasks (pending)" };
            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Title", "Date", "When", "Time", "Priority", "Status", "Pts"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[1], &mut app.state);
        }
        ViewMode::Rewards => {
            let rows: Vec<Row> = CATALOG
                .iter()
                .map(|a| {
                    let unlocked = app.unlocked.contains(&a.id);
                    let style = if unlocked {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Row::new(vec![
                        Cell::from(a.id.to_string()),
                        Cell::from(a.name),
                        Cell::from(a.requirement.to_string()),
                        Cell::from(format!("{:?}", a.category)),
                        Cell::from(if unlocked { "Unlocked" } else { "Locked" }),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(4),
                Constraint::Min(18),
                Constraint::Length(12),
                Constraint::Length(16),
                Constraint::Length(10),
            ];

            let title = format!(
                "Achievements | streak {} | {} completed, {} on time",
                app.rewards.current_streak, app.rewards.tasks_completed, app.rewards.on_time_completed
            );
            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Achievement", "Requirement", "Category", "Status"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[1], &mut app.achievement_state);
        }
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => "q: Quit | a: Add | n: Title | t: Date | h: Time | p: Priority | Space: Done/Undo | c: Toggle Done | d: Del | v: Rewards",
            ViewMode::Rewards => "q: Quit | v: View Tasks",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };

    let help = match &app.message {
        Some(msg) => Paragraph::new(msg.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(help_text)),
        None => Paragraph::new(help_text)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL)),
    };

    f.render_widget(help, chunks[2]);

    // Render Input Box if needed
    match app.input_mode {
        InputMode::Editing | InputMode::Adding => {
            let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
            f.render_widget(Clear, area); // Clear the area first

            let title = match app.input_mode {
                InputMode::Adding => match app.add_state.step {
                    0 => "Add Task: Enter Title",
                    1 => "Add Task: Enter Date (YYYY-MM-DD, empty for today)",
                    2 => "Add Task: Enter Time (HH:MM)",
                    3 => "Add Task: Enter Priority (low/medium/high)",
                    _ => "Add Task",
                },
                InputMode::Editing => match app.input_field {
                    InputField::Title => "Edit Title",
                    InputField::Date => "Edit Date (YYYY-MM-DD)",
                    InputField::Time => "Edit Time (HH:MM)",
                    InputField::Priority => "Edit Priority (low/medium/high)",
                    InputField::None => "Edit",
                },
                _ => "",
            };

            let input = Paragraph::new(app.input_buffer.as_str())
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title(title));

            f.render_widget(input, area);
        }
        _ => {}
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
