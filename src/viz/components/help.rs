use ratatui::{prelude::*, widgets::*};

pub type Binding = (&'static str, &'static str);

const DASHBOARD: [Binding; 3] = [
    ("  q  ", "Stop watching and exit"),
    ("  h  ", "Toggle help popup"),
    (" Tab ", "Switch tabs"),
];

const PLOTS: [Binding; 1] = [("⬅ / ➡", "Switch plots")];

const LOGS: [Binding; 8] = [
    ("  s  ", "Toggle the target selector"),
    ("  f  ", "Focus on the selected target only"),
    ("⬆ / ⬇", "Switch log target"),
    ("⬅ / ➡", "Show one level less/more"),
    ("- / +", "Capture one level less/more"),
    ("PgUp ", "Enter page mode and scroll up"),
    ("PgDn ", "Scroll down in page mode"),
    (" Esc ", "Leave page mode"),
];

/// Help popup of the training dashboard for the selected tab
pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let extra: &[Binding] = match selected_tab {
        0 => &PLOTS,
        1 => &LOGS,
        _ => &[],
    };
    let bindings = DASHBOARD.iter().chain(extra).copied().collect::<Vec<_>>();
    render_bindings(area, buf, "Help", &bindings);
}

/// Centered popup listing key bindings
pub fn render_bindings(area: Rect, buf: &mut Buffer, title: &str, bindings: &[Binding]) {
    let lines = bindings
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::from(*key).light_cyan().bold(),
                Span::raw(format!(" : {action}")),
            ])
        })
        .collect::<Vec<_>>();

    let [_, center_vert, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length((lines.len() + 4) as u16),
        Constraint::Fill(1),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(60),
        Constraint::Fill(1),
    ])
    .areas(center_vert);

    Clear.render(center, buf);

    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::horizontal(1))
                .title(title.to_string()),
        )
        .wrap(Wrap { trim: false })
        .render(center, buf);
}
