use std::collections::VecDeque;

use ratatui::{prelude::*, style::Stylize, widgets::*};

use crate::viz::Update;

/// Episodes averaged into the trend line
const TREND_WINDOW: usize = 100;

/// A scatter of one metric per episode with a moving average on top
pub struct Plot {
    title: &'static str,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    data: Vec<(f64, f64)>,
    trend: Vec<(f64, f64)>,
    window: VecDeque<f64>,
    window_sum: f64,
}

impl Plot {
    pub fn new(title: &'static str, episodes: u32) -> Self {
        Self {
            title,
            x_bounds: [0.0, episodes.max(1) as f64],
            y_bounds: [f64::MAX, f64::MIN],
            data: Vec::new(),
            trend: Vec::new(),
            window: VecDeque::with_capacity(TREND_WINDOW),
            window_sum: 0.0,
        }
    }

    pub fn update(&mut self, point: (f64, f64)) {
        let (x, y) = point;
        self.x_bounds[0] = self.x_bounds[0].min(x);
        self.x_bounds[1] = self.x_bounds[1].max(x);
        self.y_bounds[0] = self.y_bounds[0].min(y);
        self.y_bounds[1] = self.y_bounds[1].max(y);

        if self.window.len() == TREND_WINDOW {
            self.window_sum -= self.window.pop_front().unwrap_or_default();
        }
        self.window.push_back(y);
        self.window_sum += y;

        self.data.push(point);
        self.trend.push((x, self.window_sum / self.window.len() as f64));
    }

    /// Last moving average, if any data arrived
    pub fn trend(&self) -> Option<f64> {
        self.trend.last().map(|&(_, y)| y)
    }

    fn y_bounds(&self) -> [f64; 2] {
        match self.y_bounds {
            [lo, hi] if lo > hi => [0.0, 1.0],
            [lo, hi] if lo == hi => [lo - 1.0, hi + 1.0],
            bounds => bounds,
        }
    }
}

fn labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|x| format!("{x:.1}").bold())
        .collect()
}

impl Widget for &Plot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scatter = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .cyan()
            .data(&self.data);

        let trend = Dataset::default()
            .name(format!("mean of last {TREND_WINDOW}"))
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .light_yellow()
            .data(&self.trend);

        let y_bounds = self.y_bounds();
        let x_axis = Axis::default()
            .title("Episode")
            .dark_gray()
            .labels(labels(self.x_bounds))
            .bounds(self.x_bounds);

        let y_axis = Axis::default()
            .title(self.title)
            .dark_gray()
            .labels(labels(y_bounds))
            .bounds(y_bounds);

        let title = match self.trend() {
            Some(avg) => format!("{} (avg {avg:.2})", self.title),
            None => self.title.to_string(),
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title)
            .padding(Padding::uniform(2));

        Chart::new(vec![scatter, trend])
            .block(block)
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}

/// One plot per reported metric, cycled with the arrow keys
pub struct Plots {
    names: Vec<&'static str>,
    plots: Vec<Plot>,
    selected: usize,
}

impl Plots {
    pub fn new(names: Vec<&'static str>, episodes: u32) -> Self {
        let plots = names.iter().map(|&k| Plot::new(k, episodes)).collect();
        Self {
            names,
            plots,
            selected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn next_plot(&mut self) {
        if !self.is_empty() {
            self.selected = (self.selected + 1) % self.len();
        }
    }

    pub fn prev_plot(&mut self) {
        if !self.is_empty() {
            let len = self.len();
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn update(&mut self, update: Update) {
        let Update { episode, data } = update;
        for (plot, metric) in self.plots.iter_mut().zip(data) {
            plot.update((episode as f64, metric));
        }
    }
}

impl Widget for &Plots {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, plot_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(self.names.iter().copied())
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        if let Some(plot) = self.plots.get(self.selected) {
            plot.render(plot_area, buf);
        }
    }
}
