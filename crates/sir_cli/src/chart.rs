//! Static SVG line chart of the three compartments.

use sir_core::Trajectory;
use svg::node::element::{path::Data, Line, Path, Rectangle as Rect, Text};
use svg::Document;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 60.0;

const PANEL: &str = "#dddddd";
const LEGEND_BORDER: &str = "#999999";

#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Counts are divided by this before plotting.
    pub scale: f64,
    pub x_label: String,
    pub y_label: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            scale: 1000.0,
            x_label: "Time /days".into(),
            y_label: "Count (1000s)".into(),
        }
    }
}

struct Series<'a> {
    label: &'static str,
    color: &'static str,
    values: &'a [f64],
}

fn series(trajectory: &Trajectory) -> [Series<'_>; 3] {
    [
        Series {
            label: "Susceptible",
            color: "#1f3fbf",
            values: &trajectory.susceptible,
        },
        Series {
            label: "Infected",
            color: "#bf1f1f",
            values: &trajectory.infected,
        },
        Series {
            label: "Recovered with immunity",
            color: "#1f8f2f",
            values: &trajectory.recovered,
        },
    ]
}

/// Rounds `raw` up to 1, 2 or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    let step = nice_step((max - min) / target as f64);
    let first = (min / step).ceil() as i64;
    let last = (max / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        let text = format!("{value:.3}");
        text.trim_end_matches('0').to_string()
    }
}

/// Maps (time, count) onto the plot area.
struct Frame {
    t_min: f64,
    t_max: f64,
    y_max: f64,
    scale: f64,
}

impl Frame {
    const PLOT_W: f64 = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    const PLOT_H: f64 = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    fn fit(trajectory: &Trajectory, scale: f64) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let t_min = trajectory.time.first().copied().unwrap_or(0.0);
        let mut t_max = trajectory.time.last().copied().unwrap_or(1.0);
        if t_max <= t_min {
            t_max = t_min + 1.0;
        }
        let peak = series(trajectory)
            .iter()
            .flat_map(|s| s.values.iter())
            .fold(0.0f64, |acc, v| acc.max(v / scale));
        let y_step = nice_step(peak / 5.0);
        let y_max = if peak > 0.0 {
            (peak / y_step).ceil() * y_step
        } else {
            1.0
        };
        Self {
            t_min,
            t_max,
            y_max,
            scale,
        }
    }

    fn x(&self, t: f64) -> f64 {
        MARGIN_LEFT + (t - self.t_min) / (self.t_max - self.t_min) * Self::PLOT_W
    }

    /// `scaled` is already divided by the chart scale.
    fn y_scaled(&self, scaled: f64) -> f64 {
        MARGIN_TOP + Self::PLOT_H - scaled / self.y_max * Self::PLOT_H
    }

    fn y(&self, count: f64) -> f64 {
        self.y_scaled(count / self.scale)
    }

    fn points(&self, time: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
        time.iter()
            .zip(values)
            .map(|(&t, &v)| (self.x(t), self.y(v)))
            .collect()
    }
}

fn label(x: f64, y: f64, anchor: &str, content: &str) -> Text {
    Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("text-anchor", anchor)
}

fn curve(points: &[(f64, f64)], color: &str) -> Path {
    let mut data = Data::new();
    for (idx, &(x, y)) in points.iter().enumerate() {
        let point = (x as f32, y as f32);
        data = if idx == 0 {
            data.move_to(point)
        } else {
            data.line_to(point)
        };
    }
    Path::new()
        .set("fill", "none")
        .set("stroke", color)
        .set("stroke-opacity", 0.5)
        .set("stroke-width", 2)
        .set("d", data)
}

fn rule(x1: f64, y1: f64, x2: f64, y2: f64, color: &str) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", color)
        .set("stroke-width", 1)
}

/// Draws S, I and R against time on a grey panel with a white grid.
pub fn render_svg(trajectory: &Trajectory, options: &ChartOptions) -> Document {
    let frame = Frame::fit(trajectory, options.scale);
    let bottom = MARGIN_TOP + Frame::PLOT_H;
    let right = MARGIN_LEFT + Frame::PLOT_W;

    let mut document = Document::new()
        .set("width", WIDTH)
        .set("height", HEIGHT)
        .set("viewBox", format!("0 0 {WIDTH} {HEIGHT}"))
        .set("font-family", "sans-serif")
        .set("font-size", 12)
        .add(
            Rect::new()
                .set("width", WIDTH)
                .set("height", HEIGHT)
                .set("fill", "white"),
        )
        .add(
            Rect::new()
                .set("x", MARGIN_LEFT)
                .set("y", MARGIN_TOP)
                .set("width", Frame::PLOT_W)
                .set("height", Frame::PLOT_H)
                .set("fill", PANEL),
        );

    for tick in ticks(frame.t_min, frame.t_max, 8) {
        let x = frame.x(tick);
        document = document
            .add(rule(x, MARGIN_TOP, x, bottom, "white"))
            .add(label(x, bottom + 18.0, "middle", &format_tick(tick)));
    }
    for tick in ticks(0.0, frame.y_max, 5) {
        let y = frame.y_scaled(tick);
        document = document
            .add(rule(MARGIN_LEFT, y, right, y, "white"))
            .add(label(MARGIN_LEFT - 8.0, y + 4.0, "end", &format_tick(tick)));
    }

    let curves = series(trajectory);
    for s in &curves {
        document = document.add(curve(&frame.points(&trajectory.time, s.values), s.color));
    }

    let legend_x = right - 190.0;
    let legend_y = MARGIN_TOP + 10.0;
    document = document.add(
        Rect::new()
            .set("x", legend_x)
            .set("y", legend_y)
            .set("width", 180)
            .set("height", 66)
            .set("fill", "white")
            .set("fill-opacity", 0.5)
            .set("stroke", LEGEND_BORDER),
    );
    for (idx, s) in curves.iter().enumerate() {
        let y = legend_y + 16.0 + idx as f64 * 18.0;
        document = document
            .add(
                rule(legend_x + 8.0, y, legend_x + 30.0, y, s.color)
                    .set("stroke-opacity", 0.5)
                    .set("stroke-width", 2),
            )
            .add(label(legend_x + 36.0, y + 4.0, "start", s.label));
    }

    let mid_y = MARGIN_TOP + Frame::PLOT_H / 2.0;
    document
        .add(label(
            MARGIN_LEFT + Frame::PLOT_W / 2.0,
            HEIGHT - 15.0,
            "middle",
            &options.x_label,
        ))
        .add(label(18.0, mid_y, "middle", &options.y_label).set(
            "transform",
            format!("rotate(-90 18 {mid_y})"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sir_core::SirConfig;

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(0.18), 0.2);
        assert_eq!(nice_step(17.0), 20.0);
        assert_eq!(nice_step(30.0), 50.0);
        assert_eq!(nice_step(0.0), 1.0);
    }

    #[test]
    fn ticks_cover_range() {
        assert_eq!(
            ticks(0.0, 1.0, 5),
            vec![0.0, 0.2, 0.4, 0.6000000000000001, 0.8, 1.0]
        );
        assert_eq!(
            ticks(0.0, 160.0, 8),
            vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 120.0, 140.0, 160.0]
        );
    }

    #[test]
    fn renders_three_labelled_curves() {
        let trajectory = SirConfig::default().run().unwrap();
        let svg = render_svg(&trajectory, &ChartOptions::default()).to_string();

        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 3);
        for label in [
            "Susceptible",
            "Infected",
            "Recovered with immunity",
            "Time /days",
            "Count (1000s)",
        ] {
            assert!(svg.contains(label), "missing {label}");
        }
    }

    #[test]
    fn one_vertex_per_sample() {
        let trajectory = SirConfig::default().run().unwrap();
        let frame = Frame::fit(&trajectory, 1000.0);
        for s in series(&trajectory) {
            assert_eq!(
                frame.points(&trajectory.time, s.values).len(),
                trajectory.len()
            );
        }
    }

    #[test]
    fn values_stay_inside_plot_area() {
        let trajectory = SirConfig::default().run().unwrap();
        let frame = Frame::fit(&trajectory, 1000.0);
        for s in series(&trajectory) {
            for (x, y) in frame.points(&trajectory.time, s.values) {
                assert!((MARGIN_LEFT - 0.01..=WIDTH - MARGIN_RIGHT + 0.01).contains(&x));
                assert!((MARGIN_TOP - 0.01..=HEIGHT - MARGIN_BOTTOM + 0.01).contains(&y));
            }
        }
    }
}
