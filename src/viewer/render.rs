//! HTML for the log viewer: one section per run, scalar series as inline
//! SVG line charts and images in step order.
//!
//! The page comes from a single template (`assets/viewer.html`) with
//! `{{TOKEN}}` placeholders; `render_index` fills them.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::summary::{find_runs, read_events, EventValue};

const TEMPLATE: &str = include_str!("assets/viewer.html");

const CHART_W: f64 = 360.0;
const CHART_H: f64 = 180.0;
const MARGIN: f64 = 28.0;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Name of a run relative to the log directory; `.` for the root itself.
pub fn run_name(logdir: &Path, run: &Path) -> String {
    match run.strip_prefix(logdir) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        _ => ".".to_owned(),
    }
}

/// SVG line chart of `(step, value)` points.
pub fn line_chart(points: &[(u64, f64)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let (min_step, max_step) = points.iter().fold((u64::MAX, 0), |(lo, hi), &(s, _)| (lo.min(s), hi.max(s)));
    let (mut min_v, mut max_v) = points.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
    if (max_v - min_v).abs() < 1e-12 {
        min_v -= 0.5;
        max_v += 0.5;
    }
    let step_span = (max_step - min_step).max(1) as f64;

    let project = |s: u64, v: f64| {
        let x = MARGIN + (s - min_step) as f64 / step_span * (CHART_W - 2.0 * MARGIN);
        let y = CHART_H - MARGIN - (v - min_v) / (max_v - min_v) * (CHART_H - 2.0 * MARGIN);
        (x, y)
    };

    let mut svg = format!(
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\">",
        w = CHART_W, h = CHART_H
    );
    svg.push_str(&format!(
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#fff\"/>",
        CHART_W, CHART_H
    ));
    let coords: Vec<String> = points.iter()
        .map(|&(s, v)| {
            let (x, y) = project(s, v);
            format!("{:.1},{:.1}", x, y)
        })
        .collect();
    svg.push_str(&format!("<polyline points=\"{}\"/>", coords.join(" ")));
    for &(s, v) in points {
        let (x, y) = project(s, v);
        svg.push_str(&format!("<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"2.5\"/>", x, y));
    }
    svg.push_str(&format!(
        "<text x=\"2\" y=\"{:.0}\">{:.4}</text><text x=\"2\" y=\"{:.0}\">{:.4}</text>",
        MARGIN - 8.0, max_v, CHART_H - MARGIN + 12.0, min_v
    ));
    svg.push_str(&format!(
        "<text x=\"{:.0}\" y=\"{:.0}\">step {}</text><text x=\"{:.0}\" y=\"{:.0}\">step {}</text>",
        MARGIN, CHART_H - 4.0, min_step, CHART_W - MARGIN - 40.0, CHART_H - 4.0, max_step
    ));
    svg.push_str("</svg>");
    svg
}

fn render_run(logdir: &Path, run: &Path) -> Result<String> {
    let name = run_name(logdir, run);
    let mut scalars: BTreeMap<String, Vec<(u64, f64)>> = BTreeMap::new();
    let mut images: BTreeMap<String, Vec<(u64, String)>> = BTreeMap::new();

    for event in read_events(run)? {
        match event.value {
            EventValue::Scalar { value } => {
                scalars.entry(event.tag).or_default().push((event.step, value));
            }
            EventValue::Image { path, .. } => {
                images.entry(event.tag).or_default().push((event.step, path));
            }
        }
    }

    let mut html = format!("<h2>run: {}</h2>\n", escape(&name));
    if scalars.is_empty() && images.is_empty() {
        html.push_str("<p class=\"empty\">no events yet</p>\n");
    }

    if !scalars.is_empty() {
        html.push_str("<div class=\"charts\">\n");
        for (tag, mut points) in scalars {
            points.sort_by_key(|&(step, _)| step);
            html.push_str(&format!(
                "<figure>{}<figcaption>{}</figcaption></figure>\n",
                line_chart(&points),
                escape(&tag)
            ));
        }
        html.push_str("</div>\n");
    }

    for (tag, mut entries) in images {
        entries.sort_by_key(|(step, _)| *step);
        html.push_str(&format!("<h3>{}</h3>\n<div class=\"images\">\n", escape(&tag)));
        for (step, path) in entries {
            let src = if name == "." { format!("/files/{}", path) } else { format!("/files/{}/{}", name, path) };
            html.push_str(&format!(
                "<figure><img src=\"{}\" alt=\"{} step {}\"><figcaption>step {}</figcaption></figure>\n",
                escape(&src), escape(&tag), step, step
            ));
        }
        html.push_str("</div>\n");
    }
    Ok(html)
}

/// Full index page for every run under `logdir`.
pub fn render_index(logdir: &Path) -> Result<String> {
    let runs = if logdir.is_dir() { find_runs(logdir)? } else { Vec::new() };
    let body = if runs.is_empty() {
        "<p class=\"empty\">No summaries found.</p>".to_owned()
    } else {
        let mut body = String::new();
        for run in &runs {
            body.push_str(&render_run(logdir, run)?);
        }
        body
    };

    Ok(TEMPLATE
        .replace("{{TITLE}}", "fashion-nn summaries")
        .replace("{{LOG_DIR}}", &escape(&logdir.display().to_string()))
        .replace("{{RUNS}}", &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SummaryWriter;
    use image::RgbaImage;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn chart_has_one_point_per_step() {
        let svg = line_chart(&[(0, 0.9), (1, 0.5), (2, 0.4)]);
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(line_chart(&[]).is_empty());
        // A flat series must not divide by zero.
        assert!(!line_chart(&[(0, 1.0), (1, 1.0)]).contains("NaN"));
    }

    #[test]
    fn index_lists_runs_scalars_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut root = SummaryWriter::create(dir.path()).unwrap();
        root.image("training_set", 0, &RgbaImage::new(2, 2)).unwrap();
        let mut train = SummaryWriter::create(dir.path().join("train")).unwrap();
        train.scalar("epoch_loss", 0, 0.6).unwrap();
        train.scalar("epoch_loss", 1, 0.4).unwrap();

        let html = render_index(dir.path()).unwrap();
        assert!(html.contains("run: ."));
        assert!(html.contains("run: train"));
        assert!(html.contains("epoch_loss"));
        assert!(html.contains("src=\"/files/images/training_set/step_0.png\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn missing_log_dir_renders_empty_page() {
        let html = render_index(Path::new("/definitely/not/here")).unwrap();
        assert!(html.contains("No summaries found."));
    }
}
