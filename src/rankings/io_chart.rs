use plotters::prelude::*;
use std::path::Path;

use crate::rankings::*;

const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);
const X_DESC: &str = "Average Rank (Lower is Better)";

// Layout, in pixels.
const WIDTH: u32 = 1000;
const MIN_HEIGHT: u32 = 800;
const BAR_HEIGHT: u32 = 36;
const CHAR_WIDTH: u32 = 9;

/// Draws one horizontal bar per course, the best course on top.
pub fn render_chart(path: &Path, title: &str, courses: &[CourseRank]) -> RankingsResult<()> {
    let path_s = path.display().to_string();
    ensure_whatever!(
        !courses.is_empty(),
        "No course to draw in chart {}",
        path_s
    );
    draw(path, title, courses).map_err(|e| RankingsError::ChartRender {
        path: path_s,
        message: e.to_string(),
    })
}

// Courses are stacked from the top: the first course sits in the highest slot.
fn slot_of(n: usize, idx: usize) -> usize {
    n - 1 - idx
}

fn course_label(courses: &[CourseRank], v: &SegmentValue<usize>) -> String {
    let n = courses.len();
    match v {
        SegmentValue::CenterOf(slot) | SegmentValue::Exact(slot) if *slot < n => {
            courses[slot_of(n, *slot)].course.clone()
        }
        _ => "".to_string(),
    }
}

fn draw(
    path: &Path,
    title: &str,
    courses: &[CourseRank],
) -> Result<(), Box<dyn std::error::Error>> {
    let n = courses.len();
    let x_max = courses
        .iter()
        .map(|c| c.average_rank)
        .fold(1.0, f64::max)
        .ceil()
        + 0.5;
    let label_width = courses
        .iter()
        .map(|c| c.course.chars().count() as u32)
        .max()
        .unwrap_or(0)
        * CHAR_WIDTH
        + 20;
    let height = MIN_HEIGHT.max(BAR_HEIGHT * n as u32 + 200);

    let root = BitMapBackend::new(path, (WIDTH + label_width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(label_width)
        .build_cartesian_2d(0f64..x_max, (0usize..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n + 1)
        .y_label_formatter(&|v| course_label(courses, v))
        .x_desc(X_DESC)
        .axis_desc_style(("sans-serif", 18))
        .draw()?;

    chart.draw_series(courses.iter().enumerate().map(|(idx, c)| {
        let slot = slot_of(n, idx);
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(slot)),
                (c.average_rank, SegmentValue::Exact(slot + 1)),
            ],
            BAR_COLOR.filled(),
        )
    }))?;

    root.present()?;
    debug!("render_chart: {} bars drawn in {:?}", n, path);
    Ok(())
}
