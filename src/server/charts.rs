//! Inline SVG charts for the model log page.

use std::f64::consts::PI;

use crate::analytics::{LogSummary, MinuteBucket};

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 240.0;
const PAD: f64 = 32.0;

/// Two bars: successful extractions and extractions with corrections.
pub fn success_bar_chart(summary: &LogSummary) -> String {
    let bars = [
        ("Success", summary.successes, "bar-success"),
        ("Corrected", summary.corrections, "bar-corrected"),
    ];
    let max = bars.iter().map(|(_, v, _)| *v).max().unwrap_or(0).max(1) as f64;
    let plot_h = HEIGHT - 2.0 * PAD;
    let slot = (WIDTH - 2.0 * PAD) / bars.len() as f64;
    let bar_w = slot * 0.5;

    let mut body = String::new();
    for (i, (label, value, class)) in bars.iter().enumerate() {
        let h = *value as f64 / max * plot_h;
        let x = PAD + slot * i as f64 + (slot - bar_w) / 2.0;
        let y = HEIGHT - PAD - h;
        body.push_str(&format!(
            r#"<rect class="{}" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"><title>{}: {}</title></rect>
<text class="bar-value" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>
<text class="axis-label" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>
"#,
            class,
            x,
            y,
            bar_w,
            h,
            label,
            value,
            x + bar_w / 2.0,
            y - 4.0,
            value,
            x + bar_w / 2.0,
            HEIGHT - PAD + 16.0,
            label
        ));
    }

    svg("Success vs corrections", &format!(
        r#"<line class="axis" x1="{pad}" y1="{base:.1}" x2="{end:.1}" y2="{base:.1}"/>
{body}"#,
        pad = PAD,
        base = HEIGHT - PAD,
        end = WIDTH - PAD,
        body = body
    ))
}

/// Pie of the success distribution.
pub fn success_pie_chart(summary: &LogSummary) -> String {
    let cx = WIDTH / 2.0;
    let cy = HEIGHT / 2.0;
    let r = HEIGHT / 2.0 - PAD / 2.0;

    if summary.total == 0 {
        return svg(
            "Success distribution",
            &format!(
                r#"<circle class="pie-empty" cx="{:.1}" cy="{:.1}" r="{:.1}"/>
<text class="axis-label" x="{:.1}" y="{:.1}" text-anchor="middle">no data</text>"#,
                cx, cy, r, cx, cy
            ),
        );
    }

    // A single full slice cannot be drawn as an arc.
    if summary.successes == 0 || summary.corrections == 0 {
        let class = if summary.successes > 0 {
            "pie-success"
        } else {
            "pie-corrected"
        };
        return svg(
            "Success distribution",
            &format!(
                r#"<circle class="{}" cx="{:.1}" cy="{:.1}" r="{:.1}"><title>100.0%</title></circle>"#,
                class, cx, cy, r
            ),
        );
    }

    let fraction = summary.successes as f64 / summary.total as f64;
    let angle = fraction * 2.0 * PI;
    // Start at 12 o'clock and sweep clockwise.
    let (sx, sy) = (cx, cy - r);
    let (ex, ey) = (cx + r * angle.sin(), cy - r * angle.cos());
    let large = if fraction > 0.5 { 1 } else { 0 };

    let slices = format!(
        r#"<path class="pie-success" d="M {cx:.1} {cy:.1} L {sx:.1} {sy:.1} A {r:.1} {r:.1} 0 {large} 1 {ex:.1} {ey:.1} Z"><title>Success {sp:.1}%</title></path>
<path class="pie-corrected" d="M {cx:.1} {cy:.1} L {ex:.1} {ey:.1} A {r:.1} {r:.1} 0 {small} 1 {sx:.1} {sy:.1} Z"><title>Corrected {cp:.1}%</title></path>"#,
        cx = cx,
        cy = cy,
        sx = sx,
        sy = sy,
        ex = ex,
        ey = ey,
        r = r,
        large = large,
        small = 1 - large,
        sp = summary.success_pct(),
        cp = summary.correction_pct(),
    );
    svg("Success distribution", &slices)
}

/// Per-minute success rate as a line.
pub fn success_rate_series(buckets: &[MinuteBucket]) -> String {
    if buckets.is_empty() {
        return svg(
            "Success rate per minute",
            &format!(
                r#"<text class="axis-label" x="{:.1}" y="{:.1}" text-anchor="middle">no timestamped entries</text>"#,
                WIDTH / 2.0,
                HEIGHT / 2.0
            ),
        );
    }

    let plot_w = WIDTH - 2.0 * PAD;
    let plot_h = HEIGHT - 2.0 * PAD;
    let step = if buckets.len() > 1 {
        plot_w / (buckets.len() - 1) as f64
    } else {
        0.0
    };
    let point = |i: usize, rate: f64| {
        let x = if buckets.len() > 1 {
            PAD + step * i as f64
        } else {
            WIDTH / 2.0
        };
        (x, HEIGHT - PAD - rate * plot_h)
    };

    let mut path = String::new();
    let mut dots = String::new();
    for (i, bucket) in buckets.iter().enumerate() {
        let (x, y) = point(i, bucket.success_rate());
        path.push_str(&format!("{}{:.1},{:.1}", if i == 0 { "" } else { " " }, x, y));
        dots.push_str(&format!(
            r#"<circle class="series-dot" cx="{:.1}" cy="{:.1}" r="3"><title>{} - {:.0}% of {}</title></circle>
"#,
            x,
            y,
            bucket.minute.format("%Y-%m-%d %H:%M"),
            bucket.success_rate() * 100.0,
            bucket.total
        ));
    }

    let first = buckets[0].minute.format("%H:%M");
    let last = buckets[buckets.len() - 1].minute.format("%H:%M");

    svg(
        "Success rate per minute",
        &format!(
            r#"<line class="axis" x1="{pad}" y1="{base:.1}" x2="{end:.1}" y2="{base:.1}"/>
<line class="axis" x1="{pad}" y1="{pad}" x2="{pad}" y2="{base:.1}"/>
<text class="axis-label" x="{lx:.1}" y="{ty:.1}" text-anchor="end">100%</text>
<text class="axis-label" x="{lx:.1}" y="{base:.1}" text-anchor="end">0%</text>
<polyline class="series-line" points="{path}"/>
{dots}<text class="axis-label" x="{pad}" y="{below:.1}">{first}</text>
<text class="axis-label" x="{end:.1}" y="{below:.1}" text-anchor="end">{last}</text>"#,
            pad = PAD,
            base = HEIGHT - PAD,
            end = WIDTH - PAD,
            lx = PAD - 4.0,
            ty = PAD + 4.0,
            below = HEIGHT - PAD + 16.0,
            path = path,
            dots = dots,
            first = first,
            last = last
        ),
    )
}

fn svg(title: &str, body: &str) -> String {
    format!(
        r#"<svg class="chart" viewBox="0 0 {} {}" role="img" aria-label="{}">
<title>{}</title>
{}
</svg>"#,
        WIDTH, HEIGHT, title, title, body
    )
}
