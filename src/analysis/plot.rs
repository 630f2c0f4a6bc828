use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::analysis::band_power::PowerSeries;
use crate::analysis::bands::BandRegistry;
use crate::analysis::compare::BandComparison;
use crate::analysis::dfa::DfaResult;
use crate::analysis::error::AnalysisError;
use crate::analysis::spikes::SpikeEvent;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub foreground: RGBColor,
    pub accent: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            foreground: WHITE,
            accent: RGBColor(0x42, 0xa5, 0xf5),
        }
    }
}
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        (0.0, 1.0)
    } else if (hi - lo).abs() < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        let pad = 0.05 * (hi - lo);
        (lo - pad, hi + pad)
    }
}
/// Band power over time, with spike markers and the threshold line when given.
pub fn render_power_series_png(
    series: &PowerSeries,
    spikes: &[SpikeEvent],
    threshold: Option<f64>,
    title: &str,
    style: PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    if series.is_empty() {
        return Err(AnalysisError::Plot("power series has no windows".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let accent = style.accent;
        let x = bounds(series.times.iter().copied());
        let y = bounds(series.powers.iter().copied().chain(threshold));
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(title, ("sans-serif", 20).into_font().color(&style.foreground))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x.0..x.1, y.0..y.1)?;
        chart
            .configure_mesh()
            .x_desc("time (s)")
            .y_desc("power (µV²)")
            .label_style(("sans-serif", 12).into_font().color(&style.foreground))
            .light_line_style(&style.foreground.mix(0.1))
            .draw()?;
        chart
            .draw_series(LineSeries::new(series.iter(), &accent))?
            .label("band power")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], accent));
        if let Some(level) = threshold {
            chart
                .draw_series(LineSeries::new(vec![(x.0, level), (x.1, level)], &YELLOW))?
                .label("threshold")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], YELLOW));
        }
        if !spikes.is_empty() {
            chart
                .draw_series(PointSeries::of_element(
                    spikes.iter().map(|s| (s.time_seconds, s.power)),
                    4,
                    RED.filled(),
                    &|coord, size, marker| EmptyElement::at(coord) + Circle::new((0, 0), size, marker),
                ))?
                .label("spikes")
                .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));
        }
        chart
            .configure_series_labels()
            .label_font(("sans-serif", 12).into_font().color(&style.foreground))
            .border_style(&style.foreground.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Normalized band series overlaid on one axis, drawn in each band's own color.
pub fn render_band_comparison_png(
    comparison: &BandComparison,
    registry: &BandRegistry,
    style: PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    if comparison.bands.is_empty() || comparison.times.is_empty() {
        return Err(AnalysisError::Plot("comparison has no bands".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let x = bounds(comparison.times.iter().copied());
        let y = bounds(comparison.bands.iter().flat_map(|b| b.values.iter().copied()));
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                "Band Power Comparison",
                ("sans-serif", 20).into_font().color(&style.foreground),
            )
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x.0..x.1, y.0..y.1)?;
        chart
            .configure_mesh()
            .x_desc("time (s)")
            .y_desc("normalized power")
            .label_style(("sans-serif", 12).into_font().color(&style.foreground))
            .light_line_style(&style.foreground.mix(0.1))
            .draw()?;
        for band in &comparison.bands {
            let (r, g, b) = registry.resolve(&band.name).rgb();
            let color = RGBColor(r, g, b);
            let points = comparison.times.iter().copied().zip(band.values.iter().copied());
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(band.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
        chart
            .configure_series_labels()
            .label_font(("sans-serif", 12).into_font().color(&style.foreground))
            .border_style(&style.foreground.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// log10 F(s) against log10 s with the fitted line.
pub fn render_dfa_png(result: &DfaResult, style: PlotStyle) -> Result<Vec<u8>, AnalysisError> {
    if result.scales.is_empty() {
        return Err(AnalysisError::Plot("DFA result has no valid scales".into()));
    }
    let points: Vec<(f64, f64)> = result
        .scales
        .iter()
        .zip(&result.fluctuations)
        .map(|(&s, f)| ((s as f64).log10(), f.log10()))
        .collect();
    let fitted: Vec<(f64, f64)> = result
        .fitted_line()
        .into_iter()
        .map(|(s, f)| (s.log10(), f.log10()))
        .collect();
    let title = if result.is_valid() {
        format!("DFA  alpha = {:.3} ({})", result.alpha, result.regime().description())
    } else {
        "DFA  alpha = NaN".to_string()
    };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let x = bounds(points.iter().map(|p| p.0));
        let y = bounds(points.iter().chain(&fitted).map(|p| p.1));
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(title, ("sans-serif", 20).into_font().color(&style.foreground))
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x.0..x.1, y.0..y.1)?;
        chart
            .configure_mesh()
            .x_desc("log10 scale (samples)")
            .y_desc("log10 F(s)")
            .label_style(("sans-serif", 12).into_font().color(&style.foreground))
            .light_line_style(&style.foreground.mix(0.1))
            .draw()?;
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 4, style.accent.filled())),
        )?;
        if !fitted.is_empty() {
            chart.draw_series(LineSeries::new(fitted, &RED))?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, AnalysisError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| AnalysisError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
