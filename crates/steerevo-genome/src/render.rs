//! PNG rendering of a genotype's topology.
//!
//! Inputs are drawn in the left column and outputs in the right column.
//! Hidden neurons sit in between, left to right in evaluation order.
//! Synapse colour encodes sign and magnitude of the weight: green for
//! positive, red for negative, blue for recurrent connections.

use std::{
    fs::File,
    io::{self, BufWriter, Seek, Write},
    path::Path,
};

use image::{ImageFormat, Rgb, RgbImage};

use crate::genotype::{Genotype, NeuronKind};

pub const DEFAULT_WIDTH: u32 = 480;
pub const DEFAULT_HEIGHT: u32 = 320;

const MARGIN: f64 = 24.0;
const NEURON_RADIUS: f64 = 7.0;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum RenderError {
    #[display("failed to write topology image")]
    Io(io::Error),
    #[display("failed to encode topology image")]
    Encode(image::ImageError),
}

#[expect(clippy::cast_precision_loss)]
fn spread(index: usize, count: usize, start: f64, end: f64) -> f64 {
    start + (end - start) * (index as f64 + 0.5) / count.max(1) as f64
}

/// Canvas position of every neuron, by neuron index.
#[expect(clippy::cast_precision_loss)]
fn layout(genotype: &Genotype, width: f64, height: f64) -> Vec<(f64, f64)> {
    let (inputs, hidden, outputs) = genotype.topology();
    let positions = genotype.positions();
    let mut hidden_by_order = genotype.neurons_of(NeuronKind::Hidden).collect::<Vec<_>>();
    hidden_by_order.sort_by_key(|&neuron| positions[neuron]);

    let mut points = vec![(0.0, 0.0); genotype.neurons().len()];
    for (i, neuron) in genotype.neurons_of(NeuronKind::Input).enumerate() {
        points[neuron] = (MARGIN, spread(i, inputs, MARGIN, height - MARGIN));
    }
    for (i, neuron) in genotype.neurons_of(NeuronKind::Output).enumerate() {
        points[neuron] = (width - MARGIN, spread(i, outputs, MARGIN, height - MARGIN));
    }
    let column = (width - 4.0 * MARGIN) / hidden.max(1) as f64;
    for (k, &neuron) in hidden_by_order.iter().enumerate() {
        let x = 2.0 * MARGIN + column * (k as f64 + 0.5);
        // Zigzag so consecutive hidden neurons do not hide each other's synapses.
        let y = spread(k % 3, 3, MARGIN, height - MARGIN);
        points[neuron] = (x, y);
    }
    points
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn plot(image: &mut RgbImage, x: f64, y: f64, color: Rgb<u8>) {
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (x, y) = (x.round() as u32, y.round() as u32);
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_line(image: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as u32;
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps);
        plot(
            image,
            from.0 + (to.0 - from.0) * t,
            from.1 + (to.1 - from.1) * t,
            color,
        );
    }
}

fn draw_ring(image: &mut RgbImage, center: (f64, f64), radius: f64, color: Rgb<u8>) {
    for step in 0..64 {
        let angle = std::f64::consts::TAU * f64::from(step) / 64.0;
        plot(
            image,
            center.0 + radius * angle.cos(),
            center.1 + radius * angle.sin(),
            color,
        );
    }
}

fn fill_disc(image: &mut RgbImage, center: (f64, f64), radius: f64, color: Rgb<u8>) {
    let r = radius.ceil();
    let mut dy = -r;
    while dy <= r {
        let mut dx = -r;
        while dx <= r {
            if dx.hypot(dy) <= radius {
                plot(image, center.0 + dx, center.1 + dy, color);
            }
            dx += 1.0;
        }
        dy += 1.0;
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn synapse_color(weight: f64, recurrent: bool) -> Rgb<u8> {
    let strength = (weight.abs().min(2.0) / 2.0 * 175.0 + 80.0) as u8;
    match (recurrent, weight >= 0.0) {
        (true, _) => Rgb([40, 40, strength]),
        (false, true) => Rgb([30, strength, 30]),
        (false, false) => Rgb([strength, 30, 30]),
    }
}

fn neuron_color(kind: NeuronKind) -> Rgb<u8> {
    match kind {
        NeuronKind::Input => Rgb([110, 110, 110]),
        NeuronKind::Hidden => Rgb([230, 150, 30]),
        NeuronKind::Output => Rgb([120, 60, 180]),
    }
}

/// Draws the topology of `genotype` on a `width`×`height` canvas.
///
/// Zero dimensions are raised to 1.
#[must_use]
pub fn render_topology(genotype: &Genotype, width: u32, height: u32) -> RgbImage {
    let width = width.max(1);
    let height = height.max(1);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    let points = layout(genotype, f64::from(width), f64::from(height));

    for synapse in genotype.synapses() {
        let color = synapse_color(synapse.weight, synapse.recurrent);
        let (from, to) = (points[synapse.from], points[synapse.to]);
        if synapse.from == synapse.to {
            let loop_center = (from.0, from.1 - NEURON_RADIUS * 1.5);
            draw_ring(&mut image, loop_center, NEURON_RADIUS, color);
        } else {
            draw_line(&mut image, from, to, color);
        }
    }
    for (neuron, &point) in genotype.neurons().iter().zip(&points) {
        fill_disc(&mut image, point, NEURON_RADIUS, neuron_color(neuron.kind));
    }
    image
}

/// Encodes the topology of `genotype` as PNG into `writer`.
pub fn write_png<W>(genotype: &Genotype, writer: &mut W) -> Result<(), RenderError>
where
    W: Write + Seek,
{
    render_topology(genotype, DEFAULT_WIDTH, DEFAULT_HEIGHT).write_to(writer, ImageFormat::Png)?;
    Ok(())
}

/// Writes the topology of `genotype` to a PNG file, replacing any existing
/// file.
pub fn save_png<P>(genotype: &Genotype, path: P) -> Result<(), RenderError>
where
    P: AsRef<Path>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write_png(genotype, &mut writer)?;
    writer.flush()?;
    Ok(())
}
