use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, Point},
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb888,
    primitives::{Primitive, PrimitiveStyle},
    text::{Baseline, Text},
    Drawable, Pixel,
};

use crate::types::DrawCommand;

const DASH_ON: u32 = 2;
const DASH_PERIOD: u32 = 4;
const LABEL_OFFSET_X: i32 = 2;

/// Paints a frame's commands onto any `Rgb888` draw target, in order.
pub fn draw_commands<D>(target: &mut D, commands: &[DrawCommand]) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    for command in commands {
        match command {
            DrawCommand::Clear(color) => target.clear(*color)?,
            DrawCommand::Fill { area, color, .. } => {
                area.into_styled(PrimitiveStyle::with_fill(*color)).draw(target)?;
            }
            DrawCommand::Gridline {
                x,
                label,
                line_color,
                label_color,
            } => draw_gridline(target, *x, label, *line_color, *label_color)?,
        }
    }
    Ok(())
}

/// Dashed full-height line with its label along the bottom edge.
fn draw_gridline<D>(
    target: &mut D,
    x: i32,
    label: &str,
    line_color: Rgb888,
    label_color: Rgb888,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let bounds = target.bounding_box();
    let top = bounds.top_left.y;
    let height = bounds.size.height;

    let dashes = (0..height)
        .filter(|y| y % DASH_PERIOD < DASH_ON)
        .map(|y| Pixel(Point::new(x, top + y as i32), line_color));
    target.draw_iter(dashes)?;

    let baseline = Point::new(x + LABEL_OFFSET_X, top + height as i32 - 1);
    let style = MonoTextStyle::new(&FONT_6X10, label_color);
    Text::with_baseline(label, baseline, style, Baseline::Bottom).draw(target)?;
    Ok(())
}
