// Spectrum bar widget
// Draws the reconciler's bar set, one column span per bin

use std::str::FromStr;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Block, Widget},
};

use crate::render::{BarElement, Reconciler};

/// Colour used when a bar's fill does not parse
const FALLBACK_FILL: Color = Color::Gray;

pub struct SpectrumBars<'a> {
    block: Option<Block<'a>>,
    reconciler: &'a Reconciler,
}

impl<'a> SpectrumBars<'a> {
    pub fn new(reconciler: &'a Reconciler) -> Self {
        Self {
            block: None,
            reconciler,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl<'a> Widget for SpectrumBars<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };

        if inner_area.width < 1 || inner_area.height < 1 {
            return;
        }

        let mut palette = FillCache::default();
        for bar in self.reconciler.bars() {
            let style = Style::default().fg(palette.color(&bar.fill));
            draw_bar(bar, inner_area, style, buf);
        }
    }
}

/// Fill a bar's cells, clipped to `area`
fn draw_bar(bar: &BarElement, area: Rect, style: Style, buf: &mut Buffer) {
    if bar.height == 0 || bar.x >= area.width as u32 {
        return;
    }

    let width = bar.width.max(1).min(area.width as u32 - bar.x) as u16;
    let height = bar.height.min(area.height as u32) as u16;
    let left = area.left() + bar.x as u16;

    for column in left..left + width {
        for row in 0..height {
            let y = area.bottom() - 1 - row;
            buf.get_mut(column, y)
                .set_symbol(symbols::block::FULL)
                .set_style(style);
        }
    }
}

/// Bars share one fill, so remember the last parse
#[derive(Default)]
struct FillCache {
    last: Option<(String, Color)>,
}

impl FillCache {
    fn color(&mut self, fill: &str) -> Color {
        if let Some((name, color)) = &self.last {
            if name == fill {
                return *color;
            }
        }
        let color = Color::from_str(fill).unwrap_or(FALLBACK_FILL);
        self.last = Some((fill.to_string(), color));
        color
    }
}
