//! Placing a QR code on a small monochrome display.
//!
//! The encoder only answers `is_dark`; this module decides how large each
//! module is drawn and where the symbol sits on the screen, then hands filled
//! rectangles to a [`PixelSink`].

use crate::config::DisplayConfig;
use crate::QrCode;

/// Pixel geometry of one symbol on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Edge length of a module in pixels. At least 1.
    pub module_size: usize,
    pub origin_x: usize,
    pub origin_y: usize,
    /// Modules per side of the symbol being laid out.
    pub symbol_width: usize,
}

impl Layout {
    /// Scales the symbol to the largest whole module size within
    /// `max_extent` pixels and centers it horizontally on a screen
    /// `canvas_width` pixels wide, `top` pixels from the top edge.
    ///
    ///     use upiqr::raster::Layout;
    ///
    ///     let layout = Layout::fit(29, 128, 55, 5);
    ///     assert_eq!((layout.module_size, layout.origin_x, layout.origin_y), (1, 49, 5));
    pub fn fit(symbol_width: usize, canvas_width: usize, max_extent: usize, top: usize) -> Self {
        let module_size = (max_extent / symbol_width.max(1)).max(1);
        let extent = symbol_width * module_size;
        Self {
            module_size,
            origin_x: canvas_width.saturating_sub(extent) / 2,
            origin_y: top,
            symbol_width,
        }
    }

    /// Drawn edge length of the whole symbol in pixels.
    pub fn extent(&self) -> usize {
        self.symbol_width * self.module_size
    }
}

/// Which of the two QR screens is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayProfile {
    /// Below the title, leaving room for the button hints.
    Preview,
    /// The whole screen height.
    Fullscreen,
}

impl DisplayProfile {
    pub fn layout(self, symbol_width: usize, display: &DisplayConfig) -> Layout {
        match self {
            DisplayProfile::Preview => Layout::fit(
                symbol_width,
                display.width,
                display.preview_extent,
                display.preview_top,
            ),
            DisplayProfile::Fullscreen => Layout::fit(
                symbol_width,
                display.width,
                display.fullscreen_extent,
                display.fullscreen_top,
            ),
        }
    }
}

/// Receives the filled rectangles of the dark modules.
pub trait PixelSink {
    fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize);
}

/// Draws every dark module of `code` as one square, row by row.
pub fn rasterize<S: PixelSink + ?Sized>(code: &QrCode, layout: &Layout, sink: &mut S) {
    let scale = layout.module_size;
    for y in 0..code.size() {
        for x in 0..code.size() {
            if code.is_dark(x, y) {
                sink.fill_rect(
                    layout.origin_x + x * scale,
                    layout.origin_y + y * scale,
                    scale,
                    scale,
                );
            }
        }
    }
}

/// A monochrome screen kept in memory, for showing the display on a terminal.
/// Pixels outside the screen are clipped.
#[derive(Debug, Clone)]
pub struct TextScreen {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl TextScreen {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            width: display.width,
            height: display.height,
            pixels: vec![false; display.width * display.height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Two pixel rows per text line using half block characters.
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                s.push(match (self.get(x, y), self.get(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            s.push('\n');
        }
        s
    }
}

impl PixelSink for TextScreen {
    fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize) {
        for py in y..(y + height).min(self.height) {
            for px in x..(x + width).min(self.width) {
                self.pixels[py * self.width + px] = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EcLevel, Version};

    #[derive(Default)]
    struct Recorder(Vec<(usize, usize, usize, usize)>);

    impl PixelSink for Recorder {
        fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize) {
            self.0.push((x, y, width, height));
        }
    }

    #[test]
    fn preview_and_fullscreen_geometry() {
        let display = DisplayConfig::default();
        // Version 3 on the 128x64 screen.
        assert_eq!(
            DisplayProfile::Preview.layout(29, &display),
            Layout {
                module_size: 1,
                origin_x: 49,
                origin_y: 5,
                symbol_width: 29,
            }
        );
        assert_eq!(
            DisplayProfile::Fullscreen.layout(29, &display),
            Layout {
                module_size: 2,
                origin_x: 35,
                origin_y: 0,
                symbol_width: 29,
            }
        );
        // Version 1 gets bigger modules.
        assert_eq!(DisplayProfile::Fullscreen.layout(21, &display).module_size, 3);
    }

    #[test]
    fn module_size_never_zero() {
        let layout = Layout::fit(177, 128, 64, 0);
        assert_eq!(layout.module_size, 1);
        assert_eq!(layout.origin_x, 0);
        assert_eq!(layout.extent(), 177);
    }

    #[test]
    fn one_rect_per_dark_module() {
        let code = QrCode::with_version("upi", Version::new(1).unwrap(), EcLevel::L).unwrap();
        let layout = Layout::fit(code.size(), 128, 64, 0);
        let mut recorder = Recorder::default();
        rasterize(&code, &layout, &mut recorder);

        assert_eq!(recorder.0.len(), code.dark_module_count());
        // The top-left finder corner comes first.
        assert_eq!(recorder.0[0], (layout.origin_x, 0, 3, 3));
        assert!(recorder.0.iter().all(|r| r.2 == 3 && r.3 == 3));
    }

    #[test]
    fn text_screen_lights_modules() {
        let display = DisplayConfig::default();
        let code = QrCode::with_version("upi", Version::new(1).unwrap(), EcLevel::L).unwrap();
        let layout = DisplayProfile::Fullscreen.layout(code.size(), &display);
        let mut screen = TextScreen::new(&display);
        rasterize(&code, &layout, &mut screen);

        assert_eq!(screen.lit_count(), code.dark_module_count() * 9);
        assert!(screen.get(layout.origin_x, 0));
        assert!(!screen.get(layout.origin_x - 1, 0));
        assert_eq!(screen.to_text().lines().count(), 32);
    }

    #[test]
    fn text_screen_clips() {
        let mut screen = TextScreen::new(&DisplayConfig::default());
        screen.fill_rect(126, 62, 10, 10);
        assert_eq!(screen.lit_count(), 4);
    }
}
