/// Bordered frame composition and change-tracked presentation
use iced::widget::image::Handle;
use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::config::ViewerConfig;
use crate::decode::Frame;
use crate::state::session::{PresentKey, Presentation};

/// Border drawn around the displayed picture; its color says whether the
/// picture is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderStyle {
    pub width: u32,
    pub selected: [u8; 3],
    pub neutral: [u8; 3],
}

impl BorderStyle {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            width: config.border_px,
            selected: config.selected_border,
            neutral: config.neutral_border,
        }
    }

    fn color(&self, selected: bool) -> Rgba<u8> {
        let [r, g, b] = if selected { self.selected } else { self.neutral };
        Rgba([r, g, b, 255])
    }
}

/// The frame surrounded by a solid border on all four sides
pub fn compose_bordered(frame: &Frame, selected: bool, style: &BorderStyle) -> RgbaImage {
    let border = style.width;
    let mut canvas = RgbaImage::from_pixel(
        frame.width() + border * 2,
        frame.height() + border * 2,
        style.color(selected),
    );
    let inner = DynamicImage::ImageRgb8(frame.image.clone()).to_rgba8();
    imageops::replace(&mut canvas, &inner, i64::from(border), i64::from(border));
    canvas
}

/// Holds what is on screen and only rebuilds it when the presentation key
/// changes.
#[derive(Default)]
pub struct Presenter {
    last: Option<PresentKey>,
    handle: Option<Handle>,
}

impl Presenter {
    /// Returns true when the on-screen image changed.
    pub fn present(&mut self, presentation: Option<Presentation<'_>>, style: &BorderStyle) -> bool {
        let Some(presentation) = presentation else {
            let changed = self.last.is_some();
            self.last = None;
            self.handle = None;
            return changed;
        };

        if self.last.as_ref() == Some(&presentation.key) {
            return false;
        }

        let composed = compose_bordered(presentation.frame, presentation.key.selected, style);
        let (width, height) = composed.dimensions();
        self.handle = Some(Handle::from_rgba(width, height, composed.into_raw()));
        self.last = Some(presentation.key);
        true
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }
}
