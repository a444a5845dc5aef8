// Canvas 2D implementation of `Surface` plus the per-path image element cache.
use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::game::target::{ImageHandle, ImageStatus};
use crate::surface::Surface;

/// One `<img>` per image path. Load completion is written into the shared
/// `ImageHandle` status; targets poll it while rendering.
#[derive(Default)]
pub struct ImageCache {
    elements: HashMap<String, HtmlImageElement>,
}

impl ImageCache {
    pub fn ensure(&mut self, handle: &ImageHandle) {
        if self.elements.contains_key(&handle.src) {
            return;
        }
        match start_load(handle) {
            Ok(img) => {
                self.elements.insert(handle.src.clone(), img);
            }
            Err(e) => {
                log::warn!("could not create image for {}: {:?}", handle.src, e);
                handle.set_status(ImageStatus::Failed);
            }
        }
    }

    fn get(&self, src: &str) -> Option<&HtmlImageElement> {
        self.elements.get(src)
    }
}

fn start_load(handle: &ImageHandle) -> Result<HtmlImageElement, JsValue> {
    let img = HtmlImageElement::new()?;
    {
        let h = handle.clone();
        let el = img.clone();
        let onload = Closure::<dyn FnMut()>::new(move || {
            log::info!("image loaded: {} ({}x{})", h.src, el.natural_width(), el.natural_height());
            h.set_status(ImageStatus::Loaded {
                width: el.natural_width() as f64,
                height: el.natural_height() as f64,
            });
        });
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
    }
    {
        let h = handle.clone();
        let onerror = Closure::<dyn FnMut()>::new(move || {
            log::warn!("image failed to load: {}", h.src);
            h.set_status(ImageStatus::Failed);
        });
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }
    img.set_src(&handle.src);
    Ok(img)
}

pub struct CanvasSurface {
    pub canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub images: ImageCache,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        ctx.set_text_align("center");
        Ok(Self { canvas, ctx, images: ImageCache::default() })
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        // Resetting the size resets context state too.
        self.ctx.set_text_align("center");
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width(), self.height());
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.begin_path();
        self.ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU).ok();
        self.ctx.fill();
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(x, y, w, h);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font_px: f64, color: &str) {
        self.ctx.set_font(&format!("{font_px}px Arial"));
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_text(text, x, y).ok();
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, w: f64, h: f64) -> bool {
        let Some(img) = self.images.get(src) else {
            return false;
        };
        if !img.complete() || img.natural_width() == 0 {
            return false;
        }
        match self.ctx.draw_image_with_html_image_element_and_dw_and_dh(img, x, y, w, h) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("drawing {} failed: {:?}", src, e);
                false
            }
        }
    }
}
