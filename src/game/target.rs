// Falling word target: position, typing progress rendering and explosion state.
use std::cell::Cell;
use std::rc::Rc;

use rand::Rng;

use super::particle::Particle;
use crate::surface::Surface;

/// Load state of a target image, written by the host loader and polled at render time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageStatus {
    Loading,
    Loaded { width: f64, height: f64 },
    Failed,
}

/// Image source path plus its shared load status. Cloning shares the status cell,
/// so every target showing the same picture sees one load.
#[derive(Clone, Debug)]
pub struct ImageHandle {
    pub src: String,
    status: Rc<Cell<ImageStatus>>,
}

impl ImageHandle {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into(), status: Rc::new(Cell::new(ImageStatus::Loading)) }
    }

    pub fn status(&self) -> ImageStatus {
        self.status.get()
    }

    pub fn set_status(&self, status: ImageStatus) {
        self.status.set(status);
    }
}

/// Uppercases and folds Ё into Е so typed input and target text compare alike.
pub fn normalize(text: &str) -> String {
    text.to_uppercase()
        .chars()
        .map(|c| if c == 'Ё' { 'Е' } else { c })
        .collect()
}

pub struct Target {
    text: String,
    match_key: Vec<char>,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    image: ImageHandle,
    exploding: bool,
    particles: Vec<Particle>,
}

impl Target {
    pub fn new(text: &str, x: f64, image: ImageHandle, speed: f64) -> Self {
        let text = text.to_uppercase();
        let match_key = normalize(&text).chars().collect();
        Self { text, match_key, x, y: 0.0, speed, image, exploding: false, particles: Vec::new() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn is_exploding(&self) -> bool {
        self.exploding
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Exploded and every particle has burnt out.
    pub fn is_drained(&self) -> bool {
        self.exploding && self.particles.is_empty()
    }

    pub fn is_missed(&self, canvas_height: f64) -> bool {
        !self.exploding && self.y > canvas_height
    }

    /// Number of leading characters of `input` that match the text, stopping at
    /// the first mismatch.
    pub fn matched_prefix_len(&self, input: &str) -> usize {
        normalize(input)
            .chars()
            .zip(self.match_key.iter())
            .take_while(|(a, b)| a == *b)
            .count()
    }

    /// True if `input` is a prefix of the text (the empty input included).
    pub fn accepts(&self, input: &str) -> bool {
        let len = normalize(input).chars().count();
        len <= self.match_key.len() && self.matched_prefix_len(input) == len
    }

    pub fn is_complete(&self, input: &str) -> bool {
        normalize(input).chars().eq(self.match_key.iter().copied())
    }

    pub fn update(&mut self) {
        if self.exploding {
            for p in &mut self.particles {
                p.update();
            }
            self.particles.retain(Particle::is_alive);
        } else {
            self.y += self.speed;
        }
    }

    /// Starts the burst. Callers invoke this once per target.
    pub fn explode<R: Rng>(&mut self, count: usize, lifetime: u32, rng: &mut R) {
        self.exploding = true;
        for _ in 0..count {
            self.particles.push(Particle::new(self.x, self.y, lifetime, rng));
        }
    }

    pub fn render(&self, surface: &mut dyn Surface, input: &str) {
        if self.exploding {
            for p in &self.particles {
                p.render(surface);
            }
            return;
        }
        let image_height = self.render_image(surface);
        self.render_text(surface, input, image_height);
    }

    // Returns the height taken by the picture (or its placeholder).
    fn render_image(&self, surface: &mut dyn Surface) -> f64 {
        if let ImageStatus::Loaded { width, height } = self.image.status() {
            if width > 0.0 && height > 0.0 {
                let (w, h) = fit_image(surface.width(), width, height);
                if surface.draw_image(&self.image.src, self.x - w / 2.0, self.y - h / 2.0, w, h) {
                    return h;
                }
                self.render_placeholder(surface);
                return h;
            }
        }
        self.render_placeholder(surface)
    }

    fn render_placeholder(&self, surface: &mut dyn Surface) -> f64 {
        let size = (surface.width() * 0.25).min(100.0);
        surface.fill_rect(self.x - size / 2.0, self.y - size / 2.0, size, size, "lightgray");
        surface.fill_text("?", self.x, self.y + size * 0.1, size * 0.3, "black");
        size
    }

    fn render_text(&self, surface: &mut dyn Surface, input: &str, image_height: f64) {
        let font = text_font_size(surface.width());
        let matched = self.matched_prefix_len(input);
        let char_w = font * 0.6;
        let len = self.text.chars().count() as f64;
        let text_y = self.y + image_height / 2.0 + font + 10.0;
        for (i, ch) in self.text.chars().enumerate() {
            let color = if i < matched { "lime" } else { "white" };
            let text_x = self.x + i as f64 * char_w - len * char_w / 2.0;
            surface.fill_text(ch.encode_utf8(&mut [0; 4]), text_x, text_y, font, color);
        }
    }
}

/// Scales an image to fit a square of `min(canvas_w * 0.25, 150)` keeping its
/// aspect ratio.
pub fn fit_image(canvas_width: f64, width: f64, height: f64) -> (f64, f64) {
    let max = (canvas_width * 0.25).min(150.0);
    let scale = (max / width).min(max / height);
    (width * scale, height * scale)
}

pub fn text_font_size(canvas_width: f64) -> f64 {
    (canvas_width * 0.03).clamp(16.0, 25.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::{Op, RecordingSurface};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn target(text: &str) -> Target {
        Target::new(text, 100.0, ImageHandle::new("images/capitals/RU.png"), 0.3)
    }

    #[test]
    fn text_is_uppercased() {
        assert_eq!(target("Москва").text(), "МОСКВА");
    }

    #[test]
    fn prefix_matching_is_case_insensitive() {
        let t = target("Москва");
        assert!(t.accepts(""));
        assert!(t.accepts("мос"));
        assert!(t.accepts("МОСКВА"));
        assert!(!t.accepts("МОСКВАА"));
        assert!(!t.accepts("МА"));
        assert_eq!(t.matched_prefix_len("мосх"), 3);
        assert!(t.is_complete("москва"));
        assert!(!t.is_complete("моск"));
    }

    #[test]
    fn yo_is_folded_into_ye() {
        let t = target("Алёна");
        assert!(t.accepts("АЛЕ"));
        assert!(t.accepts("алё"));
        assert!(t.is_complete("АЛЕНА"));
        let t = target("Семенов");
        assert!(t.accepts("СЁМ"));
    }

    #[test]
    fn falls_at_its_speed_until_missed() {
        let mut t = target("Рим");
        t.update();
        t.update();
        assert!((t.y - 0.6).abs() < 1e-9);
        assert!(!t.is_missed(0.6));
        t.update();
        assert!(t.is_missed(0.6));
    }

    #[test]
    fn explode_creates_full_lifetime_particles_and_drains() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut t = target("Рим");
        t.y = 42.0;
        t.explode(20, 30, &mut rng);
        assert!(t.is_exploding());
        assert_eq!(t.particles().len(), 20);
        assert!(t.particles().iter().all(|p| p.life() == 30 && p.x == 100.0 && p.y == 42.0));
        // exploding targets stop falling
        t.update();
        assert_eq!(t.y, 42.0);
        assert!(!t.is_missed(0.0));
        for _ in 0..29 {
            t.update();
        }
        assert!(t.is_drained());
    }

    #[test]
    fn render_colors_matched_prefix() {
        let t = target("Рим");
        let mut s = RecordingSurface::new(400.0, 600.0);
        t.render(&mut s, "рв");
        let letters: Vec<_> = s.texts().into_iter().filter(|(txt, _)| txt != "?").collect();
        assert_eq!(
            letters,
            vec![
                ("Р".to_string(), "lime".to_string()),
                ("И".to_string(), "white".to_string()),
                ("М".to_string(), "white".to_string()),
            ]
        );
    }

    #[test]
    fn loading_or_failed_image_draws_placeholder() {
        let t = target("Рим");
        let mut s = RecordingSurface::new(200.0, 600.0);
        t.render(&mut s, "");
        assert!(matches!(&s.ops[0], Op::Rect { w, color, .. } if *w == 50.0 && color == "lightgray"));

        t.image().set_status(ImageStatus::Failed);
        let mut s = RecordingSurface::new(800.0, 600.0);
        t.render(&mut s, "");
        assert!(matches!(&s.ops[0], Op::Rect { w, .. } if *w == 100.0));
    }

    #[test]
    fn loaded_image_keeps_aspect_ratio() {
        let t = target("Рим");
        t.image().set_status(ImageStatus::Loaded { width: 300.0, height: 150.0 });
        let mut s = RecordingSurface::new(800.0, 600.0);
        t.render(&mut s, "");
        assert_eq!(s.ops[0], Op::Image { src: "images/capitals/RU.png".into(), w: 150.0, h: 75.0 });
        // text sits below the picture: y + 75/2 + font(24) + 10
        match &s.ops[1] {
            Op::Text { y, font, .. } => {
                assert!((font - 24.0).abs() < 1e-9);
                assert!((y - 71.5).abs() < 1e-9);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn undrawable_image_falls_back_to_placeholder() {
        let t = target("Рим");
        t.image().set_status(ImageStatus::Loaded { width: 100.0, height: 100.0 });
        let mut s = RecordingSurface::new(800.0, 600.0);
        s.images_drawable = false;
        t.render(&mut s, "");
        assert!(matches!(&s.ops[0], Op::Rect { .. }));
    }

    #[test]
    fn exploding_target_renders_only_particles() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut t = target("Рим");
        t.explode(20, 30, &mut rng);
        let mut s = RecordingSurface::new(800.0, 600.0);
        t.render(&mut s, "");
        assert_eq!(s.ops.len(), 20);
        assert!(s.ops.iter().all(|op| matches!(op, Op::Circle { .. })));
    }

    #[test]
    fn font_size_is_clamped() {
        assert_eq!(text_font_size(100.0), 16.0);
        assert!((text_font_size(700.0) - 21.0).abs() < 1e-9);
        assert_eq!(text_font_size(2000.0), 25.0);
    }
}
