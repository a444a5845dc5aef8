//! Drawing seam between game entities and the host canvas. Game code only talks to
//! `Surface`; the browser implementation lives in `web::canvas`, tests use a recorder.

/// Minimal 2D drawing surface used by targets and particles.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn clear(&mut self);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
    /// Draws centered text with the given pixel font size.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, font_px: f64, color: &str);
    /// Draws the image loaded from `src`. Returns false if it could not be drawn,
    /// in which case the caller falls back to a placeholder.
    fn draw_image(&mut self, src: &str, x: f64, y: f64, w: f64, h: f64) -> bool;
}
