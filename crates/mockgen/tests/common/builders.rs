//! Builders for test images and configurations.

#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use mockgen::config::Config;

pub const MARKER: Rgb<u8> = Rgb([255, 0, 255]);
pub const BACKGROUND: Rgb<u8> = Rgb([236, 232, 228]);

/// Builds a rendered product photo with an optional marker rectangle.
pub struct RenderBuilder {
    width: u32,
    height: u32,
    marker: Option<(u32, u32, u32, u32)>,
}

impl RenderBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            marker: None,
        }
    }

    /// Places a marker rectangle given as fractions of the image size.
    pub fn marker_fraction(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        let px = |v: f64, total: u32| (v * total as f64).round() as u32;
        self.marker = Some((
            px(x, self.width),
            px(y, self.height),
            px(width, self.width),
            px(height, self.height),
        ));
        self
    }

    pub fn png(self) -> Vec<u8> {
        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        if let Some((x0, y0, w, h)) = self.marker {
            for y in y0..(y0 + h).min(self.height) {
                for x in x0..(x0 + w).min(self.width) {
                    img.put_pixel(x, y, MARKER);
                }
            }
        }
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .expect("Failed to encode test image");
        out.into_inner()
    }
}

/// Builder for `Config` instances with test-friendly timings.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new("https://vendor.test/v1", "https://cdn.test/marker.png"),
        }
    }

    pub fn cooldown_ms(mut self, ms: u64) -> Self {
        self.config.schedule.group_cooldown_ms = ms;
        self
    }

    pub fn poll(mut self, interval_ms: u64, attempts: u32) -> Self {
        self.config.schedule.poll_interval_ms = interval_ms;
        self.config.schedule.poll_attempts = attempts;
        self
    }

    pub fn error_log_capacity(mut self, capacity: usize) -> Self {
        self.config.error_log_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
