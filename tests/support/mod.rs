//! Shared fixtures for integration tests: encoded image bodies and HTTP mocks.

#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Encodes a small solid-color image in `format`.
pub fn image_bytes(format: ImageFormat, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb(color));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format)
        .expect("failed to encode test image");
    cursor.into_inner()
}

pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    image_bytes(ImageFormat::Png, color)
}

pub fn bmp_bytes() -> Vec<u8> {
    image_bytes(ImageFormat::Bmp, [0, 120, 255])
}

pub fn avif_bytes() -> Vec<u8> {
    image_bytes(ImageFormat::Avif, [250, 200, 0])
}

/// Mounts `GET path_str` returning `status` with `body`.
pub async fn mount_body(server: &MockServer, path_str: &str, status: u16, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Mounts `GET path_str` returning an empty response with `status`.
pub async fn mount_status(server: &MockServer, path_str: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Lists file names in `dir`, sorted.
pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("failed to read output dir")
        .map(|entry| {
            entry
                .expect("failed to read dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
