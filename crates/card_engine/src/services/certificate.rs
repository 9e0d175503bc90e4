use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use crate::app::rendering::canvas::{lerp_color, line_height, wrap_text, Canvas, Rgba};
use crate::content::CardContent;

use super::atomic_io::write_atomic;

pub const CERTIFICATE_WIDTH: u32 = 800;
pub const CERTIFICATE_HEIGHT: u32 = 600;
pub const CERTIFICATE_FILE_NAME: &str = "birthday-surprise.png";

const BACKGROUND_TOP: Rgba = [255, 236, 179, 255];
const BACKGROUND_BOTTOM: Rgba = [255, 193, 94, 255];
const BORDER: Rgba = [184, 134, 11, 255];
const INNER_BORDER: Rgba = [255, 250, 230, 255];
const RIBBON: Rgba = [200, 30, 60, 255];
const SEAL: Rgba = [220, 38, 38, 255];
const SEAL_RIM: Rgba = [255, 215, 0, 255];
const TITLE: Rgba = [120, 53, 15, 255];
const BODY: Rgba = [92, 64, 51, 255];

const TEXT_MAX_CHARS: usize = 40;

/// Produces the downloadable certificate. Resolves once the file is on disk.
pub trait CertificateService {
    fn generate_and_download(&mut self) -> Result<PathBuf, CertificateError>;
}

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate rendering is not available")]
    Unavailable,
    #[error("failed to encode certificate image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write certificate {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Stand-in for hosts without a writable download location.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCertificate;

impl CertificateService for NoCertificate {
    fn generate_and_download(&mut self) -> Result<PathBuf, CertificateError> {
        Err(CertificateError::Unavailable)
    }
}

#[derive(Debug, Clone)]
pub struct PngCertificateWriter {
    output_dir: PathBuf,
    content: CardContent,
}

impl PngCertificateWriter {
    pub fn new(output_dir: &Path, content: CardContent) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            content,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(CERTIFICATE_FILE_NAME)
    }
}

impl CertificateService for PngCertificateWriter {
    fn generate_and_download(&mut self) -> Result<PathBuf, CertificateError> {
        let image = render_certificate(&self.content);
        let mut encoded = Cursor::new(Vec::new());
        image.write_to(&mut encoded, ImageFormat::Png)?;
        let bytes = encoded.into_inner();

        let path = self.output_path();
        write_atomic(&path, &bytes).map_err(|source| CertificateError::Write {
            path: path.clone(),
            source,
        })?;
        info!(
            path = %path.display(),
            bytes = bytes.len(),
            serial = %certificate_serial(&self.content),
            "certificate_written"
        );
        Ok(path)
    }
}

/// Short code printed on the certificate, stable for a given recipient and message.
pub fn certificate_serial(content: &CardContent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.recipient.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.message.as_bytes());
    let digest = hasher.finalize();
    let hex = digest[..4]
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<String>();
    format!("{}-{}", &hex[..4], &hex[4..])
}

pub fn render_certificate(content: &CardContent) -> RgbaImage {
    let mut image = RgbaImage::new(CERTIFICATE_WIDTH, CERTIFICATE_HEIGHT);
    let (width, height) = (CERTIFICATE_WIDTH as i32, CERTIFICATE_HEIGHT as i32);
    let center_x = width / 2;
    {
        let mut canvas = Canvas::new(&mut image, CERTIFICATE_WIDTH, CERTIFICATE_HEIGHT);
        canvas.vertical_gradient(BACKGROUND_TOP, BACKGROUND_BOTTOM);
        canvas.outline_rect(12, 12, width - 24, height - 24, 10, BORDER);
        canvas.outline_rect(32, 32, width - 64, height - 64, 3, INNER_BORDER);

        canvas.fill_rect(0, 118, width, 14, RIBBON);
        canvas.fill_rect(0, 136, width, 4, lerp_color(RIBBON, BACKGROUND_TOP, 0.5));

        canvas.centered_text(center_x, 64, 6, &content.certificate.title, TITLE);
        canvas.centered_text(center_x, 170, 4, &format!("For {}", content.recipient), TITLE);

        let mut y = 240;
        for line in &content.certificate.lines {
            for wrapped in wrap_text(line, TEXT_MAX_CHARS) {
                canvas.centered_text(center_x, y, 3, &wrapped, BODY);
                y += line_height(3);
            }
            y += line_height(3) / 2;
        }

        canvas.fill_circle(width - 130, height - 130, 56, SEAL_RIM);
        canvas.fill_circle(width - 130, height - 130, 48, SEAL);
        canvas.centered_text(width - 130, height - 137, 3, "100%", SEAL_RIM);

        let serial = format!("No. {}", certificate_serial(content));
        canvas.text(60, height - 80, 2, &serial, BODY);
    }
    image
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn writes_png_of_expected_size() {
        let temp = TempDir::new().expect("temp");
        let mut writer = PngCertificateWriter::new(temp.path(), CardContent::default());

        let path = writer.generate_and_download().expect("certificate");
        assert_eq!(path, temp.path().join("birthday-surprise.png"));

        let decoded = image::open(&path).expect("decode png");
        assert_eq!(decoded.width(), 800);
        assert_eq!(decoded.height(), 600);
    }

    #[test]
    fn rewriting_replaces_previous_certificate() {
        let temp = TempDir::new().expect("temp");
        let mut writer = PngCertificateWriter::new(temp.path(), CardContent::default());
        writer.generate_and_download().expect("first");
        writer.generate_and_download().expect("second");
        let files = std::fs::read_dir(temp.path()).expect("dir").count();
        assert_eq!(files, 1);
    }

    #[test]
    fn serial_depends_on_recipient() {
        let card = CardContent::default();
        let other = CardContent {
            recipient: "Alex".to_string(),
            ..card.clone()
        };
        let serial = certificate_serial(&card);
        assert_eq!(serial.len(), 9);
        assert_eq!(serial, certificate_serial(&card));
        assert_ne!(serial, certificate_serial(&other));
    }

    #[test]
    fn border_and_background_are_painted() {
        let image = render_certificate(&CardContent::default());
        assert_eq!(image.get_pixel(14, 300).0, BORDER);
        assert_eq!(image.get_pixel(2, 2).0, BACKGROUND_TOP);
    }

    #[test]
    fn unavailable_service_reports_error() {
        assert!(matches!(
            NoCertificate.generate_and_download(),
            Err(CertificateError::Unavailable)
        ));
    }
}
