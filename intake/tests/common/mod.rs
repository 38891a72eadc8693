// Shared helpers for the integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Once;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use intake::config::{Config, OcrConfig, PreprocessingConfig, SecondaryOcrConfig};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// OCR text of a cleanly photographed card.
pub const SAMPLE_KTP_TEXT: &str = "PROVINSI DKI JAKARTA
KOTA JAKARTA SELATAN
NIK : 3174051708900003
Nama : BUDI SANTOSO
Tempat/Tgl Lahir : JAKARTA, 17-08-1990
Jenis Kelamin : LAKI-LAKI Gol. Darah : O
Alamat : JL. MELATI NO. 12
RT/RW : 003/012
Kel/Desa : KEBAYORAN LAMA UTARA
Kecamatan : KEBAYORAN LAMA
Agama : ISLAM
Status Perkawinan : KAWIN
Pekerjaan : PEGAWAI SWASTA
Kewarganegaraan : WNI
Berlaku Hingga : SEUMUR HIDUP";

/// A small PNG with some structure in it.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 7 + y * 13) % 256) as u8;
        Rgb([v, 255 - v, v / 2])
    });
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    output
}

/// Config pointing both providers at a mock server.
pub fn mock_config(base_url: &str) -> Config {
    Config {
        ocr: OcrConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some(base_url.to_string()),
            timeout_secs: 5,
            deadline_secs: 30,
            ..OcrConfig::default()
        },
        secondary: Some(SecondaryOcrConfig {
            url: format!("{base_url}/ktp"),
            token: Some("backend-token".to_string()),
            timeout_secs: 5,
        }),
        preprocessing: PreprocessingConfig::default(),
    }
}
