use serde::{Deserialize, Serialize};

/// Minimum number of filled fields for an OCR reading to count as strong.
pub const STRONG_FIELD_COUNT: usize = 7;

/// The sixteen canonical KTP fields, in card order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Nik,
    NamaLengkap,
    TempatLahir,
    TanggalLahir,
    JenisKelamin,
    StatusPerkawinan,
    Agama,
    Kewarganegaraan,
    Jenispekerjaan,
    AlamatLengkap,
    Rt,
    Rw,
    DesaKelurahan,
    Kecamatan,
    Kabupaten,
    Provinsi,
}

impl IdentityField {
    pub const ALL: [IdentityField; 16] = [
        IdentityField::Nik,
        IdentityField::NamaLengkap,
        IdentityField::TempatLahir,
        IdentityField::TanggalLahir,
        IdentityField::JenisKelamin,
        IdentityField::StatusPerkawinan,
        IdentityField::Agama,
        IdentityField::Kewarganegaraan,
        IdentityField::Jenispekerjaan,
        IdentityField::AlamatLengkap,
        IdentityField::Rt,
        IdentityField::Rw,
        IdentityField::DesaKelurahan,
        IdentityField::Kecamatan,
        IdentityField::Kabupaten,
        IdentityField::Provinsi,
    ];

    /// Serialized key of the field.
    pub fn key(&self) -> &'static str {
        match self {
            IdentityField::Nik => "nik",
            IdentityField::NamaLengkap => "namaLengkap",
            IdentityField::TempatLahir => "tempatLahir",
            IdentityField::TanggalLahir => "tanggalLahir",
            IdentityField::JenisKelamin => "jenisKelamin",
            IdentityField::StatusPerkawinan => "statusPerkawinan",
            IdentityField::Agama => "agama",
            IdentityField::Kewarganegaraan => "kewarganegaraan",
            IdentityField::Jenispekerjaan => "jenispekerjaan",
            IdentityField::AlamatLengkap => "alamatLengkap",
            IdentityField::Rt => "rt",
            IdentityField::Rw => "rw",
            IdentityField::DesaKelurahan => "desaKelurahan",
            IdentityField::Kecamatan => "kecamatan",
            IdentityField::Kabupaten => "kabupaten",
            IdentityField::Provinsi => "provinsi",
        }
    }
}

impl std::fmt::Display for IdentityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Structured KTP data. Every field is either empty or a trimmed,
/// normalized value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalIdentityRecord {
    pub nik: String,
    pub nama_lengkap: String,
    pub tempat_lahir: String,
    /// ISO `yyyy-mm-dd`.
    pub tanggal_lahir: String,
    pub jenis_kelamin: String,
    pub status_perkawinan: String,
    pub agama: String,
    pub kewarganegaraan: String,
    pub jenispekerjaan: String,
    pub alamat_lengkap: String,
    pub rt: String,
    pub rw: String,
    pub desa_kelurahan: String,
    pub kecamatan: String,
    pub kabupaten: String,
    pub provinsi: String,
}

impl CanonicalIdentityRecord {
    pub fn get(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::Nik => &self.nik,
            IdentityField::NamaLengkap => &self.nama_lengkap,
            IdentityField::TempatLahir => &self.tempat_lahir,
            IdentityField::TanggalLahir => &self.tanggal_lahir,
            IdentityField::JenisKelamin => &self.jenis_kelamin,
            IdentityField::StatusPerkawinan => &self.status_perkawinan,
            IdentityField::Agama => &self.agama,
            IdentityField::Kewarganegaraan => &self.kewarganegaraan,
            IdentityField::Jenispekerjaan => &self.jenispekerjaan,
            IdentityField::AlamatLengkap => &self.alamat_lengkap,
            IdentityField::Rt => &self.rt,
            IdentityField::Rw => &self.rw,
            IdentityField::DesaKelurahan => &self.desa_kelurahan,
            IdentityField::Kecamatan => &self.kecamatan,
            IdentityField::Kabupaten => &self.kabupaten,
            IdentityField::Provinsi => &self.provinsi,
        }
    }

    fn slot(&mut self, field: IdentityField) -> &mut String {
        match field {
            IdentityField::Nik => &mut self.nik,
            IdentityField::NamaLengkap => &mut self.nama_lengkap,
            IdentityField::TempatLahir => &mut self.tempat_lahir,
            IdentityField::TanggalLahir => &mut self.tanggal_lahir,
            IdentityField::JenisKelamin => &mut self.jenis_kelamin,
            IdentityField::StatusPerkawinan => &mut self.status_perkawinan,
            IdentityField::Agama => &mut self.agama,
            IdentityField::Kewarganegaraan => &mut self.kewarganegaraan,
            IdentityField::Jenispekerjaan => &mut self.jenispekerjaan,
            IdentityField::AlamatLengkap => &mut self.alamat_lengkap,
            IdentityField::Rt => &mut self.rt,
            IdentityField::Rw => &mut self.rw,
            IdentityField::DesaKelurahan => &mut self.desa_kelurahan,
            IdentityField::Kecamatan => &mut self.kecamatan,
            IdentityField::Kabupaten => &mut self.kabupaten,
            IdentityField::Provinsi => &mut self.provinsi,
        }
    }

    /// Stores `value` trimmed.
    pub fn set(&mut self, field: IdentityField, value: impl AsRef<str>) {
        *self.slot(field) = value.as_ref().trim().to_string();
    }

    pub fn is_filled(&self, field: IdentityField) -> bool {
        !self.get(field).is_empty()
    }

    /// Completeness score: number of non-empty fields (0..=16).
    pub fn filled_count(&self) -> usize {
        IdentityField::ALL
            .iter()
            .filter(|field| self.is_filled(**field))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.filled_count() == 0
    }

    /// A reading good enough to stop escalating: seven or more fields, or the
    /// NIK / name / birth date triple.
    pub fn is_strong(&self) -> bool {
        self.filled_count() >= STRONG_FIELD_COUNT
            || (self.is_filled(IdentityField::Nik)
                && self.is_filled(IdentityField::NamaLengkap)
                && self.is_filled(IdentityField::TanggalLahir))
    }
}
