//! Tax-object read models
//!
//! Column names follow the PBB schema; JSON keeps its upper-case field names.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::nop::Nop;

/// Taxpayer identity (`dat_subjek_pajak`)
///
/// `email_wp` is the ownership link to a user account.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TaxSubject {
    pub subjek_pajak_id: String,
    pub nm_wp: Option<String>,
    pub jalan_wp: Option<String>,
    pub blok_kav_no_wp: Option<String>,
    pub rw_wp: Option<String>,
    pub rt_wp: Option<String>,
    pub kelurahan_wp: Option<String>,
    pub kota_wp: Option<String>,
    pub kd_pos_wp: Option<String>,
    pub telp_wp: Option<String>,
    pub npwp: Option<String>,
    pub status_pekerjaan_wp: Option<String>,
    pub email_wp: Option<String>,
}

/// Tax-object registration (`spop`)
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Spop {
    pub kd_propinsi: String,
    pub kd_dati2: String,
    pub kd_kecamatan: String,
    pub kd_kelurahan: String,
    pub kd_blok: String,
    pub no_urut: String,
    pub kd_jns_op: String,
    pub subjek_pajak_id: Option<String>,
    pub no_formulir_spop: Option<String>,
    pub jns_transaksi_op: Option<String>,
    pub jalan_op: Option<String>,
    pub blok_kav_no_op: Option<String>,
    pub kelurahan_op: Option<String>,
    pub rw_op: Option<String>,
    pub rt_op: Option<String>,
    pub kd_status_wp: Option<String>,
    pub luas_bumi: Option<i64>,
    pub kd_znt: Option<String>,
    pub jns_bumi: Option<String>,
    pub nilai_sistem_bumi: Option<i64>,
    pub tgl_pendataan_op: Option<NaiveDate>,
    pub tgl_pemeriksaan_op: Option<NaiveDate>,
    pub no_persil: Option<String>,
}

impl Spop {
    pub fn nop(&self) -> Option<Nop> {
        Nop::from_parts([
            self.kd_propinsi.as_str(),
            self.kd_dati2.as_str(),
            self.kd_kecamatan.as_str(),
            self.kd_kelurahan.as_str(),
            self.kd_blok.as_str(),
            self.no_urut.as_str(),
            self.kd_jns_op.as_str(),
        ])
        .ok()
    }
}

/// Owned SPOP row joined with its taxpayer
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SpopView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub spop: Spop,
    #[serde(rename = "NM_WP")]
    pub nm_wp: Option<String>,
    #[serde(rename = "JALAN_WP")]
    pub jalan_wp: Option<String>,
    #[serde(rename = "KOTA_WP")]
    pub kota_wp: Option<String>,
    #[serde(rename = "TELP_WP")]
    pub telp_wp: Option<String>,
}

/// Annual tax bill (`sppt`)
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Sppt {
    pub kd_propinsi: String,
    pub kd_dati2: String,
    pub kd_kecamatan: String,
    pub kd_kelurahan: String,
    pub kd_blok: String,
    pub no_urut: String,
    pub kd_jns_op: String,
    pub thn_pajak_sppt: String,
    pub nm_wp_sppt: Option<String>,
    pub jln_wp_sppt: Option<String>,
    pub blok_kav_no_wp_sppt: Option<String>,
    pub rw_wp_sppt: Option<String>,
    pub rt_wp_sppt: Option<String>,
    pub kelurahan_wp_sppt: Option<String>,
    pub kota_wp_sppt: Option<String>,
    pub kd_pos_wp_sppt: Option<String>,
    pub npwp_sppt: Option<String>,
    pub tgl_jatuh_tempo_sppt: Option<NaiveDate>,
    pub luas_bumi_sppt: Option<i64>,
    pub luas_bng_sppt: Option<i64>,
    pub njop_bumi_sppt: Option<i64>,
    pub njop_bng_sppt: Option<i64>,
    pub njop_sppt: Option<i64>,
    pub njoptkp_sppt: Option<i64>,
    pub njkp_sppt: Option<i64>,
    pub pbb_terhutang_sppt: Option<i64>,
    pub pbb_yg_harus_dibayar_sppt: Option<i64>,
    pub status_pembayaran_sppt: Option<bool>,
    pub status_tagihan_sppt: Option<bool>,
    pub tgl_terbit_sppt: Option<DateTime<Utc>>,
}

/// Bill count for one tax year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SpptYear {
    #[serde(rename = "THN_PAJAK_SPPT")]
    pub thn_pajak_sppt: String,
    pub count: i64,
}

/// Parcel attributes (`dat_peta_objek_pajak`) without geometry
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ParcelInfo {
    pub nop: String,
    pub luas: Option<f64>,
    pub kd_propinsi: Option<String>,
    pub kd_dati2: Option<String>,
    pub kd_kecamatan: Option<String>,
    pub kd_kelurahan: Option<String>,
    pub kd_blok: Option<String>,
    pub no_urut: Option<String>,
    pub kd_jns_op: Option<String>,
    pub shm: Option<String>,
    pub nib: Option<String>,
    pub guna_tanah: Option<String>,
    pub status: Option<String>,
    pub znt: Option<String>,
    pub harga_transaksi: Option<String>,
    pub no_pelayanan: Option<String>,
}

/// Parcel with its geometry as a GeoJSON object
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub info: ParcelInfo,
    pub geometry: serde_json::Value,
}

/// Region and year filter for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionFilter {
    pub year: Option<String>,
    pub kd_propinsi: Option<String>,
    pub kd_dati2: Option<String>,
    pub kd_kecamatan: Option<String>,
    pub kd_kelurahan: Option<String>,
}

impl RegionFilter {
    /// Most specific region level filtered on, with its code
    pub fn narrowest(&self) -> Option<(&'static str, &str)> {
        [
            ("kelurahan", &self.kd_kelurahan),
            ("kecamatan", &self.kd_kecamatan),
            ("dati2", &self.kd_dati2),
            ("propinsi", &self.kd_propinsi),
        ]
        .into_iter()
        .find_map(|(level, code)| code.as_deref().map(|code| (level, code)))
    }
}

/// SPPT totals over a region
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct SpptTotals {
    pub total_sppt: i64,
    pub total_sppt_lunas: i64,
    pub total_sppt_belum_lunas: i64,
    pub total_pbb_terhutang: i64,
}

/// Active-building totals over a region
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct BuildingTotals {
    pub total_bangunan: i64,
    pub total_nilai_bangunan: i64,
    /// Mean over buildings with a positive floor area
    pub rata_rata_luas_bangunan: f64,
}
