//! PostgreSQL Repository Implementation
//!
//! `spop` and `sppt` carry a generated `nop` column (the seven codes
//! concatenated), so key lookups bind a single value.

use auth::models::Email;
use sqlx::PgPool;

use crate::domain::entity::{
    BuildingTotals, Parcel, ParcelInfo, RegionFilter, Sppt, SpptTotals, SpptYear, SpopView,
    TaxSubject,
};
use crate::domain::name::names_match;
use crate::domain::nop::Nop;
use crate::domain::repository::{
    ClaimOutcome, ClaimRequest, OpRepository, SortOrder, SpopPage, SpopQuery, SpopSort,
};
use crate::error::OpResult;

#[derive(Clone)]
pub struct PgOpRepository {
    pool: PgPool,
}

impl PgOpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TAX_SUBJECT_COLUMNS: &str = r#"
    subjek_pajak_id, nm_wp, jalan_wp, blok_kav_no_wp, rw_wp, rt_wp,
    kelurahan_wp, kota_wp, kd_pos_wp, telp_wp, npwp, status_pekerjaan_wp, email_wp
"#;

const SPOP_COLUMNS: &str = r#"
    s.kd_propinsi, s.kd_dati2, s.kd_kecamatan, s.kd_kelurahan, s.kd_blok, s.no_urut,
    s.kd_jns_op, s.subjek_pajak_id, s.no_formulir_spop, s.jns_transaksi_op, s.jalan_op,
    s.blok_kav_no_op, s.kelurahan_op, s.rw_op, s.rt_op, s.kd_status_wp, s.luas_bumi,
    s.kd_znt, s.jns_bumi, s.nilai_sistem_bumi, s.tgl_pendataan_op, s.tgl_pemeriksaan_op,
    s.no_persil
"#;

const SPPT_COLUMNS: &str = r#"
    p.kd_propinsi, p.kd_dati2, p.kd_kecamatan, p.kd_kelurahan, p.kd_blok, p.no_urut,
    p.kd_jns_op, p.thn_pajak_sppt, p.nm_wp_sppt, p.jln_wp_sppt, p.blok_kav_no_wp_sppt,
    p.rw_wp_sppt, p.rt_wp_sppt, p.kelurahan_wp_sppt, p.kota_wp_sppt, p.kd_pos_wp_sppt,
    p.npwp_sppt, p.tgl_jatuh_tempo_sppt, p.luas_bumi_sppt, p.luas_bng_sppt,
    p.njop_bumi_sppt, p.njop_bng_sppt, p.njop_sppt, p.njoptkp_sppt, p.njkp_sppt,
    p.pbb_terhutang_sppt, p.pbb_yg_harus_dibayar_sppt, p.status_pembayaran_sppt,
    p.status_tagihan_sppt, p.tgl_terbit_sppt
"#;

const PARCEL_COLUMNS: &str = r#"
    nop, luas, kd_propinsi, kd_dati2, kd_kecamatan, kd_kelurahan, kd_blok, no_urut,
    kd_jns_op, shm, nib, guna_tanah, status, znt, harga_transaksi, no_pelayanan
"#;

/// Owned objects: `$1` is the owner email
const OWNED_SPOP_FROM: &str = r#"
    FROM spop s
    JOIN dat_subjek_pajak t ON t.subjek_pajak_id = s.subjek_pajak_id
    WHERE t.email_wp = $1
"#;

/// Owned bills: `$1` owner email, `$2` NOP
const OWNED_SPPT_FROM: &str = r#"
    FROM sppt p
    JOIN spop s ON s.nop = p.nop
    JOIN dat_subjek_pajak t ON t.subjek_pajak_id = s.subjek_pajak_id
    WHERE t.email_wp = $1 AND p.nop = $2
"#;

/// Name search against the stored name with the ignored characters removed
const NAME_SEARCH: &str = r#"
    ($2::text IS NULL OR lower(translate(t.nm_wp, ' /\-_.,', '')) LIKE '%' || $2 || '%' ESCAPE '\')
"#;

fn sort_column(sort: SpopSort) -> &'static str {
    match sort {
        SpopSort::KdPropinsi => "s.kd_propinsi",
        SpopSort::JalanOp => "s.jalan_op",
        SpopSort::LuasBumi => "s.luas_bumi",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Escape LIKE wildcards (default escape character `\`)
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(sqlx::FromRow)]
struct ParcelRow {
    #[sqlx(flatten)]
    info: ParcelInfo,
    geometry: Option<serde_json::Value>,
}

#[derive(sqlx::FromRow)]
struct ClaimTarget {
    subjek_pajak_id: String,
    nm_wp: Option<String>,
    email_wp: Option<String>,
}

impl OpRepository for PgOpRepository {
    async fn find_taxpayer_by_email(&self, email: &Email) -> OpResult<Option<TaxSubject>> {
        let row = sqlx::query_as::<_, TaxSubject>(&format!(
            "SELECT {TAX_SUBJECT_COLUMNS} FROM dat_subjek_pajak WHERE email_wp = $1 LIMIT 1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_owned_spop(&self, email: &Email, query: &SpopQuery) -> OpResult<SpopPage> {
        let pattern = query.search.as_deref().map(escape_like);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) {OWNED_SPOP_FROM} AND {NAME_SEARCH}"
        ))
        .bind(email.as_str())
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        // Full key as tiebreaker keeps pages stable
        let items = sqlx::query_as::<_, SpopView>(&format!(
            r#"
            SELECT {SPOP_COLUMNS}, t.nm_wp, t.jalan_wp, t.kota_wp, t.telp_wp
            {OWNED_SPOP_FROM} AND {NAME_SEARCH}
            ORDER BY {column} {direction} NULLS LAST, s.nop
            OFFSET $3 LIMIT $4
            "#,
            column = sort_column(query.sort_by),
            direction = sort_direction(query.sort_order),
        ))
        .bind(email.as_str())
        .bind(&pattern)
        .bind(query.offset)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(SpopPage { items, total })
    }

    async fn owns_object(&self, email: &Email, nop: &Nop) -> OpResult<bool> {
        let owned: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 {OWNED_SPOP_FROM} AND s.nop = $2)"
        ))
        .bind(email.as_str())
        .bind(nop.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(owned)
    }

    async fn object_exists(&self, nop: &Nop) -> OpResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM spop WHERE nop = $1)")
            .bind(nop.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn owned_sppt_years(&self, email: &Email, nop: &Nop) -> OpResult<Vec<SpptYear>> {
        let rows = sqlx::query_as::<_, SpptYear>(&format!(
            r#"
            SELECT p.thn_pajak_sppt, COUNT(*) AS count
            {OWNED_SPPT_FROM}
            GROUP BY p.thn_pajak_sppt
            ORDER BY p.thn_pajak_sppt DESC
            "#
        ))
        .bind(email.as_str())
        .bind(nop.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_owned_sppt(
        &self,
        email: &Email,
        nop: &Nop,
        year: &str,
    ) -> OpResult<Option<Sppt>> {
        let row = sqlx::query_as::<_, Sppt>(&format!(
            "SELECT {SPPT_COLUMNS} {OWNED_SPPT_FROM} AND p.thn_pajak_sppt = $3"
        ))
        .bind(email.as_str())
        .bind(nop.as_str())
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_owned_sppt(&self, email: &Email, nop: &Nop) -> OpResult<Vec<Sppt>> {
        let rows = sqlx::query_as::<_, Sppt>(&format!(
            "SELECT {SPPT_COLUMNS} {OWNED_SPPT_FROM} ORDER BY p.thn_pajak_sppt DESC"
        ))
        .bind(email.as_str())
        .bind(nop.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn claim_taxpayer(&self, request: &ClaimRequest<'_>) -> OpResult<ClaimOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent claims of one taxpayer
        let target = sqlx::query_as::<_, ClaimTarget>(
            r#"
            SELECT t.subjek_pajak_id, t.nm_wp, t.email_wp
            FROM spop s
            JOIN dat_subjek_pajak t ON t.subjek_pajak_id = s.subjek_pajak_id
            WHERE s.nop = $1
            FOR UPDATE OF t
            "#,
        )
        .bind(request.nop.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(target) = target else {
            return Ok(ClaimOutcome::NoMatch);
        };
        if !names_match(request.claimed_name, target.nm_wp.as_deref().unwrap_or_default()) {
            return Ok(ClaimOutcome::NoMatch);
        }

        let outcome = match target.email_wp.as_deref().map(str::trim) {
            Some(linked) if linked.eq_ignore_ascii_case(request.email.as_str()) => {
                ClaimOutcome::AlreadyOwned
            }
            Some(linked) if !linked.is_empty() => return Ok(ClaimOutcome::ClaimedByOther),
            _ => ClaimOutcome::Claimed,
        };

        sqlx::query(
            r#"
            UPDATE dat_subjek_pajak
            SET email_wp = $2, telp_wp = COALESCE($3, telp_wp)
            WHERE subjek_pajak_id = $1
            "#,
        )
        .bind(&target.subjek_pajak_id)
        .bind(request.email.as_str())
        .bind(request.phone)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = now() WHERE id = $1")
            .bind(request.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(outcome)
    }

    async fn sppt_totals(&self, filter: &RegionFilter) -> OpResult<SpptTotals> {
        let totals = sqlx::query_as::<_, SpptTotals>(
            r#"
            SELECT
                COUNT(*) AS total_sppt,
                COUNT(*) FILTER (WHERE status_pembayaran_sppt) AS total_sppt_lunas,
                COUNT(*) FILTER (WHERE status_pembayaran_sppt = FALSE) AS total_sppt_belum_lunas,
                COALESCE(SUM(pbb_terhutang_sppt), 0)::BIGINT AS total_pbb_terhutang
            FROM sppt
            WHERE ($1::text IS NULL OR thn_pajak_sppt = $1)
              AND ($2::text IS NULL OR kd_propinsi = $2)
              AND ($3::text IS NULL OR kd_dati2 = $3)
              AND ($4::text IS NULL OR kd_kecamatan = $4)
              AND ($5::text IS NULL OR kd_kelurahan = $5)
            "#,
        )
        .bind(&filter.year)
        .bind(&filter.kd_propinsi)
        .bind(&filter.kd_dati2)
        .bind(&filter.kd_kecamatan)
        .bind(&filter.kd_kelurahan)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    async fn building_totals(&self, filter: &RegionFilter) -> OpResult<BuildingTotals> {
        let totals = sqlx::query_as::<_, BuildingTotals>(
            r#"
            SELECT
                COUNT(*) AS total_bangunan,
                COALESCE(SUM(nilai_sistem_bng), 0)::BIGINT AS total_nilai_bangunan,
                COALESCE(AVG(luas_bng) FILTER (WHERE luas_bng > 0), 0)::DOUBLE PRECISION
                    AS rata_rata_luas_bangunan
            FROM dat_op_bangunan
            WHERE aktif
              AND ($1::text IS NULL OR kd_propinsi = $1)
              AND ($2::text IS NULL OR kd_dati2 = $2)
              AND ($3::text IS NULL OR kd_kecamatan = $3)
              AND ($4::text IS NULL OR kd_kelurahan = $4)
            "#,
        )
        .bind(&filter.kd_propinsi)
        .bind(&filter.kd_dati2)
        .bind(&filter.kd_kecamatan)
        .bind(&filter.kd_kelurahan)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    async fn tax_years(&self) -> OpResult<Vec<String>> {
        let years = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT thn_pajak_sppt
            FROM sppt
            WHERE thn_pajak_sppt <> ''
            ORDER BY thn_pajak_sppt DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(years)
    }

    async fn find_parcel(&self, nop: &Nop) -> OpResult<Option<Parcel>> {
        let row = sqlx::query_as::<_, ParcelRow>(&format!(
            r#"
            SELECT {PARCEL_COLUMNS}, ST_AsGeoJSON(geometry)::jsonb AS geometry
            FROM dat_peta_objek_pajak
            WHERE nop = $1
            LIMIT 1
            "#
        ))
        .bind(nop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Parcel {
            info: row.info,
            geometry: row.geometry.unwrap_or(serde_json::Value::Null),
        }))
    }

    async fn find_parcel_info(&self, nop: &Nop) -> OpResult<Option<ParcelInfo>> {
        let row = sqlx::query_as::<_, ParcelInfo>(&format!(
            "SELECT {PARCEL_COLUMNS} FROM dat_peta_objek_pajak WHERE nop = $1 LIMIT 1"
        ))
        .bind(nop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_parcel_nops(&self, limit: i64) -> OpResult<Vec<String>> {
        let nops: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT nop FROM dat_peta_objek_pajak ORDER BY nop LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(nops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_columns_are_whitelisted() {
        assert_eq!(sort_column(SpopSort::default()), "s.kd_propinsi");
        assert_eq!(sort_column(SpopSort::LuasBumi), "s.luas_bumi");
        assert_eq!(sort_direction(SortOrder::Desc), "DESC");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("wayan"), "wayan");
    }
}
