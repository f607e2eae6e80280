//! Use-case scenarios against in-memory stores

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use auth::AuthConfig;
use auth::MemoryRevocationStore;
use auth::domain::repository::{OAuthIdentity, OAuthProvider, UserPage, UserRepository};
use auth::domain::token::{TokenCodec, TokenType};
use auth::models::{Email, User, UserId, UserProfile};
use auth::{AuthAppState, AuthResult, auth_router};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use platform::password::HashedPassword;
use platform::retry::RetryPolicy;
use tower::ServiceExt;

use crate::application::{
    ClaimInput, ClaimUseCase, DashboardUseCase, OpConfig, PetaUseCase, ProfileUseCase,
    SpopListParams, TaxObjectUseCase,
};
use crate::domain::entity::{
    BuildingTotals, Parcel, ParcelInfo, RegionFilter, Sppt, SpptTotals, SpptYear, Spop, SpopView,
    TaxSubject,
};
use crate::domain::name::{names_match, normalize_name};
use crate::domain::nop::Nop;
use crate::domain::repository::{ClaimOutcome, ClaimRequest, OpRepository, SpopPage, SpopQuery};
use crate::error::{OpError, OpResult};
use crate::presentation::handlers::OpAppState;
use crate::presentation::router::op_router;

const ALICE_NOP: &str = "510203000102400180";
const BOB_NOP: &str = "510203000102400190";
const ALICE_PARTS: [&str; 7] = ["51", "02", "030", "001", "024", "0018", "0"];

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeUsers {
    users: Mutex<HashMap<UserId, User>>,
}

impl FakeUsers {
    fn add(&self, email: &str) -> User {
        let user = User::new(
            Email::new(email).unwrap(),
            HashedPassword::from_stored("$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA"),
            UserProfile::default(),
        );
        self.users
            .lock()
            .unwrap()
            .insert(user.user_id, user.clone());
        user
    }

    fn get(&self, id: &UserId) -> User {
        self.users.lock().unwrap()[id].clone()
    }
}

impl UserRepository for FakeUsers {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.users
            .lock()
            .unwrap()
            .insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| &u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        self.create(user).await
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        Ok(self.users.lock().unwrap().remove(user_id).is_some())
    }

    async fn list(&self, _search: Option<&str>, _offset: i64, _limit: i64) -> AuthResult<UserPage> {
        let users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        let total_count = users.len() as i64;
        Ok(UserPage { users, total_count })
    }
}

struct NoProvider;

impl OAuthProvider for NoProvider {
    fn authorize_url(&self, _state: &str, _code_challenge: &str) -> AuthResult<String> {
        Ok(String::new())
    }

    async fn fetch_identity(&self, _code: &str, _code_verifier: &str) -> AuthResult<OAuthIdentity> {
        Err(auth::AuthError::OAuthNotConfigured)
    }
}

/// `dat_op_bangunan` row reduced to what the dashboard reads
struct Building {
    region: [&'static str; 4],
    luas_bng: i64,
    nilai_sistem_bng: i64,
    aktif: bool,
}

/// Tax-object store sharing the user table, as the real schema does
struct FakeOpRepository {
    users: Arc<FakeUsers>,
    subjects: Mutex<Vec<TaxSubject>>,
    spops: Vec<Spop>,
    sppts: Vec<Sppt>,
    buildings: Vec<Building>,
    parcels: Vec<Parcel>,
    outages: AtomicU32,
}

impl FakeOpRepository {
    fn new(users: Arc<FakeUsers>) -> Self {
        Self {
            users,
            subjects: Mutex::new(vec![
                subject("SP001", "I Wayan Sudarsana", None),
                subject("SP002", "Ni Made Ayu", Some("bob@example.com")),
            ]),
            spops: vec![spop(ALICE_PARTS, "SP001", 250), {
                let mut s = spop(ALICE_PARTS, "SP002", 120);
                s.no_urut = "0019".into();
                s
            }],
            sppts: vec![
                sppt(ALICE_NOP, "2023", 150_000, true),
                sppt(ALICE_NOP, "2024", 175_000, false),
                sppt(BOB_NOP, "2024", 90_000, true),
            ],
            buildings: vec![
                building(["51", "02", "030", "001"], 120, 300_000_000, true),
                building(["51", "02", "030", "001"], 0, 50_000_000, true),
                building(["51", "02", "040", "002"], 80, 200_000_000, true),
                building(["51", "02", "030", "001"], 500, 900_000_000, false),
            ],
            parcels: vec![Parcel {
                info: parcel_info(ALICE_NOP),
                geometry: serde_json::json!({"type": "Point", "coordinates": [115.2, -8.6]}),
            }],
            outages: AtomicU32::new(0),
        }
    }

    fn fail_next(&self, n: u32) {
        self.outages.store(n, Ordering::SeqCst);
    }

    fn check(&self) -> OpResult<()> {
        let failed = self
            .outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(OpError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn subject(&self, id: &str) -> TaxSubject {
        let subjects = self.subjects.lock().unwrap();
        subjects
            .iter()
            .find(|s| s.subjek_pajak_id == id)
            .cloned()
            .unwrap()
    }

    fn spop_by_nop(&self, nop: &Nop) -> Option<&Spop> {
        self.spops.iter().find(|s| s.nop().as_ref() == Some(nop))
    }

    /// Owned SPOPs with their taxpayer
    fn owned(&self, email: &Email) -> Vec<(Spop, TaxSubject)> {
        let subjects = self.subjects.lock().unwrap();
        self.spops
            .iter()
            .filter_map(|s| {
                let subject = subjects
                    .iter()
                    .find(|t| Some(&t.subjek_pajak_id) == s.subjek_pajak_id.as_ref())?;
                (subject.email_wp.as_deref() == Some(email.as_str()))
                    .then(|| (s.clone(), subject.clone()))
            })
            .collect()
    }

    fn owned_sppts(&self, email: &Email, nop: &Nop) -> Vec<Sppt> {
        let owned = self
            .owned(email)
            .iter()
            .any(|(s, _)| s.nop().as_ref() == Some(nop));
        self.sppts
            .iter()
            .filter(|p| owned && sppt_nop(p) == nop.as_str())
            .cloned()
            .collect()
    }
}

impl OpRepository for FakeOpRepository {
    async fn find_taxpayer_by_email(&self, email: &Email) -> OpResult<Option<TaxSubject>> {
        self.check()?;
        let subjects = self.subjects.lock().unwrap();
        Ok(subjects
            .iter()
            .find(|s| s.email_wp.as_deref() == Some(email.as_str()))
            .cloned())
    }

    async fn list_owned_spop(&self, email: &Email, query: &SpopQuery) -> OpResult<SpopPage> {
        self.check()?;
        let matched: Vec<SpopView> = self
            .owned(email)
            .into_iter()
            .filter(|(_, t)| {
                query.search.as_deref().is_none_or(|needle| {
                    normalize_name(t.nm_wp.as_deref().unwrap_or_default()).contains(needle)
                })
            })
            .map(|(spop, t)| SpopView {
                spop,
                nm_wp: t.nm_wp,
                jalan_wp: t.jalan_wp,
                kota_wp: t.kota_wp,
                telp_wp: t.telp_wp,
            })
            .collect();
        let total = matched.len() as i64;
        Ok(SpopPage {
            items: matched
                .into_iter()
                .skip(query.offset as usize)
                .take(query.limit as usize)
                .collect(),
            total,
        })
    }

    async fn owns_object(&self, email: &Email, nop: &Nop) -> OpResult<bool> {
        self.check()?;
        Ok(self
            .owned(email)
            .iter()
            .any(|(s, _)| s.nop().as_ref() == Some(nop)))
    }

    async fn object_exists(&self, nop: &Nop) -> OpResult<bool> {
        self.check()?;
        Ok(self.spop_by_nop(nop).is_some())
    }

    async fn owned_sppt_years(&self, email: &Email, nop: &Nop) -> OpResult<Vec<SpptYear>> {
        self.check()?;
        let mut years: Vec<SpptYear> = self
            .owned_sppts(email, nop)
            .into_iter()
            .map(|p| SpptYear {
                thn_pajak_sppt: p.thn_pajak_sppt,
                count: 1,
            })
            .collect();
        years.sort_by(|a, b| b.thn_pajak_sppt.cmp(&a.thn_pajak_sppt));
        Ok(years)
    }

    async fn find_owned_sppt(
        &self,
        email: &Email,
        nop: &Nop,
        year: &str,
    ) -> OpResult<Option<Sppt>> {
        self.check()?;
        Ok(self
            .owned_sppts(email, nop)
            .into_iter()
            .find(|p| p.thn_pajak_sppt == year))
    }

    async fn list_owned_sppt(&self, email: &Email, nop: &Nop) -> OpResult<Vec<Sppt>> {
        self.check()?;
        let mut sppts = self.owned_sppts(email, nop);
        sppts.sort_by(|a, b| b.thn_pajak_sppt.cmp(&a.thn_pajak_sppt));
        Ok(sppts)
    }

    async fn claim_taxpayer(&self, request: &ClaimRequest<'_>) -> OpResult<ClaimOutcome> {
        self.check()?;
        let Some(subject_id) = self
            .spop_by_nop(request.nop)
            .and_then(|s| s.subjek_pajak_id.clone())
        else {
            return Ok(ClaimOutcome::NoMatch);
        };

        let mut subjects = self.subjects.lock().unwrap();
        let Some(subject) = subjects
            .iter_mut()
            .find(|s| s.subjek_pajak_id == subject_id)
        else {
            return Ok(ClaimOutcome::NoMatch);
        };
        if !names_match(request.claimed_name, subject.nm_wp.as_deref().unwrap_or_default()) {
            return Ok(ClaimOutcome::NoMatch);
        }
        let outcome = match subject.email_wp.as_deref() {
            Some(linked) if linked.eq_ignore_ascii_case(request.email.as_str()) => {
                ClaimOutcome::AlreadyOwned
            }
            Some(_) => return Ok(ClaimOutcome::ClaimedByOther),
            None => ClaimOutcome::Claimed,
        };

        subject.email_wp = Some(request.email.as_str().to_string());
        if let Some(phone) = request.phone {
            subject.telp_wp = Some(phone.to_string());
        }
        let mut users = self.users.users.lock().unwrap();
        if let Some(user) = users.get_mut(&request.user_id) {
            user.set_verified(true);
        }

        Ok(outcome)
    }

    async fn sppt_totals(&self, filter: &RegionFilter) -> OpResult<SpptTotals> {
        self.check()?;
        let matches = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| w == have);
        let selected: Vec<&Sppt> = self
            .sppts
            .iter()
            .filter(|p| {
                matches(&filter.year, &p.thn_pajak_sppt)
                    && matches(&filter.kd_propinsi, &p.kd_propinsi)
                    && matches(&filter.kd_dati2, &p.kd_dati2)
                    && matches(&filter.kd_kecamatan, &p.kd_kecamatan)
                    && matches(&filter.kd_kelurahan, &p.kd_kelurahan)
            })
            .collect();

        Ok(SpptTotals {
            total_sppt: selected.len() as i64,
            total_sppt_lunas: selected
                .iter()
                .filter(|p| p.status_pembayaran_sppt == Some(true))
                .count() as i64,
            total_sppt_belum_lunas: selected
                .iter()
                .filter(|p| p.status_pembayaran_sppt == Some(false))
                .count() as i64,
            total_pbb_terhutang: selected
                .iter()
                .filter_map(|p| p.pbb_terhutang_sppt)
                .sum(),
        })
    }

    async fn building_totals(&self, filter: &RegionFilter) -> OpResult<BuildingTotals> {
        self.check()?;
        let wanted = [
            &filter.kd_propinsi,
            &filter.kd_dati2,
            &filter.kd_kecamatan,
            &filter.kd_kelurahan,
        ];
        let selected: Vec<&Building> = self
            .buildings
            .iter()
            .filter(|b| {
                b.aktif
                    && wanted
                        .iter()
                        .zip(b.region)
                        .all(|(want, have)| want.as_deref().is_none_or(|w| w == have))
            })
            .collect();
        let areas: Vec<i64> = selected
            .iter()
            .map(|b| b.luas_bng)
            .filter(|luas| *luas > 0)
            .collect();

        Ok(BuildingTotals {
            total_bangunan: selected.len() as i64,
            total_nilai_bangunan: selected.iter().map(|b| b.nilai_sistem_bng).sum(),
            rata_rata_luas_bangunan: if areas.is_empty() {
                0.0
            } else {
                areas.iter().sum::<i64>() as f64 / areas.len() as f64
            },
        })
    }

    async fn tax_years(&self) -> OpResult<Vec<String>> {
        self.check()?;
        let mut years: Vec<String> = self.sppts.iter().map(|p| p.thn_pajak_sppt.clone()).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    async fn find_parcel(&self, nop: &Nop) -> OpResult<Option<Parcel>> {
        self.check()?;
        Ok(self
            .parcels
            .iter()
            .find(|p| p.info.nop == nop.as_str())
            .cloned())
    }

    async fn find_parcel_info(&self, nop: &Nop) -> OpResult<Option<ParcelInfo>> {
        Ok(self.find_parcel(nop).await?.map(|p| p.info))
    }

    async fn list_parcel_nops(&self, limit: i64) -> OpResult<Vec<String>> {
        self.check()?;
        Ok(self
            .parcels
            .iter()
            .map(|p| p.info.nop.clone())
            .take(limit as usize)
            .collect())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn subject(id: &str, name: &str, email: Option<&str>) -> TaxSubject {
    TaxSubject {
        subjek_pajak_id: id.to_string(),
        nm_wp: Some(name.to_string()),
        jalan_wp: Some("Jl. Raya Kuta".to_string()),
        blok_kav_no_wp: None,
        rw_wp: None,
        rt_wp: None,
        kelurahan_wp: None,
        kota_wp: Some("Badung".to_string()),
        kd_pos_wp: None,
        telp_wp: None,
        npwp: None,
        status_pekerjaan_wp: None,
        email_wp: email.map(str::to_string),
    }
}

fn spop(parts: [&str; 7], subject_id: &str, luas: i64) -> Spop {
    Spop {
        kd_propinsi: parts[0].into(),
        kd_dati2: parts[1].into(),
        kd_kecamatan: parts[2].into(),
        kd_kelurahan: parts[3].into(),
        kd_blok: parts[4].into(),
        no_urut: parts[5].into(),
        kd_jns_op: parts[6].into(),
        subjek_pajak_id: Some(subject_id.to_string()),
        no_formulir_spop: None,
        jns_transaksi_op: None,
        jalan_op: Some("Jl. Sunset Road".to_string()),
        blok_kav_no_op: None,
        kelurahan_op: None,
        rw_op: None,
        rt_op: None,
        kd_status_wp: None,
        luas_bumi: Some(luas),
        kd_znt: None,
        jns_bumi: None,
        nilai_sistem_bumi: None,
        tgl_pendataan_op: None,
        tgl_pemeriksaan_op: None,
        no_persil: None,
    }
}

fn sppt(nop: &str, year: &str, amount: i64, paid: bool) -> Sppt {
    let nop = Nop::parse(nop).unwrap();
    let parts = nop.parts();
    Sppt {
        kd_propinsi: parts.kd_propinsi.into(),
        kd_dati2: parts.kd_dati2.into(),
        kd_kecamatan: parts.kd_kecamatan.into(),
        kd_kelurahan: parts.kd_kelurahan.into(),
        kd_blok: parts.kd_blok.into(),
        no_urut: parts.no_urut.into(),
        kd_jns_op: parts.kd_jns_op.into(),
        thn_pajak_sppt: year.to_string(),
        nm_wp_sppt: None,
        jln_wp_sppt: None,
        blok_kav_no_wp_sppt: None,
        rw_wp_sppt: None,
        rt_wp_sppt: None,
        kelurahan_wp_sppt: None,
        kota_wp_sppt: None,
        kd_pos_wp_sppt: None,
        npwp_sppt: None,
        tgl_jatuh_tempo_sppt: None,
        luas_bumi_sppt: None,
        luas_bng_sppt: None,
        njop_bumi_sppt: None,
        njop_bng_sppt: None,
        njop_sppt: None,
        njoptkp_sppt: None,
        njkp_sppt: None,
        pbb_terhutang_sppt: Some(amount),
        pbb_yg_harus_dibayar_sppt: Some(amount),
        status_pembayaran_sppt: Some(paid),
        status_tagihan_sppt: None,
        tgl_terbit_sppt: None,
    }
}

fn sppt_nop(p: &Sppt) -> String {
    [
        p.kd_propinsi.as_str(),
        &p.kd_dati2,
        &p.kd_kecamatan,
        &p.kd_kelurahan,
        &p.kd_blok,
        &p.no_urut,
        &p.kd_jns_op,
    ]
    .concat()
}

fn building(region: [&'static str; 4], luas_bng: i64, nilai: i64, aktif: bool) -> Building {
    Building {
        region,
        luas_bng,
        nilai_sistem_bng: nilai,
        aktif,
    }
}

fn parcel_info(nop: &str) -> ParcelInfo {
    ParcelInfo {
        nop: nop.to_string(),
        luas: Some(250.0),
        kd_propinsi: Some("51".into()),
        kd_dati2: Some("02".into()),
        kd_kecamatan: Some("030".into()),
        kd_kelurahan: Some("001".into()),
        kd_blok: Some("024".into()),
        no_urut: Some("0018".into()),
        kd_jns_op: Some("0".into()),
        shm: None,
        nib: None,
        guna_tanah: Some("Perumahan".into()),
        status: None,
        znt: None,
        harga_transaksi: None,
        no_pelayanan: None,
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    users: Arc<FakeUsers>,
    repo: Arc<FakeOpRepository>,
    config: Arc<OpConfig>,
    alice: User,
    bob: User,
}

impl Harness {
    fn new() -> Self {
        let users = Arc::new(FakeUsers::default());
        let alice = users.add("alice@example.com");
        let bob = users.add("bob@example.com");
        let repo = Arc::new(FakeOpRepository::new(users.clone()));
        let config = OpConfig {
            store_retry: RetryPolicy::new(3, Duration::from_millis(10)),
            ..OpConfig::default()
        };
        Self {
            users,
            repo,
            config: Arc::new(config),
            alice,
            bob,
        }
    }

    fn tax_objects(&self) -> TaxObjectUseCase<FakeOpRepository> {
        TaxObjectUseCase::new(self.repo.clone(), self.config.clone())
    }

    async fn claim(&self, user: &User, name: &str, parts: [&str; 7]) -> OpResult<bool> {
        ClaimUseCase::new(self.repo.clone(), self.config.clone())
            .execute(
                user,
                ClaimInput {
                    name: name.to_string(),
                    parts: parts.map(str::to_string),
                    phone: Some(" 081234567 ".to_string()),
                },
            )
            .await
    }
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn test_unlinked_user_sees_nothing() {
    let h = Harness::new();

    let listing = h
        .tax_objects()
        .list_spop(&h.alice.email, SpopListParams::default())
        .await
        .unwrap();
    assert!(listing.items.is_empty());
    assert_eq!(listing.total, 0);
    assert_eq!(listing.total_pages, 0);

    // Existing but owned by someone else
    let err = h
        .tax_objects()
        .sppt_batch(&h.alice.email, BOB_NOP)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::ObjectForbidden));
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

    let err = h
        .tax_objects()
        .sppt_years(&h.alice.email, "51.99.999.999.999.9999.9")
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::ObjectNotFound));
}

#[tokio::test]
async fn test_owner_reads_bills_newest_first() {
    let h = Harness::new();

    let batch = h.tax_objects().sppt_batch(&h.bob.email, BOB_NOP).await.unwrap();
    assert_eq!(batch.len(), 1);

    let detail = h
        .tax_objects()
        .sppt_detail(&h.bob.email, "2024", BOB_NOP)
        .await
        .unwrap();
    assert_eq!(detail.pbb_terhutang_sppt, Some(90_000));

    let err = h
        .tax_objects()
        .sppt_detail(&h.bob.email, "2019", BOB_NOP)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::SpptNotFound));
}

#[tokio::test]
async fn test_list_spop_clamps_and_searches() {
    let h = Harness::new();

    let listing = h
        .tax_objects()
        .list_spop(
            &h.bob.email,
            SpopListParams {
                search: Some("made-ayu".into()),
                page: Some(0),
                per_page: Some(500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(listing.page, 1);
    assert_eq!(listing.per_page, 100);
    assert_eq!(listing.total, 1);
    assert_eq!(listing.total_pages, 1);

    let listing = h
        .tax_objects()
        .list_spop(
            &h.bob.email,
            SpopListParams {
                search: Some("wayan".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
}

#[tokio::test]
async fn test_invalid_nop_is_rejected() {
    let h = Harness::new();
    let err = h
        .tax_objects()
        .sppt_batch(&h.alice.email, "51-02-030")
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::InvalidNop));
    assert_eq!(err.code(), "INVALID_NOP");
}

// ============================================================================
// Claim
// ============================================================================

#[tokio::test]
async fn test_claim_links_taxpayer_and_verifies_user() {
    let h = Harness::new();

    let exists = h
        .claim(&h.alice, "i wayan-sudarsana", ALICE_PARTS)
        .await
        .unwrap();
    assert!(exists);

    let subject = h.repo.subject("SP001");
    assert_eq!(subject.email_wp.as_deref(), Some("alice@example.com"));
    assert_eq!(subject.telp_wp.as_deref(), Some("081234567"));
    assert!(h.users.get(&h.alice.user_id).is_verified);

    // Now owned: bills are visible, newest first
    let batch = h.tax_objects().sppt_batch(&h.alice.email, ALICE_NOP).await.unwrap();
    let years: Vec<_> = batch.iter().map(|p| p.thn_pajak_sppt.as_str()).collect();
    assert_eq!(years, vec!["2024", "2023"]);
}

#[tokio::test]
async fn test_claim_is_idempotent_for_same_user() {
    let h = Harness::new();
    assert!(h.claim(&h.alice, "I Wayan Sudarsana", ALICE_PARTS).await.unwrap());
    assert!(h.claim(&h.alice, "I WAYAN SUDARSANA", ALICE_PARTS).await.unwrap());
}

#[tokio::test]
async fn test_claim_by_other_user_conflicts() {
    let h = Harness::new();
    let bob_parts = ["51", "02", "030", "001", "024", "0019", "0"];

    let err = h.claim(&h.alice, "Ni Made Ayu", bob_parts).await.unwrap_err();
    assert!(matches!(err, OpError::ClaimConflict));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let subject = h.repo.subject("SP002");
    assert_eq!(subject.email_wp.as_deref(), Some("bob@example.com"));
    assert!(!h.users.get(&h.alice.user_id).is_verified);
}

#[tokio::test]
async fn test_claim_name_mismatch_writes_nothing() {
    let h = Harness::new();

    assert!(!h.claim(&h.alice, "Ketut Sudarsana", ALICE_PARTS).await.unwrap());
    assert_eq!(h.repo.subject("SP001").email_wp, None);
    assert!(!h.users.get(&h.alice.user_id).is_verified);

    // Unknown object
    let unknown = ["51", "02", "030", "001", "024", "9999", "0"];
    assert!(!h.claim(&h.alice, "I Wayan Sudarsana", unknown).await.unwrap());
}

#[tokio::test]
async fn test_claim_validates_input() {
    let h = Harness::new();

    let short = ["51", "2", "030", "001", "024", "0018", "0"];
    let err = h.claim(&h.alice, "I Wayan", short).await.unwrap_err();
    assert!(matches!(err, OpError::InvalidNop));

    let err = h.claim(&h.alice, " -./ ", ALICE_PARTS).await.unwrap_err();
    let OpError::Validation(fields) = err else {
        panic!("expected validation error, got {:?}", err);
    };
    assert_eq!(fields[0].0, "NM_WP");
}

// ============================================================================
// Profile / Dashboard / Peta
// ============================================================================

#[tokio::test]
async fn test_profile_shows_linked_taxpayer() {
    let h = Harness::new();
    let profile = ProfileUseCase::new(h.repo.clone(), h.config.clone());

    assert_eq!(profile.linked_taxpayer(&h.alice).await.unwrap(), None);
    let taxpayer = profile.linked_taxpayer(&h.bob).await.unwrap().unwrap();
    assert_eq!(taxpayer.subjek_pajak_id, "SP002");
}

#[tokio::test(start_paused = true)]
async fn test_profile_degrades_when_store_unavailable() {
    let h = Harness::new();
    h.repo.fail_next(3);

    let profile = ProfileUseCase::new(h.repo.clone(), h.config.clone());
    assert_eq!(profile.linked_taxpayer(&h.bob).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_tax_object_store_outage_is_service_unavailable() {
    let h = Harness::new();
    h.repo.fail_next(2);
    assert!(h.tax_objects().sppt_batch(&h.bob.email, BOB_NOP).await.is_ok());

    h.repo.fail_next(3);
    let err = h
        .tax_objects()
        .sppt_batch(&h.bob.email, BOB_NOP)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::ServiceUnavailable));
    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_dashboard_describes_narrowest_filter() {
    let h = Harness::new();
    let dashboard = DashboardUseCase::new(h.repo.clone(), h.config.clone());

    let all = dashboard.stats(RegionFilter::default()).await.unwrap();
    assert_eq!(all.totals.total_sppt, 3);
    assert_eq!(all.totals.total_sppt_lunas, 2);
    assert_eq!(all.totals.total_sppt_belum_lunas, 1);
    assert_eq!(all.totals.total_pbb_terhutang, 415_000);
    assert_eq!(all.filtered_by, None);
    // The inactive building is left out; the zero-area one counts but is not averaged
    assert_eq!(all.buildings.total_bangunan, 3);
    assert_eq!(all.buildings.total_nilai_bangunan, 550_000_000);
    assert_eq!(all.buildings.rata_rata_luas_bangunan, 100.0);

    let stats = dashboard
        .stats(RegionFilter {
            year: Some("2024".into()),
            kd_propinsi: Some("51".into()),
            kd_kecamatan: Some("030".into()),
            kd_kelurahan: Some("  ".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(stats.totals.total_sppt, 2);
    // Buildings ignore the year
    assert_eq!(stats.buildings.total_bangunan, 2);
    assert_eq!(stats.buildings.total_nilai_bangunan, 350_000_000);
    assert_eq!(stats.buildings.rata_rata_luas_bangunan, 120.0);
    assert_eq!(stats.filtered_by, Some("kecamatan"));
    assert_eq!(stats.filter_value.as_deref(), Some("030"));
    assert_eq!(stats.year_filter.as_deref(), Some("2024"));
}

#[tokio::test]
async fn test_dashboard_years_newest_first() {
    let h = Harness::new();
    let dashboard = DashboardUseCase::new(h.repo.clone(), h.config.clone());

    assert_eq!(dashboard.years().await.unwrap(), vec!["2024", "2023"]);
}

#[tokio::test]
async fn test_dashboard_without_buildings_averages_zero() {
    let h = Harness::new();
    let dashboard = DashboardUseCase::new(h.repo.clone(), h.config.clone());

    let stats = dashboard
        .stats(RegionFilter {
            kd_propinsi: Some("52".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(stats.buildings, BuildingTotals::default());
    assert_eq!(stats.totals.total_sppt, 0);
}

#[tokio::test]
async fn test_peta_lookups() {
    let h = Harness::new();
    let peta = PetaUseCase::new(h.repo.clone(), h.config.clone());

    let parcel = peta.parcel("51.02.030.001.024.0018.0").await.unwrap();
    assert_eq!(parcel.info.nop, ALICE_NOP);
    assert_eq!(parcel.geometry["type"], "Point");

    let err = peta.parcel_info(BOB_NOP).await.unwrap_err();
    assert!(matches!(err, OpError::ParcelNotFound));

    assert_eq!(peta.list_nops(Some(0)).await.unwrap(), vec![ALICE_NOP]);
}

// ============================================================================
// Router
// ============================================================================

struct App {
    h: Harness,
    codec: Arc<TokenCodec>,
    router: axum::Router,
}

impl App {
    fn new() -> Self {
        let h = Harness::new();
        let config = AuthConfig::development();
        let codec = Arc::new(TokenCodec::new(
            &config.access_secret,
            &config.refresh_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        ));
        let auth_state: AuthAppState<FakeUsers, MemoryRevocationStore, NoProvider> =
            AuthAppState {
                users: h.users.clone(),
                revocations: Arc::new(MemoryRevocationStore::new()),
                oauth: None,
                codec: codec.clone(),
                config: Arc::new(config),
            };
        let op_state = OpAppState {
            repo: h.repo.clone(),
            config: h.config.clone(),
        };
        let guard = auth_state.guard();
        let router = axum::Router::new().nest(
            "/api",
            auth_router(auth_state).merge(op_router(op_state, guard)),
        );
        Self { h, codec, router }
    }

    fn bearer(&self, user: &User) -> String {
        let token = self
            .codec
            .issue(&user.user_id.to_string(), TokenType::Access)
            .unwrap();
        format!("Bearer {}", token)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn test_router_claim_then_me_shows_verified() {
    let app = App::new();
    let alice = app.h.alice.clone();

    let (status, body) = app
        .send(
            Request::post("/api/op/verifikasi")
                .header(header::AUTHORIZATION, app.bearer(&alice))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"NM_WP":"I Wayan Sudarsana","KD_PROPINSI":"51","KD_DATI2":"02",
                        "KD_KECAMATAN":"030","KD_KELURAHAN":"001","KD_BLOK":"024",
                        "NO_URUT":"0018","KD_JNS_OP":"0"}"#,
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (status, me) = app
        .send(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, app.bearer(&alice))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_verified"], true);

    let (status, listing) = app
        .send(
            Request::get("/api/op/spop?sort_by=LUAS_BUMI&sort_order=desc")
                .header(header::AUTHORIZATION, app.bearer(&alice))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["meta"]["total"], 1);
    assert_eq!(listing["data"][0]["NM_WP"], "I Wayan Sudarsana");
    assert_eq!(listing["data"][0]["NO_URUT"], "0018");
}

#[tokio::test]
async fn test_router_forbidden_object_problem_details() {
    let app = App::new();

    let (status, body) = app
        .send(
            Request::get(format!("/api/op/sppt/batch/{}", BOB_NOP))
                .header(header::AUTHORIZATION, app.bearer(&app.h.alice))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "OBJECT_FORBIDDEN");

    let (status, body) = app
        .send(
            Request::post("/api/op/sppt/years")
                .header(header::AUTHORIZATION, app.bearer(&app.h.bob))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"nop":"{}"}}"#, BOB_NOP)))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_years"][0]["THN_PAJAK_SPPT"], "2024");
}

#[tokio::test]
async fn test_router_guards() {
    let app = App::new();

    let (status, body) = app
        .send(Request::get("/api/profile/me").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "NOT_AUTHENTICATED");

    let (status, body) = app
        .send(
            Request::get("/api/dashboard/stats")
                .header(header::AUTHORIZATION, app.bearer(&app.h.bob))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ADMIN_REQUIRED");

    app.h
        .users
        .users
        .lock()
        .unwrap()
        .get_mut(&app.h.bob.user_id)
        .unwrap()
        .set_admin(true);
    let (status, stats) = app
        .send(
            Request::get("/api/dashboard/stats?kd_kecamatan=030")
                .header(header::AUTHORIZATION, app.bearer(&app.h.bob))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_bangunan"], 2);
    assert_eq!(stats["rata_rata_luas_bangunan"], 120.0);
    assert_eq!(stats["filtered_by"], "kecamatan");

    let (status, filters) = app
        .send(
            Request::get("/api/dashboard/filters")
                .header(header::AUTHORIZATION, app.bearer(&app.h.bob))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filters["available_years"], serde_json::json!(["2024", "2023"]));

    let (status, feature) = app
        .send(
            Request::get(format!("/api/peta/nop/{}", ALICE_NOP))
                .header(header::AUTHORIZATION, app.bearer(&app.h.bob))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feature["type"], "Feature");
    assert_eq!(feature["properties"]["nop"], ALICE_NOP);
}
