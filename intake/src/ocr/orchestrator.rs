use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::api::{KtpBackendClient, OcrSpaceClient};
use super::preprocessing::{EnhancementTier, ImagePreprocessor, PreparedImage, RawImage};
use super::provider::{IdentityRecognizer, OcrAttemptConfig, SecondaryReading, TextRecognizer};
use crate::config::Config;
use crate::error::{IntakeError, Result};
use crate::extraction::{extract, merge};
use crate::models::CanonicalIdentityRecord;

/// One primary-provider reading and where it came from.
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub fields: CanonicalIdentityRecord,
    /// Filled field count, 0..=16.
    pub score: usize,
    pub attempt: OcrAttemptConfig,
    pub tier: EnhancementTier,
}

#[derive(Debug)]
pub enum AttemptOutcome {
    /// Good enough to stop escalating.
    Strong(OcrResult),
    Weak(OcrResult),
    Failed(IntakeError),
}

/// Final identity reading handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityExtraction {
    pub fields: CanonicalIdentityRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub score: usize,
}

impl IdentityExtraction {
    fn new(fields: CanonicalIdentityRecord, warning: Option<String>) -> Self {
        Self {
            score: fields.filled_count(),
            fields,
            warning,
        }
    }
}

/// Running state of the attempt fold: first strong result wins, otherwise
/// the best-scored result and the most recent error are kept.
#[derive(Default)]
struct Search {
    best: Option<OcrResult>,
    last_error: Option<IntakeError>,
    interrupted: bool,
}

impl Search {
    /// Absorbs one outcome. Returns the result when it ends the search.
    fn absorb(&mut self, outcome: AttemptOutcome) -> Option<OcrResult> {
        match outcome {
            AttemptOutcome::Strong(result) => return Some(result),
            AttemptOutcome::Weak(result) => {
                // Ties keep the earlier result.
                if self.best.as_ref().map_or(true, |best| result.score > best.score) {
                    self.best = Some(result);
                }
            }
            AttemptOutcome::Failed(e) => {
                self.interrupted |= e.is_interruption();
                self.last_error = Some(e);
            }
        }
        None
    }

    fn best_score(&self) -> usize {
        self.best.as_ref().map_or(0, |best| best.score)
    }
}

/// Runs the bounded sequence of OCR attempts for one KTP photo.
///
/// Every enhancement tier is tried with every attempt config against the
/// primary provider, strictly one call at a time. The server-side reader
/// is the last resort. A strong reading at any point ends the sequence.
pub struct OcrOrchestrator {
    preprocessor: ImagePreprocessor,
    primary: Option<Arc<dyn TextRecognizer>>,
    secondary: Option<Arc<dyn IdentityRecognizer>>,
    attempts: [OcrAttemptConfig; 3],
    max_upload_bytes: usize,
    deadline: Duration,
}

impl OcrOrchestrator {
    pub fn new(config: &Config) -> Result<Self> {
        let primary: Option<Arc<dyn TextRecognizer>> = match OcrSpaceClient::new(&config.ocr) {
            Ok(client) => {
                info!("Primary OCR provider initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Primary OCR provider unavailable: {}", e);
                None
            }
        };

        let secondary: Option<Arc<dyn IdentityRecognizer>> = match &config.secondary {
            Some(secondary) => match KtpBackendClient::new(secondary) {
                Ok(client) => {
                    info!(url = %secondary.url, "Secondary KTP OCR provider initialized");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    warn!("Secondary KTP OCR provider unavailable: {}", e);
                    None
                }
            },
            None => None,
        };

        if primary.is_none() && secondary.is_none() {
            return Err(IntakeError::ProviderUnavailable(
                "no OCR provider configured, set OCR_API_KEY or KTP_OCR_URL".to_string(),
            ));
        }

        Ok(Self::with_recognizers(config, primary, secondary))
    }

    /// Builds an orchestrator around already constructed providers.
    pub fn with_recognizers(
        config: &Config,
        primary: Option<Arc<dyn TextRecognizer>>,
        secondary: Option<Arc<dyn IdentityRecognizer>>,
    ) -> Self {
        Self {
            preprocessor: ImagePreprocessor::new(&config.preprocessing),
            primary,
            secondary,
            attempts: OcrAttemptConfig::sequence(&config.ocr),
            max_upload_bytes: config.preprocessing.max_upload_bytes,
            deadline: Duration::from_secs(config.ocr.deadline_secs),
        }
    }

    pub async fn extract_identity(&self, image: Vec<u8>) -> Result<IdentityExtraction> {
        self.extract_identity_with_cancel(image, CancellationToken::new())
            .await
    }

    /// Like [`extract_identity`](Self::extract_identity), but stops issuing
    /// provider calls once `cancel` fires or the configured deadline passes.
    /// Whatever was read before that point is still returned.
    pub async fn extract_identity_with_cancel(
        &self,
        image: Vec<u8>,
        cancel: CancellationToken,
    ) -> Result<IdentityExtraction> {
        let image = RawImage::from_bytes(image, self.max_upload_bytes)?;
        let deadline = Instant::now() + self.deadline;
        let mut search = Search::default();

        info!(
            bytes = image.size(),
            mime = image.mime(),
            "Starting KTP extraction"
        );

        if let Some(primary) = &self.primary {
            if let Some(strong) = self
                .run_primary(primary.as_ref(), &image, deadline, &cancel, &mut search)
                .await
            {
                info!(
                    score = strong.score,
                    tier = %strong.tier,
                    language = %strong.attempt.language,
                    engine = %strong.attempt.engine,
                    "Strong OCR result"
                );
                return Ok(IdentityExtraction::new(strong.fields, None));
            }
        }

        let mut secondary_reading = None;
        match &self.secondary {
            Some(secondary) if !search.interrupted => {
                match self
                    .run_secondary(secondary.as_ref(), &image, deadline, &cancel)
                    .await
                {
                    Ok(reading) => secondary_reading = Some(reading),
                    Err(e) => {
                        warn!("Secondary KTP OCR failed: {}", e);
                        search.last_error = Some(e);
                    }
                }
            }
            Some(_) => debug!("Skipping secondary KTP OCR after interruption"),
            None => {}
        }

        let local_score = search.best_score();
        let local = search.best.map(|best| best.fields).unwrap_or_default();
        let (remote, warning) = match secondary_reading {
            Some(reading) => (reading.fields, reading.warning),
            None => (CanonicalIdentityRecord::default(), None),
        };

        if local.is_empty() && remote.is_empty() {
            warn!("No OCR strategy produced any KTP field");
            return Err(IntakeError::extraction_failed(search.last_error));
        }

        let remote_score = remote.filled_count();
        // Ties favour the local reading.
        let fields = if remote_score > local_score {
            merge(&remote, &local)
        } else {
            merge(&local, &remote)
        };

        info!(
            local_score,
            remote_score,
            score = fields.filled_count(),
            "KTP extraction finished without a strong reading"
        );
        Ok(IdentityExtraction::new(fields, warning))
    }

    async fn run_primary(
        &self,
        primary: &dyn TextRecognizer,
        image: &RawImage,
        deadline: Instant,
        cancel: &CancellationToken,
        search: &mut Search,
    ) -> Option<OcrResult> {
        for tier in EnhancementTier::ALL {
            let prepared = match self.preprocessor.prepare_tier(image, tier) {
                Ok(prepared) => prepared,
                Err(e) => {
                    warn!(tier = %tier, "Skipping tier, preprocessing failed: {}", e);
                    search.last_error = Some(e);
                    continue;
                }
            };

            for attempt in &self.attempts {
                let outcome = self
                    .run_attempt(primary, &prepared, attempt, tier, deadline, cancel)
                    .await;
                if let Some(strong) = search.absorb(outcome) {
                    return Some(strong);
                }
                if search.interrupted {
                    return None;
                }
            }
        }
        None
    }

    async fn run_attempt(
        &self,
        primary: &dyn TextRecognizer,
        image: &PreparedImage,
        attempt: &OcrAttemptConfig,
        tier: EnhancementTier,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> AttemptOutcome {
        let text = match self
            .bounded(deadline, cancel, primary.recognize(image, attempt))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    tier = %tier,
                    language = %attempt.language,
                    engine = %attempt.engine,
                    "OCR attempt failed: {}",
                    e
                );
                return AttemptOutcome::Failed(e);
            }
        };

        let fields = extract(&text);
        let result = OcrResult {
            score: fields.filled_count(),
            text,
            fields,
            attempt: attempt.clone(),
            tier,
        };
        debug!(
            tier = %tier,
            language = %attempt.language,
            engine = %attempt.engine,
            score = result.score,
            "OCR attempt finished"
        );

        if result.fields.is_strong() {
            AttemptOutcome::Strong(result)
        } else {
            AttemptOutcome::Weak(result)
        }
    }

    async fn run_secondary(
        &self,
        secondary: &dyn IdentityRecognizer,
        image: &RawImage,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<SecondaryReading> {
        let prepared = self.preprocessor.compress(image)?;
        let reading = self
            .bounded(deadline, cancel, secondary.recognize_identity(&prepared))
            .await?;
        debug!(
            score = reading.fields.filled_count(),
            warning = reading.warning.as_deref().unwrap_or(""),
            "Secondary KTP OCR finished"
        );
        Ok(reading)
    }

    /// Runs one provider call under the extraction deadline and the
    /// cancellation token. Nothing is issued once either has fired.
    async fn bounded<T>(
        &self,
        deadline: Instant,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let expired = IntakeError::DeadlineExceeded {
            secs: self.deadline.as_secs(),
        };
        if cancel.is_cancelled() {
            return Err(IntakeError::Cancelled);
        }
        if Instant::now() >= deadline {
            return Err(expired);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(IntakeError::Cancelled),
            outcome = tokio::time::timeout_at(deadline, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(expired),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXTRACTION_FAILED_MESSAGE;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat};
    use std::collections::VecDeque;
    use std::error::Error as _;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const STRONG_TEXT: &str = "NIK : 3204123456780001
Nama : SITI NURHALIZA
Tempat/Tgl Lahir : BANDUNG, 12-04-1992";
    const WEAK_TEXT: &str = "NIK : 3201234567890001\nNama : BUDI SANTOSO";

    /// Replays scripted responses and records what it was asked.
    #[derive(Default)]
    struct ScriptedRecognizer {
        responses: Mutex<VecDeque<Result<String>>>,
        seen: Mutex<Vec<(OcrAttemptConfig, Option<EnhancementTier>)>>,
        cancel_on_call: Option<CancellationToken>,
        delay: Option<Duration>,
    }

    impl ScriptedRecognizer {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextRecognizer for ScriptedRecognizer {
        async fn recognize(
            &self,
            image: &PreparedImage,
            attempt: &OcrAttemptConfig,
        ) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((attempt.clone(), image.tier));
            if let Some(token) = &self.cancel_on_call {
                token.cancel();
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(IntakeError::ProviderProcessing("exhausted".into())))
        }
    }

    struct FixedSecondary {
        reading: Option<SecondaryReading>,
        calls: AtomicUsize,
    }

    impl FixedSecondary {
        fn returning(reading: Option<SecondaryReading>) -> Self {
            Self {
                reading,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IdentityRecognizer for FixedSecondary {
        async fn recognize_identity(&self, image: &PreparedImage) -> Result<SecondaryReading> {
            assert!(image.tier.is_none(), "secondary expects the unenhanced photo");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reading
                .clone()
                .ok_or_else(|| IntakeError::ProviderTransport("backend down".into()))
        }
    }

    fn test_config() -> Config {
        Config {
            ocr: crate::config::OcrConfig {
                api_key: Some("test".into()),
                ..Default::default()
            },
            secondary: None,
            preprocessing: crate::config::PreprocessingConfig::default(),
        }
    }

    fn test_png() -> Vec<u8> {
        let mut output = Vec::new();
        DynamicImage::new_rgb8(64, 64)
            .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .unwrap();
        output
    }

    fn orchestrator(
        primary: &Arc<ScriptedRecognizer>,
        secondary: Option<&Arc<FixedSecondary>>,
    ) -> OcrOrchestrator {
        OcrOrchestrator::with_recognizers(
            &test_config(),
            Some(primary.clone() as Arc<dyn TextRecognizer>),
            secondary.map(|s| s.clone() as Arc<dyn IdentityRecognizer>),
        )
    }

    fn weak_responses(n: usize) -> Vec<Result<String>> {
        (0..n).map(|_| Ok(WEAK_TEXT.to_string())).collect()
    }

    #[tokio::test]
    async fn test_strong_first_attempt_makes_one_call() {
        let primary = Arc::new(ScriptedRecognizer::new(vec![Ok(STRONG_TEXT.into())]));
        let secondary = Arc::new(FixedSecondary::returning(None));
        let orchestrator = orchestrator(&primary, Some(&secondary));

        let extraction = orchestrator.extract_identity(test_png()).await.unwrap();

        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
        assert_eq!(extraction.fields.nik, "3204123456780001");
        assert_eq!(extraction.fields.tanggal_lahir, "1992-04-12");
        assert_eq!(extraction.score, 4);
        assert!(extraction.warning.is_none());
    }

    #[tokio::test]
    async fn test_attempt_order_across_tiers() {
        let mut responses: Vec<Result<String>> = (0..3)
            .map(|_| Err(IntakeError::ProviderTransport("timeout".into())))
            .collect();
        responses.push(Ok(STRONG_TEXT.into()));
        let primary = Arc::new(ScriptedRecognizer::new(responses));
        let orchestrator = orchestrator(&primary, None);

        orchestrator.extract_identity(test_png()).await.unwrap();

        let seen = primary.seen.lock().unwrap().clone();
        let attempts: Vec<(&str, &str, Option<EnhancementTier>)> = seen
            .iter()
            .map(|(a, t)| (a.language.as_str(), a.engine.as_str(), *t))
            .collect();
        assert_eq!(
            attempts,
            vec![
                ("ind", "2", Some(EnhancementTier::Mild)),
                ("ind", "1", Some(EnhancementTier::Mild)),
                ("eng", "2", Some(EnhancementTier::Mild)),
                ("ind", "2", Some(EnhancementTier::Binarized)),
            ]
        );
    }

    #[tokio::test]
    async fn test_weak_results_escalate_to_secondary_and_merge() {
        let primary = Arc::new(ScriptedRecognizer::new(weak_responses(9)));
        let mut fields = CanonicalIdentityRecord::default();
        fields.nama_lengkap = "BUDI S".into();
        fields.agama = "ISLAM".into();
        fields.jenispekerjaan = "WIRASWASTA".into();
        fields.provinsi = "JAWA BARAT".into();
        let secondary = Arc::new(FixedSecondary::returning(Some(SecondaryReading {
            fields,
            warning: Some("Foto buram".into()),
        })));
        let orchestrator = orchestrator(&primary, Some(&secondary));

        let extraction = orchestrator.extract_identity(test_png()).await.unwrap();

        assert_eq!(primary.calls(), 9);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
        // The secondary reading scored higher, so its values win.
        assert_eq!(extraction.fields.nama_lengkap, "BUDI S");
        assert_eq!(extraction.fields.nik, "3201234567890001");
        assert_eq!(extraction.fields.agama, "ISLAM");
        assert_eq!(extraction.score, 5);
        assert_eq!(extraction.warning.as_deref(), Some("Foto buram"));
    }

    #[tokio::test]
    async fn test_best_reading_kept_across_tiers() {
        let one = "Nama : BUDI";
        let best = "Nama : BUDI SANTOSO\nAgama : ISLAM\nPekerjaan : PETANI";
        let lower = "Nama : BUDI S\nAgama : ISLAM";
        let tie = "Nama : ANDI\nAgama : KRISTEN\nPekerjaan : GURU";
        // Binarized tier, second attempt scores highest; a later tie must not replace it.
        let script = [one, one, one, one, best, lower, tie, lower, one];
        let primary = Arc::new(ScriptedRecognizer::new(
            script.iter().map(|text| Ok(text.to_string())).collect(),
        ));
        let orchestrator = orchestrator(&primary, None);

        let extraction = orchestrator.extract_identity(test_png()).await.unwrap();

        assert_eq!(primary.calls(), 9);
        assert_eq!(extraction.score, 3);
        assert_eq!(extraction.fields.nama_lengkap, "BUDI SANTOSO");
        assert_eq!(extraction.fields.agama, "ISLAM");
        assert_eq!(extraction.fields.jenispekerjaan, "PETANI");
    }

    #[test]
    fn test_search_keeps_earlier_result_on_tie() {
        let reading = |nama: &str, score: usize| {
            let mut fields = CanonicalIdentityRecord::default();
            fields.nama_lengkap = nama.to_string();
            AttemptOutcome::Weak(OcrResult {
                text: String::new(),
                fields,
                score,
                attempt: OcrAttemptConfig::new("ind", "2"),
                tier: EnhancementTier::Mild,
            })
        };
        let mut search = Search::default();

        assert!(search.absorb(reading("A", 2)).is_none());
        assert!(search.absorb(reading("B", 2)).is_none());
        assert!(search.absorb(reading("C", 1)).is_none());
        search.absorb(AttemptOutcome::Failed(IntakeError::ProviderTransport("x".into())));

        let best = search.best.as_ref().unwrap();
        assert_eq!(best.fields.nama_lengkap, "A");
        assert!(!search.interrupted);
        assert!(search.last_error.is_some());

        search.absorb(reading("D", 3));
        assert_eq!(search.best_score(), 3);
    }

    #[tokio::test]
    async fn test_score_tie_favours_local_reading() {
        let primary = Arc::new(ScriptedRecognizer::new(weak_responses(9)));
        let mut fields = CanonicalIdentityRecord::default();
        fields.nama_lengkap = "BUDI S".into();
        fields.rt = "003".into();
        let secondary = Arc::new(FixedSecondary::returning(Some(SecondaryReading {
            fields,
            warning: None,
        })));
        let orchestrator = orchestrator(&primary, Some(&secondary));

        let extraction = orchestrator.extract_identity(test_png()).await.unwrap();

        assert_eq!(extraction.fields.nama_lengkap, "BUDI SANTOSO");
        assert_eq!(extraction.fields.rt, "003");
    }

    #[tokio::test]
    async fn test_total_failure_keeps_last_error() {
        let primary = Arc::new(ScriptedRecognizer::new(vec![]));
        let secondary = Arc::new(FixedSecondary::returning(None));
        let orchestrator = orchestrator(&primary, Some(&secondary));

        let error = orchestrator.extract_identity(test_png()).await.unwrap_err();

        assert_eq!(primary.calls(), 9);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(error.to_string(), EXTRACTION_FAILED_MESSAGE);
        let cause = error.source().unwrap().to_string();
        assert!(cause.contains("backend down"), "unexpected cause: {cause}");
    }

    #[tokio::test]
    async fn test_secondary_only() {
        let mut fields = CanonicalIdentityRecord::default();
        fields.nik = "3201234567890001".into();
        let secondary = Arc::new(FixedSecondary::returning(Some(SecondaryReading {
            fields,
            warning: None,
        })));
        let orchestrator = OcrOrchestrator::with_recognizers(
            &test_config(),
            None,
            Some(secondary.clone() as Arc<dyn IdentityRecognizer>),
        );

        let extraction = orchestrator.extract_identity(test_png()).await.unwrap();
        assert_eq!(extraction.fields.nik, "3201234567890001");
        assert_eq!(extraction.score, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_issues_no_calls() {
        let primary = Arc::new(ScriptedRecognizer::new(weak_responses(9)));
        let secondary = Arc::new(FixedSecondary::returning(None));
        let orchestrator = orchestrator(&primary, Some(&secondary));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = orchestrator
            .extract_identity_with_cancel(test_png(), cancel)
            .await
            .unwrap_err();

        assert_eq!(primary.calls(), 0);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            error,
            IntakeError::ExtractionFailed { source: Some(ref cause), .. }
                if matches!(**cause, IntakeError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_cancel_mid_sequence_stops_further_calls() {
        let cancel = CancellationToken::new();
        let primary = Arc::new(ScriptedRecognizer {
            responses: Mutex::new(weak_responses(9).into()),
            cancel_on_call: Some(cancel.clone()),
            delay: Some(Duration::from_millis(50)),
            ..ScriptedRecognizer::default()
        });
        let secondary = Arc::new(FixedSecondary::returning(None));
        let orchestrator = orchestrator(&primary, Some(&secondary));

        let result = orchestrator
            .extract_identity_with_cancel(test_png(), cancel)
            .await;

        // The first call is abandoned by the cancellation, nothing follows it.
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deadline_stops_slow_provider() {
        let primary = Arc::new(ScriptedRecognizer {
            delay: Some(Duration::from_secs(30)),
            ..ScriptedRecognizer::default()
        });
        let mut config = test_config();
        config.ocr.deadline_secs = 1;
        let orchestrator = OcrOrchestrator::with_recognizers(
            &config,
            Some(primary.clone() as Arc<dyn TextRecognizer>),
            None,
        );

        let started = std::time::Instant::now();
        let error = orchestrator.extract_identity(test_png()).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(primary.calls(), 1);
        assert!(matches!(
            error,
            IntakeError::ExtractionFailed { source: Some(ref cause), .. }
                if matches!(**cause, IntakeError::DeadlineExceeded { secs: 1 })
        ));
    }

    #[tokio::test]
    async fn test_invalid_upload_rejected_before_any_call() {
        let primary = Arc::new(ScriptedRecognizer::new(weak_responses(1)));
        let orchestrator = orchestrator(&primary, None);

        let error = orchestrator
            .extract_identity(b"not an image".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(error, IntakeError::UnsupportedFormat(_)));

        let mut config = test_config();
        config.preprocessing.max_upload_bytes = 8;
        let small = OcrOrchestrator::with_recognizers(
            &config,
            Some(primary.clone() as Arc<dyn TextRecognizer>),
            None,
        );
        let error = small.extract_identity(test_png()).await.unwrap_err();
        assert!(matches!(error, IntakeError::ImageTooLarge { .. }));
        assert_eq!(primary.calls(), 0);
    }
}
