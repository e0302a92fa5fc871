use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbImage;

use crate::detection::domain::detection_engine::{
    Candidate, DetectionEngine, EngineImage, EnrolledIdentity, FeatureVector, SpoofLabel,
    SpoofResult,
};
use crate::detection::domain::engine_error::{EngineError, EngineErrorCode};
use crate::detection::domain::face_region::{FaceRegion, ObjectRegion};
use crate::shared::rect::Rect;

const EMBEDDING_DIM: usize = 16;
const MATCH_THRESHOLD: f32 = 0.7;

/// What the engine "sees" in a frame. Rects are fractions of the image size.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub face: Option<ScriptedFace>,
    pub objects: Vec<(Rect, String)>,
    /// Preprocessing refuses the frame.
    pub reject: bool,
}

#[derive(Clone, Debug)]
pub struct ScriptedFace {
    pub bounds: Rect,
    pub score: f32,
    /// Selects the embedding, see [`embedding_for`].
    pub person: u32,
    pub liveness: f32,
    pub spoof_error: i32,
    pub extractable: bool,
}

impl ScriptedFace {
    pub fn new(person: u32) -> Self {
        Self {
            bounds: Rect::new(0.3, 0.2, 0.3, 0.5),
            score: 0.97,
            person,
            liveness: 0.9,
            spoof_error: 0,
            extractable: true,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn with_liveness(mut self, liveness: f32) -> Self {
        self.liveness = liveness;
        self
    }

    pub fn with_spoof_error(mut self, code: i32) -> Self {
        self.spoof_error = code;
        self
    }

    pub fn unextractable(mut self) -> Self {
        self.extractable = false;
        self
    }
}

/// Maps a frame tag (the red value of its first pixel) to a scene.
pub type SceneScript = Arc<dyn Fn(u8) -> Scene + Send + Sync>;

struct Record {
    identity: String,
    uuid: String,
    vector: FeatureVector,
}

/// In-memory stand-in for the face analysis engine.
///
/// Detection results come from a scene script keyed on pixel content;
/// enrollment and identification run against real in-memory collections.
pub struct ScriptedDetectionEngine {
    script: SceneScript,
    collections: Mutex<BTreeMap<String, Vec<Record>>>,
    enroll_calls: AtomicUsize,
    identify_calls: AtomicUsize,
    spoof_calls: AtomicUsize,
}

impl ScriptedDetectionEngine {
    pub fn new(script: SceneScript) -> Self {
        Self {
            script,
            collections: Mutex::new(BTreeMap::new()),
            enroll_calls: AtomicUsize::new(0),
            identify_calls: AtomicUsize::new(0),
            spoof_calls: AtomicUsize::new(0),
        }
    }

    /// The same scene for every frame.
    pub fn fixed(scene: Scene) -> Self {
        Self::new(Arc::new(move |_| scene.clone()))
    }

    /// A face is present for the first `on_frames` of every `period`
    /// frames. Successive appearances alternate between persons 0 and 1,
    /// and person 1 fails liveness. A cup sits in every frame.
    ///
    /// The tag is one byte and wraps every 256 frames, so the cycle stays
    /// regular only when `period` divides 256.
    pub fn cycling(period: u32, on_frames: u32) -> Self {
        let period = period.max(1);
        Self::new(Arc::new(move |tag| {
            let t = u32::from(tag);
            let mut objects = vec![(Rect::new(0.7, 0.6, 0.1, 0.15), "cup".to_string())];
            let face = (t % period < on_frames).then(|| {
                let person = (t / period) % 2;
                let face = ScriptedFace::new(person);
                objects.push((face.bounds, "person".to_string()));
                if person == 1 {
                    face.with_liveness(0.2)
                } else {
                    face
                }
            });
            Scene {
                face,
                objects,
                reject: false,
            }
        }))
    }

    pub fn enroll_calls(&self) -> usize {
        self.enroll_calls.load(Ordering::Relaxed)
    }

    pub fn identify_calls(&self) -> usize {
        self.identify_calls.load(Ordering::Relaxed)
    }

    pub fn spoof_calls(&self) -> usize {
        self.spoof_calls.load(Ordering::Relaxed)
    }

    fn scene(&self, image: &RgbImage) -> Scene {
        let tag = image.as_raw().first().copied().unwrap_or(0);
        (self.script)(tag)
    }

    fn collections(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<Record>>>, EngineError> {
        self.collections.lock().map_err(|_| {
            EngineError::new(
                EngineErrorCode::DatabaseConnectionError,
                "collection store poisoned",
            )
        })
    }

    fn scripted_face(&self, image: &EngineImage) -> Option<ScriptedFace> {
        self.scene(image.pixels()).face
    }
}

/// Deterministic embedding for a scripted person.
pub fn embedding_for(person: u32) -> FeatureVector {
    let mut v = vec![0.1f32; EMBEDDING_DIM];
    v[person as usize % EMBEDDING_DIM] = 1.0;
    FeatureVector(v)
}

fn scale(fraction: &Rect, image: &EngineImage) -> Rect {
    let w = f64::from(image.width());
    let h = f64::from(image.height());
    Rect::new(
        fraction.x * w,
        fraction.y * h,
        fraction.width * w,
        fraction.height * h,
    )
}

impl DetectionEngine for ScriptedDetectionEngine {
    fn preprocess(&self, frame: RgbImage) -> Option<EngineImage> {
        if frame.width() == 0 || frame.height() == 0 || self.scene(&frame).reject {
            return None;
        }
        Some(EngineImage::new(frame))
    }

    fn detect_largest_face(&self, image: &EngineImage) -> Option<FaceRegion> {
        let face = self.scene(image.pixels()).face?;
        Some(FaceRegion::new(scale(&face.bounds, image), face.score))
    }

    fn detect_objects(&self, image: &EngineImage) -> Vec<ObjectRegion> {
        self.scene(image.pixels())
            .objects
            .iter()
            .map(|(bounds, label)| ObjectRegion::new(scale(bounds, image), label.as_str(), 0.8))
            .collect()
    }

    fn extract_feature_vector(
        &self,
        image: &EngineImage,
        _face: &FaceRegion,
    ) -> Option<FeatureVector> {
        self.scripted_face(image)
            .filter(|f| f.extractable)
            .map(|f| embedding_for(f.person))
    }

    fn identify_top_candidate(
        &self,
        probe: &FeatureVector,
        collection: &str,
    ) -> Result<Option<Candidate>, EngineError> {
        self.identify_calls.fetch_add(1, Ordering::Relaxed);
        let collections = self.collections()?;
        let Some(records) = collections.get(collection) else {
            return Ok(None);
        };
        let best = records
            .iter()
            .map(|r| (r, r.vector.similarity(probe)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        Ok(best
            .filter(|(_, similarity)| *similarity >= MATCH_THRESHOLD)
            .map(|(record, similarity)| Candidate {
                identity: record.identity.clone(),
                similarity,
            }))
    }

    fn enroll(
        &self,
        vector: &FeatureVector,
        identity: &str,
        collection: &str,
    ) -> Result<(), EngineError> {
        self.enroll_calls.fetch_add(1, Ordering::Relaxed);
        if vector.0.len() != EMBEDDING_DIM {
            return Err(EngineError::new(
                EngineErrorCode::EnrollmentError,
                format!("expected {EMBEDDING_DIM} features, got {}", vector.0.len()),
            ));
        }
        self.collections()?
            .entry(collection.to_string())
            .or_default()
            .push(Record {
                identity: identity.to_string(),
                uuid: uuid::Uuid::new_v4().to_string(),
                vector: vector.clone(),
            });
        Ok(())
    }

    fn detect_spoof(&self, image: &EngineImage, _face: &FaceRegion, threshold: f32) -> SpoofResult {
        self.spoof_calls.fetch_add(1, Ordering::Relaxed);
        let Some(scripted) = self.scripted_face(image) else {
            return SpoofResult {
                label: SpoofLabel::Fake,
                score: 0.0,
                error_code: EngineErrorCode::NoFaceInFrame.raw(),
            };
        };
        if scripted.spoof_error != EngineErrorCode::NoError.raw() {
            return SpoofResult {
                label: SpoofLabel::Fake,
                score: 0.0,
                error_code: scripted.spoof_error,
            };
        }
        let label = if scripted.liveness >= threshold {
            SpoofLabel::Real
        } else {
            SpoofLabel::Fake
        };
        SpoofResult {
            label,
            score: scripted.liveness,
            error_code: EngineErrorCode::NoError.raw(),
        }
    }

    fn list_identities(&self, collection: &str) -> Result<Vec<EnrolledIdentity>, EngineError> {
        Ok(self
            .collections()?
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .map(|r| EnrolledIdentity {
                        identity: r.identity.clone(),
                        uuid: r.uuid.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn remove(&self, identity: &str, collection: &str) -> Result<(), EngineError> {
        let mut collections = self.collections()?;
        let records = collections.get_mut(collection).ok_or_else(|| {
            EngineError::new(EngineErrorCode::NoCollectionFound, collection.to_string())
        })?;
        let before = records.len();
        records.retain(|r| r.identity != identity);
        if records.len() == before {
            return Err(EngineError::new(
                EngineErrorCode::NoRecordFound,
                identity.to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn image_tagged(tag: u8) -> RgbImage {
        RgbImage::from_pixel(100, 50, Rgb([tag, tag, tag]))
    }

    fn with_face(face: ScriptedFace) -> ScriptedDetectionEngine {
        ScriptedDetectionEngine::fixed(Scene {
            face: Some(face),
            ..Scene::default()
        })
    }

    #[test]
    fn test_face_is_scaled_to_image() {
        let engine = with_face(ScriptedFace::new(0));
        let image = engine.preprocess(image_tagged(0)).unwrap();
        let face = engine.detect_largest_face(&image).unwrap();
        let rect = face.rect();
        assert_relative_eq!(rect.x, 30.0);
        assert_relative_eq!(rect.y, 10.0);
        assert_relative_eq!(rect.width, 30.0);
        assert_relative_eq!(rect.height, 25.0);
    }

    #[test]
    fn test_rejected_scene_fails_preprocess() {
        let engine = ScriptedDetectionEngine::fixed(Scene {
            reject: true,
            ..Scene::default()
        });
        assert!(engine.preprocess(image_tagged(0)).is_none());
        assert!(engine.preprocess(RgbImage::new(0, 0)).is_none());
    }

    #[test]
    fn test_cycling_script_follows_tag() {
        let engine = ScriptedDetectionEngine::cycling(10, 4);
        let present = engine.preprocess(image_tagged(3)).unwrap();
        let absent = engine.preprocess(image_tagged(4)).unwrap();
        assert!(engine.detect_largest_face(&present).is_some());
        assert!(engine.detect_largest_face(&absent).is_none());
        assert_eq!(engine.detect_objects(&present).len(), 2);
        assert_eq!(engine.detect_objects(&absent).len(), 1);
    }

    #[test]
    fn test_cycling_stays_regular_across_tag_wrap() {
        let engine = ScriptedDetectionEngine::cycling(32, 20);
        let appearances: Vec<(bool, Option<u32>)> = (0u32..600)
            .map(|frame| {
                let scene = (engine.script)((frame % 256) as u8);
                (scene.face.is_some(), scene.face.map(|f| f.person))
            })
            .collect();
        for (frame, (present, person)) in appearances.iter().enumerate() {
            let frame = frame as u32;
            assert_eq!(*present, frame % 32 < 20, "frame {frame}");
            if *present {
                assert_eq!(*person, Some((frame / 32) % 2), "frame {frame}");
            }
        }
    }

    #[test]
    fn test_enroll_then_identify() {
        let engine = with_face(ScriptedFace::new(3));
        let image = engine.preprocess(image_tagged(0)).unwrap();
        let face = engine.detect_largest_face(&image).unwrap();
        let vector = engine.extract_feature_vector(&image, &face).unwrap();

        assert_eq!(engine.identify_top_candidate(&vector, "DEMO").unwrap(), None);
        engine.enroll(&vector, "ada", "DEMO").unwrap();

        let candidate = engine
            .identify_top_candidate(&vector, "DEMO")
            .unwrap()
            .unwrap();
        assert_eq!(candidate.identity, "ada");
        assert_relative_eq!(candidate.similarity, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dissimilar_person_is_not_matched() {
        let engine = ScriptedDetectionEngine::fixed(Scene::default());
        engine.enroll(&embedding_for(0), "ada", "DEMO").unwrap();
        let result = engine.identify_top_candidate(&embedding_for(1), "DEMO").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unextractable_face_yields_no_vector() {
        let engine = with_face(ScriptedFace::new(0).unextractable());
        let image = engine.preprocess(image_tagged(0)).unwrap();
        let face = engine.detect_largest_face(&image).unwrap();
        assert!(engine.extract_feature_vector(&image, &face).is_none());
    }

    #[test]
    fn test_spoof_label_follows_threshold() {
        let engine = with_face(ScriptedFace::new(0).with_liveness(0.4));
        let image = engine.preprocess(image_tagged(0)).unwrap();
        let face = engine.detect_largest_face(&image).unwrap();

        let strict = engine.detect_spoof(&image, &face, 0.5);
        assert_eq!(strict.label, SpoofLabel::Fake);
        assert!(strict.is_ok());
        let lenient = engine.detect_spoof(&image, &face, 0.3);
        assert_eq!(lenient.label, SpoofLabel::Real);
        assert_eq!(engine.spoof_calls(), 2);
    }

    #[test]
    fn test_spoof_error_is_reported() {
        let engine =
            with_face(ScriptedFace::new(0).with_spoof_error(EngineErrorCode::EyesClosed.raw()));
        let image = engine.preprocess(image_tagged(0)).unwrap();
        let face = engine.detect_largest_face(&image).unwrap();
        let result = engine.detect_spoof(&image, &face, 0.5);
        assert_eq!(result.error_code, EngineErrorCode::EyesClosed.raw());
    }

    #[test]
    fn test_list_and_remove() {
        let engine = ScriptedDetectionEngine::fixed(Scene::default());
        engine.enroll(&embedding_for(0), "ada", "DEMO").unwrap();
        engine.enroll(&embedding_for(1), "grace", "DEMO").unwrap();

        let listed = engine.list_identities("DEMO").unwrap();
        assert_eq!(listed.len(), 2);
        assert_ne!(listed[0].uuid, listed[1].uuid);

        engine.remove("ada", "DEMO").unwrap();
        assert_eq!(engine.list_identities("DEMO").unwrap().len(), 1);
        assert_eq!(
            engine.remove("ada", "DEMO").unwrap_err().code,
            EngineErrorCode::NoRecordFound
        );
        assert_eq!(
            engine.remove("ada", "OTHER").unwrap_err().code,
            EngineErrorCode::NoCollectionFound
        );
        assert!(engine.list_identities("OTHER").unwrap().is_empty());
    }

    #[test]
    fn test_enroll_rejects_wrong_dimension() {
        let engine = ScriptedDetectionEngine::fixed(Scene::default());
        let err = engine.enroll(&FeatureVector(vec![1.0]), "ada", "DEMO").unwrap_err();
        assert_eq!(err.code, EngineErrorCode::EnrollmentError);
        assert_eq!(engine.enroll_calls(), 1);
    }
}
