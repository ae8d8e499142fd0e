use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use picfind::describe::{Describer, Description, UsageStats};
use picfind::embed::{EMBEDDING_DIM, Embedder, strip_stats};
use picfind::openai::ModelError;
use picfind::pipeline::{FailurePolicy, IndexOutcome, Pipeline};
use picfind::store::{CollectionConfig, Distance, VectorStore};
use prometheus::TextEncoder;
use rstest::*;
use tempfile::TempDir;

/// 把图片文件内容当作描述返回，按词袋生成向量
#[derive(Default)]
struct FakeClient {
    fail_describe: bool,
    embed_calls: AtomicUsize,
}

impl Describer for FakeClient {
    async fn describe(&self, image: &Path, model: &str) -> Result<Description, ModelError> {
        if self.fail_describe {
            return Err(ModelError::Api { status: 500, message: "upstream exploded".into() });
        }
        let text = std::fs::read_to_string(image)?;
        Ok(Description {
            model: model.to_string(),
            text,
            empty: false,
            stats: UsageStats { output_tokens: 9, reasoning_tokens: 0, finish_reason: "stop".into() },
        })
    }
}

impl Embedder for FakeClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        let text = strip_stats(text);
        if text.contains("explode") {
            return Err(ModelError::EmptyResponse);
        }
        let mut vector = vec![0f32; EMBEDDING_DIM];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[hasher.finish() as usize % EMBEDDING_DIM] += 1.;
        }
        Ok(vector)
    }
}

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// 某个模型下各状态的已处理图片计数
fn indexed_image_counts(model: &str) -> Vec<String> {
    let text = TextEncoder::new().encode_to_string(&prometheus::gather()).unwrap();
    let prefix = format!("picfind_indexed_image_count{{model=\"{}\",", model);
    text.lines().filter(|line| line.starts_with(&prefix)).map(str::to_string).collect()
}

fn pipeline(dir: &TempDir, client: FakeClient) -> Pipeline<FakeClient> {
    let config = CollectionConfig { size: EMBEDDING_DIM, distance: Distance::Cosine };
    let store = VectorStore::new(dir.path().join("vectors"), "photos", config);
    Pipeline::new(client, store, dir.path().join("uploads"))
}

#[rstest]
#[tokio::test]
async fn test_index_then_search(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());

    let report = pipeline.index_upload("a.jpg", b"a red car", "gpt-4o").await.unwrap();
    assert!(report.path.ends_with("a.jpg"));
    assert!(matches!(report.outcome, IndexOutcome::Indexed { .. }));

    let hits = pipeline.search("red car", 4).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].payload.path.ends_with("a.jpg"));
    assert_eq!(hits[0].payload.model, "gpt-4o");
    assert!(hits[0].payload.description.starts_with("a red car"));
    assert!(hits[0].payload.description.contains("[Stats | Output: 9"));
}

#[rstest]
#[tokio::test]
async fn test_search_ranks_best_match_first(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    pipeline.index_upload("car.jpg", b"a red car on a street", "gpt-4o").await.unwrap();
    pipeline.index_upload("dog.jpg", b"a brown dog in the grass", "gpt-5").await.unwrap();
    pipeline.index_upload("cat.jpg", b"a sleeping cat", "gpt-5-mini").await.unwrap();

    let hits = pipeline.search("brown dog", 4).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits[0].payload.path.ends_with("dog.jpg"));
    assert_eq!(hits[0].payload.model, "gpt-5");
}

#[rstest]
#[tokio::test]
async fn test_failed_description_is_skipped(temp_dir: TempDir) {
    let client = FakeClient { fail_describe: true, ..Default::default() };
    let pipeline = pipeline(&temp_dir, client);
    pipeline.store().ensure_collection().await.unwrap();

    let report = pipeline.index_upload("a.jpg", b"whatever", "gpt-5").await.unwrap();
    match report.outcome {
        IndexOutcome::Skipped { error } => assert!(error.contains("upstream exploded")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(pipeline.store().get_collection().await.unwrap().points_count, 0);
}

#[rstest]
#[tokio::test]
async fn test_failed_description_can_be_indexed(temp_dir: TempDir) {
    let client = FakeClient { fail_describe: true, ..Default::default() };
    let pipeline = pipeline(&temp_dir, client).policy(FailurePolicy::Index);

    let report = pipeline.index_upload("a.jpg", b"whatever", "gpt-5").await.unwrap();
    match report.outcome {
        IndexOutcome::Indexed { description, .. } => {
            assert!(description.starts_with("Model error gpt-5:"))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(pipeline.store().get_collection().await.unwrap().points_count, 1);
}

#[rstest]
#[tokio::test]
async fn test_reset_then_search_is_empty(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    pipeline.index_upload("a.jpg", b"a red car", "gpt-4o").await.unwrap();

    let info = pipeline.reset().await.unwrap();
    assert_eq!(info.points_count, 0);
    assert!(pipeline.search("red car", 4).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_search_on_fresh_collection(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    assert!(pipeline.search("anything", 4).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_same_content_is_not_deduplicated(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    let files: [(&str, &[u8]); 2] = [("one.jpg", b"a red car"), ("two.jpg", b"a red car")];
    let reports = pipeline.index_batch(files, "gpt-4o").await.unwrap();
    assert_eq!(reports.len(), 2);

    let hits = pipeline.search("red car", 4).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_ne!(hits[0].id, hits[1].id);
}

#[rstest]
#[tokio::test]
async fn test_same_file_name_last_write_wins(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    let files: [(&str, &[u8]); 2] = [("a.jpg", b"a red car"), ("a.jpg", b"a blue boat")];
    pipeline.index_batch(files, "gpt-4o").await.unwrap();

    let saved = std::fs::read_to_string(pipeline.upload_dir().join("a.jpg")).unwrap();
    assert_eq!(saved, "a blue boat");
    assert_eq!(pipeline.store().get_collection().await.unwrap().points_count, 2);
}

#[rstest]
#[tokio::test]
async fn test_batch_aborts_on_embedding_error(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    let files: [(&str, &[u8]); 3] =
        [("a.jpg", b"a red car"), ("b.jpg", b"explode"), ("c.jpg", b"a green tree")];
    assert!(pipeline.index_batch(files, "gpt-4o").await.is_err());

    assert_eq!(pipeline.store().get_collection().await.unwrap().points_count, 1);
    assert!(!pipeline.upload_dir().join("c.jpg").exists());
}

#[rstest]
#[tokio::test]
async fn test_blank_query_skips_embedding(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    assert!(pipeline.search("   ", 4).await.unwrap().is_empty());
    assert!(pipeline.search("", 4).await.unwrap().is_empty());
    assert_eq!(pipeline.client().embed_calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_upload_name_is_sanitized(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    let path = pipeline.save_upload("../../escape.jpg", b"x").await.unwrap();
    assert_eq!(path, pipeline.upload_dir().join("escape.jpg"));
    assert!(pipeline.save_upload("../", b"x").await.is_err());
}

#[rstest]
#[tokio::test]
async fn test_indexed_failure_is_counted_once(temp_dir: TempDir) {
    let client = FakeClient { fail_describe: true, ..Default::default() };
    let pipeline = pipeline(&temp_dir, client).policy(FailurePolicy::Index);
    pipeline.index_upload("a.jpg", b"whatever", "counted-once-model").await.unwrap();

    let counts = indexed_image_counts("counted-once-model");
    assert_eq!(counts, [r#"picfind_indexed_image_count{model="counted-once-model",status="failed_indexed"} 1"#]);
}

#[rstest]
#[tokio::test]
async fn test_search_limit_bounds(temp_dir: TempDir) {
    let pipeline = pipeline(&temp_dir, FakeClient::default());
    pipeline.index_upload("car.jpg", b"a red car", "gpt-4o").await.unwrap();
    pipeline.index_upload("boat.jpg", b"a blue boat", "gpt-4o").await.unwrap();

    assert!(pipeline.search("red car", 0).await.unwrap().is_empty());
    assert_eq!(pipeline.search("red car", 10).await.unwrap().len(), 2);
    assert_eq!(pipeline.search("red car", usize::MAX).await.unwrap().len(), 2);
}
