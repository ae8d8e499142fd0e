use std::sync::LazyLock;

use prometheus::*;

static METRIC_INDEXED_IMAGE_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "picfind_indexed_image_count",
        "count of the processed images",
        &["model", "status"]
    )
    .unwrap()
});

static METRIC_GENERATION_TOKENS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "picfind_generation_tokens",
        "tokens consumed by description generation",
        &["model", "kind"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("picfind_search_duration", "duration of the text search in seconds")
        .unwrap()
});

static METRIC_SEARCH_HITS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "picfind_search_hits",
        "number of hits returned by the text search",
        (0..=16).map(|x| x as f64).collect()
    )
    .unwrap()
});

/// 记录一张图片的处理结果，`status` 为 indexed、failed 或 failed_indexed
pub fn inc_indexed_image(model: &str, status: &str) {
    METRIC_INDEXED_IMAGE_COUNT.with_label_values(&[model, status]).inc();
}

pub fn inc_generation_tokens(model: &str, output: u32, reasoning: u32) {
    METRIC_GENERATION_TOKENS.with_label_values(&[model, "output"]).inc_by(output as u64);
    METRIC_GENERATION_TOKENS.with_label_values(&[model, "reasoning"]).inc_by(reasoning as u64);
}

pub fn observe_search(duration: f32, hits: usize) {
    METRIC_SEARCH_DURATION.observe(duration as f64);
    METRIC_SEARCH_HITS.observe(hits as f64);
}

/// 以文本格式导出所有指标
pub fn gather_text() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&prometheus::gather())?)
}
